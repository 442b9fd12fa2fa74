//! 起案（提出・一時保存）

use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{
        ApprovalDetail,
        ApprovalDocument,
        ApprovalForm,
        ApprovalNo,
        Attachment,
        Drafter,
        NewApprovalDetail,
        NewApprovalDocument,
        SignerChain,
    },
    member::Member,
    value_objects::{ReferenceNames, Version},
};
use signflow_infra::storage::StorageArea;
use signflow_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{
        approval::{ApprovalUseCaseImpl, DraftInput},
        helpers::{FindResultExt, find_member},
    },
};

/// 起案時に添付したファイルの情報ラベル
const DRAFT_ATTACHMENT_INFO: &str = "起案";

/// 提出か一時保存か
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraftMode {
    Submit,
    Temporary,
}

impl DraftMode {
    fn storage_area(self) -> StorageArea {
        match self {
            Self::Submit => StorageArea::Upload,
            Self::Temporary => StorageArea::Temporary,
        }
    }
}

/// 保存前の文書と本文
///
/// 既存文書を編集する場合は読み込み時の version を持つ。
struct PreparedDraft {
    document: ApprovalDocument,
    detail:   ApprovalDetail,
    expected: Option<(Version, Version)>,
}

impl ApprovalUseCaseImpl {
    /// 決裁文書を提出する
    ///
    /// ## 処理フロー
    ///
    /// 1. 起案者と様式を取得し、様式の決裁者・参照者を重ねる
    /// 2. 新規作成、または既存文書を再上申する（下書き、未着手の決裁中のみ）
    /// 3. 空きスロットを確認してから添付ファイルを保存する
    /// 4. 文書と本文を 1 トランザクションで保存する（失敗時は保存したファイルを削除）
    ///
    /// ## エラー
    ///
    /// - 決裁者が 1 人もいない、決裁ラインに空きがある: `BadRequest`
    /// - 起案者以外による編集: `NotDrafter`
    /// - 決裁が始まっている: `AlreadyProgressed`
    /// - 却下・完了済み: `InvalidStage`
    /// - 添付が空きスロットを超える: `AttachmentSlotsFull`
    pub async fn submit_draft(&self, input: DraftInput) -> Result<ApprovalNo, CoreError> {
        let actor_id = input.actor_id.clone();
        let approval_no = self.save_draft(input, DraftMode::Submit).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::APPROVAL_SUBMITTED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            "決裁文書提出"
        );

        Ok(approval_no)
    }

    /// 決裁文書を一時保存する
    ///
    /// 既存文書の編集は下書きに限る。添付ファイルは一時領域に保存する。
    pub async fn save_temporary(&self, input: DraftInput) -> Result<ApprovalNo, CoreError> {
        let actor_id = input.actor_id.clone();
        let approval_no = self.save_draft(input, DraftMode::Temporary).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::APPROVAL_SAVED_TEMPORARILY,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            "決裁文書一時保存"
        );

        Ok(approval_no)
    }

    async fn save_draft(&self, input: DraftInput, mode: DraftMode) -> Result<ApprovalNo, CoreError> {
        // 1. 起案者と様式を取得
        let member = find_member(self.deps.member_repo.as_ref(), &input.actor_id).await?;
        let form = self
            .deps
            .form_repo
            .find_by_no(&input.form_no)
            .await
            .or_not_found("決裁様式")?;

        let signers = form.resolve_chain(input.signers.clone())?;
        let references = form.resolve_references(input.references.clone());
        let now = self.deps.clock.now();

        // 2. 文書と本文を組み立てる
        let prepared = match &input.approval_no {
            Some(approval_no) => {
                self.revise_existing(approval_no, &input, &form, signers, references, mode, now)
                    .await?
            }
            None => self.create_new(&member, &input, &form, signers, references, mode, now)?,
        };

        // 3. 添付ファイルを保存
        prepared
            .detail
            .ensure_drafter_capacity(input.attachments.len())?;
        let stored = self
            .store_files(mode.storage_area(), input.attachments, now)
            .await?;

        // 4. 永続化（失敗したら保存済みファイルを削除）
        let result = self.persist_draft(prepared, stored.clone(), now).await;
        if result.is_err() {
            self.discard_files(&stored).await;
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn revise_existing(
        &self,
        approval_no: &ApprovalNo,
        input: &DraftInput,
        form: &ApprovalForm,
        signers: SignerChain,
        references: ReferenceNames,
        mode: DraftMode,
        now: DateTime<Utc>,
    ) -> Result<PreparedDraft, CoreError> {
        let document = self.load_document(approval_no).await?;
        let detail = self.load_detail(approval_no).await?;
        let expected = Some((document.version(), detail.version()));

        let document = match mode {
            DraftMode::Submit => document.submit(signers, references, &input.actor_id, now)?,
            DraftMode::Temporary => {
                document.revise_draft(signers, references, &input.actor_id, now)?
            }
        };
        let detail = detail.revise(
            form.form_no().clone(),
            form.form_type().clone(),
            input.title.clone(),
            input.body.clone(),
            &input.actor_id,
            now,
        )?;

        Ok(PreparedDraft {
            document,
            detail,
            expected,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_new(
        &self,
        member: &Member,
        input: &DraftInput,
        form: &ApprovalForm,
        signers: SignerChain,
        references: ReferenceNames,
        mode: DraftMode,
        now: DateTime<Utc>,
    ) -> Result<PreparedDraft, CoreError> {
        let approval_no = ApprovalNo::new();
        let detail = ApprovalDetail::new(NewApprovalDetail {
            approval_no: approval_no.clone(),
            form_no:     form.form_no().clone(),
            form_type:   form.form_type().clone(),
            title:       input.title.clone(),
            body:        input.body.clone(),
            created_by:  member.id.clone(),
            now,
        })?;

        let document = match mode {
            DraftMode::Submit => ApprovalDocument::new(NewApprovalDocument {
                approval_no,
                drafter: Drafter::from(member),
                signers: SignerChain::default(),
                references: ReferenceNames::default(),
                now,
            })
            .submit(signers, references, &member.id, now)?,
            DraftMode::Temporary => ApprovalDocument::new(NewApprovalDocument {
                approval_no,
                drafter: Drafter::from(member),
                signers,
                references,
                now,
            }),
        };

        Ok(PreparedDraft {
            document,
            detail,
            expected: None,
        })
    }

    async fn persist_draft(
        &self,
        prepared: PreparedDraft,
        stored: Vec<Attachment>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalNo, CoreError> {
        let PreparedDraft {
            document,
            mut detail,
            expected,
        } = prepared;

        for attachment in stored {
            detail = detail.attach_drafter_file(
                Attachment {
                    info: DRAFT_ATTACHMENT_INFO.to_string(),
                    ..attachment
                },
                now,
            )?;
        }

        let mut tx = self.begin_tx().await?;
        match expected {
            Some((document_version, detail_version)) => {
                self.save_document(&mut tx, &document, document_version)
                    .await?;
                self.save_detail(&mut tx, &detail, detail_version).await?;
            }
            None => {
                self.deps
                    .document_repo
                    .insert(&mut tx, &document)
                    .await
                    .map_err(|e| CoreError::Internal(format!("決裁文書の保存に失敗: {}", e)))?;
                self.deps
                    .detail_repo
                    .insert(&mut tx, &detail)
                    .await
                    .map_err(|e| CoreError::Internal(format!("本文の保存に失敗: {}", e)))?;
            }
        }
        self.commit_tx(tx).await?;

        Ok(document.approval_no().clone())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use signflow_domain::{
        approval::{
            ApprovalError,
            ApprovalForm,
            ApprovalStatus,
            AttachmentSlot,
            FormNo,
            NewApprovalForm,
            SignerNames,
        },
        value_objects::{FormType, MemberName, ReferenceNames},
    };

    use super::*;
    use crate::usecase::approval::{
        UploadedFile,
        command::test_helpers::{Mocks, add_draft, add_form, add_submitted, id, names, now},
    };

    fn draft_input(form_no: &FormNo, signers: &[&str]) -> DraftInput {
        DraftInput {
            actor_id:    id("dana"),
            approval_no: None,
            form_no:     form_no.clone(),
            title:       "出張申請".to_string(),
            body:        "大阪支社".to_string(),
            signers:     names(signers),
            references:  ReferenceNames::parse("Erin").unwrap(),
            attachments: Vec::new(),
        }
    }

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content:   Bytes::from_static(b"%PDF"),
        }
    }

    #[tokio::test]
    async fn test_submit_draft_新規文書は決裁中になり先頭の決裁者が次の決裁者になる() {
        // Arrange
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let sut = mocks.sut();

        // Act
        let approval_no = sut
            .submit_draft(draft_input(form.form_no(), &["Alice", "Bob"]))
            .await
            .unwrap();

        // Assert
        let document = mocks.documents.get(&approval_no).unwrap();
        assert_eq!(document.status(), ApprovalStatus::InProgress);
        assert_eq!(document.next_signer().map(MemberName::as_str), Some("Alice"));
        assert_eq!(document.started_at(), Some(now()));
        assert_eq!(document.drafter().name.as_str(), "Dana");
        let detail = mocks.details.get(&approval_no).unwrap();
        assert_eq!(detail.title(), "出張申請");
        assert_eq!(detail.form_type().as_str(), "休暇");
    }

    #[tokio::test]
    async fn test_submit_draft_様式の決裁者がスロットごとに優先される() {
        // Arrange
        let mocks = Mocks::with_members();
        let mut preset = SignerNames::default();
        preset[1] = Some(MemberName::new("Carol").unwrap());
        let form = ApprovalForm::new(NewApprovalForm {
            form_no:    FormNo::new(),
            form_type:  FormType::new("経費").unwrap(),
            title:      "経費精算".to_string(),
            template:   String::new(),
            signers:    preset,
            references: ReferenceNames::parse("Erin").unwrap(),
            now:        now(),
        })
        .unwrap();
        mocks.forms.add_form(form.clone());
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Alice", "Bob"]);
        input.references = ReferenceNames::default();

        // Act
        let approval_no = sut.submit_draft(input).await.unwrap();

        // Assert
        let document = mocks.documents.get(&approval_no).unwrap();
        assert_eq!(document.signers().joined_names(), "Alice,Carol");
        assert_eq!(document.references().to_joined(), "Erin");
    }

    #[tokio::test]
    async fn test_submit_draft_決裁者がいなければbad_request() {
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let sut = mocks.sut();

        let result = sut.submit_draft(draft_input(form.form_no(), &[])).await;

        assert!(matches!(result, Err(CoreError::BadRequest(_))));
        assert!(mocks.storage.paths().is_empty());
    }

    #[tokio::test]
    async fn test_submit_draft_添付は本保存領域に起案ラベルで保存される() {
        // Arrange
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Alice"]);
        input.attachments = vec![file("見積書.pdf"), file("日程.xlsx")];

        // Act
        let approval_no = sut.submit_draft(input).await.unwrap();

        // Assert
        let detail = mocks.details.get(&approval_no).unwrap();
        let first = detail.attachment(AttachmentSlot::Drafter(0)).unwrap();
        assert_eq!(first.file_name, "1775034000000_見積書.pdf");
        assert_eq!(first.info, "起案");
        assert!(first.path.starts_with("upload/"));
        assert_eq!(
            detail.attachment(AttachmentSlot::Drafter(1)).unwrap().original_name(),
            "日程.xlsx"
        );
        assert_eq!(mocks.storage.paths().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_draft_添付が6件以上なら保存前にattachment_slots_full() {
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Alice"]);
        input.attachments = (1..=6).map(|n| file(&format!("{n}.txt"))).collect();

        let result = sut.submit_draft(input).await;

        assert!(matches!(
            result,
            Err(CoreError::Approval(ApprovalError::AttachmentSlotsFull))
        ));
        assert!(mocks.storage.paths().is_empty());
    }

    #[tokio::test]
    async fn test_submit_draft_保存に失敗したら書き込み済みファイルを削除する() {
        // Arrange
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        mocks.storage.fail_on_store("b.txt");
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Alice"]);
        input.attachments = vec![file("a.txt"), file("b.txt")];

        // Act
        let result = sut.submit_draft(input).await;

        // Assert
        assert!(matches!(result, Err(CoreError::Storage(_))));
        assert!(mocks.storage.paths().is_empty());
    }

    #[tokio::test]
    async fn test_submit_draft_下書きを再提出すると同じ文書番号で決裁中になる() {
        // Arrange
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let approval_no = add_draft(&mocks, &["Alice"]);
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Bob"]);
        input.approval_no = Some(approval_no.clone());

        // Act
        let result = sut.submit_draft(input).await.unwrap();

        // Assert
        assert_eq!(result, approval_no);
        let document = mocks.documents.get(&approval_no).unwrap();
        assert_eq!(document.status(), ApprovalStatus::InProgress);
        assert_eq!(document.next_signer().map(MemberName::as_str), Some("Bob"));
        assert_eq!(mocks.details.get(&approval_no).unwrap().title(), "出張申請");
    }

    #[tokio::test]
    async fn test_submit_draft_決裁が始まった文書はalready_progressed() {
        // Arrange
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let approval_no = add_submitted(&mocks, &["Alice", "Bob"]);
        let sut = mocks.sut();
        sut.approve(&id("alice"), &approval_no).await.unwrap();
        let mut input = draft_input(form.form_no(), &["Alice", "Bob"]);
        input.approval_no = Some(approval_no);

        // Act
        let result = sut.submit_draft(input).await;

        // Assert
        assert!(matches!(
            result,
            Err(CoreError::Approval(ApprovalError::AlreadyProgressed))
        ));
    }

    #[tokio::test]
    async fn test_submit_draft_起案者以外の編集はnot_drafter() {
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let approval_no = add_draft(&mocks, &["Alice"]);
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Alice"]);
        input.actor_id = id("mallory");
        input.approval_no = Some(approval_no);

        let result = sut.submit_draft(input).await;

        assert!(matches!(
            result,
            Err(CoreError::Approval(ApprovalError::NotDrafter))
        ));
    }

    #[tokio::test]
    async fn test_save_temporary_新規文書は下書きで添付は一時領域に保存される() {
        // Arrange
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &[]);
        input.attachments = vec![file("memo.txt")];

        // Act
        let approval_no = sut.save_temporary(input).await.unwrap();

        // Assert
        let document = mocks.documents.get(&approval_no).unwrap();
        assert_eq!(document.status(), ApprovalStatus::Draft);
        assert_eq!(document.next_signer(), None);
        assert_eq!(mocks.storage.paths(), vec!["temp/1775034000000_memo.txt"]);
    }

    #[tokio::test]
    async fn test_save_temporary_決裁中の文書はinvalid_stage() {
        let mocks = Mocks::with_members();
        let form = add_form(&mocks);
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();
        let mut input = draft_input(form.form_no(), &["Alice"]);
        input.approval_no = Some(approval_no);

        let result = sut.save_temporary(input).await;

        assert!(matches!(
            result,
            Err(CoreError::Approval(ApprovalError::InvalidStage))
        ));
    }

    #[tokio::test]
    async fn test_save_temporary_存在しない様式はnot_found() {
        let mocks = Mocks::with_members();
        let sut = mocks.sut();

        let result = sut
            .save_temporary(draft_input(&FormNo::new(), &["Alice"]))
            .await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }
}
