//! コメントの追加・修正・削除

use signflow_domain::{
    approval::{self, ApprovalNo, CommentChange},
    member::MemberId,
    value_objects::Version,
};
use signflow_infra::storage::StorageArea;
use signflow_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{
        approval::{ApprovalUseCaseImpl, CommentInput},
        helpers::resolve_actor,
    },
};

fn ensure_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::BadRequest(
            "コメントを入力してください".to_string(),
        ));
    }
    Ok(())
}

impl ApprovalUseCaseImpl {
    /// コメントを追加する（添付 1 件まで）
    ///
    /// ## 処理フロー
    ///
    /// 1. 役割と添付スロットの空きを確認する（ファイルを書き込む前に判定）
    /// 2. 添付ファイルを保存する
    /// 3. 役割の欄にコメントと添付を書き込み、1 トランザクションで保存する
    ///
    /// 保存に失敗した場合は書き込んだファイルを削除する。
    #[tracing::instrument(skip_all, fields(actor_id = %input.actor_id, approval_no = %input.approval_no))]
    pub async fn add_comment(&self, input: CommentInput) -> Result<(), CoreError> {
        ensure_text(&input.text)?;
        let actor = resolve_actor(self.deps.member_repo.as_ref(), &input.actor_id).await?;
        let document = self.load_document(&input.approval_no).await?;
        let detail = self.load_detail(&input.approval_no).await?;
        let expected = (document.version(), detail.version());

        // 1. 権限と空きスロットの確認
        approval::authorize_comment(&document, &detail, &actor, input.attachment.is_some())?;

        // 2. 添付ファイルを保存
        let now = self.deps.clock.now();
        let stored = match input.attachment {
            Some(file) => self.store_files(StorageArea::Upload, vec![file], now).await?,
            None => Vec::new(),
        };

        // 3. 書き込みと永続化
        let result = match approval::add_comment(
            document,
            detail,
            &actor,
            input.text,
            stored.first().cloned(),
            now,
        ) {
            Ok(change) => self.persist_comment(&change, expected).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            self.discard_files(&stored).await;
            return Err(e);
        }

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::COMMENT_ADDED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %input.approval_no,
            event.actor_id = %input.actor_id,
            event.result = event::result::SUCCESS,
            with_attachment = !stored.is_empty(),
            "コメント追加"
        );

        Ok(())
    }

    /// コメントを修正する（添付は変更しない）
    #[tracing::instrument(skip_all, fields(actor_id = %input.actor_id, approval_no = %input.approval_no))]
    pub async fn update_comment(&self, input: CommentInput) -> Result<(), CoreError> {
        ensure_text(&input.text)?;
        let actor = resolve_actor(self.deps.member_repo.as_ref(), &input.actor_id).await?;
        let document = self.load_document(&input.approval_no).await?;
        let detail = self.load_detail(&input.approval_no).await?;
        let expected = (document.version(), detail.version());

        let change = approval::update_comment(
            document,
            detail,
            &actor,
            input.text,
            self.deps.clock.now(),
        )?;
        self.persist_comment(&change, expected).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::COMMENT_UPDATED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %input.approval_no,
            event.actor_id = %input.actor_id,
            event.result = event::result::SUCCESS,
            "コメント修正"
        );

        Ok(())
    }

    /// コメントを削除する
    ///
    /// 決裁者・参照者のコメント添付はコミット後にストレージから削除する。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no))]
    pub async fn delete_comment(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<(), CoreError> {
        let actor = resolve_actor(self.deps.member_repo.as_ref(), actor_id).await?;
        let document = self.load_document(approval_no).await?;
        let detail = self.load_detail(approval_no).await?;
        let expected = (document.version(), detail.version());

        let change =
            approval::delete_comment(document, detail, &actor, self.deps.clock.now())?;
        self.persist_comment(&change, expected).await?;
        self.discard_files(&change.released).await;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::COMMENT_DELETED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            released_files = change.released.len(),
            "コメント削除"
        );

        Ok(())
    }

    /// コメント変更を保存する
    ///
    /// 決裁者コメントは決裁文書側の欄に書き込むため、文書も更新する。
    /// `expected` は読み込み時の (文書, 本文) の version。
    async fn persist_comment(
        &self,
        change: &CommentChange,
        expected: (Version, Version),
    ) -> Result<(), CoreError> {
        let mut tx = self.begin_tx().await?;
        if change.touches_document() {
            self.save_document(&mut tx, &change.document, expected.0)
                .await?;
        }
        self.save_detail(&mut tx, &change.detail, expected.1).await?;
        self.commit_tx(tx).await
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use signflow_domain::approval::{ApprovalError, AttachmentSlot};

    use super::*;
    use crate::usecase::approval::{
        UploadedFile,
        command::test_helpers::{Mocks, add_submitted, id},
    };

    fn comment(actor: &str, approval_no: &ApprovalNo, attachment: Option<&str>) -> CommentInput {
        CommentInput {
            actor_id:    id(actor),
            approval_no: approval_no.clone(),
            text:        format!("{actor} のコメント"),
            attachment:  attachment.map(|name| UploadedFile {
                file_name: name.to_string(),
                content:   Bytes::from_static(b"data"),
            }),
        }
    }

    #[tokio::test]
    async fn test_add_comment_決裁者のコメントと添付は決裁者欄に入る() {
        // Arrange
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice", "Bob"]);
        let sut = mocks.sut();

        // Act
        sut.add_comment(comment("bob", &approval_no, Some("意見.pdf")))
            .await
            .unwrap();

        // Assert
        let document = mocks.documents.get(&approval_no).unwrap();
        assert_eq!(document.signers().slots()[1].remark(), Some("bob のコメント"));
        let detail = mocks.details.get(&approval_no).unwrap();
        let attachment = detail.attachment(AttachmentSlot::Signer).unwrap();
        assert_eq!(attachment.info, "Bob（決裁者）");
        assert_eq!(attachment.original_name(), "意見.pdf");
    }

    #[tokio::test]
    async fn test_add_comment_決裁者添付が既にあればファイルを保存せずにエラー() {
        // Arrange
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice", "Bob"]);
        let sut = mocks.sut();
        sut.add_comment(comment("alice", &approval_no, Some("a.pdf")))
            .await
            .unwrap();

        // Act
        let result = sut
            .add_comment(comment("bob", &approval_no, Some("b.pdf")))
            .await;

        // Assert
        assert!(matches!(
            result,
            Err(CoreError::Approval(ApprovalError::SignerAttachmentExists))
        ));
        assert_eq!(mocks.storage.paths().len(), 1);
    }

    #[tokio::test]
    async fn test_add_comment_参照者は参照者欄に書き込む() {
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();

        sut.add_comment(comment("erin", &approval_no, Some("memo.txt")))
            .await
            .unwrap();

        let detail = mocks.details.get(&approval_no).unwrap();
        assert_eq!(detail.reference_remark(), Some("erin のコメント"));
        assert_eq!(
            detail.attachment(AttachmentSlot::Referencer).unwrap().info,
            "Erin（参照者）"
        );
    }

    #[tokio::test]
    async fn test_add_comment_起案者の添付は空いている起案者スロットに入る() {
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();

        sut.add_comment(comment("dana", &approval_no, Some("補足.docx")))
            .await
            .unwrap();

        let detail = mocks.details.get(&approval_no).unwrap();
        assert_eq!(detail.drafter_remark(), Some("dana のコメント"));
        assert_eq!(
            detail.attachment(AttachmentSlot::Drafter(0)).unwrap().info,
            "起案者コメント"
        );
    }

    #[tokio::test]
    async fn test_add_comment_関係者以外はno_comment_permission() {
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();

        let result = sut
            .add_comment(comment("mallory", &approval_no, Some("x.txt")))
            .await;

        assert!(matches!(
            result,
            Err(CoreError::Approval(ApprovalError::NoCommentPermission))
        ));
        assert!(mocks.storage.paths().is_empty());
    }

    #[tokio::test]
    async fn test_add_comment_空のコメントはbad_request() {
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();
        let mut input = comment("alice", &approval_no, None);
        input.text = "  ".to_string();

        let result = sut.add_comment(input).await;

        assert!(matches!(result, Err(CoreError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_comment_添付を残したままコメントだけ書き換える() {
        // Arrange
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();
        sut.add_comment(comment("erin", &approval_no, Some("memo.txt")))
            .await
            .unwrap();
        let mut input = comment("erin", &approval_no, None);
        input.text = "追記しました".to_string();

        // Act
        sut.update_comment(input).await.unwrap();

        // Assert
        let detail = mocks.details.get(&approval_no).unwrap();
        assert_eq!(detail.reference_remark(), Some("追記しました"));
        assert!(detail.attachment(AttachmentSlot::Referencer).is_some());
    }

    #[tokio::test]
    async fn test_delete_comment_決裁者の添付もストレージから削除する() {
        // Arrange
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();
        sut.add_comment(comment("alice", &approval_no, Some("a.pdf")))
            .await
            .unwrap();

        // Act
        sut.delete_comment(&id("alice"), &approval_no).await.unwrap();

        // Assert
        let document = mocks.documents.get(&approval_no).unwrap();
        assert_eq!(document.signers().slots()[0].remark(), None);
        let detail = mocks.details.get(&approval_no).unwrap();
        assert_eq!(detail.attachment(AttachmentSlot::Signer), None);
        assert!(mocks.storage.paths().is_empty());
    }

    #[tokio::test]
    async fn test_delete_comment_起案者の添付は残る() {
        let mocks = Mocks::with_members();
        let approval_no = add_submitted(&mocks, &["Alice"]);
        let sut = mocks.sut();
        sut.add_comment(comment("dana", &approval_no, Some("補足.docx")))
            .await
            .unwrap();

        sut.delete_comment(&id("dana"), &approval_no).await.unwrap();

        let detail = mocks.details.get(&approval_no).unwrap();
        assert_eq!(detail.drafter_remark(), None);
        assert!(detail.attachment(AttachmentSlot::Drafter(0)).is_some());
        assert_eq!(mocks.storage.paths().len(), 1);
    }
}
