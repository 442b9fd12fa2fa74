//! 決裁ユースケースの状態変更操作

mod comment;
mod decision;
mod drafting;
mod helpers;
mod removal;

#[cfg(test)]
pub(super) mod test_helpers {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use signflow_domain::{
        approval::{
            ApprovalDetail,
            ApprovalDocument,
            ApprovalForm,
            ApprovalNo,
            Drafter,
            FormNo,
            NewApprovalDetail,
            NewApprovalDocument,
            NewApprovalForm,
            SignerChain,
            SignerNames,
        },
        clock::FixedClock,
        member::{Member, MemberId},
        value_objects::{FormType, MemberName, ReferenceNames},
    };
    use signflow_infra::mock::{
        MockApprovalDetailRepository,
        MockApprovalDocumentRepository,
        MockApprovalFormRepository,
        MockFileStorage,
        MockMemberRepository,
        MockTransactionManager,
    };

    use crate::usecase::approval::{ApprovalDeps, ApprovalUseCaseImpl};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    /// テストで使うモック一式
    #[derive(Clone, Default)]
    pub struct Mocks {
        pub documents: MockApprovalDocumentRepository,
        pub details:   MockApprovalDetailRepository,
        pub forms:     MockApprovalFormRepository,
        pub members:   MockMemberRepository,
        pub storage:   MockFileStorage,
    }

    impl Mocks {
        /// 起案者 dana、決裁者 alice / bob / carol、参照者 erin、部外者 mallory を登録する
        pub fn with_members() -> Self {
            let mocks = Self::default();
            for (id, name) in [
                ("dana", "Dana"),
                ("alice", "Alice"),
                ("bob", "Bob"),
                ("carol", "Carol"),
                ("erin", "Erin"),
                ("mallory", "Mallory"),
            ] {
                mocks.members.add_member(member(id, name));
            }
            mocks
        }

        pub fn sut(&self) -> ApprovalUseCaseImpl {
            ApprovalUseCaseImpl::new(
                ApprovalDeps {
                    document_repo: Arc::new(self.documents.clone()),
                    detail_repo:   Arc::new(self.details.clone()),
                    form_repo:     Arc::new(self.forms.clone()),
                    member_repo:   Arc::new(self.members.clone()),
                    storage:       Arc::new(self.storage.clone()),
                    clock:         Arc::new(FixedClock::new(now())),
                    tx_manager:    Arc::new(MockTransactionManager),
                },
                15,
            )
        }
    }

    pub fn member(id: &str, name: &str) -> Member {
        Member {
            id:         MemberId::new(id).unwrap(),
            name:       MemberName::new(name).unwrap(),
            department: "総務部".to_string(),
            position:   "主任".to_string(),
        }
    }

    pub fn id(raw: &str) -> MemberId {
        MemberId::new(raw).unwrap()
    }

    pub fn names(raw: &[&str]) -> SignerNames {
        let mut names = SignerNames::default();
        for (slot, name) in names.iter_mut().zip(raw) {
            *slot = Some(MemberName::new(*name).unwrap());
        }
        names
    }

    /// 決裁者を持たない様式を登録して返す
    pub fn add_form(mocks: &Mocks) -> ApprovalForm {
        let form = ApprovalForm::new(NewApprovalForm {
            form_no:    FormNo::new(),
            form_type:  FormType::new("休暇").unwrap(),
            title:      "休暇申請".to_string(),
            template:   "<p>期間:</p>".to_string(),
            signers:    SignerNames::default(),
            references: ReferenceNames::default(),
            now:        now(),
        })
        .unwrap();
        mocks.forms.add_form(form.clone());
        form
    }

    /// dana が起案し、指定した決裁ラインで上申済みの文書を登録する
    ///
    /// 参照者は Erin。
    pub fn add_submitted(mocks: &Mocks, signers: &[&str]) -> ApprovalNo {
        let approval_no = ApprovalNo::new();
        let drafter = Drafter::from(&member("dana", "Dana"));
        let document = ApprovalDocument::new(NewApprovalDocument {
            approval_no: approval_no.clone(),
            drafter,
            signers: SignerChain::default(),
            references: ReferenceNames::parse("Erin").unwrap(),
            now: now(),
        })
        .submit(
            SignerChain::assign(names(signers)).unwrap(),
            ReferenceNames::parse("Erin").unwrap(),
            &id("dana"),
            now(),
        )
        .unwrap();
        mocks.documents.add_document(document);
        mocks.details.add_detail(detail(&approval_no));
        approval_no
    }

    /// dana の下書きを登録する
    pub fn add_draft(mocks: &Mocks, signers: &[&str]) -> ApprovalNo {
        let approval_no = ApprovalNo::new();
        let document = ApprovalDocument::new(NewApprovalDocument {
            approval_no: approval_no.clone(),
            drafter:     Drafter::from(&member("dana", "Dana")),
            signers:     SignerChain::assign(names(signers)).unwrap(),
            references:  ReferenceNames::parse("Erin").unwrap(),
            now:         now(),
        });
        mocks.documents.add_document(document);
        mocks.details.add_detail(detail(&approval_no));
        approval_no
    }

    pub fn detail(approval_no: &ApprovalNo) -> ApprovalDetail {
        ApprovalDetail::new(NewApprovalDetail {
            approval_no: approval_no.clone(),
            form_no:     FormNo::new(),
            form_type:   FormType::new("休暇").unwrap(),
            title:       "夏季休暇の申請".to_string(),
            body:        "8/10〜8/14".to_string(),
            created_by:  id("dana"),
            now:         now(),
        })
        .unwrap()
    }
}
