//! 決裁テストビルダー
//!
//! モックリポジトリ・固定時刻・メンバーを揃えたユースケースとルーターを組み立てる。

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use signflow_domain::{
    approval::{ApprovalForm, FormNo, NewApprovalForm, SignerNames},
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

use crate::{
    app_builder::{AppStates, build_app},
    handler::{ApprovalApiState, DashboardState, FormState},
    usecase::{ApprovalDeps, ApprovalUseCaseImpl, DashboardUseCaseImpl, FormUseCaseImpl},
};

/// 決裁テストのセットアップデータ
///
/// 各ユースケース（SUT）と、状態を確認するためのモックを持つ。
/// モックは内部で状態を共有しているため、SUT 経由の変更がそのまま見える。
pub struct ApprovalTestSetup {
    pub approval:  ApprovalUseCaseImpl,
    pub form:      FormUseCaseImpl,
    pub dashboard: DashboardUseCaseImpl,
    pub documents: MockApprovalDocumentRepository,
    pub details:   MockApprovalDetailRepository,
    pub forms:     MockApprovalFormRepository,
    pub storage:   MockFileStorage,
}

/// 決裁テストビルダー
///
/// # 使用例
///
/// ```ignore
/// use signflow_core_service::test_utils::ApprovalTestBuilder;
///
/// #[tokio::test]
/// async fn test_example() {
///     let builder = ApprovalTestBuilder::new().with_member("dana", "Dana");
///     let form = builder.add_form("休暇申請", &[]);
///     let setup = builder.build();
///     // setup.approval.submit_draft(...)
/// }
/// ```
pub struct ApprovalTestBuilder {
    now:       DateTime<Utc>,
    page_size: usize,
    documents: MockApprovalDocumentRepository,
    details:   MockApprovalDetailRepository,
    forms:     MockApprovalFormRepository,
    members:   MockMemberRepository,
    storage:   MockFileStorage,
}

impl ApprovalTestBuilder {
    /// 2026-04-01 09:00 UTC に固定した空のビルダーを作成
    pub fn new() -> Self {
        Self {
            now:       Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
            page_size: 15,
            documents: MockApprovalDocumentRepository::new(),
            details:   MockApprovalDetailRepository::new(),
            forms:     MockApprovalFormRepository::new(),
            members:   MockMemberRepository::new(),
            storage:   MockFileStorage::new(),
        }
    }

    /// 現在時刻を指定
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// 一覧の 1 ページあたりの件数を指定
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// メンバーを登録する（所属は「総務部 / 主任」）
    pub fn with_member(self, id: &str, name: &str) -> Self {
        self.members.add_member(Member {
            id:         MemberId::new(id).unwrap(),
            name:       MemberName::new(name).unwrap(),
            department: "総務部".to_string(),
            position:   "主任".to_string(),
        });
        self
    }

    /// ビルダーの now を取得
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 様式を登録する
    ///
    /// `signers` は様式に固定する決裁者（空なら固定しない）。
    pub fn add_form(&self, title: &str, signers: &[&str]) -> ApprovalForm {
        let mut names = SignerNames::default();
        for (slot, name) in names.iter_mut().zip(signers) {
            *slot = Some(MemberName::new(*name).unwrap());
        }
        let form = ApprovalForm::new(NewApprovalForm {
            form_no: FormNo::new(),
            form_type: FormType::new("一般").unwrap(),
            title: title.to_string(),
            template: String::new(),
            signers: names,
            references: ReferenceNames::default(),
            now: self.now,
        })
        .unwrap();
        self.forms.add_form(form.clone());
        form
    }

    /// ユースケース一式を構築
    pub fn build(&self) -> ApprovalTestSetup {
        ApprovalTestSetup {
            approval:  self.approval_usecase(),
            form:      self.form_usecase(),
            dashboard: self.dashboard_usecase(),
            documents: self.documents.clone(),
            details:   self.details.clone(),
            forms:     self.forms.clone(),
            storage:   self.storage.clone(),
        }
    }

    /// モックを使ったルーターを構築（`/health/ready` は含まない）
    pub fn build_app(&self) -> axum::Router {
        build_app(AppStates {
            approval:  Arc::new(ApprovalApiState {
                usecase: self.approval_usecase(),
            }),
            form:      Arc::new(FormState {
                usecase: self.form_usecase(),
            }),
            dashboard: Arc::new(DashboardState {
                usecase: self.dashboard_usecase(),
            }),
            readiness: None,
        })
    }

    fn approval_usecase(&self) -> ApprovalUseCaseImpl {
        ApprovalUseCaseImpl::new(
            ApprovalDeps {
                document_repo: Arc::new(self.documents.clone()),
                detail_repo:   Arc::new(self.details.clone()),
                form_repo:     Arc::new(self.forms.clone()),
                member_repo:   Arc::new(self.members.clone()),
                storage:       Arc::new(self.storage.clone()),
                clock:         Arc::new(FixedClock::new(self.now)),
                tx_manager:    Arc::new(MockTransactionManager),
            },
            self.page_size,
        )
    }

    fn form_usecase(&self) -> FormUseCaseImpl {
        FormUseCaseImpl::new(
            Arc::new(self.forms.clone()),
            Arc::new(self.members.clone()),
            Arc::new(FixedClock::new(self.now)),
            Arc::new(MockTransactionManager),
        )
    }

    fn dashboard_usecase(&self) -> DashboardUseCaseImpl {
        DashboardUseCaseImpl::new(
            Arc::new(self.documents.clone()),
            Arc::new(self.details.clone()),
            Arc::new(self.members.clone()),
        )
    }
}

impl Default for ApprovalTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
