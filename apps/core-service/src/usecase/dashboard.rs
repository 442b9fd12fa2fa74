//! # ダッシュボードユースケース
//!
//! ログイン直後の画面に出す件数と一覧を取得する。
//!
//! ## 表示項目
//!
//! - 件数: 自分が起案した文書の総数・決裁中・完了
//! - 起案文書: 自分が起案した新しい文書 5 件
//! - 決裁待ち: 自分が次の決裁者になっている決裁中の文書

use std::sync::Arc;

use signflow_domain::{
    approval::{self, ApprovalDocument, ApprovalSummary, DashboardCounts},
    member::MemberId,
};
use signflow_infra::repository::{
    ApprovalDetailRepository,
    ApprovalDocumentRepository,
    MemberRepository,
};

use crate::{
    error::CoreError,
    usecase::helpers::{attach_details, resolve_actor},
};

/// ダッシュボードユースケース実装
pub struct DashboardUseCaseImpl {
    document_repo: Arc<dyn ApprovalDocumentRepository>,
    detail_repo:   Arc<dyn ApprovalDetailRepository>,
    member_repo:   Arc<dyn MemberRepository>,
}

impl DashboardUseCaseImpl {
    pub fn new(
        document_repo: Arc<dyn ApprovalDocumentRepository>,
        detail_repo: Arc<dyn ApprovalDetailRepository>,
        member_repo: Arc<dyn MemberRepository>,
    ) -> Self {
        Self {
            document_repo,
            detail_repo,
            member_repo,
        }
    }

    /// 自分が起案した文書の件数
    #[tracing::instrument(skip_all, fields(%actor_id))]
    pub async fn dashboard_counts(&self, actor_id: &MemberId) -> Result<DashboardCounts, CoreError> {
        let actor = resolve_actor(self.member_repo.as_ref(), actor_id).await?;
        let drafted = self.find_drafted(&actor.id).await?;
        Ok(DashboardCounts::tally(&drafted, &actor.id))
    }

    /// 自分が起案した新しい文書
    #[tracing::instrument(skip_all, fields(%actor_id))]
    pub async fn my_submitted(&self, actor_id: &MemberId) -> Result<Vec<ApprovalSummary>, CoreError> {
        let actor = resolve_actor(self.member_repo.as_ref(), actor_id).await?;
        let drafted = self.find_drafted(&actor.id).await?;
        let entries = attach_details(self.detail_repo.as_ref(), drafted).await?;
        Ok(approval::recent_submitted(&entries, &actor.id))
    }

    /// 自分の決裁待ち
    #[tracing::instrument(skip_all, fields(%actor_id))]
    pub async fn my_pending(&self, actor_id: &MemberId) -> Result<Vec<ApprovalSummary>, CoreError> {
        let actor = resolve_actor(self.member_repo.as_ref(), actor_id).await?;
        let pending = self
            .document_repo
            .find_pending_for(&actor.name)
            .await
            .map_err(|e| CoreError::Internal(format!("決裁待ち文書の取得に失敗: {}", e)))?;
        let entries = attach_details(self.detail_repo.as_ref(), pending).await?;
        Ok(approval::pending_for(&entries, &actor.name))
    }

    async fn find_drafted(&self, drafter_id: &MemberId) -> Result<Vec<ApprovalDocument>, CoreError> {
        self.document_repo
            .find_by_drafter(drafter_id)
            .await
            .map_err(|e| CoreError::Internal(format!("起案文書の取得に失敗: {}", e)))
    }
}
