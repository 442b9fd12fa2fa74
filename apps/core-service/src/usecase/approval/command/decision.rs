//! 決裁・却下・上申取り消し

use signflow_domain::{
    approval::{ApprovalDocument, ApprovalNo},
    member::MemberId,
};
use signflow_shared::{event_log::event, log_business_event};

use super::helpers::stale_decision;
use crate::{
    error::CoreError,
    usecase::{approval::ApprovalUseCaseImpl, helpers::resolve_actor},
};

impl ApprovalUseCaseImpl {
    /// 決裁する
    ///
    /// 操作者が次の決裁者であることを確認し、自分のスロットに決裁日時を記録する。
    /// 後続の決裁者がいなければ文書は完了になる。
    ///
    /// 同じ文書を並行して決裁した場合、後からコミットした側は
    /// `AlreadyActedOrInvalidStage` になる。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no))]
    pub async fn approve(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<ApprovalDocument, CoreError> {
        let actor = resolve_actor(self.deps.member_repo.as_ref(), actor_id).await?;
        let document = self.load_document(approval_no).await?;
        let expected = document.version();

        let approved = document.approve(&actor.name, &actor.id, self.deps.clock.now())?;

        let mut tx = self.begin_tx().await?;
        self.save_document(&mut tx, &approved, expected)
            .await
            .map_err(stale_decision)?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::APPROVAL_APPROVED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            status = approved.status().as_str(),
            "決裁文書決裁"
        );

        Ok(approved)
    }

    /// 却下する
    ///
    /// 却下した時点で文書は終了し、以降の決裁者には回らない。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no))]
    pub async fn reject(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<ApprovalDocument, CoreError> {
        let actor = resolve_actor(self.deps.member_repo.as_ref(), actor_id).await?;
        let document = self.load_document(approval_no).await?;
        let expected = document.version();

        let rejected = document.reject(&actor.name, &actor.id, self.deps.clock.now())?;

        let mut tx = self.begin_tx().await?;
        self.save_document(&mut tx, &rejected, expected)
            .await
            .map_err(stale_decision)?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::APPROVAL_REJECTED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            "決裁文書却下"
        );

        Ok(rejected)
    }

    /// 上申を取り消して下書きに戻す
    ///
    /// 起案者本人が、最初の決裁者が決裁する前に限り実行できる。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no))]
    pub async fn cancel(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<ApprovalDocument, CoreError> {
        let document = self.load_document(approval_no).await?;
        let expected = document.version();

        let cancelled = document.cancel(actor_id, self.deps.clock.now())?;

        let mut tx = self.begin_tx().await?;
        self.save_document(&mut tx, &cancelled, expected).await?;
        self.commit_tx(tx).await?;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::APPROVAL_CANCELLED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            "決裁文書上申取り消し"
        );

        Ok(cancelled)
    }
}
