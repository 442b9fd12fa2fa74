//! 添付ファイル・決裁文書の削除

use signflow_domain::{
    approval::{ApprovalError, ApprovalNo, ApprovalStatus, AttachmentSlot},
    member::MemberId,
};
use signflow_shared::{event_log::event, log_business_event};

use crate::{error::CoreError, usecase::approval::ApprovalUseCaseImpl};

impl ApprovalUseCaseImpl {
    /// 起案者の添付ファイルを 1 件削除する
    ///
    /// 起案者本人が、下書きか決裁中の文書に対してのみ実行できる。
    /// 決裁者・参照者の添付はコメント削除で外す。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no, %slot))]
    pub async fn delete_attachment(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
        slot: AttachmentSlot,
    ) -> Result<(), CoreError> {
        let document = self.load_document(approval_no).await?;
        if !document.is_drafted_by(actor_id) {
            return Err(ApprovalError::NotDrafter.into());
        }
        if !matches!(
            document.status(),
            ApprovalStatus::Draft | ApprovalStatus::InProgress
        ) {
            return Err(ApprovalError::InvalidStage.into());
        }
        let AttachmentSlot::Drafter(index) = slot else {
            return Err(ApprovalError::InvalidAttachmentSlot.into());
        };

        let detail = self.load_detail(approval_no).await?;
        let expected = detail.version();
        let (detail, removed) =
            detail.detach_drafter_file(index, actor_id, self.deps.clock.now())?;

        let mut tx = self.begin_tx().await?;
        self.save_detail(&mut tx, &detail, expected).await?;
        self.commit_tx(tx).await?;

        self.discard_files(std::slice::from_ref(&removed)).await;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::ATTACHMENT_DELETED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            file_name = %removed.file_name,
            "添付ファイル削除"
        );

        Ok(())
    }

    /// 決裁文書を削除する
    ///
    /// 本文と文書を 1 トランザクションで削除し、コミット後に添付ファイルをすべて削除する。
    /// 起案者本人のみ実行できる。
    #[tracing::instrument(skip_all, fields(%actor_id, %approval_no))]
    pub async fn delete_approval(
        &self,
        actor_id: &MemberId,
        approval_no: &ApprovalNo,
    ) -> Result<(), CoreError> {
        let document = self.load_document(approval_no).await?;
        if !document.is_drafted_by(actor_id) {
            return Err(ApprovalError::NotDrafter.into());
        }
        let detail = self.load_detail(approval_no).await?;
        let attachments: Vec<_> = detail.all_attachments().cloned().collect();

        let mut tx = self.begin_tx().await?;
        self.deps
            .detail_repo
            .delete(&mut tx, approval_no)
            .await
            .map_err(|e| CoreError::Internal(format!("本文の削除に失敗: {}", e)))?;
        self.deps
            .document_repo
            .delete(&mut tx, approval_no)
            .await
            .map_err(|e| CoreError::Internal(format!("決裁文書の削除に失敗: {}", e)))?;
        self.commit_tx(tx).await?;

        self.discard_files(&attachments).await;

        log_business_event!(
            event.category = event::category::APPROVAL,
            event.action = event::action::APPROVAL_DELETED,
            event.entity_type = event::entity_type::APPROVAL_DOCUMENT,
            event.entity_id = %approval_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            status = document.status().as_str(),
            "決裁文書削除"
        );

        Ok(())
    }
}
