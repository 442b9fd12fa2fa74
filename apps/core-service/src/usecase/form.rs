//! # 決裁様式ユースケース
//!
//! 起案時に選ぶ様式の一覧・取得・作成・削除を扱う。
//! 様式を削除しても、その様式で起案済みの文書には影響しない。

use std::sync::Arc;

use signflow_domain::{
    approval::{ApprovalForm, FormNo, NewApprovalForm, SignerNames},
    clock::Clock,
    member::{Member, MemberId},
    value_objects::{FormType, MemberName, ReferenceNames},
};
use signflow_infra::{
    db::TransactionManager,
    repository::{ApprovalFormRepository, MemberRepository},
};
use signflow_shared::{event_log::event, log_business_event};

use crate::{error::CoreError, usecase::helpers::FindResultExt};

/// 様式作成の入力
#[derive(Debug, Clone)]
pub struct CreateFormInput {
    pub form_type:  String,
    pub title:      String,
    /// 本文のひな形（HTML）
    pub template:   String,
    pub signers:    SignerNames,
    pub references: ReferenceNames,
}

/// 様式にあらかじめ設定された決裁者
///
/// 名前に一致するメンバーがいなければ `member` は `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSigner {
    /// 決裁ライン上の位置（1 始まり）
    pub slot:   usize,
    pub name:   MemberName,
    pub member: Option<Member>,
}

/// 様式の取得結果
#[derive(Debug, Clone)]
pub struct FormView {
    pub form:    ApprovalForm,
    pub signers: Vec<FormSigner>,
}

/// 決裁様式ユースケース実装
pub struct FormUseCaseImpl {
    form_repo:   Arc<dyn ApprovalFormRepository>,
    member_repo: Arc<dyn MemberRepository>,
    clock:       Arc<dyn Clock>,
    tx_manager:  Arc<dyn TransactionManager>,
}

impl FormUseCaseImpl {
    pub fn new(
        form_repo: Arc<dyn ApprovalFormRepository>,
        member_repo: Arc<dyn MemberRepository>,
        clock: Arc<dyn Clock>,
        tx_manager: Arc<dyn TransactionManager>,
    ) -> Self {
        Self {
            form_repo,
            member_repo,
            clock,
            tx_manager,
        }
    }

    /// 様式名の昇順で全件を取得する
    pub async fn list_forms(&self) -> Result<Vec<ApprovalForm>, CoreError> {
        self.form_repo
            .find_all()
            .await
            .map_err(|e| CoreError::Internal(format!("決裁様式の取得に失敗: {}", e)))
    }

    /// 様式を取得し、設定済みの決裁者をメンバー情報に解決する
    #[tracing::instrument(skip_all, fields(%form_no))]
    pub async fn get_form(&self, form_no: &FormNo) -> Result<FormView, CoreError> {
        let form = self
            .form_repo
            .find_by_no(form_no)
            .await
            .or_not_found("決裁様式")?;

        let mut signers = Vec::new();
        for (index, name) in form
            .signers()
            .iter()
            .enumerate()
            .filter_map(|(index, name)| name.as_ref().map(|name| (index, name)))
        {
            let member = self
                .member_repo
                .find_by_name(name)
                .await
                .map_err(|e| CoreError::Internal(format!("メンバーの取得に失敗: {}", e)))?;
            signers.push(FormSigner {
                slot: index + 1,
                name: name.clone(),
                member,
            });
        }

        Ok(FormView { form, signers })
    }

    /// 様式を作成する
    ///
    /// 種別と様式名は空にできない。決裁者は固定したいスロットにだけ設定する。
    #[tracing::instrument(skip_all, fields(%actor_id))]
    pub async fn create_form(
        &self,
        input: CreateFormInput,
        actor_id: &MemberId,
    ) -> Result<FormNo, CoreError> {
        let form = ApprovalForm::new(NewApprovalForm {
            form_no:    FormNo::new(),
            form_type:  FormType::new(input.form_type)?,
            title:      input.title,
            template:   input.template,
            signers:    input.signers,
            references: input.references,
            now:        self.clock.now(),
        })?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクション開始に失敗: {}", e)))?;
        self.form_repo
            .insert(&mut tx, &form)
            .await
            .map_err(|e| CoreError::Internal(format!("決裁様式の保存に失敗: {}", e)))?;
        tx.commit()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクションコミットに失敗: {}", e)))?;

        log_business_event!(
            event.category = event::category::FORM,
            event.action = event::action::FORM_CREATED,
            event.entity_type = event::entity_type::APPROVAL_FORM,
            event.entity_id = %form.form_no(),
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            "決裁様式作成"
        );

        Ok(form.form_no().clone())
    }

    /// 様式を削除する
    #[tracing::instrument(skip_all, fields(%form_no, %actor_id))]
    pub async fn delete_form(&self, form_no: &FormNo, actor_id: &MemberId) -> Result<(), CoreError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクション開始に失敗: {}", e)))?;
        let deleted = self
            .form_repo
            .delete(&mut tx, form_no)
            .await
            .map_err(|e| CoreError::Internal(format!("決裁様式の削除に失敗: {}", e)))?;
        if !deleted {
            return Err(CoreError::NotFound("決裁様式が見つかりません".to_string()));
        }
        tx.commit()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクションコミットに失敗: {}", e)))?;

        log_business_event!(
            event.category = event::category::FORM,
            event.action = event::action::FORM_DELETED,
            event.entity_type = event::entity_type::APPROVAL_FORM,
            event.entity_id = %form_no,
            event.actor_id = %actor_id,
            event.result = event::result::SUCCESS,
            "決裁様式削除"
        );

        Ok(())
    }
}
