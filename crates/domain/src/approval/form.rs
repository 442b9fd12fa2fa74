//! # 決裁様式
//!
//! 起案時に選択するテンプレート。決裁ラインと参照者をあらかじめ設定できる。
//!
//! 様式に決裁者が設定されているスロットは、起案者の指定より様式を優先する。

use chrono::{DateTime, Utc};

use super::signer::{MAX_SIGNERS, SignerChain, SignerNames};
use crate::{
    DomainError,
    value_objects::{FormType, ReferenceNames},
};

define_uuid_id! {
    /// 決裁様式番号
    pub struct FormNo;
}

/// 決裁様式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalForm {
    form_no:    FormNo,
    form_type:  FormType,
    title:      String,
    template:   String,
    signers:    SignerNames,
    references: ReferenceNames,
    created_at: DateTime<Utc>,
}

/// 様式の新規作成パラメータ
pub struct NewApprovalForm {
    pub form_no:    FormNo,
    pub form_type:  FormType,
    pub title:      String,
    pub template:   String,
    pub signers:    SignerNames,
    pub references: ReferenceNames,
    pub now:        DateTime<Utc>,
}

/// 様式の DB 復元パラメータ
pub struct ApprovalFormRecord {
    pub form_no:    FormNo,
    pub form_type:  FormType,
    pub title:      String,
    pub template:   String,
    pub signers:    SignerNames,
    pub references: ReferenceNames,
    pub created_at: DateTime<Utc>,
}

impl ApprovalForm {
    /// # Errors
    ///
    /// 様式名が空の場合は `DomainError::Validation`。
    ///
    /// 決裁者は任意のスロットだけを固定してよい。空きの検査は [`Self::resolve_chain`] で行う。
    pub fn new(params: NewApprovalForm) -> Result<Self, DomainError> {
        let title = params.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("様式名は必須です".to_string()));
        }
        Ok(Self {
            form_no: params.form_no,
            form_type: params.form_type,
            title,
            template: params.template,
            signers: params.signers,
            references: params.references,
            created_at: params.now,
        })
    }

    pub fn from_db(record: ApprovalFormRecord) -> Self {
        Self {
            form_no:    record.form_no,
            form_type:  record.form_type,
            title:      record.title,
            template:   record.template,
            signers:    record.signers,
            references: record.references,
            created_at: record.created_at,
        }
    }

    pub fn form_no(&self) -> &FormNo {
        &self.form_no
    }

    pub fn form_type(&self) -> &FormType {
        &self.form_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn signers(&self) -> &SignerNames {
        &self.signers
    }

    pub fn references(&self) -> &ReferenceNames {
        &self.references
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 起案者の指定した決裁ラインに様式の決裁者を重ねる
    ///
    /// スロットごとに様式の決裁者があればそれを採用し、なければ起案者の指定を使う。
    ///
    /// # Errors
    ///
    /// 重ねた結果の決裁ラインの途中に空きがある場合は `DomainError::Validation`。
    pub fn resolve_chain(&self, requested: SignerNames) -> Result<SignerChain, DomainError> {
        let mut merged = requested;
        for (slot, preset) in merged.iter_mut().zip(self.signers.iter()).take(MAX_SIGNERS) {
            if preset.is_some() {
                slot.clone_from(preset);
            }
        }
        SignerChain::assign(merged)
    }

    /// 起案者が参照者を指定しなかった場合は様式の参照者を使う
    pub fn resolve_references(&self, requested: ReferenceNames) -> ReferenceNames {
        if requested.is_empty() {
            self.references.clone()
        } else {
            requested
        }
    }
}
