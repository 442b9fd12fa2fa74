//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{
        ApprovalDetail,
        ApprovalDocument,
        ApprovalNo,
        Drafter,
        FormNo,
        NewApprovalDetail,
        NewApprovalDocument,
        SignerChain,
        SignerNames,
    },
    member::MemberId,
    value_objects::{FormType, MemberName, ReferenceNames},
};

/// テスト用の固定日時
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn drafter() -> Drafter {
    Drafter {
        id:         MemberId::new("dana").unwrap(),
        name:       MemberName::new("Dana").unwrap(),
        department: "総務部".to_string(),
        position:   "主任".to_string(),
    }
}

pub fn signer_names(names: &[&str]) -> SignerNames {
    let mut out: SignerNames = Default::default();
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = Some(MemberName::new(*name).unwrap());
    }
    out
}

/// Dana が起案した下書き
pub fn create_draft(signers: &[&str], references: &str) -> ApprovalDocument {
    ApprovalDocument::new(NewApprovalDocument {
        approval_no: ApprovalNo::new(),
        drafter:     drafter(),
        signers:     SignerChain::assign(signer_names(signers)).unwrap(),
        references:  ReferenceNames::parse(references).unwrap(),
        now:         test_now(),
    })
}

/// Dana が起案して上申済みの文書
pub fn create_submitted(signers: &[&str], references: &str) -> ApprovalDocument {
    let draft = create_draft(signers, references);
    let chain = draft.signers().clone();
    let refs = draft.references().clone();
    draft
        .submit(chain, refs, &drafter().id, test_now())
        .unwrap()
}

pub fn create_detail(approval_no: &ApprovalNo, title: &str) -> ApprovalDetail {
    ApprovalDetail::new(NewApprovalDetail {
        approval_no: approval_no.clone(),
        form_no:     FormNo::new(),
        form_type:   FormType::new("一般").unwrap(),
        title:       title.to_string(),
        body:        "<p>本文</p>".to_string(),
        created_by:  drafter().id,
        now:         test_now(),
    })
    .unwrap()
}
