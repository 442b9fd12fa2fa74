//! # 決裁ユースケース
//!
//! 決裁文書の起案・決裁・コメント・閲覧・一覧に関するビジネスロジックを実装する。
//!
//! 状態変更（`command`）と参照（`query`）でサブモジュールを分ける。
//! 状態変更はすべて 1 回のトランザクションで決裁文書と本文を保存し、
//! 楽観的ロックの競合は `CoreError` に変換して返す。

mod command;
mod query;

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use signflow_domain::{
    approval::{
        ApprovalDetail,
        ApprovalDocument,
        ApprovalNo,
        FormNo,
        ProgressView,
        SignerNames,
    },
    clock::Clock,
    member::MemberId,
    value_objects::{MemberName, ReferenceNames},
};
use signflow_infra::{
    db::TransactionManager,
    repository::{
        ApprovalDetailRepository,
        ApprovalDocumentRepository,
        ApprovalFormRepository,
        MemberRepository,
    },
    storage::FileStorage,
};

/// 起案者がアップロードしたファイル
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// アップロード時のファイル名
    pub file_name: String,
    pub content:   Bytes,
}

/// 提出・一時保存の入力
#[derive(Debug, Clone)]
pub struct DraftInput {
    /// 操作者（起案者）
    pub actor_id:    MemberId,
    /// 既存文書を編集する場合の文書番号（なければ新規作成）
    pub approval_no: Option<ApprovalNo>,
    pub form_no:     FormNo,
    pub title:       String,
    pub body:        String,
    /// 起案者が指定した決裁ライン（様式の決裁者がスロットごとに優先される）
    pub signers:     SignerNames,
    pub references:  ReferenceNames,
    pub attachments: Vec<UploadedFile>,
}

/// コメント操作の入力
#[derive(Debug, Clone)]
pub struct CommentInput {
    pub actor_id:    MemberId,
    pub approval_no: ApprovalNo,
    pub text:        String,
    /// 追加時のみ指定できる添付
    pub attachment:  Option<UploadedFile>,
}

/// 一覧取得の入力
#[derive(Debug, Clone)]
pub struct ListInput {
    pub actor_id: MemberId,
    pub view:     ProgressView,
    pub from:     Option<NaiveDate>,
    pub to:       Option<NaiveDate>,
    pub keyword:  Option<String>,
    /// 0 始まりのページ番号
    pub page:     usize,
}

/// 文書の閲覧結果
#[derive(Debug, Clone)]
pub struct ApprovalView {
    pub document:       ApprovalDocument,
    pub detail:         ApprovalDetail,
    /// 様式が削除済みの場合は `None`
    pub form_title:     Option<String>,
    pub current_signer: Option<MemberName>,
}

/// ダウンロードする添付ファイル
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// 利用者に提示する元のファイル名
    pub file_name: String,
    pub content:   Bytes,
}

/// 決裁ユースケースの依存コンポーネント
pub struct ApprovalDeps {
    pub document_repo: Arc<dyn ApprovalDocumentRepository>,
    pub detail_repo:   Arc<dyn ApprovalDetailRepository>,
    pub form_repo:     Arc<dyn ApprovalFormRepository>,
    pub member_repo:   Arc<dyn MemberRepository>,
    pub storage:       Arc<dyn FileStorage>,
    pub clock:         Arc<dyn Clock>,
    pub tx_manager:    Arc<dyn TransactionManager>,
}

/// 決裁ユースケース実装
pub struct ApprovalUseCaseImpl {
    deps:      ApprovalDeps,
    page_size: usize,
}

impl ApprovalUseCaseImpl {
    /// `page_size` は一覧の 1 ページあたりの件数
    pub fn new(deps: ApprovalDeps, page_size: usize) -> Self {
        Self { deps, page_size }
    }
}
