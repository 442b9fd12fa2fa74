//! # インフラ層エラー
//!
//! リポジトリと添付ファイルストレージが返すエラー。
//! 生成時に [`SpanTrace`] を記録するので、どの文書・どのスロットの処理で
//! 失敗したかをユースケース側のログから辿れる。
//!
//! ユースケースは [`InfraError::kind`] で分岐する。
//! `Conflict` は版数の不一致で、決裁・却下では `AlreadyActedOrInvalidStage` に読み替えられる。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

#[derive(Debug, Error)]
pub enum InfraErrorKind {
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 添付ファイルの書き込み・読み込み・削除の失敗
    #[error("ファイルストレージエラー: {0}")]
    Storage(#[source] std::io::Error),

    /// 更新対象の版数が保存済みの版数と一致しない
    #[error("競合が発生しました: {entity}(id={id})")]
    Conflict {
        /// `ApprovalDocument` / `ApprovalDetail` / `ApprovalForm`
        entity: String,
        id:     String,
    },

    /// 添付ファイル名など、呼び出し元の入力に起因するもの
    #[error("入力エラー: {0}")]
    InvalidInput(String),

    /// 保存済みの行がドメインの制約を満たさない等
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    fn new(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 版数競合なら対象のエンティティ名と ID
    pub fn as_conflict(&self) -> Option<(&str, &str)> {
        match &self.kind {
            InfraErrorKind::Conflict { entity, id } => Some((entity, id)),
            _ => None,
        }
    }

    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Conflict {
            entity: entity.into(),
            id:     id.into(),
        })
    }

    pub fn storage(source: std::io::Error) -> Self {
        Self::new(InfraErrorKind::Storage(source))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::InvalidInput(msg.into()))
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Unexpected(msg.into()))
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::new(InfraErrorKind::Database(source))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(source: std::io::Error) -> Self {
        Self::storage(source)
    }
}
