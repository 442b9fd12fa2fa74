//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! サービス共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサービス側の責務
//! - よく使うエラー種別は便利コンストラクタで提供し、URI のハードコードを排除

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://signflow.example.com/errors";

/// エラーレスポンス（RFC 9457 Problem Details）
///
/// `type` フィールドは URI で問題の種類を識別する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"attachment-slots-full"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad-request", "Bad Request", 400, detail)
    }

    /// 403 Forbidden
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new("forbidden", "Forbidden", 403, detail)
    }

    /// 404 Not Found
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new("not-found", "Not Found", 404, detail)
    }

    /// 409 Conflict
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new("conflict", "Conflict", 409, detail)
    }

    /// 400 Validation Error
    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new("validation-error", "Validation Error", 400, detail)
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさない）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            "内部エラーが発生しました",
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_new_はベースuriに種別を付加する() {
        let error = ErrorResponse::new("attachment-slots-full", "Conflict", 409, "満杯");

        assert_eq!(
            error.error_type,
            "https://signflow.example.com/errors/attachment-slots-full"
        );
        assert_eq!(error.status, 409);
    }

    #[test]
    fn test_jsonのtypeフィールド名がrfc9457に従う() {
        let error = ErrorResponse::forbidden("起案者のみ操作できます");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["type"], "https://signflow.example.com/errors/forbidden");
        assert_eq!(json["title"], "Forbidden");
        assert_eq!(json["status"], 403);
        assert_eq!(json["detail"], "起案者のみ操作できます");
        assert!(json.get("error_type").is_none());
    }

    #[rstest]
    #[case(ErrorResponse::bad_request(""), 400)]
    #[case(ErrorResponse::forbidden(""), 403)]
    #[case(ErrorResponse::not_found(""), 404)]
    #[case(ErrorResponse::conflict(""), 409)]
    #[case(ErrorResponse::validation_error(""), 400)]
    #[case(ErrorResponse::internal_error(), 500)]
    fn test_便利コンストラクタのstatus(#[case] error: ErrorResponse, #[case] expected: u16) {
        assert_eq!(error.status, expected);
    }
}
