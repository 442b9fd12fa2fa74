//! # API レスポンスエンベロープ
//!
//! 統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// 成功レスポンスはすべて `{ "data": T }` 形式で返す。
///
/// ## 使用例
///
/// ```
/// use signflow_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでdataキーに包まれる() {
        let response = ApiResponse::new(vec!["下書き", "進行中"]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({ "data": ["下書き", "進行中"] }));
    }

    #[test]
    fn test_deserializeでjsonから復元できる() {
        let json = r#"{"data": {"total": 3}}"#;
        let response: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();

        assert_eq!(response.data["total"], 3);
    }
}
