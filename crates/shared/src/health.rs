//! # ヘルスチェック共通型
//!
//! `/health`（liveness）と `/health/ready`（readiness）のレスポンス型。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Liveness レスポンス
///
/// ## 使用例
///
/// ```
/// use signflow_shared::HealthResponse;
///
/// let response = HealthResponse::healthy("0.1.0");
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 稼働状態（`"healthy"` 固定）
    pub status:  String,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  "healthy".to_string(),
            version: version.into(),
        }
    }
}

/// 個別チェックの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    Ready,
    NotReady,
}

/// Readiness レスポンス
///
/// 依存先（データベース・添付ストレージ）ごとのチェック結果を持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: ReadinessStatus,
    /// キー: チェック名、値: 結果（キー順で出力）
    pub checks: BTreeMap<String, CheckStatus>,
}

impl ReadinessResponse {
    /// 個別チェック結果から全体のステータスを決める
    ///
    /// 1 つでも `Error` があれば `NotReady`。
    pub fn from_checks(checks: BTreeMap<String, CheckStatus>) -> Self {
        let status = if checks.values().all(|c| *c == CheckStatus::Ok) {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::NotReady
        };
        Self { status, checks }
    }
}
