//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーの設定を読み込む。
//!
//! 必須項目の欠落や値の形式誤りは `ConfigError` として返し、起動処理で中断する。

use std::{env, path::PathBuf};

use thiserror::Error;

/// 一覧画面の 1 ページあたりの件数（未設定時）
const DEFAULT_LIST_PAGE_SIZE: usize = 15;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が設定されていない
    #[error("{0} が設定されていません（.env を確認してください）")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Core Service サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// バインドアドレス
    pub host:               String,
    /// ポート番号
    pub port:               u16,
    /// データベース接続 URL
    pub database_url:       String,
    /// 接続プールの最大接続数
    pub db_max_connections: u32,
    /// 提出済み文書の添付ファイル保存先
    pub upload_dir:         PathBuf,
    /// 一時保存中の文書の添付ファイル保存先
    pub upload_temp_dir:    PathBuf,
    /// 一覧画面の 1 ページあたりの件数
    pub list_page_size:     usize,
}

impl CoreConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("CORE_PORT").ok_or(ConfigError::Missing("CORE_PORT"))?;
        let port = port.trim().parse().map_err(|_| ConfigError::Invalid {
            name:  "CORE_PORT",
            value: port,
        })?;

        let list_page_size =
            positive_or(get("LIST_PAGE_SIZE"), "LIST_PAGE_SIZE", DEFAULT_LIST_PAGE_SIZE)?;
        let db_max_connections = positive_or(
            get("DB_MAX_CONNECTIONS"),
            "DB_MAX_CONNECTIONS",
            DEFAULT_DB_MAX_CONNECTIONS,
        )?;

        Ok(Self {
            host: get("CORE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections,
            upload_dir: get("UPLOAD_DIR")
                .unwrap_or_else(|| "./data/upload".to_string())
                .into(),
            upload_temp_dir: get("UPLOAD_TEMP_DIR")
                .unwrap_or_else(|| "./data/upload-temp".to_string())
                .into(),
            list_page_size,
        })
    }
}

/// 1 以上の整数を読む。未設定なら `default`
fn positive_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value >= T::from(1))
        .ok_or(ConfigError::Invalid { name, value: raw })
}
