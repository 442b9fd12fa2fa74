//! # 添付ファイルストレージ
//!
//! 決裁文書の添付ファイルをローカルファイルシステムに保存する。
//!
//! ## 設計方針
//!
//! - **保存領域**: 提出時は本保存領域、一時保存時は一時領域に書き込む
//! - **ファイル名**: `{保存時刻のミリ秒}_{元のファイル名}`。衝突した場合はミリ秒を進めて再試行する
//! - **パス**: DB には保存先の絶対パスではなく、設定されたディレクトリを含むパス文字列を記録する
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use signflow_infra::storage::{FileStorage, LocalFileStorage, StorageArea};
//!
//! async fn save(bytes: bytes::Bytes) -> Result<(), signflow_infra::InfraError> {
//!     let storage = LocalFileStorage::new("./data/upload", "./data/upload-temp");
//!     let stored = storage
//!         .store(StorageArea::Upload, "見積書.pdf", bytes, chrono::Utc::now())
//!         .await?;
//!     println!("{}", stored.path);
//!     Ok(())
//! }
//! ```

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};

use crate::InfraError;

/// 同名ファイルが存在する場合の再試行上限
const MAX_NAME_ATTEMPTS: i64 = 1000;

/// 保存領域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    /// 提出済み文書の添付
    Upload,
    /// 一時保存中の文書の添付
    Temporary,
}

/// 保存結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// 保存先パス（読み込み・削除に使う）
    pub path:      String,
    /// 保存時のファイル名（`{millis}_{元のファイル名}`）
    pub file_name: String,
}

/// 添付ファイルストレージのインターフェース
///
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// ファイルを保存する
    ///
    /// # 引数
    ///
    /// * `area` - 保存領域
    /// * `original_name` - アップロード時のファイル名（ディレクトリ部分は取り除く）
    /// * `content` - ファイル内容
    /// * `now` - ファイル名の接頭辞に使う時刻
    async fn store(
        &self,
        area: StorageArea,
        original_name: &str,
        content: Bytes,
        now: DateTime<Utc>,
    ) -> Result<StoredFile, InfraError>;

    /// 保存済みファイルを読み込む
    async fn load(&self, path: &str) -> Result<Bytes, InfraError>;

    /// 保存済みファイルを削除する
    ///
    /// 既に存在しない場合は成功として扱う。
    async fn delete(&self, path: &str) -> Result<(), InfraError>;

    /// 書き込み可能な状態か確認する（起動時と readiness チェックで使う）
    async fn ensure_ready(&self) -> Result<(), InfraError>;
}

/// ローカルファイルシステム実装
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    upload_dir: PathBuf,
    temp_dir:   PathBuf,
}

impl LocalFileStorage {
    pub fn new(upload_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            temp_dir:   temp_dir.into(),
        }
    }

    fn dir_for(&self, area: StorageArea) -> &Path {
        match area {
            StorageArea::Upload => &self.upload_dir,
            StorageArea::Temporary => &self.temp_dir,
        }
    }
}

/// アップロード時のファイル名からディレクトリ部分を取り除く
pub fn sanitize_file_name(original_name: &str) -> Result<&str, InfraError> {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(InfraError::invalid_input(format!(
            "ファイル名が不正です: {original_name:?}"
        )));
    }
    Ok(name)
}

/// 内容を書き込む
///
/// 書き込みに失敗した場合は書きかけのファイルを削除してからエラーを返す。
async fn write_or_remove<W>(path: &Path, mut writer: W, content: &[u8]) -> Result<(), InfraError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(content).await?;
        writer.flush().await
    }
    .await;

    let Err(e) = written else {
        return Ok(());
    };
    drop(writer);
    if let Err(cleanup) = fs::remove_file(path).await {
        tracing::warn!(
            error = %cleanup,
            path = %path.display(),
            "書きかけのファイルを削除できませんでした"
        );
    }
    Err(InfraError::storage(e))
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[tracing::instrument(skip_all, level = "debug", fields(?area, %original_name))]
    async fn store(
        &self,
        area: StorageArea,
        original_name: &str,
        content: Bytes,
        now: DateTime<Utc>,
    ) -> Result<StoredFile, InfraError> {
        let name = sanitize_file_name(original_name)?;
        let dir = self.dir_for(area);
        fs::create_dir_all(dir).await?;

        let base_millis = now.timestamp_millis();
        for offset in 0..MAX_NAME_ATTEMPTS {
            let file_name = format!("{}_{name}", base_millis + offset);
            let path = dir.join(&file_name);

            let file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(InfraError::storage(e)),
            };
            write_or_remove(&path, file, &content).await?;

            return Ok(StoredFile {
                path: path.to_string_lossy().into_owned(),
                file_name,
            });
        }

        Err(InfraError::unexpected(format!(
            "保存先のファイル名を確保できません: {name}"
        )))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%path))]
    async fn load(&self, path: &str) -> Result<Bytes, InfraError> {
        let content = fs::read(path).await?;
        Ok(Bytes::from(content))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%path))]
    async fn delete(&self, path: &str) -> Result<(), InfraError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InfraError::storage(e)),
        }
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn ensure_ready(&self) -> Result<(), InfraError> {
        for dir in [&self.upload_dir, &self.temp_dir] {
            fs::create_dir_all(dir).await?;
            let metadata = fs::metadata(dir).await?;
            if metadata.permissions().readonly() {
                return Err(InfraError::unexpected(format!(
                    "保存先ディレクトリに書き込めません: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}
