//! # データベース接続とトランザクション
//!
//! 決裁文書・本文・様式の書き込みは、ユースケース単位で 1 つの [`TxContext`] にまとめる。
//! 文書と本文を続けて更新する操作（コメント、添付削除、文書削除）で
//! 片方だけが残らないようにするため、書き込み系リポジトリは `&mut TxContext` を必須引数に取る。
//!
//! ```rust,ignore
//! let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
//! db::run_migrations(&pool).await?;
//!
//! let tx_manager = PgTransactionManager::new(pool.clone());
//! let mut tx = tx_manager.begin().await?;
//! detail_repo.delete(&mut tx, &approval_no).await?;
//! document_repo.delete(&mut tx, &approval_no).await?;
//! tx.commit().await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction, postgres::PgPoolOptions};

use crate::error::InfraError;

/// 接続取得の待ち時間の上限
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// `migrations/` の決裁テーブル定義を適用する
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// 接続プールを作成する
///
/// 起動時に一度だけ呼び、リポジトリと readiness チェックで共有する。
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// `SELECT 1` で疎通を確認する
#[tracing::instrument(skip_all, level = "debug")]
pub async fn ping(pool: &PgPool) -> Result<(), InfraError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// 書き込み用トランザクション
///
/// `commit()` せずにドロップするとロールバックされる。
/// 版数の競合で更新が失敗した場合も、それまでの書き込みはこのドロップで取り消される。
pub struct TxContext(TxContextInner);

enum TxContextInner {
    Pg(Transaction<'static, Postgres>),
    #[cfg(any(test, feature = "test-utils"))]
    Mock,
}

impl TxContext {
    pub(crate) async fn begin_pg(pool: &PgPool) -> Result<Self, InfraError> {
        Ok(Self(TxContextInner::Pg(pool.begin().await?)))
    }

    /// インメモリリポジトリ用（接続を持たない）
    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock() -> Self {
        Self(TxContextInner::Mock)
    }

    pub async fn commit(self) -> Result<(), InfraError> {
        match self.0 {
            TxContextInner::Pg(tx) => {
                tx.commit().await?;
                Ok(())
            }
            #[cfg(any(test, feature = "test-utils"))]
            TxContextInner::Mock => Ok(()),
        }
    }

    /// Postgres リポジトリがクエリの実行先に使う
    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        match &mut self.0 {
            TxContextInner::Pg(tx) => tx,
            #[cfg(any(test, feature = "test-utils"))]
            TxContextInner::Mock => {
                panic!("BUG: インメモリリポジトリのトランザクションから接続を取り出した")
            }
        }
    }
}

/// ユースケースがトランザクションを開始するための入口
///
/// ユースケースは `PgPool` を持たず、この trait だけに依存する。
#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<TxContext, InfraError>;
}

pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        TxContext::begin_pg(&self.pool).await
    }
}
