//! # Core Service サーバー
//!
//! 決裁文書の起案・決裁・コメント・閲覧を扱う内部サービス。
//!
//! ## アクセス制御
//!
//! 内部ネットワークからのみアクセス可能とする。
//! 認証は前段のゲートウェイが行い、操作者のメンバー ID を `actor_id` として渡す。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `UPLOAD_DIR` | No | 提出済み文書の添付保存先（デフォルト: `./data/upload`） |
//! | `UPLOAD_TEMP_DIR` | No | 一時保存文書の添付保存先（デフォルト: `./data/upload-temp`） |
//! | `LIST_PAGE_SIZE` | No | 一覧の 1 ページあたりの件数（デフォルト: 15） |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! CORE_PORT=13001 DATABASE_URL=postgres://... cargo run -p signflow-core-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use signflow_core_service::{
    app_builder::{AppStates, build_app},
    config::CoreConfig,
    handler::{ApprovalApiState, DashboardState, FormState, ReadinessState},
    usecase::{ApprovalDeps, ApprovalUseCaseImpl, DashboardUseCaseImpl, FormUseCaseImpl},
};
use signflow_domain::clock::{Clock, SystemClock};
use signflow_infra::{
    db::{self, PgTransactionManager, TransactionManager},
    repository::{
        ApprovalDetailRepository,
        ApprovalDocumentRepository,
        ApprovalFormRepository,
        MemberRepository,
        PostgresApprovalDetailRepository,
        PostgresApprovalDocumentRepository,
        PostgresApprovalFormRepository,
        PostgresMemberRepository,
    },
    storage::{FileStorage, LocalFileStorage},
};
use signflow_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("core-service"));
    let _tracing_guard = tracing::info_span!("app", service = "core-service").entered();

    // 設定読み込み
    let config = CoreConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    db::run_migrations(&pool)
        .await
        .context("マイグレーションの実行に失敗しました")?;
    tracing::info!("マイグレーションを適用しました");

    // 添付ファイルの保存先を準備
    let storage: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(
        config.upload_dir.clone(),
        config.upload_temp_dir.clone(),
    ));
    storage
        .ensure_ready()
        .await
        .context("添付ファイル保存先の準備に失敗しました")?;

    // 依存コンポーネントを初期化
    let document_repo: Arc<dyn ApprovalDocumentRepository> =
        Arc::new(PostgresApprovalDocumentRepository::new(pool.clone()));
    let detail_repo: Arc<dyn ApprovalDetailRepository> =
        Arc::new(PostgresApprovalDetailRepository::new(pool.clone()));
    let form_repo: Arc<dyn ApprovalFormRepository> =
        Arc::new(PostgresApprovalFormRepository::new(pool.clone()));
    let member_repo: Arc<dyn MemberRepository> =
        Arc::new(PostgresMemberRepository::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tx_manager: Arc<dyn TransactionManager> =
        Arc::new(PgTransactionManager::new(pool.clone()));

    let approval_usecase = ApprovalUseCaseImpl::new(
        ApprovalDeps {
            document_repo: document_repo.clone(),
            detail_repo: detail_repo.clone(),
            form_repo: form_repo.clone(),
            member_repo: member_repo.clone(),
            storage: storage.clone(),
            clock: clock.clone(),
            tx_manager: tx_manager.clone(),
        },
        config.list_page_size,
    );
    let form_usecase = FormUseCaseImpl::new(form_repo, member_repo.clone(), clock, tx_manager);
    let dashboard_usecase = DashboardUseCaseImpl::new(document_repo, detail_repo, member_repo);

    let app = build_app(AppStates {
        approval:  Arc::new(ApprovalApiState {
            usecase: approval_usecase,
        }),
        form:      Arc::new(FormState {
            usecase: form_usecase,
        }),
        dashboard: Arc::new(DashboardState {
            usecase: dashboard_usecase,
        }),
        readiness: Some(Arc::new(ReadinessState { pool, storage })),
    });

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Core Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
