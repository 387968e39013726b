use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use server::{app, models::config::DebugConfig, utils::config::CONFIG};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// ログ設定
fn init_logger(debug_config: &DebugConfig) {
    let default_filter = if debug_config.verbose_logging {
        "debug,tower_http=debug"
    } else {
        "info,tower_http=debug"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 環境変数をロード
    if let Err(e) = dotenv() {
        eprintln!("Warning: .envファイルの読み込みに失敗しました: {}", e);
    }

    let debug_config = DebugConfig::from_env();
    init_logger(&debug_config);
    if debug_config.enabled {
        tracing::warn!(?debug_config, "debug mode is enabled");
    }

    // CORSレイヤーの設定
    let origin = CONFIG.allowed_origin.parse::<HeaderValue>()?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE]);

    // ルーティングの設定
    let app = app::create_app()
        .layer(cors)
        .layer(
            TraceLayer::new_for_http() // HTTPトレースログを有効化
                .make_span_with(|request: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        method = %request.method(),
                        uri = %request.uri(),
                        headers = ?request.headers()
                    )
                }),
        );

    // サーバーの起動
    let addr = CONFIG.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("サーバーを起動しました: http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
