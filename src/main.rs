use realty_dashboard_rust::{api, AppConfig, NarrativeService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env.local 优先于 .env
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    // 加载配置
    let config = AppConfig::from_env()?;

    // 初始化日志 - 使用本地时间格式，RUST_LOG 优先于配置
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    info!("Starting server with config: {:?}", config);
    if !config.narrative.has_api_key() {
        info!("未配置解读接口密钥，/api/analyze 将返回本地占位分析");
    }

    let state = api::AppState {
        narrative: Arc::new(NarrativeService::new(config.narrative.clone())?),
        max_upload_bytes: config.upload.max_bytes,
    };
    let app = api::router(state);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/upload   - 上传 Excel，返回标准化记录与汇总指标");
    info!("  POST /api/analyze  - 基于汇总指标生成市场解读");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
