pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::NarrativeService;

pub use handlers::*;

/// 共享状态：解析与汇总是纯函数，只有市场解读服务需要共享
#[derive(Clone)]
pub struct AppState {
    pub narrative: Arc<NarrativeService>,
    pub max_upload_bytes: usize,
}

/// 构建全部路由
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/analyze", post(analyze))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
