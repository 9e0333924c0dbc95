mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;

pub use self::state::*;
pub use self::types::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::submit_handler,
        api::upload_handler,
        api::list_handler,
        api::get_handler,
        api::erase_handler,
    ),
    components(schemas(
        types::SubmitRequest,
        types::SubmitResponse,
        types::UploadForm,
        types::IdsResponse,
        types::ImageView,
        types::EraseResponse,
    ))
)]
pub struct ApiDoc;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/images",
            post(api::submit_handler).get(api::list_handler).delete(api::erase_handler),
        )
        .route("/images/upload", post(api::upload_handler))
        .route("/images/{id}", get(api::get_handler))
        .route("/metrics", get(api::metrics_handler))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(DefaultBodyLimit::disable())
        // 上传限制：10M
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 10))
        .with_state(state)
}
