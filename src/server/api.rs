use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_typed_multipart::TypedMultipart;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{error, info};

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::db::ImageId;
use crate::error::Error;
use crate::metrics;

/// 提交一张 base64 编码的图片
#[utoipa::path(
    post,
    path = "/images",
    request_body = SubmitRequest,
    responses(
        (status = 200, body = SubmitResponse),
    )
)]
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>> {
    let content = STANDARD.decode(data.content.trim()).map_err(Error::from)?;
    let id = state.cache.insert_or_fetch(&data.name, &content).await?;
    Ok(Json(SubmitResponse { id }))
}

/// 以表单上传图片
#[utoipa::path(
    post,
    path = "/images/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = IdsResponse),
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<UploadRequest>,
) -> Result<Json<IdsResponse>> {
    let mut ids = Vec::with_capacity(data.file.len());
    for file in &data.file {
        let file_name = match &file.metadata.file_name {
            Some(file_name) => file_name,
            None => {
                return Err(Error::Decode("文件名不能为空".to_string()).into());
            }
        };
        ids.push(state.cache.insert_or_fetch(file_name, &file.contents).await?);
    }
    Ok(Json(IdsResponse { ids }))
}

/// 列出所有图片 ID
#[utoipa::path(
    get,
    path = "/images",
    responses(
        (status = 200, body = IdsResponse),
    )
)]
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Result<Json<IdsResponse>> {
    let ids = state.cache.fetch_all().await?;
    Ok(Json(IdsResponse { ids }))
}

/// 根据 ID 获取图片
#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = i64, Path, description = "图片 ID")),
    responses(
        (status = 200, body = ImageView),
        (status = 404),
    )
)]
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ImageId>,
) -> Result<Response> {
    match state.cache.fetch_by_id(id).await? {
        Some(record) => Ok(Json(ImageView::try_from(record)?).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// 删除所有图片
///
/// 删除在独立任务中执行，请求中断时会回滚
#[utoipa::path(
    delete,
    path = "/images",
    responses(
        (status = 200, body = EraseResponse),
        (status = 500, body = EraseResponse),
    )
)]
pub async fn erase_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.cache.clone().erase_all_detached().await {
        Ok(outcome) => {
            info!("批量删除: {}", outcome.as_str());
            Json(EraseResponse::from(outcome)).into_response()
        }
        Err(e) => {
            error!("批量删除失败: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(EraseResponse::failed())).into_response()
        }
    }
}

/// 导出 prometheus 指标
pub async fn metrics_handler() -> String {
    metrics::gather_text()
}
