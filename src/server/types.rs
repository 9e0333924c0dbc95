use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::{EraseOutcome, ImageId, ImageRecord};
use crate::error::Result;

/// 提交图片的请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// 图片名称
    pub name: String,
    /// base64 编码的图片内容
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    /// 图片 ID，相同内容的图片返回相同 ID
    pub id: ImageId,
}

/// 上传图片请求参数
#[derive(TryFromMultipart)]
pub struct UploadRequest {
    pub file: Vec<FieldData<Bytes>>,
}

/// 上传表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct UploadForm {
    /// 上传的图片文件，可以是多张图片，文件名作为图片名称
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdsResponse {
    pub ids: Vec<ImageId>,
}

/// 图片记录
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageView {
    pub id: ImageId,
    pub name: String,
    /// 十六进制摘要
    pub digest: String,
    /// base64 编码的原始图片
    pub data: String,
    pub embedding: Vec<f32>,
}

impl TryFrom<ImageRecord> for ImageView {
    type Error = crate::Error;

    fn try_from(record: ImageRecord) -> Result<Self> {
        Ok(Self {
            digest: record.digest()?.to_hex(),
            embedding: record.vector()?,
            data: STANDARD.encode(&record.data),
            id: record.id,
            name: record.name,
        })
    }
}

/// 批量删除结果
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EraseResponse {
    /// `committed`、`rolled_back` 或 `failed`
    pub outcome: String,
    /// 旧版状态码：1 提交，0 回滚，-1 失败
    pub code: i32,
}

impl From<EraseOutcome> for EraseResponse {
    fn from(outcome: EraseOutcome) -> Self {
        Self { outcome: outcome.as_str().to_string(), code: outcome.code() }
    }
}

impl EraseResponse {
    pub fn failed() -> Self {
        Self { outcome: "failed".to_string(), code: -1 }
    }
}
