use std::io::Cursor;

use image::ImageFormat;
use log::debug;
use serde::Deserialize;

use super::EmbeddingModel;
use crate::error::{Error, Result};
use crate::normalize::NormalizedImage;

#[derive(Deserialize)]
struct RemoteResponse {
    embedding: Vec<f32>,
}

/// 远程推理服务
///
/// 以 `image/png` 请求体 POST 归一化后的图片，期望返回 `{"embedding": [...]}`
pub struct RemoteModel {
    url: String,
    client: reqwest::Client,
}

impl RemoteModel {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new() }
    }
}

impl EmbeddingModel for RemoteModel {
    async fn compute(&self, image: NormalizedImage) -> Result<Vec<f32>> {
        let mut body = Vec::new();
        image.write_to(&mut Cursor::new(&mut body), ImageFormat::Png)?;

        debug!("请求远程模型: {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Computation(format!("model returned {status}: {text}")));
        }

        let result: RemoteResponse = response.json().await?;
        if result.embedding.is_empty() {
            return Err(Error::Computation("model returned an empty embedding".to_string()));
        }
        Ok(result.embedding)
    }
}
