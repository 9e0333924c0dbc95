use std::future::Future;

mod remote;
mod thumbnail;

pub use remote::RemoteModel;
pub use thumbnail::ThumbnailModel;

use crate::config::{CacheOptions, ModelKind};
use crate::error::{Error, Result};
use crate::normalize::NormalizedImage;

/// 特征向量计算模型
pub trait EmbeddingModel: Send + Sync {
    /// 计算归一化图片的特征向量
    fn compute(&self, image: NormalizedImage) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// 命令行可选的模型
pub enum Model {
    Thumbnail(ThumbnailModel),
    Remote(RemoteModel),
}

impl Model {
    pub fn from_options(opts: &CacheOptions) -> Result<Self> {
        match opts.model {
            ModelKind::Thumbnail => Ok(Self::Thumbnail(ThumbnailModel::new(opts.thumbnail_side))),
            ModelKind::Remote => {
                let url = opts
                    .model_url
                    .clone()
                    .ok_or_else(|| Error::Config("--model-url is required for remote model".to_string()))?;
                Ok(Self::Remote(RemoteModel::new(url)))
            }
        }
    }
}

impl EmbeddingModel for Model {
    async fn compute(&self, image: NormalizedImage) -> Result<Vec<f32>> {
        match self {
            Self::Thumbnail(model) => model.compute(image).await,
            Self::Remote(model) => model.compute(image).await,
        }
    }
}
