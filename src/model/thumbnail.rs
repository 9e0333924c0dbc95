use image::imageops::{self, FilterType};

use super::EmbeddingModel;
use crate::error::{Error, Result};
use crate::normalize::NormalizedImage;

/// 低于该范数的向量视为纯色图片，不做归一化
const MIN_NORM: f32 = 1e-4;

/// 本地缩略图模型
///
/// 将图片转为灰度并缩放到 `side x side`，去均值后做 L2 归一化，
/// 输出 `side * side` 维向量
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailModel {
    side: u32,
}

impl ThumbnailModel {
    pub fn new(side: u32) -> Self {
        Self { side }
    }

    pub fn dimension(&self) -> usize {
        self.side as usize * self.side as usize
    }

    fn embed(&self, image: &NormalizedImage) -> Result<Vec<f32>> {
        if self.side == 0 {
            return Err(Error::Config("thumbnail side must be positive".to_string()));
        }
        let gray = imageops::grayscale(image);
        let small = imageops::resize(&gray, self.side, self.side, FilterType::Triangle);

        let mut vector: Vec<f32> = small.pixels().map(|p| p.0[0] as f32 / 255.).collect();
        let mean = vector.iter().sum::<f32>() / vector.len() as f32;
        vector.iter_mut().for_each(|x| *x -= mean);

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > MIN_NORM {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

impl EmbeddingModel for ThumbnailModel {
    async fn compute(&self, image: NormalizedImage) -> Result<Vec<f32>> {
        self.embed(&image)
    }
}
