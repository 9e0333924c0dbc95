use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{Error, Result};

/// 归一化后的定长图片
pub type NormalizedImage = RgbImage;

/// 将图片裁剪为正方形并缩放到固定边长
///
/// 裁剪区域水平居中、贴齐上边缘，竖图保留上半部分
#[derive(Debug, Clone, Copy)]
pub struct SquareNormalizer {
    size: u32,
}

impl SquareNormalizer {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn normalize(&self, raw: &[u8]) -> Result<NormalizedImage> {
        if self.size == 0 {
            return Err(Error::Config("normalized size must be positive".to_string()));
        }
        let image = image::load_from_memory(raw)?.to_rgb8();
        let (width, height) = image.dimensions();
        let side = width.min(height);
        if side == 0 {
            return Err(Error::Decode("image has no pixels".to_string()));
        }

        let square = imageops::crop_imm(&image, (width - side) / 2, 0, side, side).to_image();
        Ok(imageops::resize(&square, self.size, self.size, FilterType::Triangle))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb};

    use super::*;

    fn png(width: u32, height: u32, f: impl Fn(u32, u32) -> Rgb<u8>) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, f);
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_output_size() {
        let normalizer = SquareNormalizer::new(112);
        for (w, h) in [(300, 200), (50, 400), (112, 112), (7, 3)] {
            let out = normalizer.normalize(&png(w, h, |_, _| Rgb([1, 2, 3]))).unwrap();
            assert_eq!(out.dimensions(), (112, 112));
        }
    }

    #[test]
    fn test_landscape_crop_is_centred() {
        // 左右各一列红色，中间白色
        let data = png(6, 4, |x, _| if x == 0 || x == 5 { Rgb([255, 0, 0]) } else { Rgb([255; 3]) });
        let out = SquareNormalizer::new(4).normalize(&data).unwrap();
        assert!(out.pixels().all(|p| *p == Rgb([255; 3])));
    }

    #[test]
    fn test_portrait_crop_keeps_top() {
        let data = png(4, 8, |_, y| if y < 4 { Rgb([0, 0, 255]) } else { Rgb([0, 255, 0]) });
        let out = SquareNormalizer::new(4).normalize(&data).unwrap();
        assert!(out.pixels().all(|p| *p == Rgb([0, 0, 255])));
    }

    #[test]
    fn test_invalid_image() {
        let err = SquareNormalizer::new(112).normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
