//! 特征向量与存储字节之间的转换
//!
//! 格式为逐个 f32 的小端 IEEE-754 表示，不压缩，保证逐位无损

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

const F32_SIZE: usize = size_of::<f32>();

pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut bytes = vec![0u8; vector.len() * F32_SIZE];
    LittleEndian::write_f32_into(vector, &mut bytes);
    bytes
}

pub fn decode(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % F32_SIZE != 0 {
        return Err(Error::Decode(format!(
            "embedding blob length {} is not a multiple of {F32_SIZE}",
            bytes.len()
        )));
    }
    let mut vector = vec![0f32; bytes.len() / F32_SIZE];
    LittleEndian::read_f32_into(bytes, &mut vector);
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_bit_exact() {
        let v = vec![0.0, -0.0, 1.5, -3.25e-12, f32::MAX, f32::MIN_POSITIVE, 1.0 / 3.0];
        let decoded = decode(&encode(&v)).unwrap();
        assert_eq!(decoded.len(), v.len());
        for (a, b) in v.iter().zip(&decoded) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_layout_is_little_endian() {
        assert_eq!(encode(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
    }

    #[test]
    fn test_empty() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_misaligned_length() {
        let err = decode(&[0, 0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
