use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

pub const DIGEST_LEN: usize = 32;

/// 图片内容摘要，作为去重键
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// 大写十六进制表示
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let bytes = value
            .try_into()
            .map_err(|_| Error::Decode(format!("digest must be {DIGEST_LEN} bytes, got {}", value.len())))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// 去重使用的摘要算法
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3，速度更快
    Blake3,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// 计算内存中字节序列的摘要
    pub fn digest(&self, data: &[u8]) -> Digest {
        match self {
            Self::Sha256 => Digest(Sha256::digest(data).into()),
            Self::Blake3 => Digest(*blake3::hash(data).as_bytes()),
        }
    }

    /// 流式读取并计算摘要，结果与 [`DigestAlgorithm::digest`] 一致
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        match self {
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                io::copy(&mut reader, &mut hasher)?;
                Ok(Digest(hasher.finalize().into()))
            }
            Self::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                io::copy(&mut reader, &mut hasher)?;
                Ok(Digest(*hasher.finalize().as_bytes()))
            }
        }
    }

    /// 计算文件内容的摘要
    pub fn digest_file(&self, path: impl AsRef<Path>) -> Result<Digest> {
        let file = File::open(path)?;
        Ok(self.digest_reader(BufReader::new(file))?)
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(Error::Config(format!("unknown digest algorithm: {s}"))),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
