use sqlx::FromRow;

use crate::codec;
use crate::digest::Digest;
use crate::error::Result;

pub type ImageId = i64;

/// 图片记录
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ImageRecord {
    /// 图片 ID，由存储分配，删除后不会复用
    pub id: ImageId,
    /// 提交时给出的名称，不参与去重
    pub name: String,
    /// 原始图片数据
    pub data: Vec<u8>,
    /// `data` 的摘要
    pub digest: Vec<u8>,
    /// 编码后的特征向量
    pub embedding: Vec<u8>,
}

impl ImageRecord {
    pub fn digest(&self) -> Result<Digest> {
        Digest::try_from(self.digest.as_slice())
    }

    /// 解码特征向量
    pub fn vector(&self) -> Result<Vec<f32>> {
        codec::decode(&self.embedding)
    }
}

/// 待插入的图片记录，ID 由存储分配
#[derive(Debug)]
pub struct NewImage<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub digest: Digest,
    pub embedding: Vec<u8>,
}

/// 批量删除的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseOutcome {
    /// 删除已提交
    Committed,
    /// 调用方取消，数据已恢复
    RolledBack,
}

impl EraseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }

    /// 兼容旧客户端的整数状态码
    pub fn code(&self) -> i32 {
        match self {
            Self::Committed => 1,
            Self::RolledBack => 0,
        }
    }
}
