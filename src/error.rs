use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 缓存层对外暴露的错误
///
/// 查询不到记录不属于错误，统一以 `Option::None` 表示
#[derive(Error, Debug)]
pub enum Error {
    /// 输入数据格式错误：向量长度不对齐、图片无法解码、base64 非法等
    #[error("decode error: {0}")]
    Decode(String),

    /// 归一化或特征模型计算失败
    #[error("computation error: {0}")]
    Computation(String),

    /// 持久化层错误
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 读取摘要来源失败
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 调用方取消了操作
    #[error("operation canceled")]
    Canceled,

    /// 配置不兼容，例如数据库与当前摘要算法不一致
    #[error("config error: {0}")]
    Config(String),
}

/// 扁平化的错误类别，供调用方做分支判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    Computation,
    Store,
    Io,
    Canceled,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Computation(_) => ErrorKind::Computation,
            Self::Store(_) => ErrorKind::Store,
            Self::Io(_) => ErrorKind::Io,
            Self::Canceled => ErrorKind::Canceled,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into().into())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(Box::new(err))
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Store(Box::new(err))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                Self::Decode(err.to_string())
            }
            image::ImageError::IoError(err) => Self::Io(err),
            _ => Self::Computation(err.to_string()),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Computation(err.to_string())
    }
}
