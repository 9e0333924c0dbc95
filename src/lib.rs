pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod db;
pub mod digest;
pub mod error;
pub mod gate;
mod metrics;
pub mod model;
pub mod normalize;
pub mod server;
pub mod utils;

pub use cache::{CacheBuilder, EmbeddingCache};
pub use config::Opts;
pub use error::{Error, ErrorKind, Result};

/// 命令行和 HTTP 服务使用的缓存类型
pub type Cache = EmbeddingCache<db::SqliteStore, model::Model>;
