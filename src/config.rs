use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum, value_parser};
use directories::ProjectDirs;

use crate::cli::*;
use crate::digest::DigestAlgorithm;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let path = ProjectDirs::from("", "imembed", "imembed")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".imembed"));
    ConfDir { path }
});

#[derive(Parser, Debug, Clone)]
pub struct CacheOptions {
    /// 图片去重使用的摘要算法，数据库创建后不可更改，默认为 sha256
    #[arg(short = 'H', long, value_enum)]
    pub digest: Option<DigestAlgorithm>,
    /// 归一化后的图片边长
    #[arg(long, value_name = "N", default_value_t = 112, value_parser = value_parser!(u32).range(1..=4096))]
    pub size: u32,
    /// 特征向量计算模型
    #[arg(long, value_enum, default_value_t = ModelKind::Thumbnail)]
    pub model: ModelKind,
    /// 远程模型的推理地址
    #[arg(long, value_name = "URL")]
    pub model_url: Option<String>,
    /// 缩略图模型的边长，向量维数为其平方
    #[arg(long, value_name = "N", default_value_t = 16, value_parser = value_parser!(u32).range(1..=256))]
    pub thumbnail_side: u32,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            digest: None,
            size: 112,
            model: ModelKind::Thumbnail,
            model_url: None,
            thumbnail_side: 16,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// 本地灰度缩略图
    Thumbnail,
    /// 远程推理服务
    Remote,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imembed", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// imembed 配置文件目录
    #[arg(short, long, default_value_t = CONF_DIR.clone())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 添加图片到缓存
    Add(AddCommand),
    /// 列出所有图片 ID
    List(ListCommand),
    /// 查看一张图片的记录
    Show(ShowCommand),
    /// 删除所有图片，Ctrl-C 可中止并恢复
    Clear(ClearCommand),
    /// 启动 HTTP 服务
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("imembed.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}

impl std::fmt::Display for ConfDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
