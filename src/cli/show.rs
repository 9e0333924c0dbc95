use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Serialize;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::db::ImageId;
use crate::CacheBuilder;

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// 图片 ID
    pub id: ImageId,
    /// 同时输出完整的特征向量
    #[arg(long)]
    pub embedding: bool,
}

#[derive(Serialize)]
struct RecordSummary {
    id: ImageId,
    name: String,
    digest: String,
    size: usize,
    dimension: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
}

impl SubCommandExtend for ShowCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let cache = CacheBuilder::new(opts.conf_dir.clone()).pin_digest(false).open().await?;
        let record = cache.fetch_by_id(self.id).await?.ok_or_else(|| anyhow!("图片不存在: {}", self.id))?;

        let vector = record.vector()?;
        let summary = RecordSummary {
            id: record.id,
            digest: record.digest()?.to_hex(),
            size: record.data.len(),
            dimension: vector.len(),
            embedding: self.embedding.then_some(vector),
            name: record.name,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}
