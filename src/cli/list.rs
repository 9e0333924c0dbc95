use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::CacheBuilder;

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for ListCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let cache = CacheBuilder::new(opts.conf_dir.clone()).pin_digest(false).open().await?;
        let ids = cache.fetch_all().await?;

        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&ids)?),
            OutputFormat::Table => {
                for id in ids {
                    println!("{id}");
                }
            }
        }
        Ok(())
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
