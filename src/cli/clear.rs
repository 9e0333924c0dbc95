use anyhow::{Result, bail};
use clap::Parser;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::cli::SubCommandExtend;
use crate::db::EraseOutcome;
use crate::{CacheBuilder, Opts};

#[derive(Parser, Debug, Clone)]
pub struct ClearCommand {
    /// 跳过确认
    #[arg(short, long)]
    pub yes: bool,
}

impl SubCommandExtend for ClearCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        if !self.yes {
            let answer = crate::utils::read_line("确认删除所有图片？[y/N] ")?;
            if !answer.eq_ignore_ascii_case("y") {
                bail!("已放弃");
            }
        }

        let cache = CacheBuilder::new(opts.conf_dir.clone()).pin_digest(false).open().await?;

        let cancel = CancellationToken::new();
        let ctrl_c = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("收到中断信号，正在回滚");
                    cancel.cancel();
                }
            }
        });

        info!("删除所有图片……");
        let outcome = cache.erase_all(&cancel).await?;
        ctrl_c.abort();

        match outcome {
            EraseOutcome::Committed => info!("删除完成"),
            EraseOutcome::RolledBack => warn!("删除已回滚"),
        }
        println!("{}", outcome.as_str());
        Ok(())
    }
}
