use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use indicatif::ProgressBar;
use log::{info, warn};
use regex::Regex;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::cli::SubCommandExtend;
use crate::config::{CacheOptions, Opts};
use crate::db::ImageId;
use crate::utils::pb_style;
use crate::{Cache, CacheBuilder, Error, ErrorKind};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub cache: CacheOptions,
    /// 图片文件或所在目录
    pub path: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,webp")]
    pub suffix: String,
    /// 同时处理的图片数量，默认为 CPU 核数
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

enum Added {
    New(ImageId),
    Exists(ImageId),
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let re_suf = format!("(?i)^({})$", self.suffix.replace(',', "|"));
        let re_suf = Regex::new(&re_suf)?;
        let cache = Arc::new(
            CacheBuilder::new(opts.conf_dir.clone()).options(self.cache.clone()).open().await?,
        );

        let files = scan(&self.path, &re_suf);
        info!("共 {} 张图片", files.len());

        let pb = ProgressBar::new(files.len() as u64).with_style(pb_style());
        let jobs = self.jobs.unwrap_or_else(num_cpus::get).max(1);

        let cancel = CancellationToken::new();
        let ctrl_c = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("收到中断信号，停止添加");
                    cancel.cancel();
                }
            }
        });

        futures::stream::iter(files)
            .map(|path| {
                let cache = cache.clone();
                let cancel = cancel.clone();
                async move {
                    let result = add_file(&cache, &path, &cancel).await;
                    (path, result)
                }
            })
            .buffer_unordered(jobs)
            .for_each(|(path, result)| {
                match result {
                    Ok(Added::New(id)) => {
                        pb.suspend(|| println!("{id}\t{}", path.display()));
                        pb.set_message(format!("添加图片: {}", path.display()));
                    }
                    Ok(Added::Exists(id)) => {
                        pb.suspend(|| println!("{id}\t{}", path.display()));
                        pb.set_message(format!("跳过已添加图片: {}", path.display()));
                    }
                    Err(e) if is_canceled(&e) => {}
                    Err(e) => {
                        pb.suspend(|| eprintln!("添加失败: {}: {e:#}", path.display()));
                    }
                }
                pb.inc(1);
                futures::future::ready(())
            })
            .await;

        ctrl_c.abort();

        if cancel.is_cancelled() {
            pb.abandon_with_message("添加已中断");
        } else {
            pb.finish_with_message("图片添加完成");
        }

        Ok(())
    }
}

/// 收集待添加的文件，`path` 为文件时直接返回
fn scan(path: &Path, re_suf: &Regex) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension().map(|ext| re_suf.is_match(&ext.to_string_lossy())).unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// 先按文件摘要查重，未添加过的图片才读入内存
async fn add_file(cache: &Cache, path: &Path, cancel: &CancellationToken) -> Result<Added> {
    if cancel.is_cancelled() {
        return Err(Error::Canceled.into());
    }
    let algorithm = cache.algorithm();
    let file = path.to_path_buf();
    let digest = spawn_blocking(move || algorithm.digest_file(file)).await??;
    if let Some(record) = cache.fetch_by_digest(&digest).await? {
        return Ok(Added::Exists(record.id));
    }

    let data = tokio::fs::read(path).await?;
    let id = cache.insert_or_fetch_with(&path.to_string_lossy(), &data, cancel).await?;
    Ok(Added::New(id))
}

fn is_canceled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Error>().is_some_and(|e| e.kind() == ErrorKind::Canceled)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_scan_filters_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.PNG"), b"").unwrap();
        fs::write(dir.path().join("b.jpg"), b"").unwrap();
        fs::write(dir.path().join("c.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/d.webp"), b"").unwrap();

        let re = Regex::new("(?i)^(jpg|png|webp)$").unwrap();
        let names: Vec<_> = scan(dir.path(), &re)
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg", "sub/d.webp"]);
    }

    #[test]
    fn test_is_canceled() {
        assert!(is_canceled(&Error::Canceled.into()));
        assert!(!is_canceled(&Error::Decode("bad".to_string()).into()));
        assert!(!is_canceled(&anyhow::anyhow!("other")));
    }

    #[test]
    fn test_scan_single_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let re = Regex::new("^png$").unwrap();
        assert_eq!(scan(file.path(), &re), vec![file.path().to_path_buf()]);
    }
}
