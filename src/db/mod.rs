use std::future::Future;
use std::path::Path;

use log::{debug, info, warn};
use sqlx::{SqlitePool, sqlite::*};
use tokio_util::sync::CancellationToken;

pub mod crud;
mod memory;
pub mod model;
mod sqlite;

pub use memory::MemoryStore;
pub use model::*;
pub use sqlite::SqliteStore;

use crate::digest::Digest;
use crate::error::Result;

pub type Database = SqlitePool;

/// 回滚时写回快照的最大尝试次数
const RESTORE_ATTEMPTS: usize = 3;

pub async fn init_db(filename: impl AsRef<Path>, wal: bool) -> Result<Database> {
    let filename = filename.as_ref();
    info!("初始化数据库连接: {}", filename.display());

    let journal_mode = if wal { SqliteJournalMode::Wal } else { SqliteJournalMode::Delete };
    let options = SqliteConnectOptions::new()
        .journal_mode(journal_mode)
        .synchronous(SqliteSynchronous::Normal)
        .filename(filename)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    info!("检查数据库迁移");
    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// 图片记录存储
///
/// 存储本身不保证摘要唯一，去重由 [`crate::EmbeddingCache`] 负责
pub trait RecordStore: Send + Sync {
    /// 插入新记录，返回分配的 ID
    fn insert(&self, image: &NewImage<'_>) -> impl Future<Output = Result<ImageId>> + Send;

    fn find_by_digest(
        &self,
        digest: &Digest,
    ) -> impl Future<Output = Result<Option<ImageRecord>>> + Send;

    fn find_by_id(&self, id: ImageId) -> impl Future<Output = Result<Option<ImageRecord>>> + Send;

    /// 按 ID 升序列出全部记录
    fn list_all(&self) -> impl Future<Output = Result<Vec<ImageRecord>>> + Send;

    fn list_ids(&self) -> impl Future<Output = Result<Vec<ImageId>>> + Send {
        async move { Ok(self.list_all().await?.into_iter().map(|record| record.id).collect()) }
    }

    /// 删除全部记录，返回删除数量
    fn remove_all(&self) -> impl Future<Output = Result<u64>> + Send;

    /// 按原 ID 写回记录，可重复执行
    fn restore(&self, records: &[ImageRecord]) -> impl Future<Output = Result<()>> + Send;

    /// 删除全部记录，在删除之后检查取消信号，已取消则恢复原有数据
    ///
    /// 默认实现为补偿事务：先快照，再删除，取消时写回快照。
    /// 支持原生事务的存储应当覆盖此方法
    fn erase_all(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<EraseOutcome>> + Send {
        async move {
            let snapshot = self.list_all().await?;
            let removed = self.remove_all().await?;
            debug!("已删除 {removed} 条记录");

            if !cancel.is_cancelled() {
                return Ok(EraseOutcome::Committed);
            }

            let mut attempt = 1;
            loop {
                match self.restore(&snapshot).await {
                    Ok(()) => return Ok(EraseOutcome::RolledBack),
                    Err(e) if attempt < RESTORE_ATTEMPTS => {
                        warn!("恢复快照失败（第 {attempt} 次）: {e}");
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}
