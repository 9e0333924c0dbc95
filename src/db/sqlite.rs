use std::path::Path;

use log::info;
use tokio_util::sync::CancellationToken;

use super::{Database, EraseOutcome, ImageId, ImageRecord, NewImage, RecordStore, crud, init_db};
use crate::digest::{Digest, DigestAlgorithm};
use crate::error::{Error, Result};

const META_DIGEST: &str = "digest";

/// 基于 SQLite 的记录存储，每次操作从连接池中借用连接
#[derive(Clone)]
pub struct SqliteStore {
    pool: Database,
}

impl SqliteStore {
    pub async fn open(filename: impl AsRef<Path>, wal: bool) -> Result<Self> {
        let pool = init_db(filename, wal).await?;
        Ok(Self { pool })
    }

    /// 确定该数据库使用的摘要算法
    ///
    /// 数据库已记录算法时，`requested` 必须与其一致；否则记录 `requested`，
    /// 未指定时使用默认算法
    pub async fn bind_digest_algorithm(
        &self,
        requested: Option<DigestAlgorithm>,
    ) -> Result<DigestAlgorithm> {
        match (self.digest_algorithm().await?, requested) {
            (Some(stored), Some(requested)) if stored != requested => Err(Error::Config(format!(
                "database uses digest {stored}, but {requested} was requested"
            ))),
            (Some(stored), _) => Ok(stored),
            (None, requested) => {
                let algorithm = requested.unwrap_or_default();
                info!("数据库摘要算法: {algorithm}");
                crud::set_meta(&self.pool, META_DIGEST, algorithm.name()).await?;
                Ok(algorithm)
            }
        }
    }

    pub fn pool(&self) -> &Database {
        &self.pool
    }

    /// 数据库记录的摘要算法
    pub async fn digest_algorithm(&self) -> Result<Option<DigestAlgorithm>> {
        crud::get_meta(&self.pool, META_DIGEST).await?.map(|name| name.parse()).transpose()
    }
}

impl RecordStore for SqliteStore {
    async fn insert(&self, image: &NewImage<'_>) -> Result<ImageId> {
        Ok(crud::add_image(&self.pool, image).await?)
    }

    async fn find_by_digest(&self, digest: &Digest) -> Result<Option<ImageRecord>> {
        Ok(crud::get_image_by_digest(&self.pool, digest.as_bytes()).await?)
    }

    async fn find_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>> {
        Ok(crud::get_image_by_id(&self.pool, id).await?)
    }

    async fn list_all(&self) -> Result<Vec<ImageRecord>> {
        Ok(crud::get_images(&self.pool).await?)
    }

    async fn list_ids(&self) -> Result<Vec<ImageId>> {
        Ok(crud::get_image_ids(&self.pool).await?)
    }

    async fn remove_all(&self) -> Result<u64> {
        Ok(crud::delete_images_all(&self.pool).await?)
    }

    async fn restore(&self, records: &[ImageRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            crud::put_image(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// 使用原生事务：删除后检查取消信号，已取消则回滚而不是提交
    async fn erase_all(&self, cancel: &CancellationToken) -> Result<EraseOutcome> {
        let mut tx = self.pool.begin().await?;
        let removed = crud::delete_images_all(&mut *tx).await?;

        if cancel.is_cancelled() {
            tx.rollback().await?;
            info!("批量删除已取消，回滚 {removed} 条记录");
            Ok(EraseOutcome::RolledBack)
        } else {
            tx.commit().await?;
            info!("批量删除已提交，共 {removed} 条记录");
            Ok(EraseOutcome::Committed)
        }
    }
}
