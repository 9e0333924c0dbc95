use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info};
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;

use crate::codec;
use crate::config::{CacheOptions, ConfDir};
use crate::db::{EraseOutcome, ImageId, ImageRecord, NewImage, RecordStore, SqliteStore};
use crate::digest::{Digest, DigestAlgorithm};
use crate::error::{Error, Result};
use crate::gate::ExclusionGate;
use crate::metrics;
use crate::model::{EmbeddingModel, Model};
use crate::normalize::SquareNormalizer;

/// 以内容摘要去重的特征向量缓存
///
/// 所有存储读写都经过同一个 [`ExclusionGate`]，归一化和特征计算在门外进行
pub struct EmbeddingCache<S, M> {
    gate: ExclusionGate<S>,
    model: M,
    normalizer: SquareNormalizer,
    algorithm: DigestAlgorithm,
}

impl<S, M> EmbeddingCache<S, M>
where
    S: RecordStore,
    M: EmbeddingModel,
{
    pub fn new(store: S, model: M, normalizer: SquareNormalizer, algorithm: DigestAlgorithm) -> Self {
        Self { gate: ExclusionGate::new(store), model, normalizer, algorithm }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// 添加图片，返回其 ID
    ///
    /// 相同内容的图片只会计算一次特征向量、只保存一条记录
    ///
    /// # Arguments
    ///
    /// * `name` - 图片名称
    /// * `data` - 原始图片数据
    pub async fn insert_or_fetch(&self, name: &str, data: &[u8]) -> Result<ImageId> {
        self.insert_or_fetch_with(name, data, &CancellationToken::new()).await
    }

    /// 同 [`EmbeddingCache::insert_or_fetch`]，在计算特征向量前后检查取消信号
    ///
    /// 已取消时不再写入，返回 [`Error::Canceled`]；缓存命中不受取消影响
    pub async fn insert_or_fetch_with(
        &self,
        name: &str,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<ImageId> {
        let digest = self.algorithm.digest(data);
        if let Some(record) = self.fetch_by_digest(&digest).await? {
            debug!("缓存命中: {} -> {}", digest, record.id);
            metrics::inc_lookup(true);
            return Ok(record.id);
        }
        metrics::inc_lookup(false);

        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }
        let vector = self.compute_embedding(data).await?;
        if cancel.is_cancelled() {
            debug!("添加已取消: {name}");
            return Err(Error::Canceled);
        }
        self.insert_unique(name, data, digest, vector).await
    }

    /// 根据摘要查找图片
    pub async fn fetch_by_digest(&self, digest: &Digest) -> Result<Option<ImageRecord>> {
        let store = self.gate.acquire().await;
        store.find_by_digest(digest).await
    }

    /// 按 ID 升序返回所有图片 ID
    pub async fn fetch_all(&self) -> Result<Vec<ImageId>> {
        let store = self.gate.acquire().await;
        store.list_ids().await
    }

    /// 根据 ID 查找图片，不存在时返回 `None`
    pub async fn fetch_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>> {
        let store = self.gate.acquire().await;
        store.find_by_id(id).await
    }

    /// 删除所有图片
    ///
    /// 取消信号在删除之后检查，已取消则恢复所有记录并返回 [`EraseOutcome::RolledBack`]
    pub async fn erase_all(&self, cancel: &CancellationToken) -> Result<EraseOutcome> {
        let store = self.gate.acquire().await;
        let result = store.erase_all(cancel).await;
        store.release();

        match &result {
            Ok(outcome) => {
                info!("批量删除完成: {}", outcome.as_str());
                metrics::inc_erase_outcome(outcome.as_str());
            }
            Err(e) => {
                error!("批量删除失败: {e}");
                metrics::inc_erase_outcome("failed");
            }
        }
        result
    }

    /// 在独立任务中删除所有图片
    ///
    /// 返回的 future 被丢弃时触发取消，删除任务继续运行直到回滚完成
    pub async fn erase_all_detached(self: Arc<Self>) -> Result<EraseOutcome>
    where
        S: 'static,
        M: 'static,
    {
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();

        let task = tokio::spawn(async move { self.erase_all(&cancel).await });
        let result = task.await;
        guard.disarm();

        result.map_err(|e| Error::store(format!("erase task failed: {e}")))?
    }

    /// 归一化并计算特征向量，不持有门
    async fn compute_embedding(&self, data: &[u8]) -> Result<Vec<f32>> {
        let start = Instant::now();

        let normalizer = self.normalizer;
        let data = data.to_vec();
        let image = spawn_blocking(move || normalizer.normalize(&data))
            .await
            .map_err(|e| Error::Computation(format!("normalizer task failed: {e}")))??;

        let vector = self.model.compute(image).await?;
        if vector.is_empty() {
            return Err(Error::Computation("model returned an empty embedding".to_string()));
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!("特征向量计算耗时: {elapsed:.3}s");
        metrics::observe_embedding_duration(elapsed);
        Ok(vector)
    }

    /// 持有门的情况下再次检查摘要唯一性，然后插入
    async fn insert_unique(
        &self,
        name: &str,
        data: &[u8],
        digest: Digest,
        vector: Vec<f32>,
    ) -> Result<ImageId> {
        let store = self.gate.acquire().await;

        let rederived = self.algorithm.digest(data);
        if rederived != digest {
            return Err(Error::Decode("image content changed during embedding".to_string()));
        }
        if let Some(record) = store.find_by_digest(&rederived).await? {
            debug!("并发添加的相同图片: {} -> {}", rederived, record.id);
            return Ok(record.id);
        }

        let image = NewImage { name, data, digest: rederived, embedding: codec::encode(&vector) };
        let id = store.insert(&image).await?;
        debug!("添加图片: {name} ({rederived}) -> {id}");
        Ok(id)
    }
}

/// 根据配置目录打开基于 SQLite 的缓存
pub struct CacheBuilder {
    conf_dir: ConfDir,
    options: CacheOptions,
    wal: bool,
    pin_digest: bool,
}

impl CacheBuilder {
    pub fn new(conf_dir: ConfDir) -> Self {
        Self { conf_dir, options: CacheOptions::default(), wal: true, pin_digest: true }
    }

    pub fn options(mut self, options: CacheOptions) -> Self {
        self.options = options;
        self
    }

    /// 是否启用 WAL 模式
    pub fn wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    /// 是否把摘要算法写入尚未记录算法的数据库
    ///
    /// 只读命令应关闭，以免空数据库被固定为默认算法
    pub fn pin_digest(mut self, pin: bool) -> Self {
        self.pin_digest = pin;
        self
    }

    pub async fn open(self) -> Result<EmbeddingCache<SqliteStore, Model>> {
        tokio::fs::create_dir_all(self.conf_dir.path()).await?;
        let store = SqliteStore::open(self.conf_dir.database(), self.wal).await?;
        let algorithm = if self.pin_digest {
            store.bind_digest_algorithm(self.options.digest).await?
        } else {
            store.digest_algorithm().await?.or(self.options.digest).unwrap_or_default()
        };
        let model = Model::from_options(&self.options)?;
        let normalizer = SquareNormalizer::new(self.options.size);
        Ok(EmbeddingCache::new(store, model, normalizer, algorithm))
    }
}
