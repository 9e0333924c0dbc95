use std::sync::Arc;

use crate::Cache;

/// 应用状态
pub struct AppState {
    /// 特征向量缓存，整个进程只有这一个实例
    pub cache: Arc<Cache>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(cache: Cache) -> Arc<Self> {
        Arc::new(AppState { cache: Arc::new(cache) })
    }
}
