use std::ops::Deref;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};

use crate::metrics;

/// 单许可互斥门，持有被保护的存储
///
/// 存储只能通过 [`GatePermit`] 访问，许可按等待顺序（FIFO）发放
pub struct ExclusionGate<T> {
    inner: Mutex<T>,
}

/// 门的许可，drop 时自动归还
pub struct GatePermit<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> ExclusionGate<T> {
    pub fn new(inner: T) -> Self {
        Self { inner: Mutex::new(inner) }
    }

    /// 等待并获取许可
    pub async fn acquire(&self) -> GatePermit<'_, T> {
        let start = Instant::now();
        let guard = self.inner.lock().await;
        metrics::observe_gate_wait(start.elapsed().as_secs_f64());
        GatePermit { guard }
    }

    /// 许可空闲时立即获取，否则返回 `None`
    pub fn try_acquire(&self) -> Option<GatePermit<'_, T>> {
        self.inner.try_lock().ok().map(|guard| GatePermit { guard })
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T> GatePermit<'_, T> {
    /// 归还许可，唤醒至多一个等待者
    pub fn release(self) {}
}

impl<T> Deref for GatePermit<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}
