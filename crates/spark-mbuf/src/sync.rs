//! 同步原语垫片：生产构建使用 `spin` 与 `core` 原子，`loom-model` 特性下切换为 loom 实现，
//! 使消息队列与池统计可以在 loom 模型中被穷举调度。

#[cfg(not(feature = "loom-model"))]
pub(crate) use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "loom-model")]
pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering};

/// 有界临界区锁。
///
/// 临界区内只允许 O(1) 的链接操作，不得分配、阻塞或回调外部代码。
pub(crate) struct Mutex<T> {
    #[cfg(not(feature = "loom-model"))]
    inner: spin::Mutex<T>,
    #[cfg(feature = "loom-model")]
    inner: loom::sync::Mutex<T>,
}

#[cfg(not(feature = "loom-model"))]
pub(crate) type MutexGuard<'a, T> = spin::MutexGuard<'a, T>;

#[cfg(feature = "loom-model")]
pub(crate) type MutexGuard<'a, T> = loom::sync::MutexGuard<'a, T>;

impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            #[cfg(not(feature = "loom-model"))]
            inner: spin::Mutex::new(value),
            #[cfg(feature = "loom-model")]
            inner: loom::sync::Mutex::new(value),
        }
    }

    #[cfg(not(feature = "loom-model"))]
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    #[cfg(feature = "loom-model")]
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        // 临界区内不会 panic，中毒只可能来自测试线程本身，直接取回内部值。
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
