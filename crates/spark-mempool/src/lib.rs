#![cfg_attr(not(feature = "std"), no_std)]

//! `spark-mempool` 提供固定大小内存块的来源契约与默认实现。
//!
//! # 模块定位（Why）
//! - mbuf 链只关心“取一块 / 还一块”，不关心块从哪里来；
//!   [`BlockSource`] 把这一边界显式化，内核可以用自己的块分配器替换 [`MemPool`]。
//! - [`MemPool`] 是宿主环境与测试使用的参考实现：构造时一次性分配全部块，
//!   之后的 `get`/`put` 只在自由链表上移动所有权，不再触发堆分配。
//!
//! # 设计概要（How）
//! - `block` 模块定义 [`Block`] 与 [`SourceId`]，块携带来源标识与下标，
//!   归还时据此校验归属；
//! - `source` 模块定义 [`BlockSource`] trait；
//! - `pool` 模块实现 [`MemPool`]，自由链表由 `spin::Mutex` 保护，适用于 `no_std` 与中断上下文。

extern crate alloc;

mod block;
mod error;
mod pool;
mod source;

pub use block::{Block, SourceId};
pub use error::BlockError;
pub use pool::{MemPool, MemPoolStats};
pub use source::BlockSource;
