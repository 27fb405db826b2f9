#![cfg_attr(not(feature = "std"), no_std)]

//! `spark-mbuf` 提供分段报文缓冲链（mbuf）：从固定块池取得的定长缓冲串成链，
//! 网络协议栈在链上做追加、前置、裁剪、拼接、定位、复制与比较，无需把报文搬到连续内存。
//!
//! # 模块定位（Why）
//! - 报文长度不可预知、内核不做按需堆分配，链式分段让任意长度的报文只占用池中的定长块；
//! - 协议头在发送路径上逐层前置、在接收路径上逐层剥离，`prepend`/`adjust` 只移动数据窗口。
//!
//! # 设计概要（How）
//! - [`MbufPool`]：包装一个 [`spark_mempool::BlockSource`]，负责几何约束与发放回收；
//! - [`Mbuf`]：链节点，后继以 `Box` 独占持有，报文头是显式的 `Option` 字段；
//! - `chain` 模块：链操作，全部以链头为入口；
//! - [`MbufQueue`]：有头链的有界 FIFO，入队后向 [`EventSink`] 投递通知；
//! - `sync` 模块：`spin` 与 loom 之间的同步原语垫片，`loom-model` 特性下启用模型检查。
//!
//! # 使用示例
//! ```
//! use spark_mbuf::{MbufPool, PoolConfig};
//!
//! let pool = MbufPool::with_mempool(&PoolConfig::with_data_capacity(64, 8))?;
//! let mut packet = pool.acquire_with_header(0)?;
//! packet.append(b"payload")?;
//! let mut packet = packet.prepend(4)?;
//! packet.copy_in(0, b"HDR:")?;
//! assert_eq!(packet.to_vec(), b"HDR:payload");
//! packet.free_chain()?;
//! # Ok::<(), spark_mbuf::MbufError>(())
//! ```

extern crate alloc;

mod chain;
pub mod config;
pub mod error;
mod event;
mod mbuf;
mod pool;
mod queue;
mod sync;

pub use config::{PoolConfig, QueueConfig};
pub use error::{MbufError, Result, codes};
pub use event::{EventKind, EventSink, QueueEvent};
pub use mbuf::{Iter, Mbuf, PacketHeader};
pub use pool::{MbufPool, PoolStats};
pub use queue::{EnqueueError, MbufQueue};
