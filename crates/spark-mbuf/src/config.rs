//! mbuf 池与消息队列的配置。
//!
//! 配置结构可以直接构造，也可以经 `serde` 从宿主的配置文件（TOML/JSON）反序列化；
//! 两条路径最终都要经过 `validate`，保证几何参数在进入池之前已经自洽。

use serde::{Deserialize, Serialize};

use crate::{MbufError, Result};

/// 每个缓冲节点的固定元数据开销（字节），从块大小中扣除后得到数据区容量。
pub const MBUF_OVERHEAD: usize = 16;

/// 报文头附带的用户自定义头部区最大长度。
pub const MAX_USER_HEADER_LEN: usize = u8::MAX as usize;

/// mbuf 池配置。
///
/// # 契约说明（What）
/// - `block_size`：底层块大小，必须大于 [`MBUF_OVERHEAD`]；
/// - `block_count`：池可发放的缓冲数量，必须大于 0；
/// - 数据区容量 = `block_size - MBUF_OVERHEAD`，见 [`data_capacity`](Self::data_capacity)。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    pub block_size: usize,
    pub block_count: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: 128,
            block_count: 32,
        }
    }
}

impl PoolConfig {
    pub fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
        }
    }

    /// 以数据区容量描述配置，块大小自动加上节点开销。
    pub fn with_data_capacity(data_capacity: usize, block_count: usize) -> Self {
        Self::new(data_capacity + MBUF_OVERHEAD, block_count)
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_block_count(mut self, block_count: usize) -> Self {
        self.block_count = block_count;
        self
    }

    /// 每个缓冲可用的数据区字节数；块大小不足时为 0。
    pub fn data_capacity(&self) -> usize {
        self.block_size.saturating_sub(MBUF_OVERHEAD)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size <= MBUF_OVERHEAD {
            return Err(MbufError::InvalidArgument(
                "block size must exceed the mbuf overhead",
            ));
        }
        if self.block_count == 0 {
            return Err(MbufError::InvalidArgument("block count must be non-zero"));
        }
        Ok(())
    }
}

/// 消息队列配置。
///
/// - `depth`：队列可同时容纳的报文数，存储在构造时一次性预留；
/// - `notify_arg`：入队通知事件携带的上下文值，由消费者自行解释。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    pub depth: usize,
    #[serde(default)]
    pub notify_arg: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            depth: 16,
            notify_arg: 0,
        }
    }
}

impl QueueConfig {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            notify_arg: 0,
        }
    }

    pub fn with_notify_arg(mut self, notify_arg: usize) -> Self {
        self.notify_arg = notify_arg;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(MbufError::InvalidArgument("queue depth must be non-zero"));
        }
        Ok(())
    }
}
