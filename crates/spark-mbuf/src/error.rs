//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为 mbuf 池、链操作与消息队列提供统一的错误域；
//! - 每个变体对应一个稳定错误码（[`codes`]），日志与告警按码聚合，而不是解析消息文本。
//!
//! ## 设计要求（What）
//! - 所有错误都是 `Copy`，在中断上下文返回时不触发分配；
//! - 部分成功的语义（例如 `append` 写入了一部分）由变体字段携带，调用方据此决定丢包或退避。

use thiserror::Error;

use spark_mempool::BlockError;

/// 稳定错误码，遵循 `<领域>.<语义>` 命名。
pub mod codes {
    /// 池内没有空闲块。
    pub const MBUF_EXHAUSTED: &str = "mbuf.exhausted";
    /// 参数或缓冲前置条件不满足。
    pub const MBUF_INVALID_ARGUMENT: &str = "mbuf.invalid_argument";
    /// 链中可读数据不足。
    pub const MBUF_SHORT_CHAIN: &str = "mbuf.short_chain";
    /// 链增长过程中无法取得新缓冲。
    pub const MBUF_NO_MEMORY: &str = "mbuf.no_memory";
    /// 偏移超出链长度。
    pub const MBUF_NOT_FOUND: &str = "mbuf.not_found";
    /// 消息队列已满。
    pub const MQUEUE_FULL: &str = "mqueue.full";
}

/// mbuf 子系统错误域。
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MbufError {
    /// 池内没有空闲块。
    #[error("mbuf pool exhausted")]
    Exhausted,

    /// 参数非法，或缓冲不满足操作的前置条件（如入队缓冲缺少报文头、归还到错误的池）。
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// 读取区间超出链中可用数据。
    #[error("mbuf chain too short: need {needed} bytes, {available} available")]
    ShortChain { needed: usize, available: usize },

    /// 链增长失败；`written` 为失败前已经写入链中的字节数。
    #[error("out of mbufs after writing {written} of {requested} bytes")]
    NoMemory { requested: usize, written: usize },

    /// 偏移超出链总长度。
    #[error("offset {offset} beyond chain length {len}")]
    NotFound { offset: usize, len: usize },

    /// 消息队列达到容量上限。
    #[error("mbuf queue full (depth {depth})")]
    QueueFull { depth: usize },
}

impl MbufError {
    /// 返回稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exhausted => codes::MBUF_EXHAUSTED,
            Self::InvalidArgument(_) => codes::MBUF_INVALID_ARGUMENT,
            Self::ShortChain { .. } => codes::MBUF_SHORT_CHAIN,
            Self::NoMemory { .. } => codes::MBUF_NO_MEMORY,
            Self::NotFound { .. } => codes::MBUF_NOT_FOUND,
            Self::QueueFull { .. } => codes::MQUEUE_FULL,
        }
    }
}

/// 块来源错误在池边界上的映射：耗尽保持为 `Exhausted`，其余都是归还契约被破坏。
impl From<BlockError> for MbufError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::Exhausted => Self::Exhausted,
            BlockError::ForeignBlock { .. } => {
                Self::InvalidArgument("block does not belong to this source")
            }
            BlockError::IndexOutOfRange { .. } => {
                Self::InvalidArgument("block index out of range")
            }
            BlockError::DoubleFree { .. } => Self::InvalidArgument("block already free"),
            BlockError::InvalidGeometry(reason) => Self::InvalidArgument(reason),
        }
    }
}

/// 框架统一的返回值别名。
pub type Result<T, E = MbufError> = core::result::Result<T, E>;
