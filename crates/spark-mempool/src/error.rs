use thiserror::Error;

use crate::SourceId;

/// 块来源错误域。
///
/// - `Exhausted`：自由链表为空，属于可预期的资源耗尽，调用方应降级处理；
/// - 其余变体都表示调用方违反了归还契约（外来块、越界下标、重复归还）或构造参数非法。
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// 没有空闲块。
    #[error("block source exhausted")]
    Exhausted,

    /// 归还的块不属于当前来源。
    #[error("block from {found} returned to {expected}")]
    ForeignBlock { expected: SourceId, found: SourceId },

    /// 块下标超出来源的块数量。
    #[error("block index {index} out of range (count {count})")]
    IndexOutOfRange { index: u32, count: usize },

    /// 块已经处于空闲状态。
    #[error("block {index} released twice")]
    DoubleFree { index: u32 },

    /// 块大小或块数量不合法。
    #[error("invalid pool geometry: {0}")]
    InvalidGeometry(&'static str),
}
