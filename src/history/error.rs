//! 历史记录错误类型。
//!
//! 所有错误都是局部、可恢复的：调用方把它当成一次空操作即可。

use super::{ClipKind, EntryId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// 条目已被淘汰、清空或删除
    #[error("历史条目不存在: {0}")]
    NotFound(EntryId),

    /// 内容与声明的类型不匹配，历史模型无法表示
    #[error("不支持的剪贴板内容: 类型 {kind} 不能承载 {found} 数据")]
    UnsupportedKind { kind: ClipKind, found: &'static str },

    /// 内容为空或格式残缺（空文本、空文件列表、像素数与尺寸不符的图片）
    #[error("无效的剪贴板内容 ({kind}): {reason}")]
    InvalidContent { kind: ClipKind, reason: &'static str },
}
