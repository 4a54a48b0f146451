//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 核心历史模型只有 `HistoryError` 一种错误（见 [`crate::history`]），
//! 其余外围能力（剪贴板读写、设置文件、数据目录、超时、控制台命令）统一归入 `AppError`，
//! 替代各处分散的 `.map_err(|e| e.to_string())` 与 `expect()`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `HistoryError` 与 `std::io::Error` 提供 `From` 转换，调用侧直接 `?`。

use crate::history::HistoryError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 剪贴板读写操作失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 历史记录操作失败（条目不存在等）
    #[error("{0}")]
    History(#[from] HistoryError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据目录不可用
    #[error("数据目录不可用: {0}")]
    Storage(String),

    /// 设置文件解析或写入失败
    #[error("设置错误: {0}")]
    Settings(String),

    /// 剪贴板读取超时（系统剪贴板偶发卡死）
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 控制台命令无法执行（编号不存在等）
    #[error("{0}")]
    Console(String),
}

impl AppError {
    /// 是否值得重试：超时与剪贴板瞬时失败可以重试，其余直接上抛。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Clipboard(_))
    }
}
