//! 剪贴板模块
//!
//! # 设计思路
//!
//! 历史模型不直接接触系统剪贴板，本模块负责两端的适配：
//! - **读取**：`ClipboardSource` 按格式（文件列表 / HTML / 文本 / 图片）读取当前内容，
//!   `ChangeDetector` 与上一次读取比较，只把真正的变化交给历史记录。
//!   启动时已有的内容只作为比较基线，不收录。
//!   `arboard` 没有 RTF 读取接口，轮询不会产生 `RichText` 条目，这类条目只能经由 API 写入，写回时退化为纯文本。
//! - **写回**：`ClipboardSink` 把用户在菜单中选中的条目写回系统剪贴板。
//! - **忽略自身写入**：写回前调用 `DetectorHandle::ignore_own_write`，
//!   防止下一次轮询把应用自己写入的内容再收录一遍；写回失败时用 `cancel_own_write` 撤销。
//! - **轮询**：`ClipboardWatcher` 以固定间隔轮询，单次读取带超时与重试，
//!   系统剪贴板偶发卡死不会拖住整个监控任务。
//!
//! # 实现思路
//!
//! - 同一时刻至多一个阻塞读取在途，卡住的读取返回前新的尝试直接按超时处理。
//! - 两个 trait 隔离平台实现，`ArboardClipboard` 是唯一的真实实现；
//!   测试使用内存假剪贴板。
//! - `arboard` 为阻塞 API，监控器通过 `spawn_blocking` 调用，并以 `tokio::time::timeout` 兜底。
//! - 子模块按职责拆分：比较归 `detector`，过滤规则归 `filters`，轮询归 `watcher`。

mod arboard_backend;
mod detector;
mod filters;
mod watcher;

use std::path::PathBuf;

use crate::error::AppError;
use crate::history::{ClipContent, ClipKind, ImagePayload};

pub use arboard_backend::ArboardClipboard;
pub use detector::{ChangeDetector, ClipboardReading, DetectorHandle};
pub use filters::{is_likely_code, should_skip_image, MIN_IMAGE_SIDE};
pub use watcher::{ClipboardWatcher, WatcherConfig};

/// 系统剪贴板读取端
///
/// 每个方法在对应格式不存在时返回 `Ok(None)`，只有真正的读取失败才返回错误。
pub trait ClipboardSource: Send + Sync + 'static {
    fn read_files(&self) -> Result<Option<Vec<PathBuf>>, AppError>;
    fn read_html(&self) -> Result<Option<String>, AppError>;
    fn read_text(&self) -> Result<Option<String>, AppError>;
    fn read_image(&self) -> Result<Option<ImagePayload>, AppError>;

    /// 一次读取全部格式。
    fn read_all(&self) -> Result<ClipboardReading, AppError> {
        Ok(ClipboardReading {
            files: self.read_files()?,
            html: self.read_html()?,
            text: self.read_text()?,
            image: self.read_image()?,
        })
    }
}

/// 系统剪贴板写入端
pub trait ClipboardSink: Send + Sync + 'static {
    fn write(&self, kind: ClipKind, content: &ClipContent) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}
