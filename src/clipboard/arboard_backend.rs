use std::borrow::Cow;
use std::path::PathBuf;

use arboard::{Clipboard, ImageData};

use crate::error::AppError;
use crate::history::{ClipContent, ClipKind, ImagePayload};
use crate::menu;

use super::{ClipboardSink, ClipboardSource};

/// 基于 `arboard` 的系统剪贴板实现
///
/// 每次操作都新建 `Clipboard` 句柄，不跨线程持有平台对象。
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open() -> Result<Clipboard, AppError> {
        Clipboard::new().map_err(|e| AppError::Clipboard(format!("打开剪贴板失败: {}", e)))
    }
}

/// 格式不存在属于正常情况，映射为 `None`。
fn optional<T>(result: Result<T, arboard::Error>, what: &str) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        Err(err) => Err(AppError::Clipboard(format!("读取{}失败: {}", what, err))),
    }
}

impl ClipboardSource for ArboardClipboard {
    fn read_files(&self) -> Result<Option<Vec<PathBuf>>, AppError> {
        let files = optional(Self::open()?.get().file_list(), "文件列表")?;
        Ok(files.filter(|files| !files.is_empty()))
    }

    fn read_html(&self) -> Result<Option<String>, AppError> {
        optional(Self::open()?.get().html(), "HTML")
    }

    fn read_text(&self) -> Result<Option<String>, AppError> {
        optional(Self::open()?.get_text(), "文本")
    }

    fn read_image(&self) -> Result<Option<ImagePayload>, AppError> {
        let image = optional(Self::open()?.get_image(), "图片")?;
        Ok(image.map(|data| {
            ImagePayload::new(data.width as u32, data.height as u32, data.bytes.into_owned())
        }))
    }

    /// 复用同一个句柄读取全部格式，避免每种格式各开一次剪贴板。
    fn read_all(&self) -> Result<super::ClipboardReading, AppError> {
        let mut clipboard = Self::open()?;
        let files = optional(clipboard.get().file_list(), "文件列表")?;
        let html = optional(clipboard.get().html(), "HTML")?;
        let text = optional(clipboard.get_text(), "文本")?;
        let image = optional(clipboard.get_image(), "图片")?;

        Ok(super::ClipboardReading {
            files: files.filter(|files| !files.is_empty()),
            html,
            text,
            image: image.map(|data| {
                ImagePayload::new(data.width as u32, data.height as u32, data.bytes.into_owned())
            }),
        })
    }
}

impl ClipboardSink for ArboardClipboard {
    fn write(&self, kind: ClipKind, content: &ClipContent) -> Result<(), AppError> {
        let mut clipboard = Self::open()?;
        let result = match (kind, content) {
            (ClipKind::Html, ClipContent::Text(html)) => {
                let alt = menu::html_to_plain(html);
                clipboard.set_html(html.as_str(), Some(alt.as_str()))
            }
            (ClipKind::RichText, ClipContent::Text(rtf)) => {
                log::debug!("RTF 无法直接写入，改为写入纯文本");
                clipboard.set_text(menu::rtf_to_plain(rtf))
            }
            (_, ClipContent::Text(text)) => clipboard.set_text(text.as_str()),
            (_, ClipContent::Files(files)) => clipboard.set().file_list(files.as_slice()),
            (_, ClipContent::Image(image)) => clipboard.set_image(ImageData {
                width: image.width as usize,
                height: image.height as usize,
                bytes: Cow::Borrowed(image.rgba.as_ref()),
            }),
        };
        result.map_err(|e| AppError::Clipboard(format!("写入剪贴板失败 ({}): {}", kind, e)))?;
        log::debug!("📋 已写回剪贴板 ({})", kind);
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        Self::open()?
            .clear()
            .map_err(|e| AppError::Clipboard(format!("清空剪贴板失败: {}", e)))
    }
}
