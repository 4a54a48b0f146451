use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::HistoryError;

/// 历史条目 ID，进程内单调递增，永不复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 剪贴板内容类型
///
/// 参与去重比较（同样的文本以 `PlainText` 和 `Html` 两种类型进入时视为不同条目），
/// 也决定菜单标题的生成方式与写回剪贴板的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipKind {
    PlainText,
    RichText,
    Html,
    FileList,
    Image,
}

impl ClipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain-text",
            Self::RichText => "rich-text",
            Self::Html => "html",
            Self::FileList => "file-list",
            Self::Image => "image",
        }
    }

    /// 校验内容是否能以该类型进入历史。
    pub(crate) fn check(self, content: &ClipContent) -> Result<(), HistoryError> {
        let compatible = matches!(
            (self, content),
            (Self::PlainText | Self::RichText | Self::Html, ClipContent::Text(_))
                | (Self::FileList, ClipContent::Files(_))
                | (Self::Image, ClipContent::Image(_))
        );
        if !compatible {
            return Err(HistoryError::UnsupportedKind {
                kind: self,
                found: content.variant_name(),
            });
        }

        let reason = match content {
            ClipContent::Text(text) if text.trim().is_empty() => Some("文本为空"),
            ClipContent::Files(files) if files.is_empty() => Some("文件列表为空"),
            ClipContent::Image(image) if !image.is_well_formed() => Some("图片尺寸与像素数据不符"),
            _ => None,
        };
        match reason {
            Some(reason) => Err(HistoryError::InvalidContent { kind: self, reason }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RGBA8 图片数据
///
/// 像素使用 `Bytes` 保存，`view()` 克隆快照时只增加引用计数，不复制像素。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    pub rgba: Bytes,
}

impl ImagePayload {
    pub fn new(width: u32, height: u32, rgba: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            rgba: rgba.into(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        self.width > 0 && self.height > 0 && expected == Some(self.rgba.len())
    }

    /// 图片指纹，仅用于监控器判断剪贴板是否变化，不参与历史去重。
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.width.hash(&mut hasher);
        self.height.hash(&mut hasher);
        self.rgba.hash(&mut hasher);
        hasher.finish()
    }
}

/// 快照内容，按类型打标签。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipContent {
    /// 纯文本 / RTF 源码 / HTML 源码
    Text(String),
    /// 文件路径列表
    Files(Vec<PathBuf>),
    Image(ImagePayload),
}

impl ClipContent {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Files(_) => "files",
            Self::Image(_) => "image",
        }
    }
}

/// 一次剪贴板变化的不可变快照
///
/// 只有 `pinned` 会在生命周期内变化（经由 `HistoryStore::pin` / `unpin`）。
/// `recency` 是历史内部的逻辑时钟，决定未置顶条目的新旧顺序。
#[derive(Debug, Clone)]
pub struct ClipboardSnapshot {
    id: EntryId,
    kind: ClipKind,
    content: ClipContent,
    pinned: bool,
    created_at: DateTime<Utc>,
    pub(super) recency: u64,
}

impl ClipboardSnapshot {
    pub(super) fn new(id: EntryId, kind: ClipKind, content: ClipContent, recency: u64) -> Self {
        Self {
            id,
            kind,
            content,
            pinned: false,
            created_at: Utc::now(),
            recency,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    pub fn content(&self) -> &ClipContent {
        &self.content
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(super) fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    pub(super) fn same_content(&self, kind: ClipKind, content: &ClipContent) -> bool {
        self.kind == kind && &self.content == content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_kinds_accept_text_only() {
        let text = ClipContent::Text("hello".into());
        assert!(ClipKind::PlainText.check(&text).is_ok());
        assert!(ClipKind::Html.check(&text).is_ok());
        assert_eq!(
            ClipKind::Image.check(&text),
            Err(HistoryError::UnsupportedKind {
                kind: ClipKind::Image,
                found: "text"
            })
        );
    }

    #[test]
    fn blank_text_and_empty_file_list_are_invalid() {
        assert!(matches!(
            ClipKind::PlainText.check(&ClipContent::Text("  \n\t".into())),
            Err(HistoryError::InvalidContent { .. })
        ));
        assert!(matches!(
            ClipKind::FileList.check(&ClipContent::Files(Vec::new())),
            Err(HistoryError::InvalidContent { .. })
        ));
    }

    #[test]
    fn image_must_match_its_dimensions() {
        let ok = ImagePayload::new(2, 2, vec![0u8; 16]);
        let short = ImagePayload::new(2, 2, vec![0u8; 15]);
        let empty = ImagePayload::new(0, 4, Vec::new());
        assert!(ok.is_well_formed());
        assert!(!short.is_well_formed());
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn fingerprint_tracks_pixels_and_shape() {
        let a = ImagePayload::new(2, 1, vec![1u8; 8]);
        let b = ImagePayload::new(1, 2, vec![1u8; 8]);
        let c = ImagePayload::new(2, 1, vec![1u8; 8]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), c.fingerprint());
    }
}
