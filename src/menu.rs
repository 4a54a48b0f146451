//! 菜单模型
//!
//! # 设计思路
//!
//! 菜单只读取 `view()` 的结果，不持有历史记录。渲染层（控制台或托盘）拿到
//! `Vec<MenuRow>` 后自行绘制，用户操作再以条目 id 调回历史记录。
//!
//! # 实现思路
//!
//! - 布局固定：置顶条目、分隔线、普通条目、分隔线、操作项。
//! - 标题只用于展示：HTML 去标签、RTF 去控制字，空白折叠后按字符截断。
//! - 图片条目按目标像素数缩放出缩略图尺寸，保持宽高比，以 PNG 写入图标目录。

use std::borrow::Cow;
use std::path::Path;

use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;
use crate::history::{ClipContent, ClipKind, ClipboardSnapshot, EntryId, ImagePayload};

/// 缩略图的目标像素数（宽 × 高）
pub const ICON_TARGET_PIXELS: f64 = 20_000.0;

const ELLIPSIS: char = '…';

// ============================================================
// 菜单结构
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOptions {
    pub title_max_chars: usize,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self { title_max_chars: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemView {
    pub id: EntryId,
    pub kind: ClipKind,
    pub title: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// 清空历史，保留置顶
    ClearKeepPinned,
    /// 清空全部，包括置顶与系统剪贴板
    ClearEverything,
    Quit,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::ClearKeepPinned => "Clear (keep pinned items)",
            MenuAction::ClearEverything => "Clear everything",
            MenuAction::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuRow {
    Item(MenuItemView),
    Separator,
    Action(MenuAction),
}

/// 按 `view()` 顺序生成菜单行。
///
/// `view` 已是置顶在前、普通条目按新到旧排列，这里只负责插入分隔线和操作项。
pub fn build_menu(view: &[ClipboardSnapshot], options: &MenuOptions) -> Vec<MenuRow> {
    let mut rows = Vec::with_capacity(view.len() + 5);
    let (pinned, unpinned): (Vec<_>, Vec<_>) = view.iter().partition(|s| s.is_pinned());

    rows.extend(pinned.into_iter().map(|s| MenuRow::Item(item_view(s, options))));
    rows.push(MenuRow::Separator);
    rows.extend(unpinned.into_iter().map(|s| MenuRow::Item(item_view(s, options))));
    rows.push(MenuRow::Separator);
    rows.extend(
        [
            MenuAction::ClearKeepPinned,
            MenuAction::ClearEverything,
            MenuAction::Quit,
        ]
        .map(MenuRow::Action),
    );
    rows
}

fn item_view(snapshot: &ClipboardSnapshot, options: &MenuOptions) -> MenuItemView {
    MenuItemView {
        id: snapshot.id(),
        kind: snapshot.kind(),
        title: display_title(snapshot.kind(), snapshot.content(), options.title_max_chars),
        pinned: snapshot.is_pinned(),
        created_at: snapshot.created_at(),
    }
}

// ============================================================
// 标题
// ============================================================

/// 生成单行展示标题。
pub fn display_title(kind: ClipKind, content: &ClipContent, max_chars: usize) -> String {
    let raw: Cow<'_, str> = match (kind, content) {
        (ClipKind::Html, ClipContent::Text(html)) => Cow::Owned(html_to_plain(html)),
        (ClipKind::RichText, ClipContent::Text(rtf)) => Cow::Owned(rtf_to_plain(rtf)),
        (_, ClipContent::Text(text)) => Cow::Borrowed(text.as_str()),
        (_, ClipContent::Files(files)) => match files.split_first() {
            Some((first, [])) => Cow::Owned(first.display().to_string()),
            Some((first, rest)) => Cow::Owned(format!("{} (+{})", first.display(), rest.len())),
            None => Cow::Borrowed(""),
        },
        (_, ClipContent::Image(image)) => {
            Cow::Owned(format!("Image {}x{}", image.width, image.height))
        }
    };

    let collapsed = collapse_whitespace(&raw);
    if collapsed.is_empty() {
        return format!("({})", kind);
    }
    truncate_chars(&collapsed, max_chars)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 按字符（而非字节）截断，超长时以省略号结尾。
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push(ELLIPSIS);
    out
}

// ============================================================
// HTML / RTF 转纯文本
// ============================================================

static HTML_INVISIBLE: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?is)<(script|style|head)\b[^>]*>.*?</(script|style|head)\s*>"));
static HTML_BREAK: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6]|pre|blockquote)\s*>"));
static HTML_TAG: Lazy<Option<Regex>> = Lazy::new(|| compile(r"(?s)<[^>]*>"));

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            log::error!("正则编译失败 '{}': {}", pattern, err);
            None
        }
    }
}

fn replace_all<'a>(re: &Lazy<Option<Regex>>, text: &'a str, with: &str) -> Cow<'a, str> {
    match re.as_ref() {
        Some(re) => re.replace_all(text, with),
        None => Cow::Borrowed(text),
    }
}

/// HTML 转纯文本：去掉标签与脚本样式，解码常见实体，保留段落换行。
pub fn html_to_plain(html: &str) -> String {
    let visible = replace_all(&HTML_INVISIBLE, html, "");
    let broken = replace_all(&HTML_BREAK, &visible, "\n");
    let stripped = replace_all(&HTML_TAG, &broken, "");
    let decoded = decode_entities(&stripped);

    decoded
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    // &amp; 必须最后替换
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// 这些分组只含元数据，内容不可见
const RTF_HIDDEN_GROUPS: [&str; 6] = ["fonttbl", "colortbl", "stylesheet", "info", "pict", "header"];

/// RTF 转纯文本：丢弃控制字与元数据分组，`\par` 转换行，`\'hh` 按 Latin-1 解码。
pub fn rtf_to_plain(rtf: &str) -> String {
    let mut out = String::with_capacity(rtf.len());
    let mut chars = rtf.chars().peekable();
    let mut depth = 0usize;
    let mut hidden_from: Option<usize> = None;

    while let Some(c) = chars.next() {
        match c {
            '{' => depth += 1,
            '}' => {
                if hidden_from == Some(depth) {
                    hidden_from = None;
                }
                depth = depth.saturating_sub(1);
            }
            '\\' => match chars.peek().copied() {
                Some(next) if next.is_ascii_alphabetic() => {
                    let mut word = String::new();
                    while let Some(&ch) = chars.peek() {
                        if !ch.is_ascii_alphabetic() {
                            break;
                        }
                        word.push(ch);
                        chars.next();
                    }
                    if chars.peek() == Some(&'-') {
                        chars.next();
                    }
                    while chars.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                        chars.next();
                    }
                    if chars.peek() == Some(&' ') {
                        chars.next();
                    }

                    if hidden_from.is_some() {
                        continue;
                    }
                    match word.as_str() {
                        "par" | "line" => out.push('\n'),
                        "tab" => out.push('\t'),
                        w if RTF_HIDDEN_GROUPS.contains(&w) => hidden_from = Some(depth),
                        _ => {}
                    }
                }
                Some('*') => {
                    chars.next();
                    hidden_from.get_or_insert(depth);
                }
                Some('\'') => {
                    chars.next();
                    let hex: String = chars.by_ref().take(2).collect();
                    if hidden_from.is_none() {
                        if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                            out.push(char::from(byte));
                        }
                    }
                }
                Some(escaped @ ('\\' | '{' | '}')) => {
                    chars.next();
                    if hidden_from.is_none() {
                        out.push(escaped);
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            '\r' | '\n' => {}
            _ if hidden_from.is_none() => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

// ============================================================
// 图片缩略图
// ============================================================

/// 缩放到约 `ICON_TARGET_PIXELS` 个像素，保持宽高比，每边至少 1。
pub fn scaled_icon_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (ICON_TARGET_PIXELS / (f64::from(width) * f64::from(height))).sqrt();
    let scaled = |dim: u32| ((f64::from(dim) * scale) as u32).max(1);
    (scaled(width), scaled(height))
}

/// 生成菜单用缩略图；像素数据与尺寸不符时返回 `None`。
pub fn thumbnail(image: &ImagePayload) -> Option<RgbaImage> {
    let (width, height) = scaled_icon_size(image.width, image.height);
    if width == 0 {
        return None;
    }
    let full = RgbaImage::from_raw(image.width, image.height, image.rgba.to_vec())?;
    Some(image::imageops::thumbnail(&full, width, height))
}

/// 把缩略图以 PNG 写到 `path`。
pub fn write_icon(image: &ImagePayload, path: &Path) -> Result<(), AppError> {
    let thumb = thumbnail(image).ok_or_else(|| {
        AppError::Clipboard(format!(
            "图片数据与尺寸不符 ({}x{})",
            image.width, image.height
        ))
    })?;
    thumb
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| AppError::Storage(format!("保存缩略图 '{}' 失败: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::history::HistoryStore;

    #[test]
    fn html_tags_and_entities_are_removed() {
        assert_eq!(html_to_plain("<b>bold</b>"), "bold");
        assert_eq!(html_to_plain("<p>hello <i>there</i></p>"), "hello there");
        assert_eq!(
            html_to_plain("<style>p{color:red}</style><p>a &amp; b</p><p>x&lt;y</p>"),
            "a & b\nx<y"
        );
    }

    #[test]
    fn rtf_control_words_and_tables_are_removed() {
        assert_eq!(rtf_to_plain(r"{\rtf1\ansi hello}"), "hello");
        let doc = r"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}\f0\pard caf\'e9\par {\b bold} \{x\}}";
        assert_eq!(rtf_to_plain(doc), "caf\u{e9}\nbold {x}");
        assert_eq!(rtf_to_plain(r"{\rtf1{\*\generator Foo;}text}"), "text");
    }

    #[test]
    fn titles_collapse_and_truncate() {
        let text = ClipContent::Text("  many\n\n  spaced\twords  ".into());
        assert_eq!(display_title(ClipKind::PlainText, &text, 50), "many spaced words");

        let long = ClipContent::Text("abcdefghijklmnop".into());
        assert_eq!(display_title(ClipKind::PlainText, &long, 10), "abcdefghi…");

        let wide = ClipContent::Text("日本語のテキストです".into());
        assert_eq!(display_title(ClipKind::PlainText, &wide, 5), "日本語の…");
    }

    #[test]
    fn titles_for_files_and_images() {
        let one = ClipContent::Files(vec![PathBuf::from("/tmp/a.txt")]);
        assert_eq!(display_title(ClipKind::FileList, &one, 50), "/tmp/a.txt");

        let many = ClipContent::Files(vec![
            PathBuf::from("/tmp/a.txt"),
            PathBuf::from("/tmp/b.txt"),
            PathBuf::from("/tmp/c.txt"),
        ]);
        assert_eq!(display_title(ClipKind::FileList, &many, 50), "/tmp/a.txt (+2)");

        let image = ClipContent::Image(ImagePayload::new(2, 1, vec![0u8; 8]));
        assert_eq!(display_title(ClipKind::Image, &image, 50), "Image 2x1");
    }

    #[test]
    fn html_without_text_gets_a_kind_placeholder() {
        let html = ClipContent::Text("<img src=\"cat.png\">".into());
        assert_eq!(display_title(ClipKind::Html, &html, 50), "(html)");
    }

    #[test]
    fn menu_layout_puts_pins_first() {
        let mut store = HistoryStore::new();
        let a = inserted(&mut store, "a");
        let b = inserted(&mut store, "b");
        store.pin(a).expect("pin a");

        let view: Vec<_> = store.view().cloned().collect();
        let rows = build_menu(&view, &MenuOptions::default());

        let ids: Vec<_> = rows
            .iter()
            .filter_map(|row| match row {
                MenuRow::Item(item) => Some((item.id, item.pinned)),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![(a, true), (b, false)]);
        assert_eq!(rows[1], MenuRow::Separator);
        assert_eq!(rows[3], MenuRow::Separator);
        assert_eq!(rows.last(), Some(&MenuRow::Action(MenuAction::Quit)));
    }

    #[test]
    fn empty_history_still_has_actions() {
        let rows = build_menu(&[], &MenuOptions::default());
        assert_eq!(rows.len(), 5);
        assert!(matches!(rows[2], MenuRow::Action(MenuAction::ClearKeepPinned)));
    }

    #[test]
    fn icon_size_targets_twenty_thousand_pixels() {
        let (w, h) = scaled_icon_size(400, 200);
        assert_eq!((w, h), (200, 100));

        let (w, h) = scaled_icon_size(1920, 1080);
        let pixels = f64::from(w * h);
        assert!((pixels - ICON_TARGET_PIXELS).abs() / ICON_TARGET_PIXELS < 0.02);
        assert_eq!(scaled_icon_size(0, 10), (0, 0));
        assert_eq!(scaled_icon_size(100_000, 1).1, 1);
    }

    #[test]
    fn thumbnail_keeps_aspect_ratio() {
        let payload = ImagePayload::new(400, 200, vec![255u8; 400 * 200 * 4]);
        let thumb = thumbnail(&payload).expect("thumbnail");
        assert_eq!(thumb.dimensions(), (200, 100));

        let broken = ImagePayload::new(10, 10, vec![0u8; 3]);
        assert!(thumbnail(&broken).is_none());
    }

    #[test]
    fn items_carry_their_capture_time() {
        let mut store = HistoryStore::new();
        let id = inserted(&mut store, "a");
        let view: Vec<_> = store.view().cloned().collect();
        let rows = build_menu(&view, &MenuOptions::default());

        let expected = store.get(id).expect("entry").created_at();
        assert!(matches!(&rows[1], MenuRow::Item(item) if item.created_at == expected));
    }

    #[test]
    fn icon_is_written_as_png() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("clip-tray-menu-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("1.png");

        let payload = ImagePayload::new(400, 200, vec![128u8; 400 * 200 * 4]);
        write_icon(&payload, &path).expect("write icon");
        let written = image::open(&path).expect("decode icon");
        assert_eq!((written.width(), written.height()), (200, 100));

        let broken = ImagePayload::new(10, 10, vec![0u8; 3]);
        assert!(write_icon(&broken, &dir.join("2.png")).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }

    fn inserted(store: &mut HistoryStore, text: &str) -> EntryId {
        match store.ingest(ClipContent::Text(text.into()), ClipKind::PlainText) {
            crate::history::IngestOutcome::Inserted { id, .. } => id,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
