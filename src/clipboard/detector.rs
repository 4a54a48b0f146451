use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::history::{ClipContent, ClipKind, ImagePayload};
use crate::menu;

use super::filters::should_skip_image;

/// 一次轮询读到的全部格式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardReading {
    pub files: Option<Vec<PathBuf>>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Clone, Copy)]
struct Changed {
    files: bool,
    html: bool,
    text: bool,
    image: bool,
}

/// 剪贴板变化检测器
///
/// 按格式保存上一次读到的内容（图片只保存指纹），
/// 新读取与之不同才算一次变化。每次 `observe` 都会刷新全部缓冲，
/// 同一次复制附带的其它格式不会在之后的轮询里被重复收录。
/// 启动后的第一次读取只作为基线，启动前已在剪贴板中的内容不收录。
///
/// 优先级：文件列表 > 图片（未被过滤时） > HTML > 纯文本。
/// 剪贴板中存在文件列表时，文本与 HTML 只是文件名的附带表示，不单独收录。
/// `arboard` 没有 RTF 读取接口，因此不会产生 `ClipKind::RichText`，富文本以其 HTML 或纯文本形式收录。
#[derive(Debug)]
pub struct ChangeDetector {
    last_files: Option<Vec<PathBuf>>,
    last_html: Option<String>,
    last_text: Option<String>,
    last_image: Option<u64>,
    capture_html: bool,
    primed: bool,
    pending_own_write: Option<(ClipContent, ClipKind)>,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ChangeDetector {
    pub fn new(capture_html: bool) -> Self {
        Self {
            last_files: None,
            last_html: None,
            last_text: None,
            last_image: None,
            capture_html,
            primed: false,
            pending_own_write: None,
        }
    }

    /// 比较新读取的内容，返回需要收录的变化。
    pub fn observe(&mut self, reading: ClipboardReading) -> Option<(ClipContent, ClipKind)> {
        let fingerprint = reading.image.as_ref().map(ImagePayload::fingerprint);
        let changed = Changed {
            files: reading.files.is_some() && reading.files != self.last_files,
            html: reading.html.is_some() && reading.html != self.last_html,
            text: reading.text.is_some() && reading.text != self.last_text,
            image: fingerprint.is_some() && fingerprint != self.last_image,
        };

        self.last_files = reading.files.clone();
        self.last_html = reading.html.clone();
        self.last_text = reading.text.clone();
        self.last_image = fingerprint;

        if !self.primed {
            self.primed = true;
            log::debug!("📋 已记录剪贴板基线");
            return None;
        }

        let change = self.pick(reading, changed)?;
        if let Some(expected) = self.pending_own_write.take() {
            if readback_matches(&change, &expected) {
                log::debug!("⏭️  忽略应用自身写入的剪贴板内容");
                return None;
            }
        }
        Some(change)
    }

    fn pick(&self, reading: ClipboardReading, changed: Changed) -> Option<(ClipContent, ClipKind)> {
        let ClipboardReading {
            files,
            html,
            text,
            image,
        } = reading;

        if changed.files {
            return files.map(|files| (ClipContent::Files(files), ClipKind::FileList));
        }
        if files.is_some() {
            return None;
        }

        if changed.image {
            if let Some(image) = image {
                if !should_skip_image(&image, text.as_deref()) {
                    return Some((ClipContent::Image(image), ClipKind::Image));
                }
            }
        }

        if self.capture_html && changed.html {
            return html.map(|html| (ClipContent::Text(html), ClipKind::Html));
        }
        if changed.text {
            return text.map(|text| (ClipContent::Text(text), ClipKind::PlainText));
        }
        None
    }

    /// 记录应用即将写入剪贴板的内容。
    ///
    /// 之后第一次检测到的变化若与写入内容一致，就不再收录。
    /// 按 `ArboardClipboard::write` 的实际写法推算读回形式：富文本以纯文本写入，
    /// HTML 附带去标签后的纯文本。
    pub fn ignore_own_write(&mut self, kind: ClipKind, content: &ClipContent) {
        let expected = match (kind, content) {
            (ClipKind::Html, ClipContent::Text(html)) if !self.capture_html => {
                (ClipContent::Text(menu::html_to_plain(html)), ClipKind::PlainText)
            }
            (ClipKind::RichText, ClipContent::Text(rtf)) => {
                (ClipContent::Text(menu::rtf_to_plain(rtf)), ClipKind::PlainText)
            }
            _ => (content.clone(), kind),
        };
        self.pending_own_write = Some(expected);
    }

    /// 写入失败时撤销 `ignore_own_write` 的登记。
    pub fn cancel_own_write(&mut self) {
        self.pending_own_write = None;
    }
}

/// 图片读回时像素可能经过格式转换，只比较尺寸。
fn readback_matches(change: &(ClipContent, ClipKind), expected: &(ClipContent, ClipKind)) -> bool {
    match (change, expected) {
        ((ClipContent::Image(seen), ClipKind::Image), (ClipContent::Image(wrote), ClipKind::Image)) => {
            seen.width == wrote.width && seen.height == wrote.height
        }
        _ => change == expected,
    }
}

/// 监控任务与菜单共享的检测器句柄
#[derive(Clone, Debug, Default)]
pub struct DetectorHandle {
    inner: Arc<Mutex<ChangeDetector>>,
}

impl DetectorHandle {
    pub fn new(detector: ChangeDetector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChangeDetector> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("剪贴板检测器锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    pub fn observe(&self, reading: ClipboardReading) -> Option<(ClipContent, ClipKind)> {
        self.lock().observe(reading)
    }

    pub fn ignore_own_write(&self, kind: ClipKind, content: &ClipContent) {
        self.lock().ignore_own_write(kind, content);
    }

    pub fn cancel_own_write(&self) {
        self.lock().cancel_own_write();
    }
}
