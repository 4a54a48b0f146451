//! 图片收录过滤规则
//!
//! 浏览器或编辑器复制代码时，常会同时放入一张渲染预览图。
//! 若文本看起来像代码、或是多行长文本，就认为图片只是附带品，改为收录文本。
//! 过小的图片（图标）也直接跳过。

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::history::ImagePayload;

/// 小于该边长的图片视为图标
pub const MIN_IMAGE_SIDE: u32 = 64;

/// 多行文本超过该长度时，视为网页正文复制
const LONG_MULTILINE_TEXT: usize = 500;

static CODE_PATTERNS: Lazy<Option<RegexSet>> = Lazy::new(|| {
    let set = RegexSet::new([
        // 行首关键字
        r"(?m)^\s*(fn|function|const|let|var|class|struct|impl|mod|use|import|export|def|async|pub|static|interface|type|enum|trait)\s",
        // 属性与预处理指令
        r"#!?\[[\w\s:(),=]+\]",
        r"(?m)^\s*#(include|define|ifdef|ifndef|endif)\b",
        // 宏调用与常见方法链
        r"\b\w+!\(",
        r"\.(unwrap|expect|map_err|then|await)\b",
        // 运算符
        r"->|=>|::",
        r"&mut\s+\w+",
        r"\|\s*\w+\s*\|",
        r"\b(Ok|Err|Some)\(",
    ]);
    match set {
        Ok(set) => Some(set),
        Err(err) => {
            log::error!("代码检测正则编译失败: {}", err);
            None
        }
    }
});

/// 判断文本是否可能是代码。
///
/// 不含换行的极短文本（<5 字节）直接排除，避免误判。
pub fn is_likely_code(text: &str) -> bool {
    if text.len() < 5 && !text.contains('\n') {
        return false;
    }
    CODE_PATTERNS
        .as_ref()
        .is_some_and(|patterns| patterns.is_match(text))
}

/// 剪贴板同时存在图片与文本时，是否放弃图片。
pub fn should_skip_image(image: &ImagePayload, text: Option<&str>) -> bool {
    if image.width < MIN_IMAGE_SIDE || image.height < MIN_IMAGE_SIDE {
        log::debug!("🚫 图片太小 ({}x{})，可能是图标，跳过", image.width, image.height);
        return true;
    }

    let Some(text) = text else {
        return false;
    };
    if is_likely_code(text) {
        log::debug!("🚫 同时存在代码文本，图片视为预览图，跳过");
        return true;
    }
    if text.contains('\n') && text.len() > LONG_MULTILINE_TEXT {
        log::debug!("🚫 多行长文本（{} 字节）带图片，可能是网页复制，跳过图片", text.len());
        return true;
    }
    false
}
