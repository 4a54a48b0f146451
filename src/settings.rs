//! 应用设置
//!
//! `settings.json` 使用 camelCase 字段，缺失字段取默认值，
//! 加载后统一经过 `normalize` 把数值夹到合法范围内。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::history::DEFAULT_CAPACITY;

const HISTORY_CAPACITY_MAX: usize = 500;
const POLL_INTERVAL_MIN_MS: u64 = 100;
const POLL_INTERVAL_MAX_MS: u64 = 10_000;
const READ_TIMEOUT_MIN_MS: u64 = 50;
const READ_TIMEOUT_MAX_MS: u64 = 10_000;
const READ_ATTEMPTS_MAX: u32 = 5;
const RETRY_PAUSE_MAX_MS: u64 = 2_000;
const MENU_TITLE_MIN_CHARS: usize = 10;
const MENU_TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub history_capacity: usize,
    pub poll_interval_ms: u64,
    pub read_timeout_ms: u64,
    /// 每轮轮询的读取次数（含首次）
    pub read_attempts: u32,
    pub retry_pause_ms: u64,
    pub capture_html: bool,
    /// 从菜单复制后把该条目移到最前
    pub promote_on_select: bool,
    pub clear_clipboard_on_start: bool,
    pub menu_title_max_chars: usize,
    pub log_to_stdout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            poll_interval_ms: 1_000,
            read_timeout_ms: 1_000,
            read_attempts: 2,
            retry_pause_ms: 100,
            capture_html: true,
            promote_on_select: true,
            clear_clipboard_on_start: false,
            menu_title_max_chars: 50,
            log_to_stdout: false,
            data_dir: None,
        }
    }
}

impl Settings {
    /// 把越界数值夹回合法范围，空字符串目录视为未设置。
    pub fn normalize(mut self) -> Self {
        self.history_capacity = self.history_capacity.clamp(1, HISTORY_CAPACITY_MAX);
        self.poll_interval_ms = self
            .poll_interval_ms
            .clamp(POLL_INTERVAL_MIN_MS, POLL_INTERVAL_MAX_MS);
        self.read_timeout_ms = self
            .read_timeout_ms
            .clamp(READ_TIMEOUT_MIN_MS, READ_TIMEOUT_MAX_MS);
        self.read_attempts = self.read_attempts.clamp(1, READ_ATTEMPTS_MAX);
        self.retry_pause_ms = self.retry_pause_ms.min(RETRY_PAUSE_MAX_MS);
        self.menu_title_max_chars = self
            .menu_title_max_chars
            .clamp(MENU_TITLE_MIN_CHARS, MENU_TITLE_MAX_CHARS);
        if self.data_dir.as_deref().is_some_and(|dir| dir.trim().is_empty()) {
            self.data_dir = None;
        }
        self
    }
}

/// 读取设置文件。
///
/// 文件不存在时返回默认值；
/// 文件存在但无法解析时返回错误，不静默覆盖用户的配置。
pub fn load_settings(path: &Path) -> Result<Settings, AppError> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Settings(format!("读取 '{}' 失败: {}", path.display(), e)))?;
    let parsed: Settings = serde_json::from_str(&content)
        .map_err(|e| AppError::Settings(format!("解析 '{}' 失败: {}", path.display(), e)))?;
    Ok(parsed.normalize())
}

/// 设置文件不存在时写出当前设置，方便用户修改；返回是否写了文件。
///
/// 日志初始化之后再调用，写出失败才能被记录下来。
pub fn ensure_settings_file(path: &Path, settings: &Settings) -> Result<bool, AppError> {
    if path.exists() {
        return Ok(false);
    }
    save_settings(path, settings)?;
    Ok(true)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}
