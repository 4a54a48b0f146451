//! 数据目录管理
//!
//! 优先使用设置中的 `dataDir`，未设置时回退到系统本地数据目录下的 `clip-tray`。
//! 目录不存在时自动创建。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

const APP_DIR_NAME: &str = "clip-tray";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "clip-tray.log";
const ICON_DIR: &str = "icons";

/// 获取数据目录。
///
/// - `Ok(PathBuf)`：已存在或刚创建的目录
/// - `Err(AppError::Storage)`：系统没有本地数据目录，或创建失败
pub fn resolve_data_dir(custom_dir: Option<&str>) -> Result<PathBuf, AppError> {
    let dir = match custom_dir.filter(|dir| !dir.trim().is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_local_dir()
            .ok_or_else(|| AppError::Storage("无法确定本地数据目录".to_string()))?
            .join(APP_DIR_NAME),
    };
    ensure_dir(&dir)?;
    Ok(dir)
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::Storage(format!("创建目录 '{}' 失败: {}", dir.display(), e))
        })?;
    }
    Ok(())
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

pub fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

/// 清空并重建缩略图目录。
///
/// 条目 id 只在进程内唯一，上次运行留下的图标不能复用。
pub fn reset_icon_dir(data_dir: &Path) -> Result<PathBuf, AppError> {
    let dir = data_dir.join(ICON_DIR);
    if dir.exists() {
        fs::remove_dir_all(&dir).map_err(|e| {
            AppError::Storage(format!("清理目录 '{}' 失败: {}", dir.display(), e))
        })?;
    }
    ensure_dir(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        std::env::temp_dir().join(format!("clip-tray-storage-test-{nanos}"))
    }

    #[test]
    fn custom_dir_is_created() {
        let root = unique_temp_dir();
        let dir = root.join("data");
        let resolved = resolve_data_dir(dir.to_str()).expect("resolve custom dir");

        assert_eq!(resolved, dir);
        assert!(dir.exists());
        assert_eq!(settings_path(&resolved), dir.join("settings.json"));
        assert_eq!(log_file_path(&resolved), dir.join("clip-tray.log"));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn icon_dir_starts_empty_each_run() {
        let root = unique_temp_dir();
        let stale = root.join("icons").join("7.png");
        std::fs::create_dir_all(stale.parent().expect("icon dir")).expect("create icon dir");
        std::fs::write(&stale, b"old").expect("write stale icon");

        let dir = reset_icon_dir(&root).expect("reset icon dir");
        assert_eq!(dir, root.join("icons"));
        assert!(dir.is_dir());
        assert!(!stale.exists());

        let _ = std::fs::remove_dir_all(root);
    }
}
