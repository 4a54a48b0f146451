//! # 剪贴板历史工具：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  前台 (console 菜单)                      │
//! │                                                          │
//! │  stdin 命令 ── Console ── menu::build_menu (只读 view)   │
//! │       │  pin / unpin / rm / clear / copy                 │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ SharedHistory (Arc<Mutex<HistoryStore>>)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后台 (tokio 任务)                      │
//! │                                                          │
//! │  ┌─ history ──── HistoryStore 去重·容量·置顶              │
//! │  │                                                       │
//! │  ├─ clipboard ── ClipboardWatcher 轮询 + 超时重试         │
//! │  │   ├─ detector  按格式比较 + 忽略自身写入               │
//! │  │   ├─ filters   图标 / 代码预览图过滤                   │
//! │  │   └─ arboard   系统剪贴板读写                          │
//! │  │                                                       │
//! │  ├─ settings ─── settings.json (camelCase)               │
//! │  ├─ storage ──── 数据目录 / 日志文件路径                  │
//! │  └─ error ────── AppError (统一错误类型)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`history`] | 有界、去重、支持置顶的历史记录及其共享句柄 |
//! | [`clipboard`] | 剪贴板读写 trait、变化检测、轮询任务 |
//! | [`menu`] | 菜单行模型、展示标题、图片缩略图 |
//! | [`console`] | 行命令前台，把用户操作转成历史记录操作 |
//! | [`settings`] | 设置文件的加载、默认值与范围修正 |
//! | [`storage`] | 数据目录的获取与自动创建 |

pub mod clipboard;
pub mod console;
pub mod error;
pub mod history;
pub mod menu;
pub mod settings;
pub mod storage;
