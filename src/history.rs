//! 剪贴板历史模块
//!
//! # 设计思路
//!
//! 历史记录是整个应用唯一有状态的部分：一个有容量上限、自动去重、
//! 支持置顶的有序集合。监控器只负责把新内容交给 [`HistoryStore::ingest`]，
//! 菜单只负责读取 [`HistoryStore::view`] 并把用户操作转成 pin / unpin / remove / clear。
//!
//! # 实现思路
//!
//! - `snapshot`：单条剪贴板快照及其内容类型，不含任何行为。
//! - `store`：纯内存、单线程的数据结构，所有规则（去重、淘汰、排序）都在这里，
//!   不做日志，不碰系统剪贴板，便于穷举测试。
//! - `shared`：`Arc<Mutex<HistoryStore>>` 封装，供后台监控任务与前台菜单共享，
//!   所有操作串行化在同一把锁上，并在这一层记录日志。
//! - 进程内只存在一个实例，由 `main.rs` 创建后注入各协作者；不做任何持久化。

mod error;
mod shared;
mod snapshot;
mod store;

pub use error::HistoryError;
pub use shared::SharedHistory;
pub use snapshot::{ClipContent, ClipKind, ClipboardSnapshot, EntryId, ImagePayload};
pub use store::{HistoryStore, IngestOutcome, DEFAULT_CAPACITY};
