use std::sync::{Arc, Mutex, MutexGuard};

use super::{ClipContent, ClipKind, ClipboardSnapshot, EntryId, HistoryError, HistoryStore, IngestOutcome};

/// 跨任务共享的历史记录句柄
///
/// 后台监控任务调用 `ingest`，前台菜单调用其余操作；
/// 所有修改与 `view()` 都串行在同一把互斥锁上。
/// 返回值一律为拥有所有权的克隆，锁不会跨越调用边界。
#[derive(Clone, Debug)]
pub struct SharedHistory {
    inner: Arc<Mutex<HistoryStore>>,
}

impl SharedHistory {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(HistoryStore::with_capacity(capacity))
    }

    /// 在锁内执行只读或修改操作。
    pub fn with_store<T>(&self, op: impl FnOnce(&mut HistoryStore) -> T) -> T {
        let mut store = self.lock();
        op(&mut store)
    }

    fn lock(&self) -> MutexGuard<'_, HistoryStore> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("历史记录锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    pub fn ingest(&self, content: ClipContent, kind: ClipKind) -> IngestOutcome {
        let outcome = self.with_store(|store| store.ingest(content, kind));
        match &outcome {
            IngestOutcome::Inserted { id, evicted } => {
                log::info!("📋 新增历史条目 {} ({})", id, kind);
                if let Some(evicted) = evicted {
                    log::debug!("超出容量，淘汰最旧条目 {}", evicted);
                }
            }
            IngestOutcome::Duplicate(id) => {
                log::debug!("⏭️  内容与 {} 相同，忽略", id);
            }
            IngestOutcome::Ignored(err) => {
                log::debug!("⏭️  忽略剪贴板内容: {}", err);
            }
        }
        outcome
    }

    pub fn pin(&self, id: EntryId) -> Result<(), HistoryError> {
        self.with_store(|store| store.pin(id))
            .inspect(|_| log::info!("📌 已置顶 {}", id))
            .inspect_err(|err| log::warn!("置顶失败: {}", err))
    }

    pub fn unpin(&self, id: EntryId) -> Result<Option<EntryId>, HistoryError> {
        let evicted = self
            .with_store(|store| store.unpin(id))
            .inspect_err(|err| log::warn!("取消置顶失败: {}", err))?;
        log::info!("已取消置顶 {}", id);
        if let Some(evicted) = evicted {
            log::debug!("取消置顶后超出容量，淘汰 {}", evicted);
        }
        Ok(evicted)
    }

    pub fn remove(&self, id: EntryId) -> Result<ClipboardSnapshot, HistoryError> {
        self.with_store(|store| store.remove(id))
            .inspect(|_| log::info!("🗑 已删除 {}", id))
            .inspect_err(|err| log::warn!("删除失败: {}", err))
    }

    pub fn clear(&self) -> usize {
        let removed = self.with_store(HistoryStore::clear);
        log::info!("已清空 {} 条未置顶记录", removed);
        removed
    }

    pub fn clear_all(&self) -> usize {
        let removed = self.with_store(HistoryStore::clear_all);
        log::info!("已清空全部 {} 条记录", removed);
        removed
    }

    pub fn view(&self) -> Vec<ClipboardSnapshot> {
        self.with_store(|store| store.view().cloned().collect())
    }

    pub fn select(&self, id: EntryId) -> Result<ClipboardSnapshot, HistoryError> {
        self.with_store(|store| store.select(id).cloned())
    }

    pub fn promote(&self, id: EntryId) -> Result<(), HistoryError> {
        self.with_store(|store| store.promote(id))
    }

    pub fn len(&self) -> usize {
        self.with_store(|store| store.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with_store(|store| store.is_empty())
    }
}

impl Default for SharedHistory {
    fn default() -> Self {
        Self::new(HistoryStore::new())
    }
}
