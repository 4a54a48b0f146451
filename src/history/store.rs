use std::collections::VecDeque;

use super::{ClipContent, ClipKind, ClipboardSnapshot, EntryId, HistoryError};

/// 未置顶条目的默认容量
pub const DEFAULT_CAPACITY: usize = 25;

/// `ingest` 的结果
///
/// `ingest` 本身从不失败；不支持的内容以 `Ignored` 返回，由调用方决定是否记录日志。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// 作为最新的未置顶条目插入；若超出容量，`evicted` 为被淘汰的最旧条目
    Inserted {
        id: EntryId,
        evicted: Option<EntryId>,
    },
    /// 已存在相同 `(kind, content)` 的未置顶条目，未做任何改动
    Duplicate(EntryId),
    Ignored(HistoryError),
}

/// 有容量上限、去重、支持置顶的剪贴板历史
///
/// - `pinned` 按置顶先后排列，不参与容量统计，永不被自动淘汰。
/// - `unpinned` 按 `recency` 从新到旧排列，超过 `capacity` 时淘汰队尾。
/// - 同一 `(kind, content)` 在 `unpinned` 中至多出现一次。
#[derive(Debug)]
pub struct HistoryStore {
    pinned: Vec<ClipboardSnapshot>,
    unpinned: VecDeque<ClipboardSnapshot>,
    capacity: usize,
    next_id: u64,
    next_recency: u64,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// 容量至少为 1。
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pinned: Vec::new(),
            unpinned: VecDeque::with_capacity(capacity + 1),
            capacity,
            next_id: 1,
            next_recency: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.unpinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty() && self.unpinned.is_empty()
    }

    pub fn pinned_len(&self) -> usize {
        self.pinned.len()
    }

    pub fn unpinned_len(&self) -> usize {
        self.unpinned.len()
    }

    /// 收录一次新的剪贴板内容。
    pub fn ingest(&mut self, content: ClipContent, kind: ClipKind) -> IngestOutcome {
        if let Err(err) = kind.check(&content) {
            return IngestOutcome::Ignored(err);
        }

        if let Some(existing) = self
            .unpinned
            .iter()
            .find(|entry| entry.same_content(kind, &content))
        {
            return IngestOutcome::Duplicate(existing.id());
        }

        let id = EntryId::new(self.next_id);
        self.next_id += 1;
        let recency = self.tick();
        self.unpinned
            .push_front(ClipboardSnapshot::new(id, kind, content, recency));

        IngestOutcome::Inserted {
            id,
            evicted: self.enforce_capacity(),
        }
    }

    /// 置顶条目。对已置顶的条目再次调用不做任何改动。
    pub fn pin(&mut self, id: EntryId) -> Result<(), HistoryError> {
        if self.pinned.iter().any(|entry| entry.id() == id) {
            return Ok(());
        }
        let index = self.unpinned_index(id).ok_or(HistoryError::NotFound(id))?;
        if let Some(mut entry) = self.unpinned.remove(index) {
            entry.set_pinned(true);
            self.pinned.push(entry);
        }
        Ok(())
    }

    /// 取消置顶。条目按原有的新旧位置回到未置顶队列，
    /// 若因此超出容量，立即淘汰最旧的未置顶条目（可能正是它自己）。
    ///
    /// 若未置顶队列中已有同内容条目，旧的那条被替换，保证去重不变式。
    pub fn unpin(&mut self, id: EntryId) -> Result<Option<EntryId>, HistoryError> {
        if self.unpinned_index(id).is_some() {
            return Ok(None);
        }
        let index = self
            .pinned
            .iter()
            .position(|entry| entry.id() == id)
            .ok_or(HistoryError::NotFound(id))?;

        let mut entry = self.pinned.remove(index);
        entry.set_pinned(false);
        self.unpinned
            .retain(|other| !other.same_content(entry.kind(), entry.content()));

        let position = self
            .unpinned
            .iter()
            .position(|other| other.recency < entry.recency)
            .unwrap_or(self.unpinned.len());
        self.unpinned.insert(position, entry);

        Ok(self.enforce_capacity())
    }

    /// 清空所有未置顶条目，返回删除数量。
    pub fn clear(&mut self) -> usize {
        let removed = self.unpinned.len();
        self.unpinned.clear();
        removed
    }

    /// 清空全部条目（包括置顶）。
    pub fn clear_all(&mut self) -> usize {
        let removed = self.len();
        self.pinned.clear();
        self.unpinned.clear();
        removed
    }

    /// 删除单个条目，置顶与否均可。
    pub fn remove(&mut self, id: EntryId) -> Result<ClipboardSnapshot, HistoryError> {
        if let Some(index) = self.pinned.iter().position(|entry| entry.id() == id) {
            return Ok(self.pinned.remove(index));
        }
        self.unpinned_index(id)
            .and_then(|index| self.unpinned.remove(index))
            .ok_or(HistoryError::NotFound(id))
    }

    /// 渲染顺序：置顶条目按置顶先后在前，未置顶条目从新到旧在后。
    pub fn view(&self) -> impl Iterator<Item = &ClipboardSnapshot> + '_ {
        self.pinned.iter().chain(self.unpinned.iter())
    }

    /// 取出条目供写回剪贴板，不修改历史。
    pub fn select(&self, id: EntryId) -> Result<&ClipboardSnapshot, HistoryError> {
        self.get(id).ok_or(HistoryError::NotFound(id))
    }

    pub fn get(&self, id: EntryId) -> Option<&ClipboardSnapshot> {
        self.view().find(|entry| entry.id() == id)
    }

    /// 把未置顶条目提到最新位置（重新复制旧条目后使用）；置顶条目保持不动。
    pub fn promote(&mut self, id: EntryId) -> Result<(), HistoryError> {
        if self.pinned.iter().any(|entry| entry.id() == id) {
            return Ok(());
        }
        let index = self.unpinned_index(id).ok_or(HistoryError::NotFound(id))?;
        if let Some(mut entry) = self.unpinned.remove(index) {
            entry.recency = self.tick();
            self.unpinned.push_front(entry);
        }
        Ok(())
    }

    fn unpinned_index(&self, id: EntryId) -> Option<usize> {
        self.unpinned.iter().position(|entry| entry.id() == id)
    }

    fn tick(&mut self) -> u64 {
        self.next_recency += 1;
        self.next_recency
    }

    fn enforce_capacity(&mut self) -> Option<EntryId> {
        let mut evicted = None;
        while self.unpinned.len() > self.capacity {
            evicted = self.unpinned.pop_back().map(|entry| entry.id());
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> ClipContent {
        ClipContent::Text(value.to_string())
    }

    fn ingest_text(store: &mut HistoryStore, value: &str) -> EntryId {
        match store.ingest(text(value), ClipKind::PlainText) {
            IngestOutcome::Inserted { id, .. } => id,
            other => panic!("expected insert for {value}, got {other:?}"),
        }
    }

    fn titles(store: &HistoryStore) -> Vec<String> {
        store
            .view()
            .map(|entry| match entry.content() {
                ClipContent::Text(value) => value.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn newest_unpinned_comes_first() {
        let mut store = HistoryStore::new();
        ingest_text(&mut store, "a");
        ingest_text(&mut store, "b");
        ingest_text(&mut store, "c");
        assert_eq!(titles(&store), ["c", "b", "a"]);
    }

    #[test]
    fn duplicate_ingest_is_a_noop_without_reordering() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        ingest_text(&mut store, "b");

        assert_eq!(
            store.ingest(text("a"), ClipKind::PlainText),
            IngestOutcome::Duplicate(a)
        );
        assert_eq!(titles(&store), ["b", "a"]);
    }

    #[test]
    fn same_text_with_another_kind_is_not_a_duplicate() {
        let mut store = HistoryStore::new();
        ingest_text(&mut store, "<b>x</b>");
        let outcome = store.ingest(text("<b>x</b>"), ClipKind::Html);
        assert!(matches!(outcome, IngestOutcome::Inserted { .. }));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn content_equal_to_a_pinned_entry_is_inserted_again() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        store.pin(a).unwrap();

        let outcome = store.ingest(text("a"), ClipKind::PlainText);
        assert!(matches!(outcome, IngestOutcome::Inserted { .. }));
        assert_eq!((store.pinned_len(), store.unpinned_len()), (1, 1));
    }

    #[test]
    fn overflow_evicts_exactly_the_oldest_unpinned() {
        let mut store = HistoryStore::with_capacity(3);
        let first = ingest_text(&mut store, "1");
        ingest_text(&mut store, "2");
        ingest_text(&mut store, "3");

        let outcome = store.ingest(text("4"), ClipKind::PlainText);
        assert!(matches!(
            outcome,
            IngestOutcome::Inserted { evicted: Some(id), .. } if id == first
        ));
        assert_eq!(titles(&store), ["4", "3", "2"]);
    }

    #[test]
    fn unsupported_or_empty_content_is_ignored() {
        let mut store = HistoryStore::new();
        let outcome = store.ingest(ClipContent::Files(vec!["/tmp/a".into()]), ClipKind::PlainText);
        assert!(matches!(
            outcome,
            IngestOutcome::Ignored(HistoryError::UnsupportedKind { .. })
        ));
        let outcome = store.ingest(text(""), ClipKind::PlainText);
        assert!(matches!(
            outcome,
            IngestOutcome::Ignored(HistoryError::InvalidContent { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn pinned_entries_survive_overflow() {
        let mut store = HistoryStore::new();
        let oldest = ingest_text(&mut store, "0");
        for i in 1..DEFAULT_CAPACITY {
            ingest_text(&mut store, &i.to_string());
        }
        store.pin(oldest).unwrap();

        let outcome = store.ingest(text("new"), ClipKind::PlainText);
        assert!(matches!(outcome, IngestOutcome::Inserted { evicted: None, .. }));
        let outcome = store.ingest(text("newer"), ClipKind::PlainText);
        assert!(matches!(outcome, IngestOutcome::Inserted { evicted: Some(_), .. }));

        assert!(store.get(oldest).is_some());
        assert_eq!(store.unpinned_len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn pinned_entries_come_first_in_pin_order() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        let b = ingest_text(&mut store, "b");
        ingest_text(&mut store, "c");
        store.pin(b).unwrap();
        store.pin(a).unwrap();
        assert_eq!(titles(&store), ["b", "a", "c"]);
        assert!(store.view().take(2).all(|entry| entry.is_pinned()));
    }

    #[test]
    fn clear_keeps_pins_in_order() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        ingest_text(&mut store, "b");
        let c = ingest_text(&mut store, "c");
        store.pin(c).unwrap();
        store.pin(a).unwrap();

        assert_eq!(store.clear(), 1);
        assert_eq!(titles(&store), ["c", "a"]);
    }

    #[test]
    fn clear_all_drops_pins_too() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        ingest_text(&mut store, "b");
        store.pin(a).unwrap();
        assert_eq!(store.clear_all(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn unpin_returns_entry_to_its_recency_slot() {
        let mut store = HistoryStore::new();
        ingest_text(&mut store, "a");
        let b = ingest_text(&mut store, "b");
        ingest_text(&mut store, "c");
        store.pin(b).unwrap();
        assert_eq!(titles(&store), ["b", "c", "a"]);

        assert_eq!(store.unpin(b), Ok(None));
        assert_eq!(titles(&store), ["c", "b", "a"]);
    }

    #[test]
    fn unpin_over_capacity_evicts_the_oldest_which_may_be_itself() {
        let mut store = HistoryStore::with_capacity(2);
        let a = ingest_text(&mut store, "a");
        store.pin(a).unwrap();
        ingest_text(&mut store, "b");
        ingest_text(&mut store, "c");

        assert_eq!(store.unpin(a), Ok(Some(a)));
        assert!(store.get(a).is_none());
        assert_eq!(titles(&store), ["c", "b"]);
    }

    #[test]
    fn unpin_replaces_an_unpinned_duplicate() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        store.pin(a).unwrap();
        let copy = ingest_text(&mut store, "a");

        assert_eq!(store.unpin(a), Ok(None));
        assert!(store.get(copy).is_none());
        assert_eq!(titles(&store), ["a"]);
    }

    #[test]
    fn missing_ids_report_not_found_and_change_nothing() {
        let mut store = HistoryStore::new();
        ingest_text(&mut store, "a");
        let ghost = EntryId::new(999);

        assert_eq!(store.pin(ghost), Err(HistoryError::NotFound(ghost)));
        assert_eq!(store.unpin(ghost), Err(HistoryError::NotFound(ghost)));
        assert_eq!(store.remove(ghost).err(), Some(HistoryError::NotFound(ghost)));
        assert_eq!(store.select(ghost).err(), Some(HistoryError::NotFound(ghost)));
        assert_eq!(store.promote(ghost), Err(HistoryError::NotFound(ghost)));
        assert_eq!(titles(&store), ["a"]);
    }

    #[test]
    fn remove_works_for_pinned_and_unpinned() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        let b = ingest_text(&mut store, "b");
        store.pin(a).unwrap();

        assert_eq!(store.remove(a).map(|entry| entry.id()), Ok(a));
        assert_eq!(store.remove(b).map(|entry| entry.id()), Ok(b));
        assert!(store.is_empty());
    }

    #[test]
    fn select_does_not_mutate() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        ingest_text(&mut store, "b");

        let selected = store.select(a).unwrap();
        assert_eq!(selected.content(), &text("a"));
        assert_eq!(titles(&store), ["b", "a"]);
    }

    #[test]
    fn promote_moves_unpinned_to_front_and_ignores_pins() {
        let mut store = HistoryStore::new();
        let a = ingest_text(&mut store, "a");
        let b = ingest_text(&mut store, "b");
        ingest_text(&mut store, "c");

        store.promote(a).unwrap();
        assert_eq!(titles(&store), ["a", "c", "b"]);

        store.pin(b).unwrap();
        store.promote(b).unwrap();
        assert_eq!(titles(&store), ["b", "a", "c"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut store = HistoryStore::with_capacity(0);
        ingest_text(&mut store, "a");
        ingest_text(&mut store, "b");
        assert_eq!(store.capacity(), 1);
        assert_eq!(titles(&store), ["b"]);
    }
}
