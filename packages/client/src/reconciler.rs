//! Notification reconciliation.
//!
//! The notification list is fed from two sources: a point-in-time REST
//! snapshot and the live push stream, and the two race freely (a push may
//! land before the snapshot response, a snapshot may repeat an id a push
//! already delivered). The reconciler merges both into one de-duplicated
//! set with a monotonic read flag: once a notification is read, no stale
//! snapshot can flip it back to unread.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::protocol::Notification;

/// Single source of truth for the current notification set.
#[derive(Debug, Default)]
pub struct NotificationReconciler {
    entries: HashMap<i64, Notification>,
}

impl NotificationReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a snapshot batch into the current set.
    ///
    /// Union by id: entries pushed before the snapshot arrived are kept,
    /// and an entry marked read by either source stays read.
    pub fn load_snapshot(&mut self, items: Vec<Notification>) {
        for item in items {
            self.merge(item);
        }
    }

    /// Apply one pushed notification: insert if absent, update in place
    /// if present. Never duplicates an id.
    pub fn apply_push(&mut self, item: Notification) {
        self.merge(item);
    }

    /// Mark one notification as read. Returns whether anything changed.
    pub fn mark_read(&mut self, id: i64) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if !entry.is_read => {
                entry.is_read = true;
                true
            }
            _ => false,
        }
    }

    /// Mark every notification as read. Returns how many entries changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for entry in self.entries.values_mut() {
            if !entry.is_read {
                entry.is_read = true;
                changed += 1;
            }
        }
        changed
    }

    /// The reconciled set, newest first.
    ///
    /// Sorted by `created_at` descending; ties broken by `id` descending
    /// so the order is deterministic for equal timestamps.
    pub fn view(&self) -> Vec<Notification> {
        let mut items: Vec<Notification> = self.entries.values().cloned().collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        items
    }

    /// Number of unread notifications. Derived, never stored.
    pub fn unread_count(&self) -> usize {
        self.entries.values().filter(|n| !n.is_read).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn merge(&mut self, incoming: Notification) {
        match self.entries.entry(incoming.id) {
            Entry::Occupied(mut slot) => {
                // Read state is monotonic: true from either side wins
                let is_read = slot.get().is_read || incoming.is_read;
                let entry = slot.get_mut();
                *entry = incoming;
                entry.is_read = is_read;
            }
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    fn notification(id: i64, is_read: bool, created_at_millis: i64) -> Notification {
        Notification {
            id,
            title: format!("title {}", id),
            message: format!("message {}", id),
            is_read,
            created_at: at(created_at_millis),
        }
    }

    #[test]
    fn test_view_contains_one_entry_per_id() {
        // テスト項目: 同じ ID を含む操作列でも view には ID ごとに 1 件だけ残る
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();

        // when (操作):
        reconciler.load_snapshot(vec![
            notification(1, false, 1000),
            notification(2, false, 2000),
        ]);
        reconciler.apply_push(notification(1, false, 1000));
        reconciler.apply_push(notification(3, false, 3000));
        reconciler.load_snapshot(vec![
            notification(2, false, 2000),
            notification(3, false, 3000),
        ]);

        // then (期待する結果):
        let view = reconciler.view();
        assert_eq!(view.len(), 3);
        let mut ids: Vec<i64> = view.iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_read_state_is_monotonic_across_snapshots() {
        // テスト項目: 一度既読になった通知は古いスナップショットで未読に戻らない
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();
        reconciler.load_snapshot(vec![notification(1, false, 1000)]);
        reconciler.mark_read(1);

        // when (操作):
        reconciler.load_snapshot(vec![notification(1, false, 1000)]);

        // then (期待する結果):
        let view = reconciler.view();
        assert_eq!(view.len(), 1);
        assert!(view[0].is_read);
    }

    #[test]
    fn test_snapshot_after_push_merges_read_state() {
        // テスト項目: スナップショット→既読プッシュ→古いスナップショットでも既読が保たれる
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();

        // when (操作):
        reconciler.load_snapshot(vec![notification(1, false, 1000)]);
        reconciler.apply_push(notification(1, true, 1000));
        reconciler.load_snapshot(vec![notification(1, false, 1000)]);

        // then (期待する結果):
        let view = reconciler.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 1);
        assert!(view[0].is_read);
    }

    #[test]
    fn test_push_before_snapshot_is_not_lost() {
        // テスト項目: スナップショット到着前のプッシュがマージ後も失われない
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();

        // when (操作):
        reconciler.apply_push(notification(10, false, 5000));
        reconciler.load_snapshot(vec![
            notification(1, true, 1000),
            notification(2, false, 2000),
        ]);

        // then (期待する結果):
        let view = reconciler.view();
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].id, 10);
    }

    #[test]
    fn test_unread_count_is_derived_after_every_mutation() {
        // テスト項目: どの操作の後でも unread_count が view の未読数と一致する
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();

        let assert_consistent = |r: &NotificationReconciler| {
            let derived = r.view().iter().filter(|n| !n.is_read).count();
            assert_eq!(r.unread_count(), derived);
        };

        // when (操作) / then (期待する結果):
        assert_consistent(&reconciler);

        reconciler.load_snapshot(vec![
            notification(1, false, 1000),
            notification(2, true, 2000),
        ]);
        assert_consistent(&reconciler);
        assert_eq!(reconciler.unread_count(), 1);

        reconciler.apply_push(notification(3, false, 3000));
        assert_consistent(&reconciler);
        assert_eq!(reconciler.unread_count(), 2);

        reconciler.mark_read(1);
        assert_consistent(&reconciler);
        assert_eq!(reconciler.unread_count(), 1);

        reconciler.mark_all_read();
        assert_consistent(&reconciler);
        assert_eq!(reconciler.unread_count(), 0);
    }

    #[test]
    fn test_view_is_sorted_newest_first() {
        // テスト項目: 入力順序に関係なく view は createdAt の降順になる
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();

        // when (操作):
        reconciler.apply_push(notification(5, false, 2000));
        reconciler.load_snapshot(vec![
            notification(1, false, 4000),
            notification(2, false, 1000),
        ]);
        reconciler.apply_push(notification(3, false, 3000));

        // then (期待する結果):
        let ids: Vec<i64> = reconciler.view().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3, 5, 2]);
    }

    #[test]
    fn test_equal_timestamps_break_ties_by_id_descending() {
        // テスト項目: createdAt が同じ場合は ID の降順で安定に並ぶ
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();

        // when (操作):
        reconciler.load_snapshot(vec![
            notification(1, false, 1000),
            notification(3, false, 1000),
            notification(2, false, 1000),
        ]);

        // then (期待する結果):
        let ids: Vec<i64> = reconciler.view().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_apply_push_updates_existing_entry_in_place() {
        // テスト項目: 既存 ID のプッシュは重複を作らず内容を更新する
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();
        reconciler.apply_push(notification(1, false, 1000));

        // when (操作):
        let mut updated = notification(1, false, 1000);
        updated.message = "updated body".to_string();
        reconciler.apply_push(updated);

        // then (期待する結果):
        let view = reconciler.view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].message, "updated body");
    }

    #[test]
    fn test_mark_read_reports_whether_anything_changed() {
        // テスト項目: mark_read は変更があった場合のみ true を返す
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();
        reconciler.apply_push(notification(1, false, 1000));

        // when (操作):
        let first = reconciler.mark_read(1);
        let second = reconciler.mark_read(1);
        let missing = reconciler.mark_read(99);

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(!missing);
    }

    #[test]
    fn test_mark_all_read_counts_changes() {
        // テスト項目: mark_all_read が実際に変更した件数を返す
        // given (前提条件):
        let mut reconciler = NotificationReconciler::new();
        reconciler.load_snapshot(vec![
            notification(1, false, 1000),
            notification(2, true, 2000),
            notification(3, false, 3000),
        ]);

        // when (操作):
        let changed = reconciler.mark_all_read();

        // then (期待する結果):
        assert_eq!(changed, 2);
        assert_eq!(reconciler.unread_count(), 0);
    }
}
