//! Working memory: two bounded FIFO buffers of recent events.

use agentsuite_core::memory::{MemoryItem, MemoryKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 10;

/// Recent text and recent actions, each capped independently.
///
/// Inserting into a full buffer evicts its oldest item, which is handed
/// back to the caller so it can be promoted or dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingMemory {
    max_text_items: usize,
    max_action_items: usize,
    #[serde(default)]
    text_history: VecDeque<MemoryItem>,
    #[serde(default)]
    action_history: VecDeque<MemoryItem>,
}

impl WorkingMemory {
    pub fn new(max_text_items: usize, max_action_items: usize) -> Self {
        Self {
            max_text_items,
            max_action_items,
            text_history: VecDeque::with_capacity(max_text_items),
            action_history: VecDeque::with_capacity(max_action_items),
        }
    }

    pub fn max_text_items(&self) -> usize {
        self.max_text_items
    }

    pub fn max_action_items(&self) -> usize {
        self.max_action_items
    }

    /// Record a text event. Returns the evicted item, if any.
    pub fn add_text(&mut self, content: impl Into<String>) -> Option<MemoryItem> {
        self.push(MemoryItem::text(content))
    }

    /// Record an action event. Returns the evicted item, if any.
    pub fn add_action(&mut self, content: impl Into<String>) -> Option<MemoryItem> {
        self.push(MemoryItem::action(content))
    }

    /// Insert an existing item into the buffer matching its kind.
    pub fn push(&mut self, item: MemoryItem) -> Option<MemoryItem> {
        let (buffer, capacity) = match item.kind {
            MemoryKind::Text => (&mut self.text_history, self.max_text_items),
            MemoryKind::Action => (&mut self.action_history, self.max_action_items),
        };
        if capacity == 0 {
            return Some(item);
        }
        let evicted = if buffer.len() >= capacity {
            buffer.pop_front()
        } else {
            None
        };
        buffer.push_back(item);
        evicted
    }

    /// Case-insensitive substring search, text before actions, newest first.
    ///
    /// An empty phrase returns the newest `k` items across both buffers.
    pub fn recall(&self, phrase: &str, k: usize) -> Vec<MemoryItem> {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            let mut text = self.text_history.iter().rev().peekable();
            let mut actions = self.action_history.iter().rev().peekable();
            let mut newest = Vec::with_capacity(k);
            while newest.len() < k {
                let next = match (text.peek(), actions.peek()) {
                    (Some(t), Some(a)) if a.created_at > t.created_at => actions.next(),
                    (Some(_), _) => text.next(),
                    (None, _) => actions.next(),
                };
                match next {
                    Some(item) => newest.push(item.clone()),
                    None => break,
                }
            }
            return newest;
        }

        self.text_history
            .iter()
            .rev()
            .chain(self.action_history.iter().rev())
            .filter(|item| item.content.to_lowercase().contains(&phrase))
            .take(k)
            .cloned()
            .collect()
    }

    /// The newest `k` text items, oldest first.
    pub fn recent_text(&self, k: usize) -> Vec<MemoryItem> {
        newest_in_order(&self.text_history, k)
    }

    /// The newest `k` action items, oldest first.
    pub fn recent_actions(&self, k: usize) -> Vec<MemoryItem> {
        newest_in_order(&self.action_history, k)
    }

    pub fn text_history(&self) -> impl Iterator<Item = &MemoryItem> {
        self.text_history.iter()
    }

    pub fn action_history(&self) -> impl Iterator<Item = &MemoryItem> {
        self.action_history.iter()
    }

    pub fn len(&self) -> usize {
        self.text_history.len() + self.action_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty both buffers, returning text items then action items, oldest first.
    pub fn drain(&mut self) -> Vec<MemoryItem> {
        self.text_history
            .drain(..)
            .chain(self.action_history.drain(..))
            .collect()
    }
}

impl Default for WorkingMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_CAPACITY)
    }
}

fn newest_in_order(buffer: &VecDeque<MemoryItem>, k: usize) -> Vec<MemoryItem> {
    let skip = buffer.len().saturating_sub(k);
    buffer.iter().skip(skip).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(items: &[MemoryItem]) -> Vec<&str> {
        items.iter().map(|i| i.content.as_str()).collect()
    }

    #[test]
    fn eviction_keeps_most_recent() {
        let mut wm = WorkingMemory::new(3, 3);
        for i in 0..3 {
            assert!(wm.add_text(format!("t{i}")).is_none());
        }
        let evicted = wm.add_text("t3").unwrap();
        assert_eq!(evicted.content, "t0");
        wm.add_text("t4");

        let all: Vec<_> = wm.text_history().map(|i| i.content.as_str()).collect();
        assert_eq!(all, vec!["t2", "t3", "t4"]);
        assert_eq!(wm.len(), 3);
    }

    #[test]
    fn buffers_are_independent() {
        let mut wm = WorkingMemory::new(1, 2);
        wm.add_action("a0");
        wm.add_action("a1");
        assert!(wm.add_text("t0").is_none());
        let evicted = wm.add_text("t1").unwrap();
        assert_eq!(evicted.kind, MemoryKind::Text);
        assert_eq!(wm.action_history().count(), 2);
    }

    #[test]
    fn zero_capacity_evicts_immediately() {
        let mut wm = WorkingMemory::new(0, 0);
        assert_eq!(wm.add_text("gone").unwrap().content, "gone");
        assert!(wm.is_empty());
    }

    #[test]
    fn recent_is_chronological() {
        let mut wm = WorkingMemory::default();
        for i in 0..5 {
            wm.add_text(format!("t{i}"));
            wm.add_action(format!("a{i}"));
        }
        assert_eq!(contents(&wm.recent_text(2)), vec!["t3", "t4"]);
        assert_eq!(contents(&wm.recent_actions(3)), vec!["a2", "a3", "a4"]);
        assert_eq!(wm.recent_text(50).len(), 5);
    }

    #[test]
    fn recall_matches_case_insensitively_text_first() {
        let mut wm = WorkingMemory::default();
        wm.add_text("Weather in Paris is mild");
        wm.add_text("Nothing relevant");
        wm.add_action("Action: get_weather | Args: {\"city\":\"paris\"}");
        wm.add_text("PARIS again");

        let hits = wm.recall("paris", 10);
        assert_eq!(
            contents(&hits),
            vec![
                "PARIS again",
                "Weather in Paris is mild",
                "Action: get_weather | Args: {\"city\":\"paris\"}",
            ]
        );
        assert_eq!(wm.recall("paris", 1).len(), 1);
    }

    #[test]
    fn empty_phrase_returns_newest() {
        let mut wm = WorkingMemory::default();
        wm.add_text("one");
        wm.add_text("two");
        wm.add_text("three");
        assert_eq!(contents(&wm.recall("", 2)), vec!["three", "two"]);
        assert_eq!(wm.recall("  ", 10).len(), 3);
    }

    #[test]
    fn drain_empties_both() {
        let mut wm = WorkingMemory::default();
        wm.add_action("a");
        wm.add_text("t");
        let drained = wm.drain();
        assert_eq!(contents(&drained), vec!["t", "a"]);
        assert!(wm.is_empty());
    }

    #[test]
    fn serde_round_trip_keeps_contents() {
        let mut wm = WorkingMemory::new(4, 2);
        wm.add_text("remember me");
        let json = serde_json::to_string(&wm).unwrap();
        let restored: WorkingMemory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.max_text_items(), 4);
        assert_eq!(restored.recent_text(1)[0].content, "remember me");
    }
}
