use std::collections::VecDeque;
use std::fmt;

/// Identifies one enqueued entry for its whole lifetime, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending track: the URL it was requested with and the title shown for it
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub id: EntryId,
    pub url: String,
    pub title: String,
}

/// Ordered playback queue. The head is the track currently playing (or about to).
///
/// URLs and titles live in the same entry, so the two always line up.
#[derive(Debug, Default)]
pub struct QueueStore {
    entries: VecDeque<QueueEntry>,
    next_id: u64,
}

impl QueueStore {
    /// Create a new, empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its id
    pub fn enqueue(&mut self, url: impl Into<String>, title: impl Into<String>) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push_back(QueueEntry {
            id,
            url: url.into(),
            title: title.into(),
        });
        id
    }

    /// Remove and return the head entry
    pub fn dequeue_head(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Remove the entry with the given id, wherever it is
    pub fn remove(&mut self, id: EntryId) -> Option<QueueEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(index)
    }

    /// Replace the display title of an entry. Returns false if the entry is gone.
    pub fn set_title(&mut self, id: EntryId, title: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn peek_head_url(&self) -> Option<&str> {
        self.head().map(|entry| entry.url.as_str())
    }

    /// 1-based position of an entry
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .map(|index| index + 1)
    }

    pub fn entries(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.url.as_str())
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.title.as_str())
    }

    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn queue() -> QueueStore {
        let mut queue = QueueStore::new();
        queue.enqueue("https://youtu.be/a", "A");
        queue.enqueue("https://youtu.be/b", "B");
        queue.enqueue("https://youtu.be/c", "C");
        queue
    }

    fn assert_aligned(queue: &QueueStore) {
        assert_eq!(queue.urls().count(), queue.titles().count());
        assert_eq!(queue.urls().count(), queue.len());
    }

    #[rstest]
    fn test_enqueue_preserves_order(queue: QueueStore) {
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek_head_url(), Some("https://youtu.be/a"));
        assert_eq!(queue.titles().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_aligned(&queue);
    }

    #[rstest]
    fn test_dequeue_head(mut queue: QueueStore) {
        let head = queue.dequeue_head().unwrap();
        assert_eq!(head.title, "A");
        assert_eq!(queue.peek_head_url(), Some("https://youtu.be/b"));
        assert_aligned(&queue);
    }

    #[test]
    fn test_dequeue_empty_is_none() {
        let mut queue = QueueStore::new();
        assert!(queue.dequeue_head().is_none());
        assert!(queue.is_empty());
        assert_eq!(queue.peek_head_url(), None);
    }

    #[rstest]
    fn test_remove_by_id(mut queue: QueueStore) {
        let middle = queue.entries().nth(1).unwrap().id;
        let removed = queue.remove(middle).unwrap();
        assert_eq!(removed.title, "B");
        assert!(queue.remove(middle).is_none());
        assert_eq!(queue.titles().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_aligned(&queue);
    }

    #[test]
    fn test_duplicate_urls_get_distinct_ids() {
        let mut queue = QueueStore::new();
        let first = queue.enqueue("https://youtu.be/a", "A");
        let second = queue.enqueue("https://youtu.be/a", "A");
        assert_ne!(first, second);
        assert_eq!(queue.len(), 2);

        queue.remove(first);
        assert_eq!(queue.head().map(|entry| entry.id), Some(second));
    }

    #[test]
    fn test_ids_are_not_reused_after_clear() {
        let mut queue = QueueStore::new();
        let first = queue.enqueue("https://youtu.be/a", "A");
        queue.clear();
        let second = queue.enqueue("https://youtu.be/a", "A");
        assert!(second > first);
    }

    #[rstest]
    fn test_set_title_and_position(mut queue: QueueStore) {
        let last = queue.entries().last().unwrap().id;
        assert!(queue.set_title(last, "C (remastered)"));
        assert_eq!(queue.position(last), Some(3));
        assert_eq!(queue.titles().last(), Some("C (remastered)"));

        queue.clear();
        assert!(!queue.set_title(last, "gone"));
        assert_eq!(queue.position(last), None);
        assert_aligned(&queue);
    }
}
