use std::collections::VecDeque;

use crate::types::LogEntry;

/// Insertion-ordered log capped at `capacity` entries; the oldest entry goes first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `entry`, returning the entry evicted to stay within capacity.
    pub fn push(&mut self, entry: LogEntry) -> Option<LogEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Drops every entry and leaves `placeholder` as the only one.
    pub fn reset(&mut self, placeholder: LogEntry) {
        self.entries.clear();
        self.entries.push_back(placeholder);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}
