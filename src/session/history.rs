//! Bounded undo history of table snapshots.

use crate::models::Table;

/// Maximum number of snapshots kept; the oldest is evicted beyond this.
pub const HISTORY_CAPACITY: usize = 5;

/// LIFO stack of table snapshots with a fixed capacity.
///
/// A snapshot is a full value copy of the table; once pushed it is never
/// mutated, only popped or evicted.
#[derive(Debug, Default)]
pub struct History {
    stack: Vec<Table>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a snapshot, evicting the oldest entry past capacity.
    pub fn push(&mut self, snapshot: Table) {
        self.stack.push(snapshot);
        if self.stack.len() > HISTORY_CAPACITY {
            self.stack.remove(0);
        }
    }

    /// Pop the most recent snapshot.
    pub fn pop(&mut self) -> Option<Table> {
        self.stack.pop()
    }

    /// Drop the most recent snapshot without returning it.
    ///
    /// Used to roll a push back when the operator it guarded failed.
    pub fn discard_last(&mut self) {
        self.stack.pop();
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbered_table(n: usize) -> Table {
        let mut row = serde_json::Map::new();
        row.insert("n".to_string(), json!(n));
        Table::new(vec!["n".to_string()], vec![row])
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new();
        for i in 1..=7 {
            history.push(numbered_table(i));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);

        // The five most recent remain, popped newest-first.
        for expected in (3..=7).rev() {
            let table = history.pop().unwrap();
            assert_eq!(table.rows[0]["n"], json!(expected));
        }
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_discard_last_removes_newest() {
        let mut history = History::new();
        history.push(numbered_table(1));
        history.push(numbered_table(2));

        history.discard_last();

        assert_eq!(history.len(), 1);
        assert_eq!(history.pop().unwrap().rows[0]["n"], json!(1));
    }

    #[test]
    fn test_empty_pop_is_none() {
        let mut history = History::new();
        assert!(history.pop().is_none());
        history.discard_last();
        assert!(history.is_empty());
    }
}
