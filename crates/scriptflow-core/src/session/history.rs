//! Visited-screen log of the active session.

/// Ordered, append-only log of visited screen ids.
///
/// Duplicates are allowed. Entries are removed only by `pop` (back
/// navigation) and `clear` (reset). The current screen is the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStack {
    entries: Vec<String>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>) {
        self.entries.push(id.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

impl<S: Into<String>> FromIterator<S> for HistoryStack {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}
