//! Ordered list of tracks to play, optionally shuffled.

use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// A looping play queue.
#[derive(Debug, Clone)]
pub struct Playlist {
    entries: Vec<PathBuf>,
    index: usize,
}

impl Playlist {
    /// Creates a playlist; `shuffle` randomizes the order once up front.
    pub fn new(mut entries: Vec<PathBuf>, shuffle: bool) -> Self {
        if shuffle {
            entries.shuffle(&mut rand::rng());
            tracing::debug!("Playlist shuffled ({} entries)", entries.len());
        }
        Self { entries, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based position of the current entry.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    pub fn current(&self) -> Option<&Path> {
        self.entries.get(self.index).map(PathBuf::as_path)
    }

    /// Moves to the next entry, wrapping to the first after the last.
    pub fn advance(&mut self) -> Option<&Path> {
        if self.entries.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.entries.len();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_advance_wraps() {
        let mut list = Playlist::new(paths(&["a.wav", "b.wav"]), false);
        assert_eq!(list.current(), Some(Path::new("a.wav")));
        assert_eq!(list.advance(), Some(Path::new("b.wav")));
        assert_eq!(list.position(), 2);
        assert_eq!(list.advance(), Some(Path::new("a.wav")));
    }

    #[test]
    fn test_shuffle_keeps_entries() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let list = Playlist::new(paths(&names), true);
        let mut seen: Vec<_> = list.entries.clone();
        seen.sort();
        assert_eq!(seen, paths(&names));
    }

    #[test]
    fn test_empty_playlist() {
        let mut list = Playlist::new(Vec::new(), true);
        assert!(list.is_empty());
        assert_eq!(list.current(), None);
        assert_eq!(list.advance(), None);
    }
}
