//! Release-window scan over the release listing.
//!
//! The listing order does not say which of the two requested tags is newer,
//! so the scan starts at whichever tag it meets first and then runs until it
//! meets the other one or the cap is reached.

use crate::domain::evidence::ReleaseNote;
use crate::github::ReleaseEntry;

/// Whether the scan wants more entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    Continue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// No boundary tag seen yet; entries are ignored.
    Seeking,
    /// A boundary was seen; collect until `end` or the cap.
    Collecting { end: String },
    Done,
}

/// Single-pass window over releases in provider order.
#[derive(Debug)]
pub struct ReleaseWindow {
    from: String,
    to: String,
    max: usize,
    state: State,
    notes: Vec<ReleaseNote>,
}

impl ReleaseWindow {
    pub fn new(from: &str, to: &str, max: usize) -> Self {
        let state = if max == 0 { State::Done } else { State::Seeking };
        Self {
            from: from.to_string(),
            to: to.to_string(),
            max,
            state,
            notes: Vec::new(),
        }
    }

    /// Feed the next release. Entries with a blank tag are skipped.
    pub fn push(&mut self, entry: &ReleaseEntry) -> Scan {
        let tag = entry.tag_name.as_deref().unwrap_or_default().trim();
        if tag.is_empty() {
            return self.scan();
        }

        let end = match &self.state {
            State::Done => return Scan::Stop,
            State::Collecting { end } => end.clone(),
            State::Seeking if tag == self.from => self.to.clone(),
            State::Seeking if tag == self.to => self.from.clone(),
            State::Seeking => return Scan::Continue,
        };

        self.notes
            .push(ReleaseNote::new(tag, entry.body.as_deref().unwrap_or_default()));

        self.state = if tag == end || self.notes.len() >= self.max {
            State::Done
        } else {
            State::Collecting { end }
        };
        self.scan()
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    fn scan(&self) -> Scan {
        if self.is_done() {
            Scan::Stop
        } else {
            Scan::Continue
        }
    }

    /// Collected notes, in the order they were encountered.
    pub fn into_notes(mut self) -> Vec<ReleaseNote> {
        self.notes.truncate(self.max);
        self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(entries: &[(&str, &str)], from: &str, to: &str, max: usize) -> Vec<(String, String)> {
        let mut window = ReleaseWindow::new(from, to, max);
        for (tag, body) in entries {
            if window.push(&ReleaseEntry::new(*tag, *body)) == Scan::Stop {
                break;
            }
        }
        window
            .into_notes()
            .into_iter()
            .map(|n| (n.tag, n.body))
            .collect()
    }

    fn tags(notes: &[(String, String)]) -> Vec<&str> {
        notes.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[test]
    fn test_newest_first_listing() {
        let notes = run(&[("v1.1.0", "B"), ("v1.0.0", "A")], "v1.0.0", "v1.1.0", 30);
        assert_eq!(
            notes,
            vec![
                ("v1.1.0".to_string(), "B".to_string()),
                ("v1.0.0".to_string(), "A".to_string())
            ]
        );
    }

    #[test]
    fn test_oldest_first_listing_is_direction_independent() {
        let notes = run(&[("v1.0.0", "A"), ("v1.1.0", "B")], "v1.0.0", "v1.1.0", 30);
        assert_eq!(tags(&notes), vec!["v1.0.0", "v1.1.0"]);
    }

    #[test]
    fn test_ignores_entries_outside_window() {
        let notes = run(
            &[("v3.0.0", ""), ("v2.0.0", ""), ("v1.5.0", ""), ("v1.0.0", ""), ("v0.9.0", "")],
            "v1.0.0",
            "v2.0.0",
            30,
        );
        assert_eq!(tags(&notes), vec!["v2.0.0", "v1.5.0", "v1.0.0"]);
    }

    #[test]
    fn test_cap_stops_collection() {
        let entries: Vec<(String, String)> =
            (0..10).rev().map(|i| (format!("v{i}"), String::new())).collect();
        let borrowed: Vec<(&str, &str)> =
            entries.iter().map(|(t, b)| (t.as_str(), b.as_str())).collect();

        let mut window = ReleaseWindow::new("v0", "v9", 3);
        let mut fed = 0;
        for (tag, body) in &borrowed {
            fed += 1;
            if window.push(&ReleaseEntry::new(*tag, *body)) == Scan::Stop {
                break;
            }
        }
        assert_eq!(fed, 3);
        assert!(window.is_done());
        assert_eq!(window.into_notes().len(), 3);
    }

    #[test]
    fn test_done_window_admits_nothing() {
        let mut window = ReleaseWindow::new("v1", "v2", 1);
        assert_eq!(window.push(&ReleaseEntry::new("v2", "")), Scan::Stop);
        assert_eq!(window.push(&ReleaseEntry::new("v1.5", "")), Scan::Stop);
        assert_eq!(window.push(&ReleaseEntry::new("v1", "")), Scan::Stop);
        assert_eq!(window.into_notes().len(), 1);
    }

    #[test]
    fn test_missing_boundaries_yield_nothing() {
        let notes = run(&[("v9", ""), ("v8", "")], "v1", "v2", 30);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_blank_tags_are_skipped() {
        let mut window = ReleaseWindow::new("v1", "v2", 30);
        window.push(&ReleaseEntry::new("v2", "two"));
        window.push(&ReleaseEntry::new("  ", "ghost"));
        window.push(&ReleaseEntry::default());
        window.push(&ReleaseEntry::new("v1", "one"));
        assert!(window.is_done());
        let notes = window.into_notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].body, "one");
    }

    #[test]
    fn test_same_from_and_to_collects_one() {
        let notes = run(&[("v2", "x"), ("v1", "y")], "v1", "v1", 30);
        assert_eq!(tags(&notes), vec!["v1"]);
    }
}
