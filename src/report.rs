use std::path::{Path, PathBuf};

/// Per-item outcome printed as a one character marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// A digest was newly computed and recorded.
    Added,
    /// The file vanished before it could be hashed.
    Missing,
    /// A file or checksum file could not be read or written.
    Denied,
    /// Verification found a digest different from the recorded one.
    Mismatch,
}

impl Marker {
    pub fn symbol(self) -> char {
        match self {
            Marker::Added => '+',
            Marker::Missing => '?',
            Marker::Denied => '!',
            Marker::Mismatch => 'X',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub marker: Marker,
    pub path: PathBuf,
}

pub trait Reporter {
    fn report(&mut self, marker: Marker, path: &Path);
}

/// Prints `<marker> <path>` lines on stdout as they happen.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&mut self, marker: Marker, path: &Path) {
        println!("{} {}", marker.symbol(), path.display());
    }
}

impl Reporter for Vec<Event> {
    fn report(&mut self, marker: Marker, path: &Path) {
        self.push(Event {
            marker,
            path: path.to_path_buf(),
        });
    }
}

/// Counts events per marker while forwarding them.
pub struct Tally<'a> {
    inner: &'a mut dyn Reporter,
    pub added: usize,
    pub missing: usize,
    pub denied: usize,
    pub mismatched: usize,
}

impl<'a> Tally<'a> {
    pub fn new(inner: &'a mut dyn Reporter) -> Self {
        Tally {
            inner,
            added: 0,
            missing: 0,
            denied: 0,
            mismatched: 0,
        }
    }
}

impl Reporter for Tally<'_> {
    fn report(&mut self, marker: Marker, path: &Path) {
        match marker {
            Marker::Added => self.added += 1,
            Marker::Missing => self.missing += 1,
            Marker::Denied => self.denied += 1,
            Marker::Mismatch => self.mismatched += 1,
        }
        self.inner.report(marker, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols() {
        assert_eq!(Marker::Added.symbol(), '+');
        assert_eq!(Marker::Missing.symbol(), '?');
        assert_eq!(Marker::Denied.symbol(), '!');
        assert_eq!(Marker::Mismatch.symbol(), 'X');
    }

    #[test]
    fn test_tally_counts_and_forwards() {
        let mut events: Vec<Event> = Vec::new();
        let mut tally = Tally::new(&mut events);

        tally.report(Marker::Added, Path::new("a"));
        tally.report(Marker::Added, Path::new("b"));
        tally.report(Marker::Mismatch, Path::new("c"));

        assert_eq!(tally.added, 2);
        assert_eq!(tally.mismatched, 1);
        assert_eq!(tally.missing, 0);
        assert_eq!(tally.denied, 0);
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].marker, Marker::Mismatch);
    }
}
