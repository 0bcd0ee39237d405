//! Content fingerprinting to skip polls whose source did not change.

use std::fmt;

/// MD5 digest of the raw bytes a source returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Fingerprint the given bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(md5::compute(bytes).0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Result of comparing fetched bytes with the last committed fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Same content as the last committed poll.
    Unchanged,
    /// New content, or no fingerprint committed yet. Carries the new fingerprint.
    Changed(Fingerprint),
}

/// Remembers the fingerprint of the last processed content.
///
/// The detector only moves forward on [`commit`](Self::commit), so a failed
/// fetch (which never reaches [`check`](Self::check)) leaves the previous
/// state intact.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<Fingerprint>,
}

impl ChangeDetector {
    /// Create a detector with no history; the first check reports a change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `bytes` with the last committed fingerprint.
    pub fn check(&self, bytes: &[u8]) -> Change {
        let fingerprint = Fingerprint::of(bytes);
        if self.last == Some(fingerprint) {
            Change::Unchanged
        } else {
            Change::Changed(fingerprint)
        }
    }

    /// Record `fingerprint` as the latest processed content.
    pub fn commit(&mut self, fingerprint: Fingerprint) {
        self.last = Some(fingerprint);
    }

    /// The last committed fingerprint, if any.
    pub fn last(&self) -> Option<Fingerprint> {
        self.last
    }
}
