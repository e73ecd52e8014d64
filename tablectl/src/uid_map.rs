//! Registry of UID ranges whose packets are marked for a secondary table.

/// Tracks which `[start, end] -> mark` associations are currently installed.
///
/// Both operations return `false` when the association is rejected: an invalid or overlapping
/// range on add, or one that does not exist on remove.
pub trait UidMarkRegistry: Send {
    /// Records that `[uid_start, uid_end]` is marked with `mark`.
    fn add(&mut self, uid_start: u32, uid_end: u32, mark: u32) -> bool;
    /// Forgets exactly that association.
    fn remove(&mut self, uid_start: u32, uid_end: u32, mark: u32) -> bool;
}

impl<U: UidMarkRegistry + ?Sized> UidMarkRegistry for Box<U> {
    fn add(&mut self, uid_start: u32, uid_end: u32, mark: u32) -> bool {
        (**self).add(uid_start, uid_end, mark)
    }

    fn remove(&mut self, uid_start: u32, uid_end: u32, mark: u32) -> bool {
        (**self).remove(uid_start, uid_end, mark)
    }
}

/// A UID range and the mark set on packets its owners send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidMarkEntry {
    /// First UID of the range.
    pub uid_start: u32,
    /// Last UID of the range, inclusive.
    pub uid_end: u32,
    /// Table number of the interface the range is routed through.
    pub mark: u32,
}

impl UidMarkEntry {
    fn overlaps(&self, uid_start: u32, uid_end: u32) -> bool {
        self.uid_start <= uid_end && uid_start <= self.uid_end
    }
}

/// In-memory [`UidMarkRegistry`] keeping ranges disjoint.
#[derive(Debug, Clone, Default)]
pub struct UidMarkMap {
    entries: Vec<UidMarkEntry>,
}

impl UidMarkMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mark applied to packets owned by `uid`, if any range covers it.
    pub fn mark_for_uid(&self, uid: u32) -> Option<u32> {
        self.entries.iter().find(|e| e.uid_start <= uid && uid <= e.uid_end).map(|e| e.mark)
    }

    /// The ranges in insertion order.
    pub fn entries(&self) -> &[UidMarkEntry] {
        &self.entries
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no range is marked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UidMarkRegistry for UidMarkMap {
    fn add(&mut self, uid_start: u32, uid_end: u32, mark: u32) -> bool {
        if uid_start > uid_end {
            tracing::debug!(uid_start, uid_end, "rejecting inverted uid range");
            return false;
        }

        if let Some(existing) = self.entries.iter().find(|e| e.overlaps(uid_start, uid_end)) {
            tracing::debug!(uid_start, uid_end, ?existing, "rejecting overlapping uid range");
            return false;
        }

        self.entries.push(UidMarkEntry { uid_start, uid_end, mark });
        true
    }

    fn remove(&mut self, uid_start: u32, uid_end: u32, mark: u32) -> bool {
        let entry = UidMarkEntry { uid_start, uid_end, mark };
        match self.entries.iter().position(|e| *e == entry) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }
}
