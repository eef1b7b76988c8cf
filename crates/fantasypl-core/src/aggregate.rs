// Mutex-guarded collection that fetch workers append their entries to.

use parking_lot::Mutex;

use crate::entry::Entry;

/// Shared, append-only entry collection for one league's fetch phase.
///
/// Workers hold it behind an `Arc` and call [`append`](Self::append)
/// concurrently. Appends are serialized, so none is lost; their order is
/// whatever order the workers finish in.
#[derive(Debug, Default)]
pub struct EntryAggregator {
    entries: Mutex<Vec<Entry>>,
}

impl EntryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Add one entry. Exclusion filtering is the caller's job.
    pub fn append(&self, entry: Entry) {
        self.entries.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Take everything appended so far, leaving the aggregator empty.
    /// Only meaningful once every worker has been joined.
    pub fn take_entries(&self) -> Vec<Entry> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries.into_inner()
    }
}
