use std::default::Default;

/// Contains Config properties used by every replicated collection
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Upper bound on the entry or operation count a single snapshot or
    /// delta may declare. Larger counts are rejected as malformed before any
    /// allocation happens. A writable collection refuses mutations that would
    /// hold more entries, or leave more unflushed operations, than this.
    pub max_decoded_entries: usize,
    /// Length of the change log at which a warning is logged. Crossing it
    /// usually means nobody is flushing the collection.
    pub change_log_warn_len: usize,
    /// Initial capacity of writers created by the `*_bytes` helpers
    pub writer_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_decoded_entries: 65_536,
            change_log_warn_len: 4_096,
            writer_capacity: 256,
        }
    }
}
