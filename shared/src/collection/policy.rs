/// Host-supplied predicates deciding whether a collection may be mutated and
/// whether its mutations are recorded for replication.
pub struct SyncPolicy {
    is_writable: Box<dyn Fn() -> bool>,
    is_recording: Box<dyn Fn() -> bool>,
}

impl SyncPolicy {
    pub fn new(
        is_writable: impl Fn() -> bool + 'static,
        is_recording: impl Fn() -> bool + 'static,
    ) -> Self {
        Self {
            is_writable: Box::new(is_writable),
            is_recording: Box::new(is_recording),
        }
    }

    /// Policy of the authoritative copy: writable and recording
    pub fn authority() -> Self {
        Self::new(|| true, || true)
    }

    /// Policy of a mirrored copy: read-only to callers, never recording
    pub fn mirror() -> Self {
        Self::new(|| false, || false)
    }

    pub fn is_writable(&self) -> bool {
        (self.is_writable)()
    }

    pub fn is_recording(&self) -> bool {
        (self.is_recording)()
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::authority()
    }
}
