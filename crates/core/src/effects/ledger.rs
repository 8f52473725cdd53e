use std::collections::HashSet;
use std::sync::Mutex;

/// Output files whose success side effects already fired.
///
/// Entries are only ever added, never removed.
#[derive(Debug, Default)]
pub struct DownloadLedger {
    delivered: Mutex<HashSet<String>>,
}

impl DownloadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `output_file`. Returns `true` only for the first claim of a name.
    ///
    /// Check and insert happen under one lock, so two concurrent claims of the
    /// same name cannot both succeed.
    pub fn claim(&self, output_file: &str) -> bool {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(output_file.to_string())
    }

    pub fn contains(&self, output_file: &str) -> bool {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(output_file)
    }

    pub fn len(&self) -> usize {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
