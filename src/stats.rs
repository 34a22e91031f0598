use std::fmt;

/// Running counters for one simulation run.
///
/// Only the memory manager records events; everything else reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    page_size: u64,
    translations: u64,
    hits: u64,
    faults: u64,
    replacements: u64,
    frames_allocated: u64,
}

impl Statistics {
    pub fn new(page_size: u64) -> Self {
        Statistics {
            page_size,
            ..Default::default()
        }
    }

    pub(crate) fn record_translation(&mut self) {
        self.translations += 1;
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_fault(&mut self) {
        self.faults += 1;
    }

    pub(crate) fn record_replacement(&mut self) {
        self.replacements += 1;
    }

    pub(crate) fn record_allocation(&mut self) {
        self.frames_allocated += 1;
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn translations(&self) -> u64 {
        self.translations
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    pub fn frames_allocated(&self) -> u64 {
        self.frames_allocated
    }

    pub fn bytes_committed(&self) -> u64 {
        self.frames_allocated * self.page_size
    }

    /// Fraction of translations that hit, 0 when nothing was translated
    pub fn hit_rate(&self) -> f64 {
        if self.translations == 0 {
            0.0
        } else {
            self.hits as f64 / self.translations as f64
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Page size: {} bytes", self.page_size)?;
        writeln!(f, "Page replacements: {}", self.replacements)?;
        writeln!(
            f,
            "Page table hits: {} of {} addresses ({:.2}%)",
            self.hits,
            self.translations,
            self.hit_rate() * 100.0
        )?;
        writeln!(f, "Page faults: {}", self.faults)?;
        writeln!(f, "Frames allocated: {}", self.frames_allocated)?;
        write!(f, "Bytes committed: {}", self.bytes_committed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let stats = Statistics::new(4096);
        assert_eq!(stats.page_size(), 4096);
        assert_eq!(stats.translations(), 0);
        assert_eq!(stats.bytes_committed(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_bytes_committed_follows_allocations() {
        let mut stats = Statistics::new(4096);
        stats.record_allocation();
        stats.record_allocation();
        stats.record_allocation();
        assert_eq!(stats.frames_allocated(), 3);
        assert_eq!(stats.bytes_committed(), 3 * 4096);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = Statistics::new(4096);
        for _ in 0..4 {
            stats.record_translation();
        }
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 0.25);
    }

    #[test]
    fn test_display_summary() {
        let mut stats = Statistics::new(4096);
        stats.record_translation();
        stats.record_fault();
        stats.record_allocation();
        stats.record_translation();
        stats.record_hit();

        let summary = stats.to_string();
        assert!(summary.contains("Page size: 4096 bytes"));
        assert!(summary.contains("Page table hits: 1 of 2 addresses (50.00%)"));
        assert!(summary.contains("Bytes committed: 4096"));
    }
}
