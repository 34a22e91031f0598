use crate::config::{AddressLayout, ValidConfig};
use crate::memory::{FrameIndex, FramePool};
use crate::page_table::PageTable;
use crate::replacement::{ClockHand, ReplacementPolicy};
use crate::stats::Statistics;
use crate::translation::{AccessMode, FaultEvent, TranslationResult, VirtualAddress, Vpn};

/// Owns the page table, frame pool, clock hand and counters for one run
pub struct MemoryManager {
    page_table: PageTable,
    frames: FramePool,
    hand: ClockHand,
    stats: Statistics,
    // logical clock, one tick per translation
    now: u64,
}

impl MemoryManager {
    pub fn new(config: &ValidConfig) -> Self {
        MemoryManager {
            page_table: PageTable::new(&config.layout),
            frames: FramePool::new(config.frames),
            hand: ClockHand::new(config.policy, config.recent_age),
            stats: Statistics::new(config.layout.page_size()),
            now: 0,
        }
    }

    pub fn layout(&self) -> &AddressLayout {
        self.page_table.layout()
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn frames(&self) -> &FramePool {
        &self.frames
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.hand.policy()
    }

    /// Current logical time
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Translate `vaddr` as an access of unknown kind
    pub fn translate(&mut self, vaddr: u64) -> TranslationResult {
        self.translate_access(vaddr, None)
    }

    /// Translate `vaddr`; a miss installs the mapping and reports the fault.
    ///
    /// The faulting access itself never yields a physical address. The next
    /// access to the same page hits unless its frame was taken in between.
    pub fn translate_access(&mut self, vaddr: u64, mode: Option<AccessMode>) -> TranslationResult {
        self.now += 1;
        self.stats.record_translation();

        let va = VirtualAddress::from_raw(vaddr, self.layout());

        match self.page_table.lookup(va.vpn) {
            Some(frame) => {
                self.stats.record_hit();
                self.frames.touch(frame, self.now, mode);
                TranslationResult::Success(va.physical(frame, self.page_table.layout()))
            }
            None => {
                self.stats.record_fault();
                let mut event = self.handle_fault(va.vpn);
                event.vaddr = vaddr;
                if mode == Some(AccessMode::Write) {
                    self.frames.touch(event.frame, self.now, mode);
                }
                TranslationResult::PageFault(event)
            }
        }
    }

    /// Find a frame for `vpn`, evicting the current occupant if needed,
    /// and map it.
    pub fn handle_fault(&mut self, vpn: Vpn) -> FaultEvent {
        let (frame, replacement) = match self.frames.find_free() {
            Some(frame) => (frame, false),
            None => {
                self.stats.record_replacement();
                (self.hand.select_victim(&mut self.frames, self.now), true)
            }
        };

        let evicted_dirty = self.frames.get(frame).dirty();
        let evicted = self.evict(frame);

        self.page_table.bind(vpn, frame, self.now);
        self.frames.mark_occupied(frame, vpn, self.now);
        self.stats.record_allocation();

        log::debug!(
            "fault: vpn {:#x} -> frame {} (evicted {:?}, replacement {})",
            vpn,
            frame,
            evicted,
            replacement
        );

        FaultEvent {
            vaddr: vpn << self.layout().offset_bits(),
            vpn,
            frame,
            evicted,
            evicted_dirty: evicted.is_some() && evicted_dirty,
            replacement,
        }
    }

    /// Unmap whatever page `frame` holds
    fn evict(&mut self, frame: FrameIndex) -> Option<Vpn> {
        let old = self.frames.mark_free(frame)?;
        let unmapped = self.page_table.invalidate(old);
        debug_assert_eq!(unmapped, Some(frame), "frame {} and page table disagree on vpn {:#x}", frame, old);
        Some(old)
    }
}
