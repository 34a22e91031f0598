pub const ADDRESS_BITS: u32 = 32;
pub const MAX_ADDRESS_BITS: u32 = 64;

pub const OFFSET_BITS: u32 = 12;
pub const PAGE_SIZE: u64 = 1 << OFFSET_BITS;

pub const LEVEL_BITS: u32 = 10;
pub const ENTRIES_PER_LEVEL: usize = 1 << LEVEL_BITS;
// widest single level; one node of 2^24 entries is already hundreds of MiB
pub const MAX_LEVEL_BITS: u32 = 24;

// logical ticks since last access after which an unreferenced frame may be evicted
pub const RECENT_AGE: u64 = 10;

pub const PAGE_FAULT: i64 = -1;
