use crate::constants::*;
use crate::error::ConfigError;
use crate::replacement::ReplacementPolicy;

/// Startup parameters for one simulation run, before validation.
///
/// Counts and ages are signed so that non-positive values coming from the
/// command line can be rejected with a descriptive [`ConfigError`] instead
/// of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub address_bits: u32,
    pub page_size: u64,
    pub entries_per_level: u64,
    /// Explicit per-level widths, most significant level first
    pub level_bits: Option<Vec<u32>>,
    pub frames: i64,
    pub recent_age: i64,
    pub policy: ReplacementPolicy,
    pub limit: Option<i64>,
}

impl SimConfig {
    pub fn new(frames: i64) -> Self {
        SimConfig {
            address_bits: ADDRESS_BITS,
            page_size: PAGE_SIZE,
            entries_per_level: ENTRIES_PER_LEVEL as u64,
            level_bits: None,
            frames,
            recent_age: RECENT_AGE as i64,
            policy: ReplacementPolicy::default(),
            limit: None,
        }
    }

    /// Check every parameter and derive the address layout
    pub fn validate(&self) -> Result<ValidConfig, ConfigError> {
        if self.frames <= 0 {
            return Err(ConfigError::NonPositiveFrames(self.frames));
        }
        if self.recent_age <= 0 {
            return Err(ConfigError::NonPositiveRecentAge(self.recent_age));
        }
        if let Some(limit) = self.limit {
            if limit <= 0 {
                return Err(ConfigError::NonPositiveLimit(limit));
            }
        }

        let layout = match &self.level_bits {
            Some(widths) => {
                AddressLayout::with_levels(self.address_bits, self.page_size, widths.clone())?
            }
            None => AddressLayout::uniform(self.address_bits, self.page_size, self.entries_per_level)?,
        };

        Ok(ValidConfig {
            layout,
            frames: self.frames as usize,
            recent_age: self.recent_age as u64,
            policy: self.policy,
            limit: self.limit.map(|l| l as usize),
        })
    }
}

/// Configuration that passed validation; the only way to build a memory manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidConfig {
    pub layout: AddressLayout,
    pub frames: usize,
    pub recent_age: u64,
    pub policy: ReplacementPolicy,
    pub limit: Option<usize>,
}

/// How a virtual address splits into page-table indices and an offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLayout {
    address_bits: u32,
    offset_bits: u32,
    level_bits: Vec<u32>,
    level_shifts: Vec<u32>,
}

impl AddressLayout {
    /// Equal-width levels of `entries_per_level` entries; the top level
    /// takes the remainder when the page number does not divide evenly.
    pub fn uniform(address_bits: u32, page_size: u64, entries_per_level: u64) -> Result<Self, ConfigError> {
        let (offset_bits, vpn_bits) = Self::split(address_bits, page_size)?;
        if entries_per_level < 2 || !entries_per_level.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                what: "entries per page-table level",
                value: entries_per_level,
            });
        }
        let per_level = entries_per_level.trailing_zeros();
        if per_level > MAX_LEVEL_BITS {
            return Err(ConfigError::LevelTooWide { level: 0, bits: per_level, max: MAX_LEVEL_BITS });
        }

        let depth = vpn_bits.div_ceil(per_level);
        let mut widths = vec![per_level; depth as usize];
        let remainder = vpn_bits - per_level * (depth - 1);
        widths[0] = remainder;

        Ok(Self::build(address_bits, offset_bits, widths))
    }

    /// Caller-chosen widths, most significant level first; they must cover
    /// the page number exactly.
    pub fn with_levels(address_bits: u32, page_size: u64, widths: Vec<u32>) -> Result<Self, ConfigError> {
        let (offset_bits, vpn_bits) = Self::split(address_bits, page_size)?;
        if let Some(level) = widths.iter().position(|&w| w == 0) {
            return Err(ConfigError::EmptyLevel { level });
        }
        if let Some((level, &bits)) = widths.iter().enumerate().find(|&(_, &w)| w > MAX_LEVEL_BITS) {
            return Err(ConfigError::LevelTooWide { level, bits, max: MAX_LEVEL_BITS });
        }
        let used: u32 = widths.iter().sum();
        if used > vpn_bits {
            return Err(ConfigError::BitBudgetExceeded { used, available: vpn_bits });
        }
        if used < vpn_bits {
            return Err(ConfigError::LayoutTooNarrow { used, available: vpn_bits });
        }
        Ok(Self::build(address_bits, offset_bits, widths))
    }

    fn split(address_bits: u32, page_size: u64) -> Result<(u32, u32), ConfigError> {
        if address_bits == 0 || address_bits > MAX_ADDRESS_BITS {
            return Err(ConfigError::AddressBits { bits: address_bits, max: MAX_ADDRESS_BITS });
        }
        if !page_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { what: "page size", value: page_size });
        }
        let offset_bits = page_size.trailing_zeros();
        if offset_bits >= address_bits {
            return Err(ConfigError::NoPageNumberBits { offset_bits, address_bits });
        }
        Ok((offset_bits, address_bits - offset_bits))
    }

    fn build(address_bits: u32, offset_bits: u32, level_bits: Vec<u32>) -> Self {
        // a level's shift is the combined width of every level below it
        let mut level_shifts = vec![0; level_bits.len()];
        let mut shift = 0;
        for (i, &width) in level_bits.iter().enumerate().rev() {
            level_shifts[i] = shift;
            shift += width;
        }
        AddressLayout {
            address_bits,
            offset_bits,
            level_bits,
            level_shifts,
        }
    }

    #[inline]
    pub fn address_bits(&self) -> u32 {
        self.address_bits
    }

    #[inline]
    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    #[inline]
    pub fn page_size(&self) -> u64 {
        1 << self.offset_bits
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.level_bits.len()
    }

    pub fn level_bits(&self) -> &[u32] {
        &self.level_bits
    }

    /// Number of entries in a node at `level`
    #[inline]
    pub fn entries_at(&self, level: usize) -> usize {
        1 << self.level_bits[level]
    }

    /// Index into the node at `level` for page number `vpn`
    #[inline]
    pub fn index(&self, vpn: u64, level: usize) -> usize {
        let mask = (1u64 << self.level_bits[level]) - 1;
        ((vpn >> self.level_shifts[level]) & mask) as usize
    }

    /// Largest address representable in `address_bits`
    pub fn max_address(&self) -> u64 {
        if self.address_bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.address_bits) - 1
        }
    }

    /// Per-level masks positioned over the full virtual address
    pub fn level_masks(&self) -> Vec<u64> {
        self.level_bits
            .iter()
            .zip(&self.level_shifts)
            .map(|(&width, &shift)| ((1u64 << width) - 1) << (shift + self.offset_bits))
            .collect()
    }

    pub fn offset_mask(&self) -> u64 {
        self.page_size() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sizing() {
        let layout = AddressLayout::uniform(32, 4096, 1024).unwrap();
        assert_eq!(layout.offset_bits(), 12);
        assert_eq!(layout.depth(), 2);
        assert_eq!(layout.level_bits(), &[10, 10]);
        assert_eq!(layout.entries_at(0), 1024);
    }

    #[test]
    fn test_uneven_split_puts_remainder_on_top() {
        // 20 page-number bits in 8-bit levels: 4 + 8 + 8
        let layout = AddressLayout::uniform(32, 4096, 256).unwrap();
        assert_eq!(layout.level_bits(), &[4, 8, 8]);
        assert_eq!(layout.entries_at(0), 16);
    }

    #[test]
    fn test_index_partitions_vpn() {
        let layout = AddressLayout::uniform(32, 4096, 1024).unwrap();
        let vpn = (0x2A5 << 10) | 0x13C;
        assert_eq!(layout.index(vpn, 0), 0x2A5);
        assert_eq!(layout.index(vpn, 1), 0x13C);
    }

    #[test]
    fn test_explicit_levels() {
        let layout = AddressLayout::with_levels(32, 4096, vec![8, 6, 6]).unwrap();
        assert_eq!(layout.depth(), 3);
        let vpn: u64 = (0xAB << 12) | (0x15 << 6) | 0x2F;
        assert_eq!(layout.index(vpn, 0), 0xAB);
        assert_eq!(layout.index(vpn, 1), 0x15);
        assert_eq!(layout.index(vpn, 2), 0x2F);
    }

    #[test]
    fn test_explicit_levels_over_budget() {
        let err = AddressLayout::with_levels(32, 4096, vec![10, 10, 8]).unwrap_err();
        assert_eq!(err, ConfigError::BitBudgetExceeded { used: 28, available: 20 });
    }

    #[test]
    fn test_explicit_levels_too_narrow() {
        let err = AddressLayout::with_levels(32, 4096, vec![8, 8]).unwrap_err();
        assert_eq!(err, ConfigError::LayoutTooNarrow { used: 16, available: 20 });
    }

    #[test]
    fn test_zero_width_level() {
        let err = AddressLayout::with_levels(32, 4096, vec![20, 0]).unwrap_err();
        assert_eq!(err, ConfigError::EmptyLevel { level: 1 });
    }

    #[test]
    fn test_explicit_level_too_wide() {
        let err = AddressLayout::with_levels(64, 1, vec![64]).unwrap_err();
        assert_eq!(err, ConfigError::LevelTooWide { level: 0, bits: 64, max: MAX_LEVEL_BITS });

        let err = AddressLayout::with_levels(44, 4096, vec![32]).unwrap_err();
        assert_eq!(err, ConfigError::LevelTooWide { level: 0, bits: 32, max: MAX_LEVEL_BITS });

        let err = AddressLayout::with_levels(64, 4096, vec![10, 26, 16]).unwrap_err();
        assert_eq!(err, ConfigError::LevelTooWide { level: 1, bits: 26, max: MAX_LEVEL_BITS });
    }

    #[test]
    fn test_uniform_level_too_wide() {
        let err = AddressLayout::uniform(64, 4096, 1 << 32).unwrap_err();
        assert_eq!(err, ConfigError::LevelTooWide { level: 0, bits: 32, max: MAX_LEVEL_BITS });
        assert!(AddressLayout::uniform(64, 4096, 1 << MAX_LEVEL_BITS).is_ok());
    }

    #[test]
    fn test_validate_rejects_wide_levels_before_any_translation() {
        let mut config = SimConfig::new(4);
        config.address_bits = 64;
        config.page_size = 1;
        config.level_bits = Some(vec![64]);
        assert!(matches!(config.validate(), Err(ConfigError::LevelTooWide { .. })));
    }

    #[test]
    fn test_level_masks() {
        let layout = AddressLayout::uniform(32, 4096, 1024).unwrap();
        assert_eq!(layout.level_masks(), vec![0xFFC0_0000, 0x003F_F000]);
        assert_eq!(layout.offset_mask(), 0xFFF);
    }

    #[test]
    fn test_bad_page_size() {
        let err = AddressLayout::uniform(32, 3000, 1024).unwrap_err();
        assert!(matches!(err, ConfigError::NotPowerOfTwo { what: "page size", .. }));
    }

    #[test]
    fn test_page_covers_address() {
        let err = AddressLayout::uniform(12, 4096, 1024).unwrap_err();
        assert_eq!(err, ConfigError::NoPageNumberBits { offset_bits: 12, address_bits: 12 });
    }

    #[test]
    fn test_address_width_range() {
        assert!(AddressLayout::uniform(0, 4096, 1024).is_err());
        assert!(AddressLayout::uniform(65, 4096, 1024).is_err());
        let wide = AddressLayout::uniform(64, 4096, 1024).unwrap();
        assert_eq!(wide.level_bits(), &[2, 10, 10, 10, 10, 10]);
        assert_eq!(wide.max_address(), u64::MAX);
    }

    #[test]
    fn test_validate_rejects_non_positive_values() {
        assert_eq!(SimConfig::new(0).validate().unwrap_err(), ConfigError::NonPositiveFrames(0));
        assert_eq!(SimConfig::new(-3).validate().unwrap_err(), ConfigError::NonPositiveFrames(-3));

        let mut config = SimConfig::new(4);
        config.recent_age = 0;
        assert_eq!(config.validate().unwrap_err(), ConfigError::NonPositiveRecentAge(0));

        let mut config = SimConfig::new(4);
        config.limit = Some(0);
        assert_eq!(config.validate().unwrap_err(), ConfigError::NonPositiveLimit(0));
    }

    #[test]
    fn test_validate_defaults() {
        let valid = SimConfig::new(4).validate().unwrap();
        assert_eq!(valid.frames, 4);
        assert_eq!(valid.recent_age, RECENT_AGE);
        assert_eq!(valid.policy, ReplacementPolicy::WsClock);
        assert_eq!(valid.layout.depth(), 2);
        assert_eq!(valid.limit, None);
    }
}
