use crate::config::AddressLayout;
use crate::constants::*;
use crate::memory::FrameIndex;

/// Virtual page number
pub type Vpn = u64;

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u64,
    pub vpn: Vpn,
    pub offset: u64,
}

impl VirtualAddress {
    /// Decompose a raw VA into page number and offset
    pub fn from_raw(va: u64, layout: &AddressLayout) -> Self {
        let vpn = va >> layout.offset_bits();
        let offset = va & layout.offset_mask();

        VirtualAddress { va, vpn, offset }
    }

    /// Physical address of this access once its page lives in `frame`
    #[inline]
    pub fn physical(&self, frame: FrameIndex, layout: &AddressLayout) -> u64 {
        ((frame as u64) << layout.offset_bits()) | self.offset
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VA({:#x}) = (vpn={:#x}, offset={:#x})",
            self.va, self.vpn, self.offset
        )
    }
}

/// Read or write, taken from the optional access-mode trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'r' | 'R' => Some(AccessMode::Read),
            'w' | 'W' => Some(AccessMode::Write),
            _ => None,
        }
    }
}

/// What the fault handler did to service a miss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultEvent {
    pub vaddr: u64,
    pub vpn: Vpn,
    pub frame: FrameIndex,
    /// Page previously held by `frame`, now unmapped
    pub evicted: Option<Vpn>,
    pub evicted_dirty: bool,
    /// The pool was full and the frame came from the replacement policy
    pub replacement: bool,
}

/// Result of an address translation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationResult {
    Success(u64),
    PageFault(FaultEvent),
}

impl TranslationResult {
    /// Convert to the output format (-1 for faults, PA otherwise)
    pub fn to_output(&self) -> i64 {
        match self {
            TranslationResult::Success(pa) => *pa as i64,
            TranslationResult::PageFault(_) => PAGE_FAULT,
        }
    }

    pub fn physical_address(&self) -> Option<u64> {
        match self {
            TranslationResult::Success(pa) => Some(*pa),
            TranslationResult::PageFault(_) => None,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, TranslationResult::PageFault(_))
    }
}
