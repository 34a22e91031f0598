//! Error types for the simulator.
//!
//! Page faults are not errors; they are a [`TranslationResult`] variant.
//! Everything here is fatal and reported before or instead of a run.
//!
//! [`TranslationResult`]: crate::translation::TranslationResult

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for simulator setup and I/O
pub type Result<T> = std::result::Result<T, SimError>;

/// Invalid startup configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of available frames must be greater than 0, got {0}")]
    NonPositiveFrames(i64),

    #[error("age of last access considered recent must be greater than 0, got {0}")]
    NonPositiveRecentAge(i64),

    #[error("number of memory accesses must be greater than 0, got {0}")]
    NonPositiveLimit(i64),

    #[error("address width must be between 1 and {max} bits, got {bits}")]
    AddressBits { bits: u32, max: u32 },

    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo { what: &'static str, value: u64 },

    #[error("page offset uses {offset_bits} bits, leaving nothing of a {address_bits}-bit address for the page number")]
    NoPageNumberBits { offset_bits: u32, address_bits: u32 },

    #[error("too many bits used in page tables: levels use {used} bits, page number has {available}")]
    BitBudgetExceeded { used: u32, available: u32 },

    #[error("page table levels use {used} bits but the page number has {available}")]
    LayoutTooNarrow { used: u32, available: u32 },

    #[error("page table level {level} uses {bits} bits, at most {max} are allowed per level")]
    LevelTooWide { level: usize, bits: u32, max: u32 },

    #[error("page table level {level} has zero width")]
    EmptyLevel { level: usize },
}

/// Top-level error for a simulation run
#[derive(Error, Debug)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read trace: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }
}
