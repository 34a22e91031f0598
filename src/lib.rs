pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod memory;
pub mod page_table;
pub mod replacement;
pub mod stats;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use config::{AddressLayout, SimConfig, ValidConfig};
pub use constants::*;
pub use error::{ConfigError, SimError};
pub use replacement::ReplacementPolicy;
pub use translation::{AccessMode, FaultEvent, TranslationResult, VirtualAddress, Vpn};
pub use vm_manager::MemoryManager;
