//! Error taxonomy for the CORE crate.
//!
//! Only failures that are fatal at construction time surface as a Rust
//! `Result`. Everything that can happen mid-run (invalid opcode, divide by
//! zero, an MMU access landing on an unmapped address) is handled in-band
//! per the rules in the bus/cpu modules and is only observable through the
//! `log` facade.

use thiserror::Error;

/// Fallible setup errors raised while constructing CORE components.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("bank configuration invalid: {0}")]
    InvalidBankConfig(String),
}
