#[macro_use]
extern crate bitflags;

#[cfg(feature = "wasm")]
extern crate wasm_bindgen;

pub mod bindings;
pub mod bus;
pub mod cpu;
pub mod error;
pub mod hrc;
pub mod machine;
pub mod mmu;

pub use bus::{MmioPort, Motherboard, NullPort};
pub use cpu::Cpu;
pub use error::CoreError;
pub use hrc::{Hrc, HrcRate};
pub use machine::Machine;
pub use mmu::{BankKind, Mmu, MmuConfig};
