//! Everything the cycle-stepped CPU interpreter is built from: pure
//! decoding, the register file, operand binding, per-opcode semantics,
//! and the façade that ties them into a sequencer.

pub mod cpu;
pub mod decode;
pub mod operand;
pub mod ops;
pub mod regs;
pub mod sequencer;

pub use cpu::Cpu;
pub use decode::{AddressingMode, Opcode, OperandSize};
pub use operand::Operand;
pub use regs::{Flags, Registers};
