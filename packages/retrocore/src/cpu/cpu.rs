//! The CPU façade: owns the register file, the pending-interrupt latch,
//! and whatever's left of the instruction currently moving through
//! [`crate::cpu::sequencer`]. The struct itself is just state — all of
//! the stepping logic lives in `sequencer` as a second `impl Cpu` block,
//! the way the teacher splits a struct's definition from its behavior
//! across `cpu.rs`/`utils.rs`.

use std::collections::HashSet;

use crate::bus::Motherboard;
use crate::cpu::decode::DecodedPrefix;
use crate::cpu::ops::VECTOR_RESET;
use crate::cpu::regs::Registers;

pub struct Cpu {
    pub regs: Registers,
    pub(crate) cycle_index: u32,
    pub(crate) total_cycles: u32,
    pub(crate) prefix: Option<DecodedPrefix>,
    pub(crate) db0: u8,
    pub(crate) db1: u8,
    pub(crate) pending_irq: Option<u16>,
    pub(crate) warned_pcs: HashSet<u16>,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            regs: Registers::zeroed(),
            cycle_index: 0,
            total_cycles: 0,
            prefix: None,
            db0: 0,
            db1: 0,
            pending_irq: None,
            warned_pcs: HashSet::new(),
        }
    }

    /// Zeroes every register, loads `P` from the reset vector, and drops
    /// any instruction or interrupt in flight.
    pub fn reset(&mut self, bus: &mut dyn Motherboard) {
        self.regs = Registers::zeroed();
        self.regs.p = bus.read_word(VECTOR_RESET);
        self.cycle_index = 0;
        self.total_cycles = 0;
        self.prefix = None;
        self.db0 = 0;
        self.db1 = 0;
        self.pending_irq = None;
    }

    /// Latches an edge-triggered interrupt request at `vector`. Serviced
    /// at the next instruction boundary where `F.I` is clear; a second
    /// call before that happens replaces the pending vector rather than
    /// queuing both.
    pub fn request_irq(&mut self, vector: u16) {
        self.pending_irq = Some(vector);
    }

    pub fn is_mid_instruction(&self) -> bool {
        self.total_cycles != 0
    }
}

impl Default for Cpu {
    fn default() -> Cpu {
        Cpu::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::NullPort;
    use crate::mmu::{Mmu, MmuConfig};

    #[test]
    fn reset_loads_reset_vector() {
        let mut mmu = Mmu::new(MmuConfig::blank(), Box::new(NullPort), Box::new(NullPort)).unwrap();
        mmu.write_word(VECTOR_RESET, 0x8000);
        let mut cpu = Cpu::new();
        cpu.reset(&mut mmu);
        assert_eq!(cpu.regs.p, 0x8000);
    }

    #[test]
    fn new_cpu_is_not_mid_instruction() {
        assert!(!Cpu::new().is_mid_instruction());
    }
}
