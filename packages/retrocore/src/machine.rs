//! Wires the CPU, MMU, and HRC into one runnable unit. This is the layer
//! an outer emulator loop actually drives: it owns the bus the CPU sees,
//! and bridges the HRC's wall-clock ticking to the CPU's interrupt line
//! since those are two independently-owned pieces of state per the
//! concurrency model.

use std::time::Instant;

use crate::bus::{MmioPort, Motherboard};
use crate::cpu::ops::VECTOR_IRQ;
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::hrc::{Hrc, HrcRate};
use crate::mmu::{Mmu, MmuConfig};

pub struct Machine {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub hrc: Hrc,
}

impl Machine {
    /// Builds the machine and performs the one startup reset: registers
    /// zeroed, `P` loaded from the reset vector, HRC disabled.
    pub fn new(
        config: MmuConfig,
        vpu: Box<dyn MmioPort>,
        apu: Box<dyn MmioPort>,
        now: Instant,
    ) -> Result<Machine, CoreError> {
        let mut mmu = Mmu::new(config, vpu, apu)?;
        let mut cpu = Cpu::new();
        cpu.reset(&mut mmu);
        Ok(Machine {
            cpu,
            mmu,
            hrc: Hrc::new(now),
        })
    }

    pub fn reset(&mut self, now: Instant) {
        self.cpu.reset(&mut self.mmu);
        self.hrc.reset(now);
    }

    /// Advances the HRC to `now`. Picks up whatever rate the CPU last
    /// wrote to the HRC control register before stepping, and latches a
    /// pending IRQ on the CPU when the configured period elapses.
    pub fn tick_timer(&mut self, now: Instant) {
        let configured = HrcRate::from_bits(self.mmu.hrc_control());
        if configured != self.hrc.rate() {
            self.hrc.set_type(configured, now);
        }
        if self.hrc.step(now) {
            self.cpu.request_irq(VECTOR_IRQ);
        }
    }

    pub fn step_cycle(&mut self) -> bool {
        self.cpu.step_cycle(&mut self.mmu)
    }

    pub fn step_instruction(&mut self) -> u32 {
        self.cpu.step_instruction(&mut self.mmu)
    }
}

impl Motherboard for Machine {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.mmu.read_byte(addr)
    }

    fn write_byte(&mut self, addr: u16, data: u8) {
        self.mmu.write_byte(addr, data)
    }
}
