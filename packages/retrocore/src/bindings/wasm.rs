//! WASM front-end for the CORE crate. Wraps [`Machine`] behind a handle a
//! host JS shell can new up from a cartridge image's banked buffers and
//! drive one cycle/instruction at a time.

use std::panic;
use std::time::Instant;

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;

use crate::bus::{Motherboard, NullPort};
use crate::machine::Machine;
use crate::mmu::MmuConfig;

#[wasm_bindgen]
pub struct Core {
    machine: Machine,
}

#[wasm_bindgen]
impl Core {
    /// Builds a machine from the cartridge's fixed/swappable bank buffers.
    /// `vpu`/`apu` MMIO windows aren't wired up yet at this layer — the
    /// host shell attaches real video/audio collaborators separately and
    /// this constructor stands up a `NullPort` for each in the meantime.
    #[wasm_bindgen(constructor)]
    pub fn new(
        rom_fixed: Vec<u8>,
        rom_swap: Vec<u8>,
        ram_fixed: Vec<u8>,
        ram_swap: Vec<u8>,
        tile_swap: Vec<u8>,
        dpcm_swap: Vec<u8>,
        cartridge_fixed: Vec<u8>,
        vectors: Vec<u8>,
    ) -> Core {
        let mut vector_table = [0u8; 8];
        let n = vectors.len().min(8);
        vector_table[..n].copy_from_slice(&vectors[..n]);

        let config = MmuConfig {
            rom_fixed,
            rom_swap,
            ram_fixed,
            ram_swap,
            tile_swap,
            dpcm_swap,
            cartridge_fixed,
            vectors: vector_table,
        };
        let machine = Machine::new(config, Box::new(NullPort), Box::new(NullPort), Instant::now())
            .expect("cartridge image did not declare a valid bank configuration");
        Core { machine }
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine.reset(Instant::now());
    }

    /// Advances one bus cycle. Returns whether an instruction (or
    /// interrupt entry) completed on this call.
    #[wasm_bindgen]
    pub fn step_cycle(&mut self) -> bool {
        self.machine.step_cycle()
    }

    /// Runs to the next instruction boundary and returns the number of
    /// bus cycles it took.
    #[wasm_bindgen]
    pub fn step_instruction(&mut self) -> u32 {
        self.machine.step_instruction()
    }

    /// Ticks the HRC against the current wall clock, latching a pending
    /// CPU interrupt if the configured rate's period has elapsed.
    #[wasm_bindgen]
    pub fn tick_timer(&mut self) {
        self.machine.tick_timer(Instant::now());
    }

    #[wasm_bindgen]
    pub fn read_byte(&mut self, addr: u16) -> u8 {
        self.machine.read_byte(addr)
    }

    #[wasm_bindgen]
    pub fn write_byte(&mut self, addr: u16, data: u8) {
        self.machine.write_byte(addr, data);
    }

    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u16 {
        self.machine.cpu.regs.p
    }

    /// Snapshot of `R0..R7`, `S`, and `P` as twenty little-endian bytes,
    /// handy for a host-side debugger overlay without a getter per field.
    #[wasm_bindgen]
    pub fn dump_registers(&self) -> Uint8Array {
        let regs = &self.machine.cpu.regs;
        let mut bytes = Vec::with_capacity(regs.r.len() * 2 + 4);
        for r in regs.r {
            bytes.extend_from_slice(&r.to_le_bytes());
        }
        bytes.extend_from_slice(&regs.s.to_le_bytes());
        bytes.extend_from_slice(&regs.p.to_le_bytes());
        Uint8Array::from(bytes.as_slice())
    }
}

/// Installs a panic hook that forwards Rust panics to the browser console,
/// so a crash shows a readable backtrace instead of an opaque trap.
#[wasm_bindgen]
pub fn init_debug_hooks() {
    panic::set_hook(Box::new(console_error_panic_hook::hook));
}
