//! 64 KiB banked address space: fixed/swappable ROM and RAM, VPU-visible
//! tile memory, DPCM sample memory, and the high register page (bank
//! select, HRC control, pad/serial, interrupt vectors). VPU and APU MMIO
//! windows are delegated to injected `MmioPort` collaborators rather than
//! owned here, per the redesign away from global bank/peripheral pointers.

use crate::bus::{MmioPort, Motherboard};
use crate::error::CoreError;

const ROM_FIXED_SIZE: usize = 0x4000;
const ROM_BANK_SIZE: usize = 0x4000;
const RAM_FIXED_SIZE: usize = 0x2000;
const RAM_BANK_SIZE: usize = 0x2000;
const TILE_BANK_SIZE: usize = 0x2000;
const DPCM_BANK_SIZE: usize = 0x0800;
const CARTRIDGE_FIXED_SIZE: usize = 0x0100;

/// The four banked regions a cartridge can switch via `select_bank` (tile
/// and DPCM switch only through the VPU/APU MMIO windows in the real
/// machine, but the MMU exposes them uniformly for testing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    RomSwap,
    RamSwap,
    TileSwap,
    DpcmSwap,
}

/// Sizes and initial contents for every region the MMU owns. Bank pools
/// are flat buffers, a whole number of bank-sized slices concatenated;
/// `Mmu::new` rejects anything that doesn't divide evenly or that
/// declares zero banks for a region, since that's an initialization
/// failure, not something to silently pad around.
pub struct MmuConfig {
    pub rom_fixed: Vec<u8>,
    pub rom_swap: Vec<u8>,
    pub ram_fixed: Vec<u8>,
    pub ram_swap: Vec<u8>,
    pub tile_swap: Vec<u8>,
    pub dpcm_swap: Vec<u8>,
    pub cartridge_fixed: Vec<u8>,
    /// IRQ, reserved, div-by-zero, and reset vectors, in that order, two
    /// bytes (little-endian) each: `0xFFF8..0x10000`.
    pub vectors: [u8; 8],
}

impl MmuConfig {
    /// A minimal configuration with one bank of each kind, all zeroed,
    /// and a reset vector of zero. Handy for tests that build up RAM
    /// contents by hand rather than loading a cartridge image.
    pub fn blank() -> MmuConfig {
        MmuConfig {
            rom_fixed: vec![0; ROM_FIXED_SIZE],
            rom_swap: vec![0; ROM_BANK_SIZE],
            ram_fixed: vec![0; RAM_FIXED_SIZE],
            ram_swap: vec![0; RAM_BANK_SIZE],
            tile_swap: vec![0; TILE_BANK_SIZE],
            dpcm_swap: vec![0; DPCM_BANK_SIZE],
            cartridge_fixed: vec![0; CARTRIDGE_FIXED_SIZE],
            vectors: [0; 8],
        }
    }
}

fn bank_count(buf_len: usize, bank_size: usize, label: &str) -> Result<usize, CoreError> {
    if bank_size == 0 || buf_len == 0 || buf_len % bank_size != 0 {
        return Err(CoreError::InvalidBankConfig(format!(
            "{label} buffer length {buf_len} is not a nonzero multiple of bank size {bank_size}"
        )));
    }
    Ok(buf_len / bank_size)
}

pub struct Mmu {
    rom_fixed: Vec<u8>,
    rom_swap: Vec<u8>,
    rom_banks_total: usize,
    rom_bank_active: usize,

    ram_fixed: Vec<u8>,
    ram_swap: Vec<u8>,
    ram_banks_total: usize,
    ram_bank_active: usize,

    tile_swap: Vec<u8>,
    tile_banks_total: usize,
    tile_bank_active: usize,

    dpcm_swap: Vec<u8>,
    dpcm_banks_total: usize,
    dpcm_bank_active: usize,

    cartridge_fixed: Vec<u8>,

    hrc_regs: [u8; 4],
    pad_regs: [u8; 4],
    serial_reg: [u8; 4],
    vectors: [u8; 8],

    vpu: Box<dyn MmioPort>,
    apu: Box<dyn MmioPort>,
}

impl Mmu {
    pub fn new(
        config: MmuConfig,
        vpu: Box<dyn MmioPort>,
        apu: Box<dyn MmioPort>,
    ) -> Result<Mmu, CoreError> {
        if config.rom_fixed.len() != ROM_FIXED_SIZE {
            return Err(CoreError::InvalidBankConfig(format!(
                "rom_fixed must be exactly {ROM_FIXED_SIZE} bytes, got {}",
                config.rom_fixed.len()
            )));
        }
        if config.ram_fixed.len() != RAM_FIXED_SIZE {
            return Err(CoreError::InvalidBankConfig(format!(
                "ram_fixed must be exactly {RAM_FIXED_SIZE} bytes, got {}",
                config.ram_fixed.len()
            )));
        }
        if config.cartridge_fixed.len() != CARTRIDGE_FIXED_SIZE {
            return Err(CoreError::InvalidBankConfig(format!(
                "cartridge_fixed must be exactly {CARTRIDGE_FIXED_SIZE} bytes, got {}",
                config.cartridge_fixed.len()
            )));
        }

        let rom_banks_total = bank_count(config.rom_swap.len(), ROM_BANK_SIZE, "rom_swap")?;
        let ram_banks_total = bank_count(config.ram_swap.len(), RAM_BANK_SIZE, "ram_swap")?;
        let tile_banks_total = bank_count(config.tile_swap.len(), TILE_BANK_SIZE, "tile_swap")?;
        let dpcm_banks_total = bank_count(config.dpcm_swap.len(), DPCM_BANK_SIZE, "dpcm_swap")?;

        Ok(Mmu {
            rom_fixed: config.rom_fixed,
            rom_swap: config.rom_swap,
            rom_banks_total,
            rom_bank_active: 0,
            ram_fixed: config.ram_fixed,
            ram_swap: config.ram_swap,
            ram_banks_total,
            ram_bank_active: 0,
            tile_swap: config.tile_swap,
            tile_banks_total,
            tile_bank_active: 0,
            dpcm_swap: config.dpcm_swap,
            dpcm_banks_total,
            dpcm_bank_active: 0,
            cartridge_fixed: config.cartridge_fixed,
            hrc_regs: [0; 4],
            pad_regs: [0; 4],
            serial_reg: [0; 4],
            vectors: config.vectors,
            vpu,
            apu,
        })
    }

    /// Clamps `index` modulo the declared bank count for `kind` and makes
    /// it the active bank. Takes effect on the very next bus access.
    pub fn select_bank(&mut self, kind: BankKind, index: u8) {
        match kind {
            BankKind::RomSwap => self.rom_bank_active = index as usize % self.rom_banks_total,
            BankKind::RamSwap => self.ram_bank_active = index as usize % self.ram_banks_total,
            BankKind::TileSwap => self.tile_bank_active = index as usize % self.tile_banks_total,
            BankKind::DpcmSwap => self.dpcm_bank_active = index as usize % self.dpcm_banks_total,
        }
    }

    pub fn active_bank(&self, kind: BankKind) -> usize {
        match kind {
            BankKind::RomSwap => self.rom_bank_active,
            BankKind::RamSwap => self.ram_bank_active,
            BankKind::TileSwap => self.tile_bank_active,
            BankKind::DpcmSwap => self.dpcm_bank_active,
        }
    }

    /// Raw HRC control/status register contents (`0xFFE2..0xFFE6`). The
    /// low 3 bits of byte 0 are the rate selector; `Machine` is the one
    /// that actually drives the owned `Hrc` from this value, since per
    /// the concurrency model the HRC itself is mutated only by its own
    /// `step()` and by the CPU servicing its interrupt.
    pub fn hrc_control(&self) -> u8 {
        self.hrc_regs[0]
    }

    /// Pointer into `0xFFF8..0x10000`: the IRQ, reserved, div-by-zero, and
    /// reset vectors, each little-endian. `slot` is the index of the
    /// 16-bit vector (0=IRQ, 1=reserved, 2=div-by-zero, 3=reset).
    pub fn vector(&self, slot: usize) -> u16 {
        let base = slot * 2;
        self.vectors[base] as u16 | ((self.vectors[base + 1] as u16) << 8)
    }
}

impl Motherboard for Mmu {
    fn read_byte(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => self.rom_fixed[addr as usize],
            0x4000..=0x7FFF => {
                let off = self.rom_bank_active * ROM_BANK_SIZE + (addr - 0x4000) as usize;
                self.rom_swap[off]
            }
            0x8000..=0x9FFF => self.ram_fixed[(addr - 0x8000) as usize],
            0xA000..=0xBFFF => {
                let off = self.ram_bank_active * RAM_BANK_SIZE + (addr - 0xA000) as usize;
                self.ram_swap[off]
            }
            0xC000..=0xDFFF => {
                let off = self.tile_bank_active * TILE_BANK_SIZE + (addr - 0xC000) as usize;
                self.tile_swap[off]
            }
            0xE000..=0xEBFF => self.vpu.read_byte(addr - 0xE000),
            0xEC00..=0xEFFF => self.apu.read_byte(addr - 0xEC00),
            0xF000..=0xF7FF => {
                let off = self.dpcm_bank_active * DPCM_BANK_SIZE + (addr - 0xF000) as usize;
                self.dpcm_swap[off]
            }
            0xFE00..=0xFEFF => self.cartridge_fixed[(addr - 0xFE00) as usize],
            0xFFE0 | 0xFFE1 => 0, // bank select registers are write-only
            0xFFE2..=0xFFE5 => self.hrc_regs[(addr - 0xFFE2) as usize],
            0xFFF0..=0xFFF3 => self.pad_regs[(addr - 0xFFF0) as usize],
            0xFFF4..=0xFFF7 => self.serial_reg[(addr - 0xFFF4) as usize],
            0xFFF8..=0xFFFF => self.vectors[(addr - 0xFFF8) as usize],
            _ => {
                log::trace!("mmu: read from unmapped address {addr:#06x}");
                0
            }
        }
    }

    fn write_byte(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x3FFF | 0x4000..=0x7FFF => {
                log::trace!("mmu: write to read-only ROM at {addr:#06x} dropped");
            }
            0x8000..=0x9FFF => self.ram_fixed[(addr - 0x8000) as usize] = data,
            0xA000..=0xBFFF => {
                let off = self.ram_bank_active * RAM_BANK_SIZE + (addr - 0xA000) as usize;
                self.ram_swap[off] = data;
            }
            0xC000..=0xDFFF => {
                let off = self.tile_bank_active * TILE_BANK_SIZE + (addr - 0xC000) as usize;
                self.tile_swap[off] = data;
            }
            0xE000..=0xEBFF => self.vpu.write_byte(addr - 0xE000, data),
            0xEC00..=0xEFFF => self.apu.write_byte(addr - 0xEC00, data),
            0xF000..=0xF7FF => {
                let off = self.dpcm_bank_active * DPCM_BANK_SIZE + (addr - 0xF000) as usize;
                self.dpcm_swap[off] = data;
            }
            0xFE00..=0xFEFF => {
                log::trace!("mmu: write to read-only cartridge page at {addr:#06x} dropped");
            }
            0xFFE0 => self.select_bank(BankKind::RomSwap, data),
            0xFFE1 => self.select_bank(BankKind::RamSwap, data),
            0xFFE2..=0xFFE5 => self.hrc_regs[(addr - 0xFFE2) as usize] = data,
            0xFFF0..=0xFFF3 => self.pad_regs[(addr - 0xFFF0) as usize] = data,
            0xFFF4..=0xFFF7 => self.serial_reg[(addr - 0xFFF4) as usize] = data,
            0xFFF8..=0xFFFF => self.vectors[(addr - 0xFFF8) as usize] = data,
            _ => {
                log::trace!("mmu: write to unmapped address {addr:#06x} dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::NullPort;

    fn mmu() -> Mmu {
        Mmu::new(MmuConfig::blank(), Box::new(NullPort), Box::new(NullPort)).unwrap()
    }

    #[test]
    fn rejects_zero_bank_config() {
        let mut config = MmuConfig::blank();
        config.rom_swap.clear();
        let err = Mmu::new(config, Box::new(NullPort), Box::new(NullPort)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBankConfig(_)));
    }

    #[test]
    fn ram_round_trips() {
        let mut m = mmu();
        m.write_byte(0x8010, 0x42);
        assert_eq!(m.read_byte(0x8010), 0x42);
        m.write_word(0x8020, 0xBEEF);
        assert_eq!(m.read_byte(0x8020), 0xEF);
        assert_eq!(m.read_byte(0x8021), 0xBE);
        assert_eq!(m.read_word(0x8020), 0xBEEF);
    }

    #[test]
    fn rom_writes_are_dropped() {
        let mut m = mmu();
        let before = m.read_byte(0x0000);
        m.write_byte(0x0000, 0xFF);
        assert_eq!(m.read_byte(0x0000), before);
    }

    #[test]
    fn bank_select_clamps_and_isolates_fixed_region() {
        let mut config = MmuConfig::blank();
        // 4 ROM swap banks, each bank's first byte tagged with its index.
        config.rom_swap = vec![0u8; ROM_BANK_SIZE * 4];
        for i in 0..4u8 {
            config.rom_swap[i as usize * ROM_BANK_SIZE] = i;
        }
        let mut m = Mmu::new(config, Box::new(NullPort), Box::new(NullPort)).unwrap();

        let fixed_before = m.read_byte(0x0000);
        m.select_bank(BankKind::RomSwap, 5); // 5 mod 4 = 1
        assert_eq!(m.active_bank(BankKind::RomSwap), 1);
        assert_eq!(m.read_byte(0x4000), 1);
        assert_eq!(m.read_byte(0x0000), fixed_before);
    }

    #[test]
    fn bank_select_register_write_dispatches_to_select_bank() {
        let mut config = MmuConfig::blank();
        config.rom_swap = vec![0u8; ROM_BANK_SIZE * 2];
        config.rom_swap[ROM_BANK_SIZE] = 0xAA;
        let mut m = Mmu::new(config, Box::new(NullPort), Box::new(NullPort)).unwrap();

        m.write_byte(0xFFE0, 1);
        assert_eq!(m.read_byte(0x4000), 0xAA);
        assert_eq!(m.read_byte(0xFFE0), 0); // write-only
    }

    #[test]
    fn unmapped_gap_reads_zero_and_drops_writes() {
        let mut m = mmu();
        m.write_byte(0xFFA0, 0xFF);
        assert_eq!(m.read_byte(0xFFA0), 0);
    }
}
