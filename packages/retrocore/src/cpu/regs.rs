//! The register file: eight general-purpose 16-bit registers, the stack
//! pointer, the program counter, and the flags register.

bitflags! {
    /// `Z`/`C`/`O`/`N` are the arithmetic flags; `I` marks "currently
    /// servicing an interrupt" and gates re-entrant IRQ delivery. Other
    /// bits are reserved and always read as zero.
    pub struct Flags: u8 {
        const Z = 0b0000_0001;
        const C = 0b0000_0010;
        const O = 0b0000_0100;
        const N = 0b0000_1000;
        const I = 0b0001_0000;
    }
}

/// `RX`/`RY` are 3-bit fields, so the register file has eight slots.
pub const REGISTER_COUNT: usize = 8;

#[derive(Debug, Clone)]
pub struct Registers {
    pub r: [u16; REGISTER_COUNT],
    pub s: u16,
    pub p: u16,
    pub f: Flags,
}

impl Registers {
    pub fn zeroed() -> Registers {
        Registers {
            r: [0; REGISTER_COUNT],
            s: 0,
            p: 0,
            f: Flags::empty(),
        }
    }

    /// Applies a just-computed flag result, leaving reserved bits clear.
    pub fn set_arith_flags(&mut self, zero: bool, carry: bool, overflow: bool, negative: bool) {
        self.f.set(Flags::Z, zero);
        self.f.set(Flags::C, carry);
        self.f.set(Flags::O, overflow);
        self.f.set(Flags::N, negative);
    }

    pub fn set_zn_flags(&mut self, zero: bool, negative: bool) {
        self.f.set(Flags::Z, zero);
        self.f.set(Flags::N, negative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_bits_stay_clear() {
        let regs = Registers::zeroed();
        assert_eq!(regs.f.bits(), 0);
    }

    #[test]
    fn flag_bits_match_spec_positions() {
        assert_eq!(Flags::Z.bits(), 0b0000_0001);
        assert_eq!(Flags::C.bits(), 0b0000_0010);
        assert_eq!(Flags::O.bits(), 0b0000_0100);
        assert_eq!(Flags::N.bits(), 0b0000_1000);
        assert_eq!(Flags::I.bits(), 0b0001_0000);
    }
}
