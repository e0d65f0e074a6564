//! Explicit operand descriptors, replacing a pointer into mixed
//! register/memory storage with a closed sum type. Reading and writing
//! always goes through [`read_operand`]/[`write_operand`], so there is
//! nowhere in the CPU that touches a register or a bus address except
//! through a typed accessor.

use crate::bus::Motherboard;
use crate::cpu::decode::{AddressingMode, OperandSize};
use crate::cpu::regs::Registers;

/// Where an operand's value comes from or goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(usize),
    MemoryByte(u16),
    MemoryWord(u16),
    Immediate8(u8),
    Immediate16(u16),
}

/// Zero-extends the byte(s) already fetched by the sequencer into the
/// value an `I*`/`D*` operand kind works from: an address to dereference
/// for the indirect kinds, or the literal value for the direct kinds.
fn immediate_value(mode: AddressingMode, db0: u8, db1: u8) -> u16 {
    if mode.has_immediate_word() {
        db0 as u16 | ((db1 as u16) << 8)
    } else {
        db0 as u16
    }
}

/// A plain register's value is always read through `RX` whenever a mode
/// has a plain-register operand at all — the only mode with *two*
/// register operands is `DR_DR`, which the sequencer binds directly
/// without going through this table (see [`AddressingMode::is_dr_only`]).
/// Register-*indirect* addressing uses `RX` when it's the sole operand
/// (`IR`) and `RY` when it's paired against a plain register (`DR_IR`,
/// `IR_DR`), leaving `RX` free for that register.
///
/// Binds the (destination, source) operands of a decoded, non-`DR_DR`,
/// non-void instruction. `db0`/`db1` are whatever immediate bytes the
/// sequencer has already fetched (zero if this mode has none).
pub fn bind_operands(
    mode: AddressingMode,
    rx: u8,
    ry: u8,
    db0: u8,
    db1: u8,
    size: OperandSize,
    regs: &Registers,
) -> (Option<Operand>, Option<Operand>) {
    use AddressingMode::*;

    let imm = || immediate_value(mode, db0, db1);
    let deref = |addr: u16| match size {
        OperandSize::Op8 => Operand::MemoryByte(addr),
        OperandSize::Op16 => Operand::MemoryWord(addr),
    };
    let direct_imm = || match size {
        OperandSize::Op8 => Operand::Immediate8(imm() as u8),
        OperandSize::Op16 => Operand::Immediate16(imm()),
    };

    match mode {
        Void => (None, None),
        Dr => (Some(Operand::Register(rx as usize)), None),
        Ir => (Some(deref(regs.r[rx as usize])), None),
        Db | Dw => (Some(direct_imm()), None),
        Ib | Iw => (Some(deref(imm())), None),

        DrDr => (
            Some(Operand::Register(rx as usize)),
            Some(Operand::Register(ry as usize)),
        ),
        DrIr => (
            Some(Operand::Register(rx as usize)),
            Some(deref(regs.r[ry as usize])),
        ),
        IrDr => (
            Some(deref(regs.r[ry as usize])),
            Some(Operand::Register(rx as usize)),
        ),
        DrDb | DrDw => (Some(Operand::Register(rx as usize)), Some(direct_imm())),
        DrIb | DrIw => (Some(Operand::Register(rx as usize)), Some(deref(imm()))),
        IbDr | IwDr => (Some(deref(imm())), Some(Operand::Register(rx as usize))),
    }
}

/// Reads an operand's current value, zero-extended to 16 bits. Callers
/// that need a signed interpretation (`ASR` on `OP_8`) sign-extend the
/// low byte themselves — the accessor stays width-only.
pub fn read_operand(
    op: Operand,
    size: OperandSize,
    regs: &Registers,
    bus: &mut dyn Motherboard,
) -> u16 {
    match op {
        Operand::Register(idx) => match size {
            OperandSize::Op8 => regs.r[idx] & 0x00FF,
            OperandSize::Op16 => regs.r[idx],
        },
        Operand::MemoryByte(addr) => bus.read_byte(addr) as u16,
        Operand::MemoryWord(addr) => bus.read_word(addr),
        Operand::Immediate8(v) => v as u16,
        Operand::Immediate16(v) => v,
    }
}

/// Writes a value back through an operand. A register write under `OP_8`
/// touches only the low byte, leaving the high byte untouched, per the
/// width-masking rule. Writing to an immediate is a no-op: no opcode
/// binds one as a destination.
pub fn write_operand(
    op: Operand,
    value: u16,
    size: OperandSize,
    regs: &mut Registers,
    bus: &mut dyn Motherboard,
) {
    match op {
        Operand::Register(idx) => match size {
            OperandSize::Op8 => regs.r[idx] = (regs.r[idx] & 0xFF00) | (value & 0x00FF),
            OperandSize::Op16 => regs.r[idx] = value,
        },
        Operand::MemoryByte(addr) => bus.write_byte(addr, value as u8),
        Operand::MemoryWord(addr) => bus.write_word(addr, value),
        Operand::Immediate8(_) | Operand::Immediate16(_) => {}
    }
}
