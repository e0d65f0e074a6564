//! Per-opcode semantics. Every handler is a plain function over the
//! already-bound operands, the register file, and the bus — no function
//! pointers, no shared scratch beyond what the caller passes in.
//!
//! Flag-producing instructions compute their result in wide (32-bit, or
//! wider for shifts) arithmetic before truncating to the operand width, so
//! carry/overflow can be read off the untruncated result.

use crate::bus::Motherboard;
use crate::cpu::decode::{Opcode, OperandSize};
use crate::cpu::operand::{read_operand, write_operand, Operand};
use crate::cpu::regs::{Flags, Registers};

/// Software `INT` targets the reset vector, doubling it as a "warm
/// restart with a saved return address" — unusual, but that's what the
/// instruction semantics call for; hardware-raised IRQs (HRC, pad, …)
/// target [`VECTOR_IRQ`] instead.
pub(crate) const VECTOR_IRQ: u16 = 0xFFF8;
pub(crate) const VECTOR_DIV_ZERO: u16 = 0xFFFC;
pub(crate) const VECTOR_RESET: u16 = 0xFFFE;

fn mask(size: OperandSize) -> u32 {
    match size {
        OperandSize::Op8 => 0xFF,
        OperandSize::Op16 => 0xFFFF,
    }
}

fn sign_bit(v: u16, size: OperandSize) -> bool {
    match size {
        OperandSize::Op8 => v & 0x0080 != 0,
        OperandSize::Op16 => v & 0x8000 != 0,
    }
}

fn sign_extend(v: u16, size: OperandSize) -> i32 {
    match size {
        OperandSize::Op8 => (v as u8 as i8) as i32,
        OperandSize::Op16 => (v as i16) as i32,
    }
}

/// Pushes `value`, then moves `S` down by two — the stack grows toward
/// lower addresses, and a word is always written whole regardless of the
/// instruction's own operand size.
pub(crate) fn push_word(regs: &mut Registers, bus: &mut dyn Motherboard, value: u16) {
    bus.write_word(regs.s, value);
    regs.s = regs.s.wrapping_sub(2);
}

/// Pops the word just above the current stack pointer and moves `S` up.
pub(crate) fn pop_word(regs: &mut Registers, bus: &mut dyn Motherboard) -> u16 {
    let value = bus.read_word(regs.s.wrapping_add(2));
    regs.s = regs.s.wrapping_add(2);
    value
}

/// Shared tail of `INT` and every hardware/fault interrupt entry: push
/// `P`, push `F` (while `I` is still clear, so `RTI` restores it cleared),
/// set `I`, then vector.
pub(crate) fn enter_interrupt(regs: &mut Registers, bus: &mut dyn Motherboard, vector: u16) {
    push_word(regs, bus, regs.p);
    push_word(regs, bus, regs.f.bits() as u16);
    regs.f.insert(Flags::I);
    regs.p = bus.read_word(vector);
}

fn add_like(a: u16, b: u16, size: OperandSize) -> (u16, bool, bool, bool, bool) {
    let m = mask(size);
    let at = a as u32 & m;
    let bt = b as u32 & m;
    let wide = at + bt;
    let result = (wide & m) as u16;
    let z = result == 0;
    let c = wide > m;
    let sa = sign_bit(a, size);
    let sb = sign_bit(b, size);
    let sr = sign_bit(result, size);
    let o = sa == sb && sa != sr;
    (result, z, c, o, sr)
}

fn sub_like(a: u16, b: u16, size: OperandSize) -> (u16, bool, bool, bool, bool) {
    let m = mask(size);
    let at = a as u32 & m;
    let bt = b as u32 & m;
    let c = at < bt;
    let result = (at.wrapping_sub(bt) & m) as u16;
    let z = result == 0;
    let sa = sign_bit(a, size);
    let sb = sign_bit(b, size);
    let sr = sign_bit(result, size);
    let o = sa == sb && sa != sr;
    (result, z, c, o, sr)
}

fn mul_like(a: u16, b: u16, size: OperandSize) -> (u16, bool, bool, bool, bool) {
    let m = mask(size);
    let at = a as u32 & m;
    let bt = b as u32 & m;
    let wide = at * bt;
    let result = (wide & m) as u16;
    let z = result == 0;
    let c = wide > m;
    let sa = sign_bit(a, size);
    let sb = sign_bit(b, size);
    let sr = sign_bit(result, size);
    let o = sa == sb && sa != sr;
    (result, z, c, o, sr)
}

/// Unsigned integer division. `C`/`O` are always clear — there's no
/// wide-result carry the way add/mul/shift have one — and `Z`/`N` are
/// read off the truncated quotient like every other arithmetic opcode.
fn div_like(a: u16, b: u16, size: OperandSize) -> (u16, bool, bool, bool, bool) {
    let m = mask(size);
    let at = a as u32 & m;
    let bt = b as u32 & m;
    let result = ((at / bt) & m) as u16;
    let z = result == 0;
    let n = sign_bit(result, size);
    (result, z, false, false, n)
}

fn bitwise(a: u16, b: u16, size: OperandSize, f: fn(u16, u16) -> u16) -> (u16, bool, bool, bool, bool) {
    let m = mask(size) as u16;
    let result = f(a, b) & m;
    let z = result == 0;
    let n = sign_bit(result, size);
    (result, z, false, false, n)
}

/// Shared by `LSR` (`arithmetic = false`) and `ASR` (`arithmetic = true`).
/// Per the design note overriding the source's buggy overflow path: carry
/// is the last bit shifted out, not a borrow/overflow comparison.
fn shift_right(a: u16, amount: u16, size: OperandSize, arithmetic: bool) -> (u16, bool, bool, bool, bool) {
    let m = mask(size);
    let sh = (amount as u32) & 0x1F;
    let (result_bits, last_out) = if sh == 0 {
        (a as u32 & m, false)
    } else if arithmetic {
        let signed = sign_extend(a, size);
        let last = ((signed >> (sh - 1)) & 1) != 0;
        ((signed >> sh) as u32 & m, last)
    } else {
        let at = a as u32 & m;
        let last = ((at >> (sh - 1)) & 1) != 0;
        (at >> sh, last)
    };
    let result = result_bits as u16;
    let z = result == 0;
    let sa = sign_bit(a, size);
    let sb = sign_bit(amount, size);
    let sr = sign_bit(result, size);
    let o = sa == sb && sa != sr;
    (result, z, last_out, o, sr)
}

fn shift_left(a: u16, amount: u16, size: OperandSize) -> (u16, bool, bool, bool, bool) {
    let m = mask(size);
    let at = a as u32 & m;
    let sh = (amount as u32) & 0x1F;
    let wide = at << sh;
    let result = (wide & m) as u16;
    let z = result == 0;
    let c = wide > m;
    let sa = sign_bit(a, size);
    let sb = sign_bit(amount, size);
    let sr = sign_bit(result, size);
    let o = sa == sb && sa != sr;
    (result, z, c, o, sr)
}

/// Executes one decoded, fully-bound instruction. `dst`/`src` are `None`
/// exactly when the opcode's shape doesn't call for that operand (`Void`
/// opcodes get `(None, None)`; `Single` opcodes get `(Some(_), None)`).
pub fn execute(
    opcode: Opcode,
    size: OperandSize,
    dst: Option<Operand>,
    src: Option<Operand>,
    regs: &mut Registers,
    bus: &mut dyn Motherboard,
) {
    use Opcode::*;
    match opcode {
        Nop => {}

        Int => enter_interrupt(regs, bus, VECTOR_RESET),
        Rts => regs.p = pop_word(regs, bus),
        Rti => {
            let f_bits = pop_word(regs, bus) as u8;
            regs.f = Flags::from_bits_truncate(f_bits);
            regs.p = pop_word(regs, bus);
        }

        Jp | Jz | Jc | Jo | Jn => {
            let target = read_operand(dst.expect("flow op always binds a target"), size, regs, bus);
            if opcode.condition_flag().map_or(true, |flag| regs.f.contains(flag)) {
                regs.p = target;
            }
        }
        Cl | Cz | Cc | Co | Cn => {
            let target = read_operand(dst.expect("call op always binds a target"), size, regs, bus);
            if opcode.condition_flag().map_or(true, |flag| regs.f.contains(flag)) {
                push_word(regs, bus, regs.p);
                regs.p = target;
            }
        }

        Not | Inc | Dec | Ind | Ded => {
            let op = dst.expect("unary op always binds a destination");
            let value = read_operand(op, size, regs, bus);
            let m = mask(size) as u16;
            let result = match opcode {
                Not => !value & m,
                Inc => value.wrapping_add(1) & m,
                Dec => value.wrapping_sub(1) & m,
                Ind => value.wrapping_add(2) & m,
                Ded => value.wrapping_sub(2) & m,
                _ => unreachable!(),
            };
            write_operand(op, result, size, regs, bus);
            regs.set_zn_flags(result == 0, sign_bit(result, size));
        }

        Mv => {
            let value = read_operand(src.expect("MV binds a source"), size, regs, bus);
            write_operand(dst.expect("MV binds a destination"), value, size, regs, bus);
        }
        Cmp => {
            let a = read_operand(dst.expect("CMP binds a destination"), size, regs, bus);
            let b = read_operand(src.expect("CMP binds a source"), size, regs, bus);
            let (_, z, c, o, n) = sub_like(a, b, size);
            regs.set_arith_flags(z, c, o, n);
        }
        Tst => {
            let a = read_operand(dst.expect("TST binds a destination"), size, regs, bus);
            let b = read_operand(src.expect("TST binds a source"), size, regs, bus);
            let (_, z, c, o, n) = bitwise(a, b, size, |x, y| x & y);
            regs.set_arith_flags(z, c, o, n);
        }
        Add => binary_arith(dst, src, size, regs, bus, add_like),
        Sub => binary_arith(dst, src, size, regs, bus, sub_like),
        Mul => binary_arith(dst, src, size, regs, bus, mul_like),
        Div => {
            let a = read_operand(dst.expect("DIV binds a destination"), size, regs, bus);
            let b = read_operand(src.expect("DIV binds a source"), size, regs, bus);
            if b == 0 {
                enter_interrupt(regs, bus, VECTOR_DIV_ZERO);
            } else {
                let (result, z, c, o, n) = div_like(a, b, size);
                write_operand(dst.unwrap(), result, size, regs, bus);
                regs.set_arith_flags(z, c, o, n);
            }
        }
        Lsl => binary_arith(dst, src, size, regs, bus, shift_left),
        Lsr => binary_arith(dst, src, size, regs, bus, |a, b, s| shift_right(a, b, s, false)),
        Asr => binary_arith(dst, src, size, regs, bus, |a, b, s| shift_right(a, b, s, true)),
        And => binary_arith(dst, src, size, regs, bus, |a, b, s| bitwise(a, b, s, |x, y| x & y)),
        Or => binary_arith(dst, src, size, regs, bus, |a, b, s| bitwise(a, b, s, |x, y| x | y)),
        Xor => binary_arith(dst, src, size, regs, bus, |a, b, s| bitwise(a, b, s, |x, y| x ^ y)),
    }
}

/// Shared tail of every two-operand arithmetic/logic/shift opcode: read
/// both operands, run `op`, write the result back to `dst`, set flags.
fn binary_arith(
    dst: Option<Operand>,
    src: Option<Operand>,
    size: OperandSize,
    regs: &mut Registers,
    bus: &mut dyn Motherboard,
    op: impl Fn(u16, u16, OperandSize) -> (u16, bool, bool, bool, bool),
) {
    let dst_op = dst.expect("binary op always binds a destination");
    let src_op = src.expect("binary op always binds a source");
    let a = read_operand(dst_op, size, regs, bus);
    let b = read_operand(src_op, size, regs, bus);
    let (result, z, c, o, n) = op(a, b, size);
    write_operand(dst_op, result, size, regs, bus);
    regs.set_arith_flags(z, c, o, n);
}
