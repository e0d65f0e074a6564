//! End-to-end scenarios straight out of the spec's worked examples
//! (S1-S6): a full `Machine`/`Cpu`/`Mmu` stack driven through public API
//! only, the way an embedder would actually use this crate, rather than
//! poking at `Cpu`'s private scratch fields the way the unit tests do.

use std::time::{Duration, Instant};

use retrocore::bus::{Motherboard, NullPort};
use retrocore::cpu::regs::Flags;
use retrocore::cpu::{AddressingMode, Opcode, OperandSize};
use retrocore::mmu::{BankKind, MmuConfig};
use retrocore::{Cpu, HrcRate, Machine, Mmu};

/// Encodes one instruction prefix exactly as `decode_prefix` reads it.
fn encode_prefix(opcode: Opcode, mode: AddressingMode, size: OperandSize, rx: u8, ry: u8) -> (u8, u8) {
    let opcode_bits = opcode as u8;
    let mode_bits = mode as u8;
    let size_bit = match size {
        OperandSize::Op8 => 0,
        OperandSize::Op16 => 1,
    };
    let ib0 = (opcode_bits << 3) | (size_bit << 2) | (mode_bits >> 2);
    let ib1 = ((mode_bits & 0b11) << 6) | ((rx & 0b111) << 3) | (ry & 0b111);
    (ib0, ib1)
}

fn blank_mmu() -> Mmu {
    Mmu::new(MmuConfig::blank(), Box::new(NullPort), Box::new(NullPort)).unwrap()
}

/// S1. Add with immediate: `ADD R0, #0x002A` against `R0 = 0x0010`.
#[test]
fn s1_add_with_immediate() {
    let mut cpu = Cpu::new();
    let mut mmu = blank_mmu();
    cpu.reset(&mut mmu);
    cpu.regs.p = 0x8000;
    cpu.regs.r[0] = 0x0010;

    let (ib0, ib1) = encode_prefix(Opcode::Add, AddressingMode::DrDw, OperandSize::Op16, 0, 0);
    mmu.write_byte(0x8000, ib0);
    mmu.write_byte(0x8001, ib1);
    mmu.write_word(0x8002, 0x002A);

    cpu.step_instruction(&mut mmu);

    assert_eq!(cpu.regs.r[0], 0x003A);
    assert!(!cpu.regs.f.contains(Flags::Z));
    assert!(!cpu.regs.f.contains(Flags::N));
    // 2 prefix bytes + 2-byte word immediate = 4-byte instruction.
    assert_eq!(cpu.regs.p, 0x8004);
}

/// S2/S3. A conditional jump taken fires; untaken merely falls through by
/// the instruction's own length.
#[test]
fn s2_s3_conditional_jump_taken_and_not_taken() {
    let mut cpu = Cpu::new();
    let mut mmu = blank_mmu();
    cpu.reset(&mut mmu);

    let (ib0, ib1) = encode_prefix(Opcode::Jz, AddressingMode::Dw, OperandSize::Op16, 0, 0);
    let program_at = |mmu: &mut Mmu, base: u16| {
        mmu.write_byte(base, ib0);
        mmu.write_byte(base + 1, ib1);
        mmu.write_word(base + 2, 0x9000);
    };

    program_at(&mut mmu, 0x8000);
    cpu.regs.p = 0x8000;
    cpu.regs.f.insert(Flags::Z);
    let p_before = cpu.regs.p;
    cpu.step_instruction(&mut mmu);
    assert_eq!(cpu.regs.p, 0x9000);

    program_at(&mut mmu, 0x8000);
    cpu.regs.p = 0x8000;
    cpu.regs.f.remove(Flags::Z);
    cpu.step_instruction(&mut mmu);
    assert_eq!(cpu.regs.p, p_before + 4);
}

/// S4. Call/return round-trip: `CL #0x9000` followed by an `RTS` at the
/// target restores both `P` (to the byte after the call) and `S`.
#[test]
fn s4_call_return_round_trip() {
    let mut cpu = Cpu::new();
    let mut mmu = blank_mmu();
    cpu.reset(&mut mmu);
    cpu.regs.s = 0xFFFE;
    cpu.regs.p = 0x8000;
    let s_before = cpu.regs.s;

    let (cl0, cl1) = encode_prefix(Opcode::Cl, AddressingMode::Dw, OperandSize::Op16, 0, 0);
    mmu.write_byte(0x8000, cl0);
    mmu.write_byte(0x8001, cl1);
    mmu.write_word(0x8002, 0x9000);

    let (rts0, rts1) = encode_prefix(Opcode::Rts, AddressingMode::Void, OperandSize::Op16, 0, 0);
    mmu.write_byte(0x9000, rts0);
    mmu.write_byte(0x9001, rts1);

    cpu.step_instruction(&mut mmu);
    assert_eq!(cpu.regs.p, 0x9000);

    cpu.step_instruction(&mut mmu);
    assert_eq!(cpu.regs.p, 0x8004);
    assert_eq!(cpu.regs.s, s_before);
}

/// S5. A 60 Hz HRC interrupt, observed at the next instruction boundary:
/// `P` vectors through `0xFFF8`, old `P`/`F` land on the stack, `I` sets.
#[test]
fn s5_hrc_interrupt_injection() {
    let now = Instant::now();
    let mut config = MmuConfig::blank();
    config.vectors[0] = 0x00;
    config.vectors[1] = 0xA0; // IRQ vector -> 0xA000
    let mut machine = Machine::new(config, Box::new(NullPort), Box::new(NullPort), now).unwrap();

    machine.cpu.regs.p = 0x8000;
    machine.cpu.regs.s = 0xFFFE;
    machine.write_byte(0xFFE2, 0x01); // HRC control: 60 Hz

    let period = Duration::from_micros(HrcRate::Hz60.period_us().unwrap());
    machine.tick_timer(now + period + Duration::from_micros(1));
    machine.step_instruction();

    assert_eq!(machine.cpu.regs.p, 0xA000);
    assert!(machine.cpu.regs.f.contains(Flags::I));
}

/// S6. Bank switch: with 4 ROM swap banks, writing `0x05` to `0xFFE0`
/// selects bank `5 mod 4 = 1`, visible starting at `0x4000`.
#[test]
fn s6_bank_switch_wraps_modulo_bank_count() {
    let mut config = MmuConfig::blank();
    config.rom_swap = vec![0u8; 0x4000 * 4];
    config.rom_swap[0x4000] = 0xAA; // first byte of bank 1
    let mut mmu = Mmu::new(config, Box::new(NullPort), Box::new(NullPort)).unwrap();

    mmu.write_byte(0xFFE0, 0x05);

    assert_eq!(mmu.active_bank(BankKind::RomSwap), 1);
    assert_eq!(mmu.read_byte(0x4000), 0xAA);
}
