use crate::gb::BusDevice;
use crate::gb::cpu::Cpu;
use crate::gb::cpu::ops::Register::{A, B, C, D, E, H, L};
use crate::gb::cpu::ops::WordRegister::{AF, BC, DE, HL, SP};
use crate::gb::cpu::ops::{ByteRef, ByteSource, ByteTarget, JumpCondition, JumpTarget};
use crate::gb::cpu::registers::Flags;
use crate::gb::tests::MockBus;

#[test]
fn test_byte_registers() {
    let mut cpu = Cpu::default();
    for register in [A, B, C, D, E, H, L] {
        register.write(&mut cpu, 0x42);
        assert_eq!(register.read(&cpu), 0x42);
        register.write(&mut cpu, 0x24);
        assert_eq!(register.read(&cpu), 0x24);
    }
    assert_eq!(A.to_string(), "A");
    assert_eq!(L.to_string(), "L");
}

#[test]
fn test_word_register_af_masks_low_nibble() {
    let mut cpu = Cpu::default();
    AF.write(&mut cpu, 0xABCD);
    assert_eq!(AF.read(&cpu), 0xABC0, "the low 4 bits are discarded");
    assert_eq!(AF.to_string(), "AF");
}

#[test]
fn test_word_registers() {
    let mut cpu = Cpu::default();
    for register in [BC, DE, HL, SP] {
        register.write(&mut cpu, 0x1234);
        assert_eq!(register.read(&cpu), 0x1234);
    }
    assert_eq!(cpu.r.get_bc(), 0x1234);
    assert_eq!(cpu.sp, 0x1234);
}

#[test]
fn test_byte_ref_resolve() {
    let mut cpu = Cpu::default();
    cpu.r.set_hl(0xC123);
    cpu.r.c = 0x42;
    assert_eq!(ByteRef::R(HL).resolve(&cpu), 0xC123);
    assert_eq!(ByteRef::D16(0x8000).resolve(&cpu), 0x8000);
    assert_eq!(ByteRef::C.resolve(&cpu), 0xFF42);
    assert_eq!(ByteRef::D8(0x80).resolve(&cpu), 0xFF80);
}

#[test]
fn test_byte_ref_display() {
    assert_eq!(ByteRef::R(HL).to_string(), "(HL)");
    assert_eq!(ByteRef::D16(0x8000).to_string(), "(0x8000)");
    assert_eq!(ByteRef::C.to_string(), "(C)");
    assert_eq!(ByteRef::D8(0x80).to_string(), "(0xff80)");
}

#[test]
fn test_byte_target_from_code() {
    let mut cpu = Cpu::default();
    let mut bus = MockBus::new(vec![]);
    cpu.r.set_hl(0xC000);
    bus.write(0xC000, 0x55);

    assert_eq!(ByteTarget::from_code(0), ByteTarget::R(B));
    assert_eq!(ByteTarget::from_code(7), ByteTarget::R(A));
    let target = ByteTarget::from_code(6);
    assert_eq!(target, ByteTarget::I(ByteRef::R(HL)));
    assert_eq!(target.read(&cpu, &mut bus), 0x55);
}

#[test]
fn test_byte_source_read() {
    let mut cpu = Cpu::default();
    let mut bus = MockBus::new(vec![]);
    cpu.r.b = 0x11;
    cpu.r.set_hl(0xC010);
    bus.write(0xC010, 0x22);

    assert_eq!(ByteSource::R(B).read(&cpu, &mut bus), 0x11);
    assert_eq!(ByteSource::I(ByteRef::R(HL)).read(&cpu, &mut bus), 0x22);
    assert_eq!(ByteSource::D8(0x33).read(&cpu, &mut bus), 0x33);
}

#[test]
fn test_access_cycles() {
    assert_eq!(ByteSource::R(B).access_cycles(), 0);
    assert_eq!(ByteSource::D8(0).access_cycles(), 4);
    assert_eq!(ByteSource::I(ByteRef::R(HL)).access_cycles(), 4);
    assert_eq!(ByteSource::I(ByteRef::C).access_cycles(), 4);
    assert_eq!(ByteSource::I(ByteRef::D8(0)).access_cycles(), 8);
    assert_eq!(ByteSource::I(ByteRef::D16(0)).access_cycles(), 12);
}

#[test]
fn test_jump_condition_resolve() {
    let mut cpu = Cpu::default();
    assert!(JumpCondition::Always.resolve(&cpu));
    assert!(JumpCondition::NotZero.resolve(&cpu));
    assert!(!JumpCondition::Zero.resolve(&cpu));

    cpu.r.f.set(Flags::ZERO, true);
    assert!(JumpCondition::Zero.resolve(&cpu));

    cpu.r.f.set(Flags::CARRY, true);
    assert!(JumpCondition::Carry.resolve(&cpu));
    assert!(!JumpCondition::NotCarry.resolve(&cpu));
}

#[test]
fn test_jump_target_read() {
    let mut cpu = Cpu::default();
    cpu.r.set_hl(0x4242);
    assert_eq!(JumpTarget::D16(0x1234).read(&cpu), 0x1234);
    assert_eq!(JumpTarget::HL.read(&cpu), 0x4242);
}
