use crate::gb::BusDevice;
use crate::gb::cpu::instruction::Instruction::*;
use crate::gb::cpu::ops::Register::{A, B, C, D, E, H, L};
use crate::gb::cpu::ops::WordRegister::{AF, BC, DE, HL, SP};
use crate::gb::cpu::ops::{
    ByteRef, ByteSource, ByteTarget, JumpCondition, JumpTarget, Load, Register, ResetCode,
    WordRegister, WordSource,
};
use crate::gb::cpu::ops::JumpCondition::{Always, Carry, NotCarry, NotZero, Zero};
use std::fmt;
use std::fmt::Formatter;

const OPCODE_PREFIX: u8 = 0xCB;

/// One decoded instruction with all immediates resolved.
#[derive(Copy, Clone)]
pub enum Instruction {
    ADD(ByteSource),    // Add the source to A
    ADDHL(WordRegister), // Add a register pair to HL
    ADDSP(i8),          // Add a signed immediate to SP
    ADC(ByteSource),    // Add the source and the carry flag to A
    AND(ByteSource),    // Logical AND with A
    BIT(u8, ByteTarget), // Test bit b of the target
    CALL(JumpCondition, u16), // Push the return address and jump
    CCF,                // Complement the carry flag
    CP(ByteSource),     // Compare A with the source
    CPL,                // Flip all bits of A
    DAA,                // Decimal adjust A after BCD arithmetic
    DEC(ByteTarget),    // Decrement a byte
    DEC2(WordRegister), // Decrement a register pair
    DI,                 // Disable interrupt handling
    EI,                 // Enable interrupt handling after the next instruction
    HALT,               // Wait for an interrupt
    INC(ByteTarget),    // Increment a byte
    INC2(WordRegister), // Increment a register pair
    JP(JumpCondition, JumpTarget), // Absolute jump
    JR(JumpCondition, i8), // Relative jump
    LD(Load),           // All load flavours
    NOP,                // No operation
    OR(ByteSource),     // Logical OR with A
    POP(WordRegister), // Pop a register pair off the stack
    PUSH(WordRegister), // Push a register pair onto the stack
    RES(u8, ByteTarget), // Reset bit b of the target
    RET(JumpCondition), // Return from a subroutine
    RETI,               // Return and enable interrupts immediately
    RL(ByteTarget),     // Rotate left through the carry flag
    RLA,                // Rotate A left through the carry flag
    RLC(ByteTarget),    // Rotate left
    RLCA,               // Rotate A left
    RR(ByteTarget),     // Rotate right through the carry flag
    RRA,                // Rotate A right through the carry flag
    RRC(ByteTarget),    // Rotate right
    RRCA,               // Rotate A right
    RST(ResetCode),     // Call one of the fixed vectors
    SBC(ByteSource),    // Subtract the source and the carry flag from A
    SCF,                // Set the carry flag
    SET(u8, ByteTarget), // Set bit b of the target
    SLA(ByteTarget),    // Arithmetic shift left
    SRA(ByteTarget),    // Arithmetic shift right, bit 7 unchanged
    SRL(ByteTarget),    // Logical shift right
    STOP,               // Stop the CPU until a button press
    SUB(ByteSource),    // Subtract the source from A
    SWAP(ByteTarget),   // Swap the nibbles of the target
    XOR(ByteSource),    // Logical XOR with A
}

impl Instruction {
    /// Decodes the instruction at `address`, reading as many bytes as
    /// needed from the bus. Returns the decoded instruction (None for
    /// one of the eleven unused opcodes) and the address of the next
    /// instruction.
    pub fn new<B: BusDevice>(address: u16, bus: &mut B) -> (Option<Instruction>, u16) {
        let opcode = bus.read(address);
        match opcode == OPCODE_PREFIX {
            true => {
                let instruction = Self::prefixed(bus.read(address.wrapping_add(1)));
                (Some(instruction), address.wrapping_add(2))
            }
            false => Self::not_prefixed(opcode, address.wrapping_add(1), bus),
        }
    }

    /// Decodes a CB-prefixed opcode. The block is completely regular:
    /// bits 2..0 select the target, bits 5..3 the operation or bit index.
    fn prefixed(opcode: u8) -> Instruction {
        let target = ByteTarget::from_code(opcode & 0b111);
        let bit = (opcode >> 3) & 0b111;
        match opcode >> 6 {
            0b00 => match bit {
                0 => RLC(target),
                1 => RRC(target),
                2 => RL(target),
                3 => RR(target),
                4 => SLA(target),
                5 => SRA(target),
                6 => SWAP(target),
                _ => SRL(target),
            },
            0b01 => BIT(bit, target),
            0b10 => RES(bit, target),
            _ => SET(bit, target),
        }
    }

    /// Decodes a primary opcode; `next` is the address after the opcode.
    fn not_prefixed<B: BusDevice>(
        opcode: u8,
        next: u16,
        bus: &mut B,
    ) -> (Option<Instruction>, u16) {
        // The two regular blocks are decoded by bit pattern:
        // 0x40-0x7F is LD r,r' (0x76 is HALT), 0x80-0xBF are the ALU ops
        // with the operand register in the lower 3 bits.
        match opcode {
            0x76 => return (Some(HALT), next),
            0x40..=0x7F => {
                let target = ByteTarget::from_code((opcode >> 3) & 0b111);
                let source = ByteSource::from_code(opcode & 0b111);
                return (Some(LD(Load::Byte(target, source))), next);
            }
            0x80..=0xBF => {
                let source = ByteSource::from_code(opcode & 0b111);
                let instruction = match (opcode >> 3) & 0b111 {
                    0 => ADD(source),
                    1 => ADC(source),
                    2 => SUB(source),
                    3 => SBC(source),
                    4 => AND(source),
                    5 => XOR(source),
                    6 => OR(source),
                    _ => CP(source),
                };
                return (Some(instruction), next);
            }
            _ => {}
        }

        let instruction = match opcode {
            0x00 => (NOP, next),
            0x01 => (ld_word(BC, bus.read_word(next)), next.wrapping_add(2)),
            0x02 => (LD(Load::Byte(indirect(BC), ByteSource::R(A))), next),
            0x03 => (INC2(BC), next),
            0x04 => (INC(ByteTarget::R(B)), next),
            0x05 => (DEC(ByteTarget::R(B)), next),
            0x06 => (ld_d8(B, bus.read(next)), next.wrapping_add(1)),
            0x07 => (RLCA, next),
            0x08 => (
                LD(Load::IndirectFromSP(bus.read_word(next))),
                next.wrapping_add(2),
            ),
            0x09 => (ADDHL(BC), next),
            0x0A => (LD(Load::Byte(ByteTarget::R(A), indirect_source(BC))), next),
            0x0B => (DEC2(BC), next),
            0x0C => (INC(ByteTarget::R(C)), next),
            0x0D => (DEC(ByteTarget::R(C)), next),
            0x0E => (ld_d8(C, bus.read(next)), next.wrapping_add(1)),
            0x0F => (RRCA, next),
            // STOP consumes the following padding byte
            0x10 => (STOP, next.wrapping_add(1)),
            0x11 => (ld_word(DE, bus.read_word(next)), next.wrapping_add(2)),
            0x12 => (LD(Load::Byte(indirect(DE), ByteSource::R(A))), next),
            0x13 => (INC2(DE), next),
            0x14 => (INC(ByteTarget::R(D)), next),
            0x15 => (DEC(ByteTarget::R(D)), next),
            0x16 => (ld_d8(D, bus.read(next)), next.wrapping_add(1)),
            0x17 => (RLA, next),
            0x18 => (JR(Always, bus.read(next) as i8), next.wrapping_add(1)),
            0x19 => (ADDHL(DE), next),
            0x1A => (LD(Load::Byte(ByteTarget::R(A), indirect_source(DE))), next),
            0x1B => (DEC2(DE), next),
            0x1C => (INC(ByteTarget::R(E)), next),
            0x1D => (DEC(ByteTarget::R(E)), next),
            0x1E => (ld_d8(E, bus.read(next)), next.wrapping_add(1)),
            0x1F => (RRA, next),
            0x20 => (JR(NotZero, bus.read(next) as i8), next.wrapping_add(1)),
            0x21 => (ld_word(HL, bus.read_word(next)), next.wrapping_add(2)),
            0x22 => (LD(Load::HLIFromAInc), next),
            0x23 => (INC2(HL), next),
            0x24 => (INC(ByteTarget::R(H)), next),
            0x25 => (DEC(ByteTarget::R(H)), next),
            0x26 => (ld_d8(H, bus.read(next)), next.wrapping_add(1)),
            0x27 => (DAA, next),
            0x28 => (JR(Zero, bus.read(next) as i8), next.wrapping_add(1)),
            0x29 => (ADDHL(HL), next),
            0x2A => (LD(Load::HLIToAInc), next),
            0x2B => (DEC2(HL), next),
            0x2C => (INC(ByteTarget::R(L)), next),
            0x2D => (DEC(ByteTarget::R(L)), next),
            0x2E => (ld_d8(L, bus.read(next)), next.wrapping_add(1)),
            0x2F => (CPL, next),
            0x30 => (JR(NotCarry, bus.read(next) as i8), next.wrapping_add(1)),
            0x31 => (ld_word(SP, bus.read_word(next)), next.wrapping_add(2)),
            0x32 => (LD(Load::HLIFromADec), next),
            0x33 => (INC2(SP), next),
            0x34 => (INC(ByteTarget::I(ByteRef::R(HL))), next),
            0x35 => (DEC(ByteTarget::I(ByteRef::R(HL))), next),
            0x36 => (
                LD(Load::Byte(
                    ByteTarget::I(ByteRef::R(HL)),
                    ByteSource::D8(bus.read(next)),
                )),
                next.wrapping_add(1),
            ),
            0x37 => (SCF, next),
            0x38 => (JR(Carry, bus.read(next) as i8), next.wrapping_add(1)),
            0x39 => (ADDHL(SP), next),
            0x3A => (LD(Load::HLIToADec), next),
            0x3B => (DEC2(SP), next),
            0x3C => (INC(ByteTarget::R(A)), next),
            0x3D => (DEC(ByteTarget::R(A)), next),
            0x3E => (ld_d8(A, bus.read(next)), next.wrapping_add(1)),
            0x3F => (CCF, next),

            0xC0 => (RET(NotZero), next),
            0xC1 => (POP(BC), next),
            0xC2 => (jp_d16(NotZero, bus.read_word(next)), next.wrapping_add(2)),
            0xC3 => (jp_d16(Always, bus.read_word(next)), next.wrapping_add(2)),
            0xC4 => (CALL(NotZero, bus.read_word(next)), next.wrapping_add(2)),
            0xC5 => (PUSH(BC), next),
            0xC6 => (ADD(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xC7 => (RST(ResetCode::Rst00), next),
            0xC8 => (RET(Zero), next),
            0xC9 => (RET(Always), next),
            0xCA => (jp_d16(Zero, bus.read_word(next)), next.wrapping_add(2)),
            0xCC => (CALL(Zero, bus.read_word(next)), next.wrapping_add(2)),
            0xCD => (CALL(Always, bus.read_word(next)), next.wrapping_add(2)),
            0xCE => (ADC(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xCF => (RST(ResetCode::Rst08), next),
            0xD0 => (RET(NotCarry), next),
            0xD1 => (POP(DE), next),
            0xD2 => (jp_d16(NotCarry, bus.read_word(next)), next.wrapping_add(2)),
            0xD4 => (CALL(NotCarry, bus.read_word(next)), next.wrapping_add(2)),
            0xD5 => (PUSH(DE), next),
            0xD6 => (SUB(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xD7 => (RST(ResetCode::Rst10), next),
            0xD8 => (RET(Carry), next),
            0xD9 => (RETI, next),
            0xDA => (jp_d16(Carry, bus.read_word(next)), next.wrapping_add(2)),
            0xDC => (CALL(Carry, bus.read_word(next)), next.wrapping_add(2)),
            0xDE => (SBC(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xDF => (RST(ResetCode::Rst18), next),
            0xE0 => (
                LD(Load::Byte(
                    ByteTarget::I(ByteRef::D8(bus.read(next))),
                    ByteSource::R(A),
                )),
                next.wrapping_add(1),
            ),
            0xE1 => (POP(HL), next),
            0xE2 => (LD(Load::Byte(ByteTarget::I(ByteRef::C), ByteSource::R(A))), next),
            0xE5 => (PUSH(HL), next),
            0xE6 => (AND(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xE7 => (RST(ResetCode::Rst20), next),
            0xE8 => (ADDSP(bus.read(next) as i8), next.wrapping_add(1)),
            0xE9 => (JP(Always, JumpTarget::HL), next),
            0xEA => (
                LD(Load::Byte(
                    ByteTarget::I(ByteRef::D16(bus.read_word(next))),
                    ByteSource::R(A),
                )),
                next.wrapping_add(2),
            ),
            0xEE => (XOR(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xEF => (RST(ResetCode::Rst28), next),
            0xF0 => (
                LD(Load::Byte(
                    ByteTarget::R(A),
                    ByteSource::I(ByteRef::D8(bus.read(next))),
                )),
                next.wrapping_add(1),
            ),
            0xF1 => (POP(AF), next),
            0xF2 => (LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::C))), next),
            0xF3 => (DI, next),
            0xF5 => (PUSH(AF), next),
            0xF6 => (OR(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xF7 => (RST(ResetCode::Rst30), next),
            0xF8 => (LD(Load::HLFromSPi8(bus.read(next) as i8)), next.wrapping_add(1)),
            0xF9 => (LD(Load::Word(SP, WordSource::R(HL))), next),
            0xFA => (
                LD(Load::Byte(
                    ByteTarget::R(A),
                    ByteSource::I(ByteRef::D16(bus.read_word(next))),
                )),
                next.wrapping_add(2),
            ),
            0xFB => (EI, next),
            0xFE => (CP(ByteSource::D8(bus.read(next))), next.wrapping_add(1)),
            0xFF => (RST(ResetCode::Rst38), next),
            // 0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED,
            // 0xF4, 0xFC and 0xFD are not defined on this CPU
            _ => return (None, next),
        };
        (Some(instruction.0), instruction.1)
    }
}

#[inline]
fn ld_d8(target: Register, value: u8) -> Instruction {
    LD(Load::Byte(ByteTarget::R(target), ByteSource::D8(value)))
}

#[inline]
fn ld_word(target: WordRegister, value: u16) -> Instruction {
    LD(Load::Word(target, WordSource::D16(value)))
}

#[inline]
fn jp_d16(condition: JumpCondition, address: u16) -> Instruction {
    JP(condition, JumpTarget::D16(address))
}

#[inline]
fn indirect(register: WordRegister) -> ByteTarget {
    ByteTarget::I(ByteRef::R(register))
}

#[inline]
fn indirect_source(register: WordRegister) -> ByteSource {
    ByteSource::I(ByteRef::R(register))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ADD(source) => write!(f, "ADD A, {source}"),
            ADDHL(source) => write!(f, "ADD HL, {source}"),
            ADDSP(value) => write!(f, "ADD SP, {value:+}"),
            ADC(source) => write!(f, "ADC A, {source}"),
            AND(source) => write!(f, "AND {source}"),
            BIT(bit, target) => write!(f, "BIT {bit}, {target}"),
            CALL(Always, address) => write!(f, "CALL {address:#06x}"),
            CALL(condition, address) => write!(f, "CALL {condition}, {address:#06x}"),
            CCF => f.write_str("CCF"),
            CP(source) => write!(f, "CP {source}"),
            CPL => f.write_str("CPL"),
            DAA => f.write_str("DAA"),
            DEC(target) => write!(f, "DEC {target}"),
            DEC2(target) => write!(f, "DEC {target}"),
            DI => f.write_str("DI"),
            EI => f.write_str("EI"),
            HALT => f.write_str("HALT"),
            INC(target) => write!(f, "INC {target}"),
            INC2(target) => write!(f, "INC {target}"),
            JP(Always, target) => write!(f, "JP {target}"),
            JP(condition, target) => write!(f, "JP {condition}, {target}"),
            JR(Always, offset) => write!(f, "JR {offset:+}"),
            JR(condition, offset) => write!(f, "JR {condition}, {offset:+}"),
            LD(load) => write!(f, "LD {load}"),
            NOP => f.write_str("NOP"),
            OR(source) => write!(f, "OR {source}"),
            POP(target) => write!(f, "POP {target}"),
            PUSH(target) => write!(f, "PUSH {target}"),
            RES(bit, target) => write!(f, "RES {bit}, {target}"),
            RET(Always) => f.write_str("RET"),
            RET(condition) => write!(f, "RET {condition}"),
            RETI => f.write_str("RETI"),
            RL(target) => write!(f, "RL {target}"),
            RLA => f.write_str("RLA"),
            RLC(target) => write!(f, "RLC {target}"),
            RLCA => f.write_str("RLCA"),
            RR(target) => write!(f, "RR {target}"),
            RRA => f.write_str("RRA"),
            RRC(target) => write!(f, "RRC {target}"),
            RRCA => f.write_str("RRCA"),
            RST(code) => write!(f, "RST {code}"),
            SBC(source) => write!(f, "SBC A, {source}"),
            SCF => f.write_str("SCF"),
            SET(bit, target) => write!(f, "SET {bit}, {target}"),
            SLA(target) => write!(f, "SLA {target}"),
            SRA(target) => write!(f, "SRA {target}"),
            SRL(target) => write!(f, "SRL {target}"),
            STOP => f.write_str("STOP"),
            SUB(source) => write!(f, "SUB {source}"),
            SWAP(target) => write!(f, "SWAP {target}"),
            XOR(source) => write!(f, "XOR {source}"),
        }
    }
}
