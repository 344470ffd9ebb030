use crate::gb::BusDevice;
use crate::gb::cpu::Cpu;
use crate::gb::cpu::registers::Flags;
use std::fmt;
use std::fmt::Formatter;

/// Identifies one of the 8-bit registers of the CPU.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Register {
    #[inline]
    pub fn read(&self, cpu: &Cpu) -> u8 {
        match self {
            Register::A => cpu.r.a,
            Register::B => cpu.r.b,
            Register::C => cpu.r.c,
            Register::D => cpu.r.d,
            Register::E => cpu.r.e,
            Register::H => cpu.r.h,
            Register::L => cpu.r.l,
        }
    }

    #[inline]
    pub fn write(&self, cpu: &mut Cpu, value: u8) {
        match self {
            Register::A => cpu.r.a = value,
            Register::B => cpu.r.b = value,
            Register::C => cpu.r.c = value,
            Register::D => cpu.r.d = value,
            Register::E => cpu.r.e = value,
            Register::H => cpu.r.h = value,
            Register::L => cpu.r.l = value,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::E => "E",
            Register::H => "H",
            Register::L => "L",
        };
        f.write_str(ident)
    }
}

/// Identifies one of the 16-bit register pairs of the CPU.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WordRegister {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl WordRegister {
    #[inline]
    pub fn read(&self, cpu: &Cpu) -> u16 {
        match self {
            WordRegister::AF => cpu.r.get_af(),
            WordRegister::BC => cpu.r.get_bc(),
            WordRegister::DE => cpu.r.get_de(),
            WordRegister::HL => cpu.r.get_hl(),
            WordRegister::SP => cpu.sp,
        }
    }

    #[inline]
    pub fn write(&self, cpu: &mut Cpu, value: u16) {
        match self {
            WordRegister::AF => cpu.r.set_af(value),
            WordRegister::BC => cpu.r.set_bc(value),
            WordRegister::DE => cpu.r.set_de(value),
            WordRegister::HL => cpu.r.set_hl(value),
            WordRegister::SP => cpu.sp = value,
        }
    }
}

impl fmt::Display for WordRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            WordRegister::AF => "AF",
            WordRegister::BC => "BC",
            WordRegister::DE => "DE",
            WordRegister::HL => "HL",
            WordRegister::SP => "SP",
        };
        f.write_str(ident)
    }
}

/// Defines a source which yields an address used to read or write a byte.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteRef {
    /// Memory at the address held by a register pair.
    R(WordRegister),
    /// Memory at the address from the next 16 bits.
    D16(u16),
    /// Memory at 0xFF00 | C.
    C,
    /// Memory at 0xFF00 | the next 8 bits.
    D8(u8),
}

impl ByteRef {
    /// Resolves and returns the referred address.
    #[inline]
    pub fn resolve(&self, cpu: &Cpu) -> u16 {
        match self {
            ByteRef::R(r) => r.read(cpu),
            ByteRef::D16(address) => *address,
            ByteRef::C => u16::from(cpu.r.c) | 0xFF00,
            ByteRef::D8(offset) => u16::from(*offset) | 0xFF00,
        }
    }

    /// Extra cycles needed to resolve and access this reference
    /// on top of the opcode fetch.
    #[inline]
    pub const fn access_cycles(&self) -> u16 {
        match self {
            ByteRef::R(_) | ByteRef::C => 4,
            ByteRef::D8(_) => 8,
            ByteRef::D16(_) => 12,
        }
    }
}

impl fmt::Display for ByteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteRef::R(r) => write!(f, "({r})"),
            ByteRef::D16(address) => write!(f, "({address:#06x})"),
            ByteRef::C => f.write_str("(C)"),
            ByteRef::D8(offset) => write!(f, "({:#06x})", u16::from(*offset) | 0xFF00),
        }
    }
}

/// Defines a place a byte value can be read from and written to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteTarget {
    R(Register),
    I(ByteRef),
}

impl ByteTarget {
    /// Decodes the register code in the lower 3 opcode bits;
    /// code 6 refers to the byte at address HL.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => ByteTarget::R(Register::B),
            1 => ByteTarget::R(Register::C),
            2 => ByteTarget::R(Register::D),
            3 => ByteTarget::R(Register::E),
            4 => ByteTarget::R(Register::H),
            5 => ByteTarget::R(Register::L),
            6 => ByteTarget::I(ByteRef::R(WordRegister::HL)),
            _ => ByteTarget::R(Register::A),
        }
    }

    #[inline]
    pub fn read<B: BusDevice>(&self, cpu: &Cpu, bus: &mut B) -> u8 {
        match self {
            ByteTarget::R(r) => r.read(cpu),
            ByteTarget::I(i) => bus.read(i.resolve(cpu)),
        }
    }

    #[inline]
    pub fn write<B: BusDevice>(&self, cpu: &mut Cpu, bus: &mut B, value: u8) {
        match self {
            ByteTarget::R(r) => r.write(cpu, value),
            ByteTarget::I(i) => bus.write(i.resolve(cpu), value),
        }
    }

    #[inline]
    pub const fn access_cycles(&self) -> u16 {
        match self {
            ByteTarget::R(_) => 0,
            ByteTarget::I(i) => i.access_cycles(),
        }
    }
}

impl fmt::Display for ByteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteTarget::R(r) => write!(f, "{r}"),
            ByteTarget::I(i) => write!(f, "{i}"),
        }
    }
}

/// Defines a source a byte value can be read from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteSource {
    R(Register),
    I(ByteRef),
    /// The value comes from the next 8 bits.
    D8(u8),
}

impl ByteSource {
    /// Decodes the register code in the lower 3 opcode bits.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => ByteSource::R(Register::B),
            1 => ByteSource::R(Register::C),
            2 => ByteSource::R(Register::D),
            3 => ByteSource::R(Register::E),
            4 => ByteSource::R(Register::H),
            5 => ByteSource::R(Register::L),
            6 => ByteSource::I(ByteRef::R(WordRegister::HL)),
            _ => ByteSource::R(Register::A),
        }
    }

    #[inline]
    pub fn read<B: BusDevice>(&self, cpu: &Cpu, bus: &mut B) -> u8 {
        match self {
            ByteSource::R(r) => r.read(cpu),
            ByteSource::I(i) => bus.read(i.resolve(cpu)),
            ByteSource::D8(value) => *value,
        }
    }

    #[inline]
    pub const fn access_cycles(&self) -> u16 {
        match self {
            ByteSource::R(_) => 0,
            ByteSource::D8(_) => 4,
            ByteSource::I(i) => i.access_cycles(),
        }
    }
}

impl fmt::Display for ByteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::R(r) => write!(f, "{r}"),
            ByteSource::I(i) => write!(f, "{i}"),
            ByteSource::D8(value) => write!(f, "{value:#04x}"),
        }
    }
}

/// Defines the source of a word value.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WordSource {
    R(WordRegister),
    /// The value comes from the next 16 bits.
    D16(u16),
}

impl WordSource {
    #[inline]
    pub fn read(&self, cpu: &Cpu) -> u16 {
        match self {
            WordSource::R(r) => r.read(cpu),
            WordSource::D16(value) => *value,
        }
    }
}

impl fmt::Display for WordSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WordSource::R(r) => write!(f, "{r}"),
            WordSource::D16(value) => write!(f, "{value:#06x}"),
        }
    }
}

/// Defines the possible load operations.
#[derive(Copy, Clone)]
pub enum Load {
    /// A plain 8-bit load between registers, memory and immediates.
    Byte(ByteTarget, ByteSource),
    /// A 16-bit load into a register pair.
    Word(WordRegister, WordSource),
    /// Store A at the address held by HL, then increment HL.
    HLIFromAInc,
    /// Store A at the address held by HL, then decrement HL.
    HLIFromADec,
    /// Load A from the address held by HL, then increment HL.
    HLIToAInc,
    /// Load A from the address held by HL, then decrement HL.
    HLIToADec,
    /// Store SP at the given 16-bit address, little-endian.
    IndirectFromSP(u16),
    /// Add a signed immediate to SP and store the result in HL.
    HLFromSPi8(i8),
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Load::Byte(target, source) => write!(f, "{target}, {source}"),
            Load::Word(target, source) => write!(f, "{target}, {source}"),
            Load::HLIFromAInc => f.write_str("(HL+), A"),
            Load::HLIFromADec => f.write_str("(HL-), A"),
            Load::HLIToAInc => f.write_str("A, (HL+)"),
            Load::HLIToADec => f.write_str("A, (HL-)"),
            Load::IndirectFromSP(address) => write!(f, "({address:#06x}), SP"),
            Load::HLFromSPi8(value) => write!(f, "HL, SP{value:+}"),
        }
    }
}

/// Possible conditions for JP, JR, CALL and RET.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum JumpCondition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
    Always,
}

impl JumpCondition {
    /// Resolves whether the condition is met.
    #[inline]
    pub fn resolve(&self, cpu: &Cpu) -> bool {
        match self {
            JumpCondition::NotZero => !cpu.r.f.contains(Flags::ZERO),
            JumpCondition::Zero => cpu.r.f.contains(Flags::ZERO),
            JumpCondition::NotCarry => !cpu.r.f.contains(Flags::CARRY),
            JumpCondition::Carry => cpu.r.f.contains(Flags::CARRY),
            JumpCondition::Always => true,
        }
    }
}

impl fmt::Display for JumpCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            JumpCondition::NotZero => "NZ",
            JumpCondition::Zero => "Z",
            JumpCondition::NotCarry => "NC",
            JumpCondition::Carry => "C",
            JumpCondition::Always => "",
        };
        f.write_str(ident)
    }
}

/// Defines a target address of an absolute jump.
#[derive(Copy, Clone)]
pub enum JumpTarget {
    /// The target comes from the next 16 bits.
    D16(u16),
    /// The target is the current value of HL.
    HL,
}

impl JumpTarget {
    #[inline]
    pub fn read(&self, cpu: &Cpu) -> u16 {
        match self {
            JumpTarget::D16(address) => *address,
            JumpTarget::HL => cpu.r.get_hl(),
        }
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JumpTarget::D16(address) => write!(f, "{address:#06x}"),
            JumpTarget::HL => f.write_str("HL"),
        }
    }
}

/// The eight fixed RST vectors.
#[repr(u16)]
#[derive(Copy, Clone, Debug)]
pub enum ResetCode {
    Rst00 = 0x00,
    Rst08 = 0x08,
    Rst10 = 0x10,
    Rst18 = 0x18,
    Rst20 = 0x20,
    Rst28 = 0x28,
    Rst30 = 0x30,
    Rst38 = 0x38,
}

impl fmt::Display for ResetCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", *self as u16)
    }
}
