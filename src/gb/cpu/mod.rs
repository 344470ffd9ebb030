use crate::gb::BusDevice;
use crate::gb::cpu::instruction::Instruction;
use crate::gb::cpu::ops::{
    ByteSource, ByteTarget, JumpCondition, JumpTarget, Load, ResetCode, WordRegister, WordSource,
};
use crate::gb::cpu::registers::{Flags, Registers};
use crate::gb::utils;

pub mod instruction;
pub mod ops;
pub mod registers;
#[cfg(test)]
mod tests;

/// Number of T-cycles per machine cycle.
pub const CLOCKS_PER_CYCLE: u16 = 4;

/// The interrupt master enable. EI only takes effect after the
/// instruction that follows it, which the pending state models.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ImeState {
    Disabled,
    Pending,
    Enabled,
}

/// Counts the T-cycles consumed by the current instruction.
#[derive(Default)]
pub struct Clock {
    t_cycles: u16,
}

impl Clock {
    #[inline]
    pub fn advance(&mut self, cycles: u16) {
        self.t_cycles = self.t_cycles.wrapping_add(cycles);
    }

    #[inline]
    pub fn ticks(&self) -> u16 {
        self.t_cycles
    }

    #[inline]
    pub fn reset(&mut self) {
        self.t_cycles = 0;
    }
}

/// Implements the LR35902, the 8080/Z80 hybrid inside the DMG.
pub struct Cpu {
    pub r: Registers,
    pub pc: u16,
    pub sp: u16,
    pub ime: ImeState,
    pub is_halted: bool,
    pub is_stopped: bool,
    clock: Clock,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            r: Registers::default(),
            pc: 0,
            sp: 0,
            ime: ImeState::Disabled,
            is_halted: false,
            is_stopped: false,
            clock: Clock::default(),
        }
    }
}

impl Cpu {
    /// Creates a CPU with the documented post-boot register file.
    pub fn power_on() -> Self {
        Self {
            r: Registers::power_on(),
            pc: 0x0100,
            sp: 0xFFFE,
            ..Self::default()
        }
    }

    /// Executes a single instruction and returns the number of elapsed
    /// T-cycles, always a multiple of 4. A halted or stopped CPU idles
    /// at 4 cycles per step until an interrupt wakes it up.
    pub fn step<B: BusDevice>(&mut self, bus: &mut B) -> u16 {
        self.clock.reset();

        // EI takes effect after the instruction that follows it
        if self.ime == ImeState::Pending {
            self.ime = ImeState::Enabled;
        }

        if self.is_halted || self.is_stopped {
            self.clock.advance(CLOCKS_PER_CYCLE);
            return self.clock.ticks();
        }

        let (instruction, next_address) = Instruction::new(self.pc, bus);
        self.pc = next_address;
        match instruction {
            Some(instruction) => self.execute(instruction, bus),
            // The unused opcodes behave like NOP on real hardware
            None => self.clock.advance(CLOCKS_PER_CYCLE),
        }
        self.clock.ticks()
    }

    /// Executes the given instruction and advances the internal clock.
    fn execute<B: BusDevice>(&mut self, instruction: Instruction, bus: &mut B) {
        match instruction {
            Instruction::ADD(source) => self.handle_add(source, bus),
            Instruction::ADDHL(source) => self.handle_add_hl(source),
            Instruction::ADDSP(value) => self.handle_add_sp(value),
            Instruction::ADC(source) => self.handle_adc(source, bus),
            Instruction::AND(source) => self.handle_and(source, bus),
            Instruction::BIT(bit, target) => self.handle_bit(bit, target, bus),
            Instruction::CALL(condition, address) => self.handle_call(condition, address, bus),
            Instruction::CCF => self.handle_ccf(),
            Instruction::CP(source) => self.handle_cp(source, bus),
            Instruction::CPL => self.handle_cpl(),
            Instruction::DAA => self.handle_daa(),
            Instruction::DEC(target) => self.handle_dec_byte(target, bus),
            Instruction::DEC2(target) => self.handle_dec_word(target),
            Instruction::DI => self.handle_di(),
            Instruction::EI => self.handle_ei(),
            Instruction::HALT => self.handle_halt(),
            Instruction::INC(target) => self.handle_inc_byte(target, bus),
            Instruction::INC2(target) => self.handle_inc_word(target),
            Instruction::JP(condition, target) => self.handle_jp(condition, target),
            Instruction::JR(condition, offset) => self.handle_jr(condition, offset),
            Instruction::LD(load) => self.handle_ld(load, bus),
            Instruction::NOP => self.clock.advance(CLOCKS_PER_CYCLE),
            Instruction::OR(source) => self.handle_or(source, bus),
            Instruction::POP(target) => self.handle_pop(target, bus),
            Instruction::PUSH(target) => self.handle_push(target, bus),
            Instruction::RES(bit, target) => self.handle_res(bit, target, bus),
            Instruction::RET(condition) => self.handle_ret(condition, bus),
            Instruction::RETI => self.handle_reti(bus),
            Instruction::RL(target) => self.handle_rl(target, bus),
            Instruction::RLA => self.handle_rla(),
            Instruction::RLC(target) => self.handle_rlc(target, bus),
            Instruction::RLCA => self.handle_rlca(),
            Instruction::RR(target) => self.handle_rr(target, bus),
            Instruction::RRA => self.handle_rra(),
            Instruction::RRC(target) => self.handle_rrc(target, bus),
            Instruction::RRCA => self.handle_rrca(),
            Instruction::RST(code) => self.handle_rst(code, bus),
            Instruction::SBC(source) => self.handle_sbc(source, bus),
            Instruction::SCF => self.handle_scf(),
            Instruction::SET(bit, target) => self.handle_set(bit, target, bus),
            Instruction::SLA(target) => self.handle_sla(target, bus),
            Instruction::SRA(target) => self.handle_sra(target, bus),
            Instruction::SRL(target) => self.handle_srl(target, bus),
            Instruction::STOP => self.handle_stop(),
            Instruction::SUB(source) => self.handle_sub(source, bus),
            Instruction::SWAP(target) => self.handle_swap(target, bus),
            Instruction::XOR(source) => self.handle_xor(source, bus),
        }
    }

    /// Pushes a word onto the stack, high byte first.
    pub fn push<B: BusDevice>(&mut self, value: u16, bus: &mut B) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (value >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, value as u8);
    }

    /// Pops a word off the stack.
    fn pop<B: BusDevice>(&mut self, bus: &mut B) -> u16 {
        let lsb = u16::from(bus.read(self.sp));
        self.sp = self.sp.wrapping_add(1);
        let msb = u16::from(bus.read(self.sp));
        self.sp = self.sp.wrapping_add(1);
        msb << 8 | lsb
    }

    fn handle_add<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        let value = source.read(self, bus);
        let (result, carry) = self.r.a.overflowing_add(value);
        self.r.f.update(
            result == 0,
            false,
            utils::half_carry_add_u8(self.r.a, value),
            carry,
        );
        self.r.a = result;
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_adc<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        let value = source.read(self, bus);
        let carry_in = self.r.f.carry() as u8;
        let half_carry = (self.r.a & 0x0F) + (value & 0x0F) + carry_in > 0x0F;

        let (result, carry1) = self.r.a.overflowing_add(value);
        let (result, carry2) = result.overflowing_add(carry_in);
        self.r.f.update(result == 0, false, half_carry, carry1 | carry2);
        self.r.a = result;
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_sub<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        let value = source.read(self, bus);
        let result = self.r.a.wrapping_sub(value);
        self.r.f.update(
            result == 0,
            true,
            utils::half_carry_sub_u8(self.r.a, value),
            self.r.a < value,
        );
        self.r.a = result;
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_sbc<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        let value = source.read(self, bus);
        let carry_in = self.r.f.carry() as u8;
        let result = self.r.a.wrapping_sub(value).wrapping_sub(carry_in);
        let half_carry = (self.r.a & 0x0F) < (value & 0x0F) + carry_in;
        let carry = u16::from(self.r.a) < u16::from(value) + u16::from(carry_in);
        self.r.f.update(result == 0, true, half_carry, carry);
        self.r.a = result;
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    /// CP is a SUB that throws away the result.
    fn handle_cp<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        let value = source.read(self, bus);
        let result = self.r.a.wrapping_sub(value);
        self.r.f.update(
            result == 0,
            true,
            utils::half_carry_sub_u8(self.r.a, value),
            self.r.a < value,
        );
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_and<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        self.r.a &= source.read(self, bus);
        self.r.f.update(self.r.a == 0, false, true, false);
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_or<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        self.r.a |= source.read(self, bus);
        self.r.f.update(self.r.a == 0, false, false, false);
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_xor<B: BusDevice>(&mut self, source: ByteSource, bus: &mut B) {
        self.r.a ^= source.read(self, bus);
        self.r.f.update(self.r.a == 0, false, false, false);
        self.clock.advance(CLOCKS_PER_CYCLE + source.access_cycles());
    }

    fn handle_inc_byte<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value.wrapping_add(1);
        target.write(self, bus, result);
        self.r.f.set(Flags::ZERO, result == 0);
        self.r.f.set(Flags::SUBTRACTION, false);
        self.r.f.set(Flags::HALF_CARRY, value & 0x0F == 0x0F);
        self.clock
            .advance(CLOCKS_PER_CYCLE + target.access_cycles() * 2);
    }

    fn handle_dec_byte<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value.wrapping_sub(1);
        target.write(self, bus, result);
        self.r.f.set(Flags::ZERO, result == 0);
        self.r.f.set(Flags::SUBTRACTION, true);
        self.r.f.set(Flags::HALF_CARRY, value & 0x0F == 0);
        self.clock
            .advance(CLOCKS_PER_CYCLE + target.access_cycles() * 2);
    }

    fn handle_inc_word(&mut self, target: WordRegister) {
        target.write(self, target.read(self).wrapping_add(1));
        self.clock.advance(CLOCKS_PER_CYCLE * 2);
    }

    fn handle_dec_word(&mut self, target: WordRegister) {
        target.write(self, target.read(self).wrapping_sub(1));
        self.clock.advance(CLOCKS_PER_CYCLE * 2);
    }

    /// ADD HL, rr: the half carry comes from bit 11, Z is untouched.
    fn handle_add_hl(&mut self, source: WordRegister) {
        let hl = self.r.get_hl();
        let value = source.read(self);
        let (result, carry) = hl.overflowing_add(value);
        self.r.f.set(Flags::SUBTRACTION, false);
        self.r
            .f
            .set(Flags::HALF_CARRY, (hl ^ value ^ result) & 0x1000 != 0);
        self.r.f.set(Flags::CARRY, carry);
        self.r.set_hl(result);
        self.clock.advance(CLOCKS_PER_CYCLE * 2);
    }

    /// ADD SP, e: both carries are computed on the low byte of SP.
    fn handle_add_sp(&mut self, value: i8) {
        self.sp = self.add_sp_i8(value);
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
    }

    /// Adds a signed immediate to SP and updates the flags; shared by
    /// ADD SP, e and LD HL, SP+e.
    fn add_sp_i8(&mut self, value: i8) -> u16 {
        let sp = self.sp;
        let offset = value as u16;
        let result = sp.wrapping_add(offset);
        let half_carry = (sp & 0x0F) + (offset & 0x0F) > 0x0F;
        let carry = (sp & 0xFF) + (offset & 0xFF) > 0xFF;
        self.r.f.update(false, false, half_carry, carry);
        result
    }

    fn handle_ld<B: BusDevice>(&mut self, load: Load, bus: &mut B) {
        match load {
            Load::Byte(target, source) => {
                let value = source.read(self, bus);
                target.write(self, bus, value);
                self.clock.advance(
                    CLOCKS_PER_CYCLE + source.access_cycles() + target.access_cycles(),
                );
            }
            Load::Word(target, source) => {
                let value = source.read(self);
                target.write(self, value);
                let cycles = match source {
                    WordSource::D16(_) => CLOCKS_PER_CYCLE * 3,
                    WordSource::R(_) => CLOCKS_PER_CYCLE * 2,
                };
                self.clock.advance(cycles);
            }
            Load::HLIFromAInc => {
                let address = self.r.get_hl();
                bus.write(address, self.r.a);
                self.r.set_hl(address.wrapping_add(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::HLIFromADec => {
                let address = self.r.get_hl();
                bus.write(address, self.r.a);
                self.r.set_hl(address.wrapping_sub(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::HLIToAInc => {
                let address = self.r.get_hl();
                self.r.a = bus.read(address);
                self.r.set_hl(address.wrapping_add(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::HLIToADec => {
                let address = self.r.get_hl();
                self.r.a = bus.read(address);
                self.r.set_hl(address.wrapping_sub(1));
                self.clock.advance(CLOCKS_PER_CYCLE * 2);
            }
            Load::IndirectFromSP(address) => {
                bus.write_word(address, self.sp);
                self.clock.advance(CLOCKS_PER_CYCLE * 5);
            }
            Load::HLFromSPi8(value) => {
                let result = self.add_sp_i8(value);
                self.r.set_hl(result);
                self.clock.advance(CLOCKS_PER_CYCLE * 3);
            }
        }
    }

    fn handle_jr(&mut self, condition: JumpCondition, offset: i8) {
        match condition.resolve(self) {
            true => {
                self.pc = self.pc.wrapping_add_signed(i16::from(offset));
                self.clock.advance(CLOCKS_PER_CYCLE * 3);
            }
            false => self.clock.advance(CLOCKS_PER_CYCLE * 2),
        }
    }

    fn handle_jp(&mut self, condition: JumpCondition, target: JumpTarget) {
        // JP (HL) loads the program counter directly without a fetch
        if let JumpTarget::HL = target {
            self.pc = target.read(self);
            self.clock.advance(CLOCKS_PER_CYCLE);
            return;
        }
        match condition.resolve(self) {
            true => {
                self.pc = target.read(self);
                self.clock.advance(CLOCKS_PER_CYCLE * 4);
            }
            false => self.clock.advance(CLOCKS_PER_CYCLE * 3),
        }
    }

    fn handle_call<B: BusDevice>(&mut self, condition: JumpCondition, address: u16, bus: &mut B) {
        match condition.resolve(self) {
            true => {
                self.push(self.pc, bus);
                self.pc = address;
                self.clock.advance(CLOCKS_PER_CYCLE * 6);
            }
            false => self.clock.advance(CLOCKS_PER_CYCLE * 3),
        }
    }

    fn handle_ret<B: BusDevice>(&mut self, condition: JumpCondition, bus: &mut B) {
        let cycles = if condition == JumpCondition::Always {
            CLOCKS_PER_CYCLE * 4
        } else if condition.resolve(self) {
            CLOCKS_PER_CYCLE * 5
        } else {
            CLOCKS_PER_CYCLE * 2
        };
        if condition.resolve(self) {
            self.pc = self.pop(bus);
        }
        self.clock.advance(cycles);
    }

    fn handle_reti<B: BusDevice>(&mut self, bus: &mut B) {
        self.pc = self.pop(bus);
        self.ime = ImeState::Enabled;
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
    }

    fn handle_rst<B: BusDevice>(&mut self, code: ResetCode, bus: &mut B) {
        self.push(self.pc, bus);
        self.pc = code as u16;
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
    }

    fn handle_push<B: BusDevice>(&mut self, target: WordRegister, bus: &mut B) {
        let value = target.read(self);
        self.push(value, bus);
        self.clock.advance(CLOCKS_PER_CYCLE * 4);
    }

    fn handle_pop<B: BusDevice>(&mut self, target: WordRegister, bus: &mut B) {
        let value = self.pop(bus);
        target.write(self, value);
        self.clock.advance(CLOCKS_PER_CYCLE * 3);
    }

    fn handle_di(&mut self) {
        self.ime = ImeState::Disabled;
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    /// EI only takes effect after the following instruction.
    fn handle_ei(&mut self) {
        if self.ime == ImeState::Disabled {
            self.ime = ImeState::Pending;
        }
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_halt(&mut self) {
        self.is_halted = true;
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_stop(&mut self) {
        self.is_stopped = true;
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_cpl(&mut self) {
        self.r.a = !self.r.a;
        self.r.f.set(Flags::SUBTRACTION, true);
        self.r.f.set(Flags::HALF_CARRY, true);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_scf(&mut self) {
        self.r.f.set(Flags::SUBTRACTION, false);
        self.r.f.set(Flags::HALF_CARRY, false);
        self.r.f.set(Flags::CARRY, true);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_ccf(&mut self) {
        self.r.f.set(Flags::SUBTRACTION, false);
        self.r.f.set(Flags::HALF_CARRY, false);
        self.r.f.toggle(Flags::CARRY);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    /// Decimal adjust A to a valid BCD pair after an addition or
    /// subtraction of two BCD values.
    fn handle_daa(&mut self) {
        if self.r.f.contains(Flags::SUBTRACTION) {
            if self.r.f.contains(Flags::CARRY) {
                self.r.a = self.r.a.wrapping_sub(0x60);
            }
            if self.r.f.contains(Flags::HALF_CARRY) {
                self.r.a = self.r.a.wrapping_sub(0x06);
            }
        } else {
            if self.r.f.contains(Flags::CARRY) || self.r.a > 0x99 {
                self.r.a = self.r.a.wrapping_add(0x60);
                self.r.f.set(Flags::CARRY, true);
            }
            if self.r.f.contains(Flags::HALF_CARRY) || self.r.a & 0x0F > 0x09 {
                self.r.a = self.r.a.wrapping_add(0x06);
            }
        }
        self.r.f.set(Flags::ZERO, self.r.a == 0);
        self.r.f.set(Flags::HALF_CARRY, false);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_rlca(&mut self) {
        let carry = self.r.a & 0x80 != 0;
        self.r.a = self.r.a.rotate_left(1);
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_rrca(&mut self) {
        let carry = self.r.a & 0x01 != 0;
        self.r.a = self.r.a.rotate_right(1);
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_rla(&mut self) {
        let carry = self.r.a & 0x80 != 0;
        self.r.a = self.r.a << 1 | self.r.f.carry() as u8;
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_rra(&mut self) {
        let carry = self.r.a & 0x01 != 0;
        self.r.a = self.r.a >> 1 | (self.r.f.carry() as u8) << 7;
        self.r.f.update(false, false, false, carry);
        self.clock.advance(CLOCKS_PER_CYCLE);
    }

    fn handle_rlc<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value.rotate_left(1);
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x80 != 0);
        self.advance_cb(target);
    }

    fn handle_rrc<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value.rotate_right(1);
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        self.advance_cb(target);
    }

    fn handle_rl<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value << 1 | self.r.f.carry() as u8;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x80 != 0);
        self.advance_cb(target);
    }

    fn handle_rr<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value >> 1 | (self.r.f.carry() as u8) << 7;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        self.advance_cb(target);
    }

    fn handle_sla<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value << 1;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x80 != 0);
        self.advance_cb(target);
    }

    /// SRA keeps the sign bit.
    fn handle_sra<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value >> 1 | value & 0x80;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        self.advance_cb(target);
    }

    fn handle_srl<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        let result = value >> 1;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        self.advance_cb(target);
    }

    fn handle_swap<B: BusDevice>(&mut self, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        target.write(self, bus, value.rotate_right(4));
        self.r.f.update(value == 0, false, false, false);
        self.advance_cb(target);
    }

    fn handle_bit<B: BusDevice>(&mut self, bit: u8, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        self.r.f.set(Flags::ZERO, !utils::bit_at(value, bit));
        self.r.f.set(Flags::SUBTRACTION, false);
        self.r.f.set(Flags::HALF_CARRY, true);
        // Unlike the other CB operations BIT never writes back
        self.clock
            .advance(CLOCKS_PER_CYCLE * 2 + target.access_cycles());
    }

    fn handle_res<B: BusDevice>(&mut self, bit: u8, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, false));
        self.advance_cb(target);
    }

    fn handle_set<B: BusDevice>(&mut self, bit: u8, target: ByteTarget, bus: &mut B) {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, true));
        self.advance_cb(target);
    }

    /// CB operations cost 8 cycles, plus a read and a write when the
    /// target is the byte at address HL.
    #[inline]
    fn advance_cb(&mut self, target: ByteTarget) {
        self.clock
            .advance(CLOCKS_PER_CYCLE * 2 + target.access_cycles() * 2);
    }
}
