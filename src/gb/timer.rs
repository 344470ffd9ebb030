use crate::gb::BusDevice;
use crate::gb::constants::*;
use crate::gb::interrupt::InterruptFlags;

bitflags! {
    /// Represents the timer control register (TAC) at 0xFF07.
    /// Bits 1..0 select the input clock, bit 2 enables the counter.
    #[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
    pub struct TimerControl: u8 {
        const CLOCK1  = 0b0000_0001;
        const CLOCK2  = 0b0000_0010;
        const ENABLED = 0b0000_0100;
    }
}

impl TimerControl {
    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.contains(TimerControl::ENABLED)
    }

    /// Returns the number of CPU cycles per TIMA tick for the selected
    /// input clock. This is the CPU clock (4194304 Hz) divided by the
    /// tick frequency.
    pub const fn cycles_per_tick(&self) -> u16 {
        match self.bits() & 0b11 {
            0b00 => 1024, // 4096 Hz
            0b01 => 16,   // 262144 Hz
            0b10 => 64,   // 65536 Hz
            _ => 256,     // 16384 Hz
        }
    }
}

/// The programmable timer. DIV is the upper byte of a free running
/// 16-bit counter; TIMA ticks at the TAC-selected rate and requests
/// an interrupt when it overflows.
#[derive(Clone, Default)]
pub struct Timer {
    divider: u16,
    pub counter: u8,
    pub modulo: u8,
    pub control: TimerControl,
    tima_cycles: u16,
}

impl Timer {
    /// Advances the timer by the given number of T-cycles.
    pub fn step(&mut self, cycles: u16, int_flag: &mut InterruptFlags) {
        self.divider = self.divider.wrapping_add(cycles);

        if !self.control.is_enabled() {
            return;
        }

        self.tima_cycles += cycles;
        let period = self.control.cycles_per_tick();
        while self.tima_cycles >= period {
            self.tima_cycles -= period;
            let (value, overflow) = self.counter.overflowing_add(1);
            self.counter = match overflow {
                true => {
                    int_flag.insert(InterruptFlags::TIMER);
                    self.modulo
                }
                false => value,
            };
        }
    }
}

impl BusDevice for Timer {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            // Any write resets the whole internal counter
            TIMER_DIVIDER => self.divider = 0,
            TIMER_COUNTER => self.counter = value,
            TIMER_MODULO => self.modulo = value,
            TIMER_CTRL => self.control = TimerControl::from_bits_truncate(value),
            _ => unreachable!("Timer: invalid address for write: {address:#06x}"),
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            TIMER_DIVIDER => (self.divider >> 8) as u8,
            TIMER_COUNTER => self.counter,
            TIMER_MODULO => self.modulo,
            // Undocumented bits read as 1
            TIMER_CTRL => self.control.bits() | 0b1111_1000,
            _ => unreachable!("Timer: invalid address for read: {address:#06x}"),
        }
    }
}
