use crate::gb::bus::MemoryBus;
use crate::gb::cpu::{Cpu, ImeState};

const VBLANK_IRQ_ADDRESS: u16 = 0x0040;
const LCD_IRQ_ADDRESS: u16 = 0x0048;
const TIMER_IRQ_ADDRESS: u16 = 0x0050;
const SERIAL_IRQ_ADDRESS: u16 = 0x0058;
const JOYPAD_IRQ_ADDRESS: u16 = 0x0060;

/// The interrupt dispatch sequence takes 5 machine cycles.
pub const DISPATCH_CYCLES: u16 = 20;

bitflags! {
    /// Represents the interrupt registers IE at 0xFFFF and IF at 0xFF0F.
    /// Only the lower 5 bits are defined, the flag order doubles
    /// as the service priority (V-Blank first).
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    pub struct InterruptFlags: u8 {
        const VBLANK = 0b0000_0001;
        const STAT   = 0b0000_0010;
        const TIMER  = 0b0000_0100;
        const SERIAL = 0b0000_1000;
        const JOYPAD = 0b0001_0000;
    }
}

impl InterruptFlags {
    /// Returns the interrupt vector the CPU jumps to for this request.
    fn vector(self) -> u16 {
        match self {
            InterruptFlags::VBLANK => VBLANK_IRQ_ADDRESS,
            InterruptFlags::STAT => LCD_IRQ_ADDRESS,
            InterruptFlags::TIMER => TIMER_IRQ_ADDRESS,
            InterruptFlags::SERIAL => SERIAL_IRQ_ADDRESS,
            InterruptFlags::JOYPAD => JOYPAD_IRQ_ADDRESS,
            _ => unreachable!(),
        }
    }
}

/// Polls the interrupt controller between instructions.
/// Wakes the CPU from HALT/STOP and dispatches the highest priority
/// pending request if the master enable is set.
/// Returns the number of cycles consumed by the dispatch sequence.
pub fn handle(cpu: &mut Cpu, bus: &mut MemoryBus) -> u16 {
    // STOP waits for a button press, not for an enabled interrupt
    if cpu.is_stopped && bus.interrupt_flag.contains(InterruptFlags::JOYPAD) {
        cpu.is_stopped = false;
    }

    if !bus.has_pending_interrupt() {
        return 0;
    }

    // The CPU always leaves HALT on a pending interrupt, even with IME
    // disabled; in that case execution resumes without a dispatch.
    cpu.is_halted = false;

    if cpu.ime != ImeState::Enabled {
        return 0;
    }

    for irq in [
        InterruptFlags::VBLANK,
        InterruptFlags::STAT,
        InterruptFlags::TIMER,
        InterruptFlags::SERIAL,
        InterruptFlags::JOYPAD,
    ] {
        if bus.interrupt_enable.contains(irq) && bus.interrupt_flag.contains(irq) {
            bus.interrupt_flag.remove(irq);
            dispatch(cpu, bus, irq.vector());
            return DISPATCH_CYCLES;
        }
    }
    0
}

/// Transfers control to the given interrupt vector.
fn dispatch(cpu: &mut Cpu, bus: &mut MemoryBus, address: u16) {
    cpu.ime = ImeState::Disabled;
    // Save the current execution address by pushing it onto the stack
    cpu.push(cpu.pc, bus);
    cpu.pc = address;
}
