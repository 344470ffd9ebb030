use crate::gb::interrupt::InterruptFlags;
use crate::gb::utils;

/// Represents the state of all eight buttons.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct JoypadInput {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
}

impl JoypadInput {
    /// The action group as a nibble, a set bit means pressed.
    const fn action_nibble(self) -> u8 {
        self.a as u8 | (self.b as u8) << 1 | (self.select as u8) << 2 | (self.start as u8) << 3
    }

    /// The direction group as a nibble, a set bit means pressed.
    const fn dpad_nibble(self) -> u8 {
        self.right as u8 | (self.left as u8) << 1 | (self.up as u8) << 2 | (self.down as u8) << 3
    }
}

/// Represents the joypad register at 0xFF00.
/// The eight buttons are arranged as a 2x4 matrix; software selects a
/// group by clearing bit 4 (directions) or bit 5 (actions) and reads the
/// low nibble, where a pressed button reads as 0.
#[derive(Copy, Clone, Default, Debug)]
pub struct Joypad {
    select_action: bool,
    select_dpad: bool,
    state: JoypadInput,
}

impl Joypad {
    /// Latches a new button state and requests the joypad interrupt if a
    /// selected line transitions from released to pressed.
    pub fn set_state(&mut self, input: JoypadInput, int_flag: &mut InterruptFlags) {
        let before = self.selected_nibble();
        self.state = input;
        let after = self.selected_nibble();
        if after & !before != 0 {
            int_flag.insert(InterruptFlags::JOYPAD);
        }
    }

    /// Assembles the register value; the lower nibble is active-low.
    pub const fn read(&self) -> u8 {
        let mut value = 0b1100_0000 | (!self.selected_nibble() & 0x0F);
        value = utils::set_bit(value, 4, !self.select_dpad);
        value = utils::set_bit(value, 5, !self.select_action);
        value
    }

    /// Writes the group selection bits; the lower nibble is read-only.
    pub const fn write(&mut self, value: u8) {
        self.select_dpad = !utils::bit_at(value, 4);
        self.select_action = !utils::bit_at(value, 5);
    }

    /// The pressed-button nibble of all currently selected groups.
    /// With no group selected all lines read as released.
    const fn selected_nibble(&self) -> u8 {
        let mut pressed = 0;
        if self.select_action {
            pressed |= self.state.action_nibble();
        }
        if self.select_dpad {
            pressed |= self.state.dpad_nibble();
        }
        pressed
    }
}
