/// Holds all CPU registers. The pairs AF, BC, DE and HL are views
/// over the individual 8-bit registers.
#[derive(Copy, Clone, Default)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: Flags,
    pub h: u8,
    pub l: u8,
}

impl Registers {
    /// The documented register values after power-on.
    pub fn power_on() -> Self {
        Self {
            a: 0x01,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            f: Flags::from_bits_truncate(0xB0),
            h: 0x01,
            l: 0x4D,
        }
    }

    #[inline]
    pub fn get_af(&self) -> u16 {
        u16::from(self.a) << 8 | u16::from(self.f.bits())
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = Flags::from_bits_truncate(value as u8);
    }

    #[inline]
    pub fn get_bc(&self) -> u16 {
        u16::from(self.b) << 8 | u16::from(self.c)
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    #[inline]
    pub fn get_de(&self) -> u16 {
        u16::from(self.d) << 8 | u16::from(self.e)
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    #[inline]
    pub fn get_hl(&self) -> u16 {
        u16::from(self.h) << 8 | u16::from(self.l)
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }
}

bitflags! {
    /// Represents the special purpose flags register.
    /// Only the upper 4 bits are defined, the lower nibble is
    /// structurally zero.
    ///
    ///    ┌-> Carry
    ///  ┌-+> Subtraction
    ///  | |
    /// 1111 0000
    /// | |
    /// └-+> Zero
    ///   └-> Half Carry
    #[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
    pub struct Flags: u8 {
        const ZERO        = 0b1000_0000;
        const SUBTRACTION = 0b0100_0000;
        const HALF_CARRY  = 0b0010_0000;
        const CARRY       = 0b0001_0000;
    }
}

impl Flags {
    /// Replaces all four flags at once.
    #[inline]
    pub fn update(&mut self, zero: bool, subtraction: bool, half_carry: bool, carry: bool) {
        self.set(Flags::ZERO, zero);
        self.set(Flags::SUBTRACTION, subtraction);
        self.set(Flags::HALF_CARRY, half_carry);
        self.set(Flags::CARRY, carry);
    }

    #[inline]
    pub fn carry(&self) -> bool {
        self.contains(Flags::CARRY)
    }
}
