use crate::gb::apu::channel::{NoiseChannel, SquareChannel, WaveChannel};
use crate::gb::constants::{AUDIO_REGISTERS_BEGIN, AUDIO_REGISTERS_SIZE, UNDEFINED_READ};
use crate::gb::{BusDevice, CPU_CLOCK_SPEED};
use std::collections::VecDeque;

mod channel;
#[cfg(test)]
mod tests;

/// Channel 1 period sweep.
pub const NR10: u16 = 0xFF10;
/// Channel 1 length timer and duty cycle.
pub const NR11: u16 = 0xFF11;
/// Channel 1 volume and envelope.
pub const NR12: u16 = 0xFF12;
/// Channel 1 period, low 8 bits of the 11-bit value.
pub const NR13: u16 = 0xFF13;
/// Channel 1 period high bits, trigger and length enable.
pub const NR14: u16 = 0xFF14;

pub const NR21: u16 = 0xFF16;
pub const NR22: u16 = 0xFF17;
pub const NR23: u16 = 0xFF18;
pub const NR24: u16 = 0xFF19;

/// Channel 3 DAC enable.
pub const NR30: u16 = 0xFF1A;
pub const NR31: u16 = 0xFF1B;
pub const NR32: u16 = 0xFF1C;
pub const NR33: u16 = 0xFF1D;
pub const NR34: u16 = 0xFF1E;

pub const NR41: u16 = 0xFF20;
pub const NR42: u16 = 0xFF21;
/// Channel 4 clock shift, LFSR width and divisor code.
pub const NR43: u16 = 0xFF22;
pub const NR44: u16 = 0xFF23;

/// Master volume per output terminal.
pub const NR50: u16 = 0xFF24;
/// Per-channel panning.
pub const NR51: u16 = 0xFF25;
/// Audio power control and channel status.
pub const NR52: u16 = 0xFF26;

/// Wave RAM, 16 bytes holding two 4-bit samples each.
pub const WAVE_RAM_BEGIN: u16 = 0xFF30;
pub const WAVE_RAM_END: u16 = 0xFF3F;

pub const SAMPLE_RATE: u32 = 44_100;
const CYCLES_PER_SAMPLE: u32 = CPU_CLOCK_SPEED / SAMPLE_RATE;

/// The frame sequencer runs at 512 Hz.
const FRAME_SEQUENCER_PERIOD: u32 = 8192;

/// Upper bound of buffered stereo samples (~370 ms); once full, further
/// samples are dropped so an idle host never blocks the emulation.
const SAMPLE_QUEUE_LIMIT: usize = 16384;

/// The Audio Processing Unit. Registers are kept twice: a raw register
/// file serves read-back (with the documented OR masks), the decoded
/// channel state drives synthesis.
pub struct Apu {
    r: [u8; AUDIO_REGISTERS_SIZE],
    powered: bool,
    ch1: SquareChannel,
    ch2: SquareChannel,
    ch3: WaveChannel,
    ch4: NoiseChannel,
    left_volume: u8,
    right_volume: u8,
    panning: u8,
    sequencer_step: u8,
    sequencer_cycles: u32,
    sample_cycles: u32,
    samples: VecDeque<(i16, i16)>,
    synthesize: bool,
}

impl Default for Apu {
    fn default() -> Self {
        let mut apu = Self {
            r: [0; AUDIO_REGISTERS_SIZE],
            powered: true,
            ch1: SquareChannel::default(),
            ch2: SquareChannel::default(),
            ch3: WaveChannel::default(),
            ch4: NoiseChannel::default(),
            left_volume: 7,
            right_volume: 7,
            panning: 0xF3,
            sequencer_step: 0,
            sequencer_cycles: 0,
            sample_cycles: 0,
            samples: VecDeque::with_capacity(SAMPLE_QUEUE_LIMIT),
            synthesize: true,
        };
        // Documented register values after power-on
        apu.write(NR50, 0x77);
        apu.write(NR51, 0xF3);
        apu.write(NR11, 0xBF);
        apu.write(NR12, 0xF3);
        apu
    }
}

impl Apu {
    /// Turns sample synthesis off; the register contract is still honored.
    pub fn set_synthesis(&mut self, enabled: bool) {
        self.synthesize = enabled;
        if !enabled {
            self.samples.clear();
        }
    }

    /// Advances the frame sequencer and produces samples for the
    /// elapsed cycles.
    pub fn step(&mut self, cycles: u16) {
        if !self.powered {
            return;
        }

        self.sequencer_cycles += u32::from(cycles);
        while self.sequencer_cycles >= FRAME_SEQUENCER_PERIOD {
            self.sequencer_cycles -= FRAME_SEQUENCER_PERIOD;
            self.clock_sequencer();
        }

        if !self.synthesize {
            return;
        }
        self.sample_cycles += u32::from(cycles);
        while self.sample_cycles >= CYCLES_PER_SAMPLE {
            self.sample_cycles -= CYCLES_PER_SAMPLE;
            if self.samples.len() < SAMPLE_QUEUE_LIMIT {
                let sample = self.mix_sample();
                self.samples.push_back(sample);
            }
        }
    }

    /// Drains up to `count` buffered stereo samples, padding with
    /// silence on underrun.
    pub fn pull_samples(&mut self, count: usize) -> Vec<(i16, i16)> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.samples.pop_front().unwrap_or((0, 0)));
        }
        out
    }

    /// Number of samples currently buffered.
    #[inline]
    pub fn queued_samples(&self) -> usize {
        self.samples.len()
    }

    /// One tick of the 512 Hz frame sequencer: length counters on steps
    /// 0/2/4/6, the channel 1 sweep on 2/6 and envelopes on step 7.
    fn clock_sequencer(&mut self) {
        if self.sequencer_step % 2 == 0 {
            self.ch1.clock_length();
            self.ch2.clock_length();
            self.ch3.clock_length();
            self.ch4.clock_length();
        }
        if self.sequencer_step == 2 || self.sequencer_step == 6 {
            self.ch1.clock_sweep();
        }
        if self.sequencer_step == 7 {
            self.ch1.clock_envelope();
            self.ch2.clock_envelope();
            self.ch4.clock_envelope();
        }
        self.sequencer_step = (self.sequencer_step + 1) % 8;
    }

    /// Mixes all four channels into one stereo sample.
    fn mix_sample(&mut self) -> (i16, i16) {
        let sample_rate = SAMPLE_RATE as f32;
        let panning = self.panning;
        let mut left = 0.0;
        let mut right = 0.0;

        // NR51 routes each channel to the terminals: bits 7..4 select
        // the left outputs of channels 4..1, bits 3..0 the right ones.
        let mut mix = |sample: f32, channel: u8, left: &mut f32, right: &mut f32| {
            if panning & (1 << (channel + 4)) != 0 {
                *left += sample;
            }
            if panning & (1 << channel) != 0 {
                *right += sample;
            }
        };

        if self.ch1.enabled && self.ch1.dac_enabled {
            mix(self.ch1.sample(sample_rate), 0, &mut left, &mut right);
        }
        if self.ch2.enabled && self.ch2.dac_enabled {
            mix(self.ch2.sample(sample_rate), 1, &mut left, &mut right);
        }
        if self.ch3.enabled && self.ch3.dac_enabled {
            mix(self.ch3.sample(sample_rate), 2, &mut left, &mut right);
        }
        if self.ch4.enabled && self.ch4.dac_enabled {
            mix(self.ch4.sample(CYCLES_PER_SAMPLE), 3, &mut left, &mut right);
        }

        // Scale by the master volumes and leave headroom for 4 channels
        left *= f32::from(self.left_volume) / 7.0 * 0.25;
        right *= f32::from(self.right_volume) / 7.0 * 0.25;
        (
            (left * f32::from(i16::MAX)).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16,
            (right * f32::from(i16::MAX)).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16,
        )
    }

    /// Powering off zeroes every register and silences all channels;
    /// only NR52 itself and wave RAM stay writable.
    fn power_off(&mut self) {
        self.r = [0; AUDIO_REGISTERS_SIZE];
        self.ch1 = SquareChannel::default();
        self.ch2 = SquareChannel::default();
        self.ch3 = WaveChannel::default();
        self.ch4 = NoiseChannel::default();
        self.left_volume = 0;
        self.right_volume = 0;
        self.panning = 0;
        self.sequencer_step = 0;
        self.samples.clear();
    }

    /// The OR mask applied on register read-back; unused and
    /// write-only bits read as 1.
    const fn read_mask(address: u16) -> u8 {
        match address {
            NR10 => 0x80,
            NR11 | NR21 => 0x3F,
            NR12 | NR22 | NR42 => 0x00,
            NR13 | NR23 | NR31 | NR33 | NR41 | NR43 => 0xFF,
            NR14 | NR24 | NR34 | NR44 => 0xBF,
            NR30 => 0x7F,
            NR32 => 0x9F,
            NR50 | NR51 => 0x00,
            _ => 0xFF,
        }
    }
}

impl BusDevice for Apu {
    fn write(&mut self, address: u16, value: u8) {
        // While powered off only NR52 and wave RAM are writable
        if !self.powered && address != NR52 && !(WAVE_RAM_BEGIN..=WAVE_RAM_END).contains(&address)
        {
            return;
        }

        let offset = (address - AUDIO_REGISTERS_BEGIN) as usize;
        self.r[offset] = value;
        match address {
            NR10 => self.ch1.set_sweep(value),
            NR11 => self.ch1.set_length_duty(value),
            NR12 => self.ch1.set_envelope(value),
            NR13 => self.ch1.set_period_low(value),
            NR14 => self.ch1.set_period_high(value),
            NR21 => self.ch2.set_length_duty(value),
            NR22 => self.ch2.set_envelope(value),
            NR23 => self.ch2.set_period_low(value),
            NR24 => self.ch2.set_period_high(value),
            NR30 => self.ch3.set_dac_enable(value),
            NR31 => self.ch3.set_length(value),
            NR32 => self.ch3.set_volume(value),
            NR33 => self.ch3.set_period_low(value),
            NR34 => self.ch3.set_period_high(value),
            NR41 => self.ch4.set_length(value),
            NR42 => self.ch4.set_envelope(value),
            NR43 => self.ch4.set_frequency(value),
            NR44 => self.ch4.set_control(value),
            NR50 => {
                self.right_volume = value & 0b111;
                self.left_volume = (value >> 4) & 0b111;
            }
            NR51 => self.panning = value,
            NR52 => {
                let powered = value & 0b1000_0000 != 0;
                if self.powered && !powered {
                    self.power_off();
                }
                self.powered = powered;
            }
            WAVE_RAM_BEGIN..=WAVE_RAM_END => self
                .ch3
                .write_wave_ram((address - WAVE_RAM_BEGIN) as usize, value),
            // The gaps between the channel registers are not mapped
            _ => {}
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        let offset = (address - AUDIO_REGISTERS_BEGIN) as usize;
        match address {
            NR52 => {
                let mut value = 0b0111_0000;
                value |= (self.powered as u8) << 7;
                value |= self.ch1.enabled as u8;
                value |= (self.ch2.enabled as u8) << 1;
                value |= (self.ch3.enabled as u8) << 2;
                value |= (self.ch4.enabled as u8) << 3;
                value
            }
            WAVE_RAM_BEGIN..=WAVE_RAM_END => self.r[offset],
            AUDIO_REGISTERS_BEGIN..=WAVE_RAM_END => self.r[offset] | Self::read_mask(address),
            _ => UNDEFINED_READ,
        }
    }
}
