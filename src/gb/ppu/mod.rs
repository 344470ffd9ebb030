use crate::gb::constants::*;
use crate::gb::interrupt::InterruptFlags;
use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::ppu::palette::{Palette, Pixel, Shade};
use crate::gb::ppu::registers::{LcdControl, LcdStat, PpuMode, Registers};
use crate::gb::{BusDevice, SCREEN_HEIGHT, SCREEN_WIDTH, VBLANK_SCANLINE_MAX, utils};

pub mod buffer;
pub mod palette;
pub mod registers;

pub const OAM_SCAN_CYCLES: u16 = 80;
pub const PIXEL_TRANSFER_CYCLES: u16 = 172;
pub const HBLANK_CYCLES: u16 = 204;
pub const SCANLINE_CYCLES: u16 = 456;

const OAM_ENTRY_COUNT: usize = 40;
const SPRITES_PER_LINE: usize = 10;

/// Unsigned tile data addressing base (LCDC bit 4 set), also used
/// by all sprites.
const TILE_DATA_BASE: u16 = 0x8000;

/// Signed tile data addressing base (LCDC bit 4 clear).
const TILE_DATA_SIGNED_BASE: u16 = 0x9000;

/// A single entry of the object attribute table.
#[derive(Copy, Clone)]
struct Sprite {
    x: i16,
    y: i16,
    tile: u8,
    attributes: SpriteAttributes,
    oam_index: usize,
}

bitflags! {
    /// The attribute byte of an OAM entry.
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    struct SpriteAttributes: u8 {
        const PALETTE  = 0b0001_0000; // 0 = OBP0, 1 = OBP1
        const X_FLIP   = 0b0010_0000;
        const Y_FLIP   = 0b0100_0000;
        const PRIORITY = 0b1000_0000; // 1 = behind BG color indices 1-3
    }
}

/// The Pixel Processing Unit. It owns VRAM, OAM and the LCD registers
/// and renders one scanline at a time at the end of every mode 3.
pub struct Ppu {
    pub r: Registers,
    vram: Box<[u8; VRAM_SIZE]>,
    oam: [u8; OAM_SIZE],
    clock: u16,
    window_line: u8,
    frame: FrameBuffer,
    frame_complete: bool,
}

impl Default for Ppu {
    fn default() -> Self {
        Self {
            r: Registers::default(),
            vram: Box::new([0; VRAM_SIZE]),
            oam: [0; OAM_SIZE],
            clock: 0,
            window_line: 0,
            frame: FrameBuffer::default(),
            frame_complete: false,
        }
    }
}

impl Ppu {
    /// Advances the mode machine by the given number of T-cycles and
    /// raises V-Blank and STAT interrupts at the documented transitions.
    pub fn step(&mut self, cycles: u16, int_flag: &mut InterruptFlags) {
        if !self.r.lcd_control.contains(LcdControl::LCD_EN) {
            return;
        }

        self.clock += cycles;
        loop {
            let mode = self.r.stat.mode();
            match mode {
                PpuMode::OamScan if self.clock >= OAM_SCAN_CYCLES => {
                    self.clock -= OAM_SCAN_CYCLES;
                    self.set_mode(PpuMode::PixelTransfer, int_flag);
                }
                PpuMode::PixelTransfer if self.clock >= PIXEL_TRANSFER_CYCLES => {
                    self.clock -= PIXEL_TRANSFER_CYCLES;
                    self.render_scanline();
                    self.set_mode(PpuMode::HBlank, int_flag);
                }
                PpuMode::HBlank if self.clock >= HBLANK_CYCLES => {
                    self.clock -= HBLANK_CYCLES;
                    self.set_ly(self.r.ly + 1, int_flag);
                    match self.r.ly == SCREEN_HEIGHT as u8 {
                        true => {
                            self.frame_complete = true;
                            int_flag.insert(InterruptFlags::VBLANK);
                            self.set_mode(PpuMode::VBlank, int_flag);
                        }
                        false => self.set_mode(PpuMode::OamScan, int_flag),
                    }
                }
                PpuMode::VBlank if self.clock >= SCANLINE_CYCLES => {
                    self.clock -= SCANLINE_CYCLES;
                    match self.r.ly == VBLANK_SCANLINE_MAX {
                        true => {
                            self.set_ly(0, int_flag);
                            self.window_line = 0;
                            self.set_mode(PpuMode::OamScan, int_flag);
                        }
                        false => self.set_ly(self.r.ly + 1, int_flag),
                    }
                }
                _ => break,
            }
        }
    }

    /// Returns the current screen contents.
    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Returns true once per frame after the last visible scanline
    /// was rendered and clears the marker.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    /// Switches to the given mode and raises the STAT interrupt if the
    /// matching source is enabled.
    fn set_mode(&mut self, mode: PpuMode, int_flag: &mut InterruptFlags) {
        self.r.stat.set_mode(mode);
        let source = match mode {
            PpuMode::HBlank => LcdStat::H_BLANK_INT,
            PpuMode::VBlank => LcdStat::V_BLANK_INT,
            PpuMode::OamScan => LcdStat::OAM_INT,
            PpuMode::PixelTransfer => return,
        };
        if self.r.stat.contains(source) {
            int_flag.insert(InterruptFlags::STAT);
        }
    }

    /// Updates LY, the LY == LYC coincidence flag and raises the STAT
    /// interrupt if the coincidence source is enabled.
    fn set_ly(&mut self, value: u8, int_flag: &mut InterruptFlags) {
        self.r.ly = value;
        match self.r.ly == self.r.lyc {
            true => {
                self.r.stat.insert(LcdStat::LYC_STAT);
                if self.r.stat.contains(LcdStat::LYC_INT) {
                    int_flag.insert(InterruptFlags::STAT);
                }
            }
            false => self.r.stat.remove(LcdStat::LYC_STAT),
        }
    }

    /// Writes LCDC. Disabling the LCD resets LY, the scanline clock and
    /// the mode machine and blanks the screen.
    fn set_lcd_control(&mut self, value: u8) {
        let control = LcdControl::from_bits_truncate(value);
        let was_enabled = self.r.lcd_control.contains(LcdControl::LCD_EN);
        if was_enabled && !control.contains(LcdControl::LCD_EN) {
            self.r.ly = 0;
            self.clock = 0;
            self.window_line = 0;
            self.r.stat.set_mode(PpuMode::HBlank);
            self.frame.clear();
        }
        self.r.lcd_control = control;
    }

    /// Renders the current scanline into the framebuffer.
    fn render_scanline(&mut self) {
        let y = self.r.ly;
        // The raw color indices of this line, before palette mapping.
        // Sprite priority is decided against these, not the shades.
        let mut line_indices = [Pixel::Zero; SCREEN_WIDTH];

        match self.r.lcd_control.contains(LcdControl::BG_EN) {
            true => {
                self.render_background(y, &mut line_indices);
                if self.r.lcd_control.contains(LcdControl::WIN_EN) {
                    self.render_window(y, &mut line_indices);
                }
            }
            false => {
                for x in 0..SCREEN_WIDTH {
                    self.frame.set_pixel(x, y as usize, Shade::White);
                }
            }
        }

        if self.r.lcd_control.contains(LcdControl::OBJ_EN) {
            self.render_sprites(y, &line_indices);
        }
    }

    /// Renders the background layer of one scanline.
    fn render_background(&mut self, y: u8, line_indices: &mut [Pixel; SCREEN_WIDTH]) {
        let map_base = self.r.lcd_control.bg_tile_map_area();
        let bg_y = y.wrapping_add(self.r.scy);
        let tile_row = u16::from(bg_y >> 3);
        let tile_line = bg_y & 0b111;

        for x in 0..SCREEN_WIDTH as u8 {
            let bg_x = x.wrapping_add(self.r.scx);
            let tile_col = u16::from(bg_x >> 3);
            let tile_id = self.vram_read(map_base + tile_row * 32 + tile_col);
            let pixel = self.bg_tile_pixel(tile_id, bg_x & 0b111, tile_line);
            line_indices[x as usize] = pixel;
            self.frame
                .set_pixel(x as usize, y as usize, self.r.bg_palette.colorize(pixel));
        }
    }

    /// Renders the window layer of one scanline. The window keeps its own
    /// line counter which only advances on lines it was visible on.
    fn render_window(&mut self, y: u8, line_indices: &mut [Pixel; SCREEN_WIDTH]) {
        if y < self.r.wy {
            return;
        }
        // WX holds the window position + 7
        let window_x = i16::from(self.r.wx) - 7;
        if window_x >= SCREEN_WIDTH as i16 {
            return;
        }

        let map_base = self.r.lcd_control.window_tile_map_area();
        let tile_row = u16::from(self.window_line >> 3);
        let tile_line = self.window_line & 0b111;

        for x in window_x.max(0)..SCREEN_WIDTH as i16 {
            let offset = (x - window_x) as u8;
            let tile_col = u16::from(offset >> 3);
            let tile_id = self.vram_read(map_base + tile_row * 32 + tile_col);
            let pixel = self.bg_tile_pixel(tile_id, offset & 0b111, tile_line);
            line_indices[x as usize] = pixel;
            self.frame
                .set_pixel(x as usize, y as usize, self.r.bg_palette.colorize(pixel));
        }
        self.window_line += 1;
    }

    /// Renders the sprite layer of one scanline.
    fn render_sprites(&mut self, y: u8, line_indices: &[Pixel; SCREEN_WIDTH]) {
        let height = i16::from(self.r.lcd_control.obj_height());

        // OAM scan selects the first ten entries covering this line
        let mut selected: Vec<Sprite> = Vec::with_capacity(SPRITES_PER_LINE);
        for oam_index in 0..OAM_ENTRY_COUNT {
            let entry = &self.oam[oam_index * 4..oam_index * 4 + 4];
            // The stored Y and X positions carry a +16/+8 bias
            let sprite_y = i16::from(entry[0]) - 16;
            if !(sprite_y..sprite_y + height).contains(&i16::from(y)) {
                continue;
            }
            selected.push(Sprite {
                x: i16::from(entry[1]) - 8,
                y: sprite_y,
                tile: entry[2],
                attributes: SpriteAttributes::from_bits_truncate(entry[3]),
                oam_index,
            });
            if selected.len() == SPRITES_PER_LINE {
                break;
            }
        }

        // The lowest X wins on overlap, ties resolve by OAM order.
        // Drawing back to front lets the winner overwrite the rest.
        selected.sort_by_key(|sprite| (sprite.x, sprite.oam_index));
        for sprite in selected.iter().rev() {
            self.draw_sprite(sprite, y, line_indices);
        }
    }

    /// Draws a single sprite line into the framebuffer.
    fn draw_sprite(&mut self, sprite: &Sprite, y: u8, line_indices: &[Pixel; SCREEN_WIDTH]) {
        let height = self.r.lcd_control.obj_height();
        let mut row = (i16::from(y) - sprite.y) as u8;
        if sprite.attributes.contains(SpriteAttributes::Y_FLIP) {
            row = height - 1 - row;
        }

        // 8x16 objects always pair an even top tile with an odd bottom tile
        let mut tile = sprite.tile;
        if height == 16 {
            tile = match row >= 8 {
                true => tile | 0x01,
                false => tile & 0xFE,
            };
            row &= 0b111;
        }

        let palette = match sprite.attributes.contains(SpriteAttributes::PALETTE) {
            true => self.r.obj_palette1,
            false => self.r.obj_palette0,
        };

        for offset in 0..8i16 {
            let x = sprite.x + offset;
            if !(0..SCREEN_WIDTH as i16).contains(&x) {
                continue;
            }
            let tile_x = match sprite.attributes.contains(SpriteAttributes::X_FLIP) {
                true => 7 - offset as u8,
                false => offset as u8,
            };
            let pixel = self.obj_tile_pixel(tile, tile_x, row);
            // Color index 0 is transparent for sprites
            if pixel == Pixel::Zero {
                continue;
            }
            // A background priority sprite only shows over BG color index 0
            if sprite.attributes.contains(SpriteAttributes::PRIORITY)
                && line_indices[x as usize] != Pixel::Zero
            {
                continue;
            }
            self.frame
                .set_pixel(x as usize, y as usize, palette.colorize(pixel));
        }
    }

    /// Reads one pixel of a background or window tile,
    /// honoring the LCDC tile data addressing mode.
    fn bg_tile_pixel(&self, tile_id: u8, x: u8, y: u8) -> Pixel {
        let tile_address = match self.r.lcd_control.contains(LcdControl::TILE_SEL) {
            true => TILE_DATA_BASE + u16::from(tile_id) * 16,
            false => {
                TILE_DATA_SIGNED_BASE.wrapping_add_signed(i16::from(tile_id as i8) * 16)
            }
        };
        self.tile_pixel(tile_address, x, y)
    }

    /// Reads one pixel of a sprite tile, always unsigned addressing.
    #[inline]
    fn obj_tile_pixel(&self, tile_id: u8, x: u8, y: u8) -> Pixel {
        self.tile_pixel(TILE_DATA_BASE + u16::from(tile_id) * 16, x, y)
    }

    /// Decodes one pixel out of the 2-byte tile row; the first byte holds
    /// the low color bits, the second the high bits, pixel 0 is bit 7.
    fn tile_pixel(&self, tile_address: u16, x: u8, y: u8) -> Pixel {
        let row_address = tile_address + u16::from(y) * 2;
        let low = self.vram_read(row_address);
        let high = self.vram_read(row_address + 1);
        let bit = 7 - x;
        Pixel::from((utils::bit_at(high, bit) as u8) << 1 | utils::bit_at(low, bit) as u8)
    }

    #[inline]
    fn vram_read(&self, address: u16) -> u8 {
        self.vram[(address - VRAM_BEGIN) as usize]
    }
}

impl BusDevice for Ppu {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            VRAM_BEGIN..=VRAM_END => self.vram[(address - VRAM_BEGIN) as usize] = value,
            OAM_BEGIN..=OAM_END => self.oam[(address - OAM_BEGIN) as usize] = value,
            PPU_LCDC => self.set_lcd_control(value),
            // The mode and coincidence bits are read-only
            PPU_STAT => {
                let sources = LcdStat::from_bits_truncate(value & 0b0111_1000);
                let state = self.r.stat & (LcdStat::MODE1 | LcdStat::MODE2 | LcdStat::LYC_STAT);
                self.r.stat = sources | state;
            }
            PPU_SCY => self.r.scy = value,
            PPU_SCX => self.r.scx = value,
            // LY is read-only for software
            PPU_LY => {}
            PPU_LYC => self.r.lyc = value,
            PPU_DMA => self.r.dma = value,
            PPU_BGP => self.r.bg_palette = Palette::from(value),
            PPU_OBP0 => self.r.obj_palette0 = Palette::from(value),
            PPU_OBP1 => self.r.obj_palette1 = Palette::from(value),
            PPU_WY => self.r.wy = value,
            PPU_WX => self.r.wx = value,
            _ => unreachable!("PPU: invalid address for write: {address:#06x}"),
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            VRAM_BEGIN..=VRAM_END => self.vram[(address - VRAM_BEGIN) as usize],
            OAM_BEGIN..=OAM_END => self.oam[(address - OAM_BEGIN) as usize],
            PPU_LCDC => self.r.lcd_control.bits(),
            // The undocumented bit 7 reads as 1
            PPU_STAT => self.r.stat.bits() | 0b1000_0000,
            PPU_SCY => self.r.scy,
            PPU_SCX => self.r.scx,
            PPU_LY => self.r.ly,
            PPU_LYC => self.r.lyc,
            PPU_DMA => self.r.dma,
            PPU_BGP => self.r.bg_palette.into(),
            PPU_OBP0 => self.r.obj_palette0.into(),
            PPU_OBP1 => self.r.obj_palette1.into(),
            PPU_WY => self.r.wy,
            PPU_WX => self.r.wx,
            _ => unreachable!("PPU: invalid address for read: {address:#06x}"),
        }
    }
}
