//! Top-level NES emulation core.
//!
//! [`Core`] owns the CPU, the system bus (which in turn owns the PPU, APU,
//! mapper and controller ports) and drives emulation one frame at a time.

use crate::bus::{ControllerState, NesBus};
use crate::save_state::{self, SaveStateError};
use nescore_cpu::{Cpu, StatusFlags};
use nescore_mappers::{Mapper, Rom, RomError, create_mapper};

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec, vec::Vec};

/// NES emulation timing constants.
pub mod timing {
    /// Master clock frequency (NTSC).
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock frequency (NTSC). The 2A03 divides the master clock by 12,
    /// but the commonly quoted figure (and the one DMC/APU rate tables are
    /// built from) rounds up to 1,789,773 Hz rather than truncating.
    pub const CPU_CLOCK_NTSC: u32 = 1_789_773;
    /// PPU clock frequency (NTSC).
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// CPU cycles in a normal (even) frame.
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
    /// CPU cycles in a short (odd) frame when rendering is enabled, which
    /// skips one PPU dot at the start of the pre-render line.
    pub const CPU_CYCLES_PER_FRAME_SHORT: u32 = 29_781;
    /// PPU dots per scanline.
    pub const PPU_DOTS_PER_SCANLINE: u16 = 341;
    /// Total scanlines (including vblank).
    pub const PPU_SCANLINES: u16 = 262;
    /// Target frame rate (NTSC).
    pub const FRAME_RATE_NTSC: f64 = 60.0988;
}

/// Errors the core can report across its host-facing boundary.
#[derive(Debug, Clone)]
pub enum CoreError {
    /// The image did not start with the iNES magic number `NES\x1A`.
    InvalidMagic,
    /// The iNES header names a mapper this core has no implementation for.
    UnsupportedMapper(u16),
    /// The image was shorter than its header promises.
    Truncated,
}

impl From<RomError> for CoreError {
    fn from(err: RomError) -> Self {
        match err {
            RomError::InvalidMagic(_) => Self::InvalidMagic,
            RomError::UnsupportedMapper(n) => Self::UnsupportedMapper(n),
            RomError::FileTooSmall(_)
            | RomError::SizeMismatch { .. }
            | RomError::InvalidPrgSize(_)
            | RomError::InvalidChrSize(_)
            | RomError::UnsupportedFormat(_) => Self::Truncated,
        }
    }
}

impl core::fmt::Display for CoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "invalid iNES magic number"),
            Self::UnsupportedMapper(n) => write!(f, "unsupported mapper: {n}"),
            Self::Truncated => write!(f, "ROM image is truncated or malformed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/// The result of advancing emulation by exactly one frame.
pub struct FrameResult<'a> {
    /// Completed frame, 256×240 pixels, each a packed RGBA value
    /// (4 bytes per pixel, row-major, no padding).
    pub frame: &'a [u8],
    /// Audio samples produced since the previous `step_frame` call, at the
    /// core's internal output rate (see [`NesBus`] resampling).
    pub audio_samples: Vec<f32>,
    /// Number of frames completed since power-on/reset, including this one.
    pub frame_index: u64,
}

/// NES console emulator: CPU, PPU, APU, mapper and controllers.
///
/// Constructed in two phases to match the host-facing contract: [`Core::new`]
/// produces an inert instance with no cartridge loaded, and [`Core::load_rom`]
/// parses and attaches one. Stepping before a ROM is loaded is a no-op.
pub struct Core {
    /// 6502 CPU. `None` until a ROM has been loaded.
    cpu: Cpu,
    /// System bus (PPU, APU, mapper, RAM). `None` until a ROM has been loaded.
    bus: Option<NesBus>,
    /// Frame buffer (256x240 RGBA).
    framebuffer: Vec<u8>,
    /// Total CPU cycles executed since the last reset.
    total_cycles: u64,
    /// Frames completed since the last reset.
    frame_index: u64,
}

impl Core {
    /// Create an inert core with no cartridge loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: None,
            framebuffer: vec![0; 256 * 240 * 4],
            total_cycles: 0,
            frame_index: 0,
        }
    }

    /// Create a core and immediately load a ROM image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image fails to parse or names an
    /// unsupported mapper.
    pub fn with_rom(rom_data: &[u8]) -> Result<Self, CoreError> {
        let mut core = Self::new();
        core.load_rom(rom_data)?;
        Ok(core)
    }

    /// Create a core from a pre-built mapper, bypassing ROM parsing.
    /// Chiefly useful for tests that want to construct a synthetic cartridge.
    #[must_use]
    pub fn with_mapper(mapper: Box<dyn Mapper>) -> Self {
        let mut core = Self::new();
        core.attach_mapper(mapper);
        core
    }

    /// Parse an iNES image and attach it as the loaded cartridge.
    ///
    /// Replaces any previously loaded cartridge and performs the power-on
    /// reset sequence. On failure, the core is left in its pre-load state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMagic`], [`CoreError::UnsupportedMapper`]
    /// or [`CoreError::Truncated`] if the image cannot be loaded.
    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<(), CoreError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        log::info!(
            "loaded ROM: mapper {} ({}), {:?} mirroring",
            rom.header.mapper_number,
            mapper.mapper_name(),
            rom.header.mirroring
        );
        self.attach_mapper(mapper);
        Ok(())
    }

    fn attach_mapper(&mut self, mapper: Box<dyn Mapper>) {
        self.bus = Some(NesBus::new(mapper));
        self.reset();
    }

    /// Reset the console to its power-on state (does nothing if no cartridge
    /// is loaded).
    pub fn reset(&mut self) {
        let Some(bus) = self.bus.as_mut() else {
            return;
        };
        self.cpu.reset(bus);
        bus.reset();
        self.total_cycles = 0;
        self.frame_index = 0;
        self.framebuffer.fill(0);
    }

    /// Alias for [`Core::reset`], matching the power-on naming hosts expect
    /// right after constructing a core with a cartridge attached.
    pub fn power_on(&mut self) {
        self.reset();
    }

    /// Advance the system until the PPU completes one visible frame
    /// (transition into vertical blank) and return the result.
    ///
    /// If no cartridge is loaded, returns an empty, all-zero frame without
    /// advancing any state.
    pub fn step_frame(&mut self) -> FrameResult<'_> {
        let Some(bus) = self.bus.as_mut() else {
            return FrameResult {
                frame: &self.framebuffer,
                audio_samples: Vec::new(),
                frame_index: self.frame_index,
            };
        };

        let mut audio_samples = Vec::new();
        loop {
            step_one(&mut self.cpu, bus, &mut self.total_cycles, &mut audio_samples);
            if bus.take_frame_complete() {
                break;
            }
        }

        copy_framebuffer(bus, &mut self.framebuffer);
        self.frame_index += 1;

        FrameResult {
            frame: &self.framebuffer,
            audio_samples,
            frame_index: self.frame_index,
        }
    }

    /// Set one controller port's button state from a `[A, B, Select, Start,
    /// Up, Down, Left, Right]` array, matching the shift-register bit order
    /// read back at $4016/$4017.
    ///
    /// `port` selects controller 1 (`0`) or controller 2 (`1`); other values
    /// are ignored.
    pub fn set_controller_buttons(&mut self, port: u8, buttons: [bool; 8]) {
        let Some(bus) = self.bus.as_mut() else {
            return;
        };
        let mut bits = 0u8;
        for (i, &pressed) in buttons.iter().enumerate() {
            if pressed {
                bits |= 1 << i;
            }
        }
        let state = ControllerState { buttons: bits };
        match port {
            0 => bus.controller1 = state,
            1 => bus.controller2 = state,
            _ => {}
        }
    }

    /// Execute a single CPU step (one instruction, or one cycle of
    /// DMA/interrupt servicing) and return the number of CPU cycles it
    /// consumed. Intended for tracing and low-level conformance tests;
    /// hosts driving real gameplay should use [`Core::step_frame`] instead.
    ///
    /// Does nothing and returns `0` if no cartridge is loaded.
    pub fn step(&mut self) -> u8 {
        let Some(bus) = self.bus.as_mut() else {
            return 0;
        };
        let mut audio = Vec::new();
        let cycles_before = self.total_cycles;
        step_one(&mut self.cpu, bus, &mut self.total_cycles, &mut audio);
        #[allow(clippy::cast_possible_truncation)]
        let consumed = (self.total_cycles - cycles_before) as u8;
        consumed
    }

    /// Serialize the complete emulator state to a byte buffer.
    ///
    /// Must only be called between frames (i.e. not from inside a
    /// [`Core::step_frame`] call, which the single-threaded API makes
    /// impossible anyway).
    ///
    /// # Panics
    ///
    /// Panics if called before a cartridge has been loaded; the host cannot
    /// meaningfully resume a save state without a cartridge to play it back
    /// against.
    #[must_use]
    pub fn save_state(&self) -> Vec<u8> {
        let bus = self.bus.as_ref().expect("save_state requires a loaded ROM");
        save_state::encode(&self.cpu, bus, self.total_cycles, self.frame_index)
    }

    /// Restore state previously produced by [`Core::save_state`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] variants mapped from [`SaveStateError`]: a
    /// version mismatch or corrupted/truncated payload.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), StateLoadError> {
        let bus = self
            .bus
            .as_mut()
            .ok_or(StateLoadError::Corrupt)?;
        let snapshot = save_state::decode(data).map_err(|err| {
            log::warn!("rejected save state: {err}");
            StateLoadError::from(err)
        })?;
        self.total_cycles = snapshot.total_cycles();
        self.frame_index = snapshot.frame_index();
        snapshot.apply(&mut self.cpu, bus);
        copy_framebuffer(bus, &mut self.framebuffer);
        log::info!("restored save state at frame {}", self.frame_index);
        Ok(())
    }

    /// Current framebuffer (256x240 RGBA, valid even mid-frame).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Total CPU cycles executed since the last reset.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Frames completed since the last reset.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Mapper number of the loaded cartridge, if any.
    #[must_use]
    pub fn mapper_number(&self) -> Option<u16> {
        self.bus.as_ref().map(|b| b.mapper.mapper_number())
    }

    /// Mapper name of the loaded cartridge, if any.
    #[must_use]
    pub fn mapper_name(&self) -> Option<&'static str> {
        self.bus.as_ref().map(|b| b.mapper.mapper_name())
    }

    /// Battery-backed PRG-RAM content, if the cartridge has any.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.bus.as_ref().and_then(|b| b.mapper.battery_ram())
    }

    /// Load previously saved battery-backed PRG-RAM content.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        if let Some(bus) = self.bus.as_mut() {
            bus.mapper.set_battery_ram(data);
        }
    }

    /// Read a byte of CPU address space without side effects, for debugging.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.as_ref().map_or(0, |b| b.peek(addr))
    }

    /// Reference to the CPU, for debugging/tracing.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Reference to the system bus, for debugging.
    #[must_use]
    pub fn bus(&self) -> Option<&NesBus> {
        self.bus.as_ref()
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors surfaced by [`Core::load_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLoadError {
    /// The save state's format version does not match this core's.
    VersionMismatch,
    /// The payload is truncated, has a bad checksum, or otherwise unusable.
    Corrupt,
}

impl From<SaveStateError> for StateLoadError {
    fn from(err: SaveStateError) -> Self {
        match err {
            SaveStateError::UnsupportedVersion(_) => Self::VersionMismatch,
            SaveStateError::InvalidMagic
            | SaveStateError::ChecksumMismatch { .. }
            | SaveStateError::InsufficientData { .. }
            | SaveStateError::Decode => Self::Corrupt,
        }
    }
}

impl core::fmt::Display for StateLoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::VersionMismatch => write!(f, "save state version mismatch"),
            Self::Corrupt => write!(f, "save state is corrupt or truncated"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StateLoadError {}

/// Execute one CPU step (one instruction, or one cycle of DMA/interrupt
/// servicing), ticking the PPU/APU in lockstep and accumulating audio.
fn step_one(cpu: &mut Cpu, bus: &mut NesBus, total_cycles: &mut u64, audio: &mut Vec<f32>) {
    if bus.dmc_stall_active() {
        bus.decrement_dmc_stall();
        tick_components(bus, 1, audio);
        *total_cycles += 1;
        return;
    }

    if bus.oam_dma_pending() {
        let dma_cycles = bus.execute_oam_dma();
        tick_components(bus, dma_cycles, audio);
        *total_cycles += u64::from(dma_cycles);
        return;
    }

    if bus.nmi_pending() {
        bus.acknowledge_nmi();
        cpu.trigger_nmi();
    }
    cpu.set_irq(bus.irq_pending());

    let cycles = cpu.step(bus);
    tick_components(bus, u16::from(cycles), audio);
    bus.add_cpu_cycles(cycles);
    *total_cycles += u64::from(cycles);
}

fn tick_components(bus: &mut NesBus, cpu_cycles: u16, audio: &mut Vec<f32>) {
    for _ in 0..cpu_cycles {
        bus.step_ppu();
        if let Some(sample) = bus.step_apu() {
            audio.push(sample);
        }
    }
}

fn copy_framebuffer(bus: &NesBus, framebuffer: &mut [u8]) {
    let ppu_buffer = bus.ppu.frame_buffer();
    for (i, &palette_idx) in ppu_buffer.iter().enumerate() {
        let rgb = crate::palette::palette_to_rgb(palette_idx & 0x3F);
        let offset = i * 4;
        framebuffer[offset] = rgb.0;
        framebuffer[offset + 1] = rgb.1;
        framebuffer[offset + 2] = rgb.2;
        framebuffer[offset + 3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nescore_mappers::{Mirroring, Nrom, RomHeader};

    #[cfg(not(feature = "std"))]
    use alloc::{boxed::Box, vec, vec::Vec};

    fn test_rom() -> Rom {
        Rom {
            header: RomHeader {
                prg_rom_size: 32768,
                chr_rom_size: 8192,
                mapper_number: 0,
                submapper: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
                nes2_format: false,
                prg_ram_size: 0,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
            },
            prg_rom: {
                let mut prg = vec![0xEA; 32768];
                prg[0x7FFC] = 0x00;
                prg[0x7FFD] = 0x80;
                prg
            },
            chr_rom: vec![0; 8192],
            trainer: None,
        }
    }

    fn test_core() -> Core {
        Core::with_mapper(Box::new(Nrom::new(&test_rom())))
    }

    #[test]
    fn new_core_has_no_rom() {
        let core = Core::new();
        assert_eq!(core.mapper_number(), None);
        assert_eq!(core.framebuffer().len(), 256 * 240 * 4);
    }

    #[test]
    fn load_rom_then_reset_is_the_nrom_contract() {
        let core = test_core();
        assert_eq!(core.mapper_number(), Some(0));
        assert_eq!(core.mapper_name(), Some("NROM"));
        assert_eq!(core.cpu().pc, 0x8000);
        assert_eq!(core.cpu().sp, 0xFD);
        assert!(core.cpu().status.contains(StatusFlags::INTERRUPT_DISABLE));
    }

    #[test]
    fn invalid_magic_is_rejected() {
        let mut core = Core::new();
        let err = core.load_rom(&[0u8; 32]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMagic));
    }

    #[test]
    fn step_frame_advances_frame_index_and_cycles() {
        let mut core = test_core();
        let result = core.step_frame();
        assert_eq!(result.frame_index, 1);
        assert_eq!(result.frame.len(), 256 * 240 * 4);
        assert_eq!(core.frame_index(), 1);
        assert!(core.total_cycles() > 0);
    }

    #[test]
    fn step_frame_without_rom_is_a_harmless_no_op() {
        let mut core = Core::new();
        let result = core.step_frame();
        assert_eq!(result.frame_index, 0);
        assert!(result.frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn controller_buttons_map_to_the_shift_register_bit_order() {
        let mut core = test_core();
        // A, Start, Right pressed.
        core.set_controller_buttons(0, [true, false, false, true, false, false, false, true]);
        let bus = core.bus().unwrap();
        assert_eq!(bus.controller1.buttons, 0b1000_1001);
    }

    #[test]
    fn save_and_load_state_round_trips_cpu_registers() {
        let mut core = test_core();
        core.step_frame();
        let saved = core.save_state();

        let mut other = test_core();
        other.load_state(&saved).unwrap();

        assert_eq!(other.cpu().pc, core.cpu().pc);
        assert_eq!(other.cpu().a, core.cpu().a);
        assert_eq!(other.total_cycles(), core.total_cycles());
        assert_eq!(other.frame_index(), core.frame_index());
    }

    #[test]
    fn load_state_rejects_garbage() {
        let mut core = test_core();
        let err = core.load_state(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, StateLoadError::Corrupt);
    }
}
