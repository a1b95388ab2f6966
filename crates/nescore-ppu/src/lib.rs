//! NES 2C02 PPU (Picture Processing Unit) emulation.
//!
//! This crate provides a cycle-accurate implementation of the NES PPU,
//! responsible for all graphics rendering.
//!
//! # Overview
//!
//! The PPU operates at 3x the CPU clock rate and generates a 256x240 pixel
//! image. It consists of several subsystems:
//!
//! - **Registers**: Control, Mask, Status, OAM Address, Scroll, Address, Data
//! - **Background rendering**: Nametables, pattern tables, attribute tables
//! - **Sprite rendering**: OAM, sprite evaluation, sprite 0 hit detection
//! - **Palette**: 32-byte palette RAM with mirroring
//!
//! # Timing
//!
//! NTSC timing (the primary target):
//! - Master clock: 21.477272 MHz
//! - PPU clock: 5.369318 MHz (master / 4)
//! - 341 dots per scanline
//! - 262 scanlines per frame
//! - 89,341-89,342 dots per frame (odd frame skip)
//!
//! # Usage
//!
//! ```
//! use nescore_ppu::{Mirroring, Ppu};
//!
//! let mut ppu = Ppu::new(Mirroring::Vertical);
//!
//! // Step the PPU (call 3 times per CPU cycle for NTSC), giving it a way
//! // to read pattern table data from cartridge CHR memory.
//! let (frame_complete, nmi) = ppu.step_with_chr(|_addr| 0);
//! if nmi {
//!     // Trigger NMI in CPU
//! }
//!
//! // Access registers from CPU
//! ppu.write_register(0x2000, 0x80, |_, _| {}); // Enable NMI
//! let _status = ppu.read_register(0x2002, |_| 0);
//! ```
//!
//! # no_std Support
//!
//! This crate supports `no_std` environments with the `alloc` crate.
//! Enable the `std` feature (enabled by default) for standard library support.
//!
//! # Features
//!
//! - `serde`: Enable serialization support for save states

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod timing;
mod vram;

pub use ppu::{FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH, Ppu};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use vram::Mirroring;

/// Dots per scanline (NTSC).
pub const DOTS_PER_SCANLINE: u16 = 341;
/// Scanlines per frame (NTSC).
pub const SCANLINES_PER_FRAME: u16 = 262;
/// Scanline on which VBlank begins.
pub const VBLANK_START_SCANLINE: u16 = 241;
/// The pre-render scanline, numbered -1 on real hardware and represented as
/// the last scanline index here.
pub const PRE_RENDER_SCANLINE: u16 = 261;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppu_integration() {
        let mut ppu = Ppu::new(Mirroring::Vertical);

        ppu.write_register(0x2000, 0x80, |_, _| {}); // Enable NMI
        ppu.write_register(0x2001, 0x1E, |_, _| {}); // Enable rendering

        let status = ppu.read_register(0x2002, |_| 0);
        // Status starts with vblank clear; just confirm the register path works.
        assert_eq!(status & 0x80, 0);
    }

    #[test]
    fn test_frame_completion() {
        let mut ppu = Ppu::new(Mirroring::Vertical);

        let mut frames = 0;
        for _ in 0..(u32::from(DOTS_PER_SCANLINE) * u32::from(SCANLINES_PER_FRAME) + 10) {
            let (complete, _) = ppu.step_with_chr(|_| 0);
            if complete {
                frames += 1;
            }
        }

        assert!(frames >= 1);
    }

    #[test]
    fn test_vblank_nmi() {
        let mut ppu = Ppu::new(Mirroring::Vertical);

        ppu.write_register(0x2000, 0x80, |_, _| {}); // Enable NMI

        let mut nmi_triggered = false;
        for _ in 0..100_000 {
            let (_, nmi) = ppu.step_with_chr(|_| 0);
            if nmi {
                nmi_triggered = true;
                break;
            }
        }

        assert!(nmi_triggered, "NMI should have been triggered");
    }
}
