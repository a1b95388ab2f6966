//! Save state encoding for the emulation core.
//!
//! Save states are a small header (magic, format version, CRC32 checksum)
//! followed by a [`postcard`]-encoded payload covering every piece of state
//! that affects future emulation: CPU registers, PPU, APU, internal RAM,
//! controller latches and the mapper's own opaque state blob.
//!
//! ```text
//! ┌──────────┬─────────┬──────────┬───────────────────┐
//! │ magic(4) │ ver(4)  │ crc32(4) │ postcard payload   │
//! └──────────┴─────────┴──────────┴───────────────────┘
//! ```

pub mod error;

pub use error::SaveStateError;

use crate::bus::NesBus;
use nescore_apu::Apu;
use nescore_cpu::{Cpu, CpuSnapshot};
use nescore_ppu::Ppu;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Save state format version.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Magic bytes identifying a save state buffer.
pub const SAVE_STATE_MAGIC: [u8; 4] = *b"NSC1";

const HEADER_LEN: usize = 4 + 4 + 4;

#[derive(Serialize, Deserialize)]
struct StateSnapshot {
    cpu: CpuSnapshot,
    ppu: Ppu,
    apu: Apu,
    ram: Vec<u8>,
    controller1: u8,
    controller2: u8,
    mapper_state: Vec<u8>,
    total_cycles: u64,
    frame_index: u64,
}

/// A decoded save state, ready to be applied to a live [`Cpu`]/[`NesBus`].
pub struct DecodedState {
    snapshot: StateSnapshot,
}

impl DecodedState {
    /// Apply this state to the given CPU and bus, overwriting their
    /// contents entirely.
    pub fn apply(self, cpu: &mut Cpu, bus: &mut NesBus) {
        cpu.restore(&self.snapshot.cpu);
        bus.ppu = self.snapshot.ppu;
        bus.apu = self.snapshot.apu;
        bus.ram.copy_from_slice(&self.snapshot.ram);
        bus.controller1.buttons = self.snapshot.controller1;
        bus.controller2.buttons = self.snapshot.controller2;
        bus.mapper.load_state(&self.snapshot.mapper_state);
    }

    /// Total CPU cycles recorded at the time of the save.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.snapshot.total_cycles
    }

    /// Frame index recorded at the time of the save.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.snapshot.frame_index
    }
}

/// Encode the current emulator state into a versioned, checksummed buffer.
#[must_use]
pub fn encode(cpu: &Cpu, bus: &NesBus, total_cycles: u64, frame_index: u64) -> Vec<u8> {
    let snapshot = StateSnapshot {
        cpu: cpu.snapshot(),
        ppu: bus.ppu.clone(),
        apu: bus.apu.clone(),
        ram: bus.ram.to_vec(),
        controller1: bus.controller1.buttons,
        controller2: bus.controller2.buttons,
        mapper_state: bus.mapper.save_state(),
        total_cycles,
        frame_index,
    };

    let payload = postcard::to_allocvec(&snapshot).unwrap_or_default();
    let checksum = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&SAVE_STATE_MAGIC);
    out.extend_from_slice(&SAVE_STATE_VERSION.to_le_bytes());
    out.extend_from_slice(&checksum.to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Decode and validate a save state buffer previously produced by
/// [`encode`].
///
/// # Errors
///
/// Returns [`SaveStateError::InsufficientData`] if the buffer is shorter
/// than a header, [`SaveStateError::InvalidMagic`] if the magic bytes don't
/// match, [`SaveStateError::UnsupportedVersion`] if the format version is
/// newer or older than this core understands, [`SaveStateError::ChecksumMismatch`]
/// if the payload doesn't match its recorded checksum, or
/// [`SaveStateError::Decode`] if the payload is checksum-valid but fails to
/// decode (e.g. a payload from an incompatible build sharing the same
/// version number).
pub fn decode(data: &[u8]) -> Result<DecodedState, SaveStateError> {
    if data.len() < HEADER_LEN {
        return Err(SaveStateError::InsufficientData {
            needed: HEADER_LEN,
            available: data.len(),
        });
    }

    let magic: [u8; 4] = data[0..4].try_into().unwrap();
    if magic != SAVE_STATE_MAGIC {
        return Err(SaveStateError::InvalidMagic);
    }

    let version = u32::from_le_bytes(data[4..8].try_into().unwrap());
    if version != SAVE_STATE_VERSION {
        return Err(SaveStateError::UnsupportedVersion(version));
    }

    let expected_checksum = u32::from_le_bytes(data[8..12].try_into().unwrap());
    let payload = &data[HEADER_LEN..];
    let actual_checksum = crc32fast::hash(payload);
    if actual_checksum != expected_checksum {
        return Err(SaveStateError::ChecksumMismatch {
            expected: expected_checksum,
            actual: actual_checksum,
        });
    }

    let snapshot: StateSnapshot = postcard::from_bytes(payload).map_err(|_| SaveStateError::Decode)?;
    if snapshot.ram.len() != 2048 {
        return Err(SaveStateError::Decode);
    }

    Ok(DecodedState { snapshot })
}
