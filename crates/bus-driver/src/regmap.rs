//! Fixed bus register map of the sponge front-end.

/// Status register (read-only).
pub const STATUS_ADDR: u32 = 0x0000;
/// Control register; bit 1 flags the final absorption chunk.
pub const CONTROL_ADDR: u32 = 0x0004;
/// Rate configuration register.
pub const RATE_ADDR: u32 = 0x0010;
/// Data register. Writes load a word and trigger absorption; reads return
/// squeeze output.
pub const DATA_ADDR: u32 = 0x0014;

/// Control value with the absorb-last bit set.
pub const CONTROL_ABSORB_LAST: u32 = 1 << 1;
/// Control value with the absorb-last bit cleared.
pub const CONTROL_CLEAR: u32 = 0;

/// Rate written before every absorption request.
pub const DEFAULT_RATE: u32 = 21;

const STATUS_SPONGE_BUSY: u32 = 1 << 0;
const STATUS_CORE_BUSY: u32 = 1 << 1;
const STATUS_ABSORB_READY: u32 = 1 << 2;
const STATUS_SQUEEZE_VALID: u32 = 1 << 3;

const _: () = assert!(
    STATUS_ADDR % 4 == 0 && CONTROL_ADDR % 4 == 0 && RATE_ADDR % 4 == 0 && DATA_ADDR % 4 == 0,
    "registers must be word aligned"
);
const _: () = assert!(
    STATUS_ADDR != CONTROL_ADDR
        && CONTROL_ADDR != RATE_ADDR
        && RATE_ADDR != DATA_ADDR
        && DATA_ADDR != STATUS_ADDR,
    "registers must not alias"
);

/// Decoded status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct StatusFlags {
    /// Sponge permutation in progress.
    pub sponge_busy: bool,
    /// Arithmetic core busy.
    pub core_busy: bool,
    /// Sponge can accept another absorption word.
    pub absorb_ready: bool,
    /// Squeeze output word is valid.
    pub squeeze_valid: bool,
}

impl StatusFlags {
    /// Decodes raw status bits. Reserved bits are ignored.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            sponge_busy: bits & STATUS_SPONGE_BUSY != 0,
            core_busy: bits & STATUS_CORE_BUSY != 0,
            absorb_ready: bits & STATUS_ABSORB_READY != 0,
            squeeze_valid: bits & STATUS_SQUEEZE_VALID != 0,
        }
    }

    /// Encodes flags back into register bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        let mut bits = 0;
        if self.sponge_busy {
            bits |= STATUS_SPONGE_BUSY;
        }
        if self.core_busy {
            bits |= STATUS_CORE_BUSY;
        }
        if self.absorb_ready {
            bits |= STATUS_ABSORB_READY;
        }
        if self.squeeze_valid {
            bits |= STATUS_SQUEEZE_VALID;
        }
        bits
    }

    /// Returns `true` when neither the sponge nor the core is busy.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        !self.sponge_busy && !self.core_busy
    }
}
