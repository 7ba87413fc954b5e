//! Error types for loading, executing and configuring an extraction.
//!
//! Only [`LoadError`] and [`ConfigError`] are fatal, both surfacing through
//! [`ExtractError`]. Tick faults end the subsong that raised them and are
//! reported through its diagnostics.

use thiserror::Error;

/// Convenient result alias for loading a job.
pub type Result<T> = std::result::Result<T, LoadError>;

/// The memory image could not be built from the declared blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Declared memory size is zero or above the supported maximum.
    #[error("memory size {size:#x} must be between 1 and {max:#x} bytes")]
    InvalidSize {
        /// Requested size.
        size: usize,
        /// Largest supported size.
        max: usize,
    },
    /// A block would extend past the end of memory.
    #[error("block at {address:#06x} (+{length:#x}) exceeds memory size {size:#x}")]
    OutOfBounds {
        /// Load address of the block.
        address: u32,
        /// Declared block length.
        length: usize,
        /// Memory size.
        size: usize,
    },
    /// A block carries fewer payload bytes than it declares.
    #[error("block at {address:#06x} declares {declared} bytes but carries {actual}")]
    TruncatedBlock {
        /// Load address of the block.
        address: u32,
        /// Declared length.
        declared: usize,
        /// Payload bytes actually present.
        actual: usize,
    },
}

/// Access outside the memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("address {address:#06x} outside memory image")]
pub struct AddressFault {
    /// Offending address.
    pub address: u32,
}

/// Fatal condition raised by a CPU back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuFault {
    /// The fetched byte does not decode to a supported instruction.
    #[error("illegal opcode {opcode:#04x} at {pc:#06x}")]
    IllegalOpcode {
        /// Opcode byte.
        opcode: u8,
        /// Address it was fetched from.
        pc: u16,
    },
    /// The executed code touched memory outside the image.
    #[error(transparent)]
    Address(#[from] AddressFault),
}

/// Fatal condition raised by the macro interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MacroFault {
    /// The voice program contains a byte that is not an opcode.
    #[error("voice {voice}: unknown macro opcode {opcode:#04x} at {address:#06x}")]
    UnknownOpcode {
        /// Voice whose program faulted.
        voice: usize,
        /// Opcode byte.
        opcode: u8,
        /// Address of the opcode.
        address: u32,
    },
    /// An opcode or operand read fell outside the memory image.
    #[error("voice {voice}: {fault}")]
    Address {
        /// Voice whose program (or voice table entry) faulted.
        voice: usize,
        /// Underlying access fault.
        #[source]
        fault: AddressFault,
    },
}

/// Fault raised by any tick source. Ends the current subsong only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TickFault {
    /// CPU back-end fault.
    #[error("cpu fault: {0}")]
    Cpu(#[from] CpuFault),
    /// Macro interpreter fault.
    #[error("macro fault: {0}")]
    Macro(#[from] MacroFault),
}

/// Invalid [`ExtractionConfig`](crate::ExtractionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `frame_count` is zero.
    #[error("frame_count must be at least 1")]
    ZeroFrameCount,
    /// `frames_per_block` is zero.
    #[error("frames_per_block must be at least 1")]
    ZeroBlockSize,
    /// A routine step budget is zero.
    #[error("{routine} step budget must be at least 1")]
    ZeroStepBudget {
        /// Which budget (`init` or `frame`).
        routine: &'static str,
    },
    /// Note range is inverted.
    #[error("note range {min}..={max} is inverted")]
    InvertedNoteRange {
        /// Lowest note.
        min: u8,
        /// Highest note.
        max: u8,
    },
    /// Reference pitch is not a positive finite frequency.
    #[error("reference pitch {0} Hz is not a positive frequency")]
    InvalidReference(f64),
    /// JSON (de)serialization failed.
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an [`Extractor`](crate::Extractor) could not be built.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The memory image could not be loaded.
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
    /// The configuration was rejected.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}
