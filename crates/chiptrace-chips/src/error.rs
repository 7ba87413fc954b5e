//! Errors raised by chip state queries.

use thiserror::Error;

/// Convenient result alias for chip queries.
pub type Result<T> = std::result::Result<T, ChipError>;

/// Errors returned by [`ChipState`](crate::ChipState) and
/// [`FrameSnapshot`](crate::FrameSnapshot) decoders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChipError {
    /// Requested channel does not exist on this chip family.
    #[error("channel {channel} out of range ({channels} available)")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: usize,
        /// Channels the family provides.
        channels: usize,
    },
}
