//! Errors of the encoder

use std::io;

use thiserror::Error;

use crate::{field::SfId, triplet::ColorModel};

/// An error while building or writing an AFP data stream
///
/// None of these can be recovered from within the current document, the
/// caller needs to discard the partial output and start over.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AfpError {
    /// A bracket was opened or closed out of order
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    /// A content call was issued while no page, overlay or group could take it
    #[error("No active target for {0}")]
    NoActiveTarget(&'static str),

    /// A single field or record exceeded its hard maximum
    #[error("Payload of {len} bytes exceeds the maximum of {max} for {id}")]
    PayloadTooLarge {
        /// The field (or record) identifier
        id: SfId,
        /// The offending length
        len: usize,
        /// The maximum for this kind of record
        max: usize,
    },

    /// A triplet's content does not fit its one byte length
    #[error("Triplet 0x{code:02X} of {len} bytes exceeds 255 bytes")]
    TripletTooLong {
        /// The triplet code
        code: u8,
        /// The encoded length
        len: usize,
    },

    /// Every name of a kind of object has been handed out
    #[error("No unique names left for {0}")]
    NamesExhausted(&'static str),

    /// The bits of all components of an image data element exceed one byte
    #[error("Image data elements of {0} bits exceed 255 bits")]
    IdeTooLarge(u16),

    /// The data of a drawing order does not fit its one byte length
    #[error("Drawing order 0x{code:02X} with {len} bytes of data exceeds 255 bytes")]
    OrderTooLong {
        /// The order code
        code: u8,
        /// The length of the data
        len: usize,
    },

    /// A graphics area was still open when its chain was finished
    #[error("Graphics area was not closed before the end of the graphics object")]
    UnterminatedArea,

    /// An overlay was still open when its page was ended
    #[error("Overlay was not closed before the end of the page")]
    UnterminatedOverlay,

    /// Image metadata does not agree with the color model
    #[error("{model:?} needs {expected} components, got {actual}")]
    InvalidComponentCount {
        /// The declared color model
        model: ColorModel,
        /// Number of components required by the model
        expected: usize,
        /// Number of components supplied
        actual: usize,
    },

    /// Rules can only be drawn along one of the axes
    #[error("Rule from ({0}, {1}) to ({2}, {3}) is neither horizontal nor vertical")]
    UnsupportedGeometry(i32, i32, i32, i32),

    /// Writing to the output failed
    #[error("Failed to write to the output")]
    Sink(#[from] io::Error),
}

/// Type alias for convenience
pub type AfpResult<T> = Result<T, AfpError>;
