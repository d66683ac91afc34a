#![warn(missing_docs)]
//! # afp-create
//!
//! Library to write AFP (MO:DCA) print streams with a rustic API
//!
//! ```
//! use afp_create::{
//!     common::Rotation,
//!     config::Config,
//!     modca::DataStream,
//!     ptoca::TextRun,
//! };
//!
//! let mut ds = DataStream::new(Vec::new(), Config::default());
//! ds.start_document()?;
//!
//! // A letter sized page at 240 dpi
//! ds.start_page(2040, 2640, Rotation::R0, 240, 240)?;
//! ds.create_font(1, "T1V10500", "C0H200B0", 0)?;
//! ds.create_text(&TextRun::new(240, 240, 1, "Hello World"))?;
//! ds.end_page()?;
//!
//! ds.end_document()?;
//! let bytes = ds.into_inner();
//! assert_eq!(bytes[0], 0x5A);
//! # Ok::<(), afp_create::error::AfpError>(())
//! ```

pub mod chunk;
pub mod common;
pub mod config;
pub mod encoding;
pub mod error;
pub mod field;
pub mod goca;
pub mod ioca;
pub mod modca;
pub mod ptoca;
pub mod read;
pub mod transform;
pub mod triplet;
pub mod util;
pub mod write;

pub use error::{AfpError, AfpResult};

#[doc(hidden)]
pub use nom;
