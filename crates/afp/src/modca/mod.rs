//! MO:DCA document structure
//!
//! [`DataStream`] is the entry point. It keeps the open containers and
//! writes each page as soon as nothing in front of it is still open.

pub mod factory;
pub(crate) mod group;
pub mod object;
pub mod page;
pub mod stream;

pub use page::{FontMapping, PageHandle};
pub use stream::{DataStream, StreamState};
