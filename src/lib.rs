//! # AFP print file tool
#![warn(missing_docs)]

pub mod cli;
