//! Command line options

use std::{io, path::PathBuf};

use afp_create::{
    common::{InvalidRotation, Rotation},
    config::Config,
};
use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug)]
/// Render a job script into an AFP print file
pub struct Options {
    /// A job script (*.ron)
    pub script: PathBuf,

    /// Output file (- is STDOUT)
    #[clap(default_value = "-")]
    pub out: PathBuf,

    /// Encoder configuration as a file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Resolution of pages without an explicit one (dpi)
    #[clap(long)]
    pub resolution: Option<u16>,

    /// Default page rotation (0, 90, 180 or 270)
    #[clap(long)]
    pub rotation: Option<u16>,

    /// Drop GOCA graphics from the output
    #[clap(long)]
    pub no_goca: bool,
}

/// Failed to load the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("IO Error")]
    Io(#[from] io::Error),
    /// The file is not a valid configuration
    #[error("Deserialize Error")]
    Ron(#[from] ron::error::Error),
    /// The rotation is not a multiple of 90 degrees
    #[error("Invalid rotation")]
    Rotation(#[from] InvalidRotation),
}

impl Options {
    /// The configuration file, with the command line overrides applied
    pub fn config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                ron::from_str(&text)?
            }
            None => Config::default(),
        };
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(rotation) = self.rotation {
            config.rotation = Rotation::try_from(rotation)?;
        }
        if self.no_goca {
            config.goca = false;
        }
        Ok(config)
    }
}
