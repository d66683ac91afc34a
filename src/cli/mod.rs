//! Shared parts of the command line tools

use env_logger::Env;
use log::LevelFilter;

pub mod image;
pub mod opt;
pub mod script;

/// Set up CLI
pub fn init<T: clap::Parser>() -> color_eyre::Result<T> {
    color_eyre::install()?;
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp(None)
        .parse_env(Env::new().filter("AFP_TOOL_LOG"))
        .init();
    let args = T::parse();
    Ok(args)
}
