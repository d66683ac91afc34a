use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use afp_create::{config::Config, modca::DataStream};
use afp_tool::cli::{self, opt::Options, script::JobScript};
use color_eyre::eyre::{self, WrapErr};
use log::info;

fn render<W: Write>(
    script: &JobScript,
    base: &Path,
    config: Config,
    sink: W,
) -> eyre::Result<usize> {
    let mut ds = DataStream::new(sink, config);
    script.render(&mut ds, base)?;
    let written = ds.bytes_written();
    ds.into_inner().flush()?;
    Ok(written)
}

fn main() -> eyre::Result<()> {
    let opt: Options = cli::init()?;
    let config = opt.config().wrap_err("Failed to load configuration")?;

    let text = std::fs::read_to_string(&opt.script)
        .wrap_err_with(|| format!("Failed to read `{}`", opt.script.display()))?;
    let script: JobScript = ron::from_str(&text).wrap_err("Failed to parse job script")?;
    let base = opt.script.parent().unwrap_or_else(|| Path::new("."));

    let written = if opt.out == Path::new("-") {
        let stdout = io::stdout();
        render(&script, base, config, BufWriter::new(stdout.lock()))?
    } else {
        let file = File::create(&opt.out)
            .wrap_err_with(|| format!("Failed to create `{}`", opt.out.display()))?;
        let written = render(&script, base, config, BufWriter::new(file))?;
        info!("Wrote {} bytes to {}", written, opt.out.display());
        written
    };
    log::debug!("{} page(s), {} bytes", script.pages.len(), written);
    Ok(())
}
