use std::path::PathBuf;

use afp_create::{
    nom::error::Error,
    read::{nesting, parse_fields},
};
use afp_tool::cli;
use clap::Parser;
use color_eyre::eyre::{self, eyre, WrapErr};
use log::{info, warn};
use prettytable::{format, row, Cell, Row, Table};

#[derive(Parser, Debug)]
/// List the structured fields of an AFP file
struct Options {
    /// An AFP file
    file: PathBuf,
}

fn main() -> eyre::Result<()> {
    let opt: Options = cli::init()?;
    let buffer = std::fs::read(&opt.file)
        .wrap_err_with(|| format!("Failed to read `{}`", opt.file.display()))?;

    let (rest, fields) = parse_fields::<Error<&[u8]>>(&buffer)
        .map_err(|e| eyre!("Failed to parse structured fields: {:?}", e.map_input(|i| i.len())))?;
    let depths = match nesting(&fields) {
        Ok(depths) => Some(depths),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["Offset", "ID", "Field", "Length", "Flags", "Depth"]);
    let mut offset = 0;
    for (index, field) in fields.iter().enumerate() {
        let id = field.id();
        let indent = depths.as_ref().and_then(|d| d.get(index)).copied().unwrap_or(0);
        let mnemonic = match field.name() {
            Some(name) => format!("{:indent$}{} {}", "", id, name, indent = indent * 2),
            None => format!("{:indent$}{}", "", id, indent = indent * 2),
        };
        table.add_row(Row::new(vec![
            Cell::new(&format!("{:08X}", offset)),
            Cell::new(&format!("{:02X}{:02X}{:02X}", id.0[0], id.0[1], id.0[2])),
            Cell::new(&mnemonic),
            Cell::new(&format!("{:5}", field.header.length)),
            Cell::new(&format!("{:02X}", field.header.flags.bits())),
            Cell::new(&format!("{:2}", indent)),
        ]));
        offset += field.encoded_len();
    }
    table.printstd();

    if !rest.is_empty() {
        warn!("{} trailing bytes after the last field", rest.len());
    }
    match depths {
        Some(_) => info!("{} fields, brackets balanced", fields.len()),
        None => return Err(eyre!("Brackets of `{}` do not match", opt.file.display())),
    }
    Ok(())
}
