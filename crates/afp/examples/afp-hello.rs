use std::io::Write;

use afp_create::{
    common::{Color, Point, Rotation},
    config::Config,
    goca::DrawingOrder,
    modca::DataStream,
    ptoca::TextRun,
};
use color_eyre::eyre;

pub fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let stdout = std::io::stdout();
    let mut ds = DataStream::new(stdout.lock(), Config::default());
    ds.start_document()?;
    ds.create_no_operation("afp-hello")?;

    ds.start_page(2040, 2640, Rotation::R0, 240, 240)?;
    ds.create_font(1, "T1V10500", "C0H200B0", 0)?;

    let mut run = TextRun::new(240, 300, 1, "Hello World!");
    run.color = Color::rgb(0x00, 0x33, 0x99);
    ds.create_text(&run)?;
    ds.create_line(Point::new(240, 320), Point::new(1800, 320), 4, Color::BLACK)?;

    ds.start_graphics(240, 400, 400, 400)?;
    ds.add_drawing_order(&DrawingOrder::SetLineWidth(2))?;
    ds.add_drawing_order(&DrawingOrder::FullArc {
        center: Point::new(200, 200),
        radius: 100,
    })?;
    ds.end_graphics()?;
    ds.end_page()?;

    ds.end_document()?;
    ds.into_inner().flush()?;
    Ok(())
}
