use afp_create::{
    common::{Color, Name, Point, Rotation},
    config::Config,
    error::AfpError,
    field::SfId,
    goca::{AreaFlags, DrawingOrder},
    ioca::ImageContent,
    modca::{DataStream, StreamState},
    nom::error::Error,
    ptoca::TextRun,
    read::{nesting, parse_fields, Field},
    triplet::{ColorModel, Compression},
};

fn parse(out: &[u8]) -> Vec<Field<'_>> {
    let (rest, fields) = parse_fields::<Error<&[u8]>>(out).unwrap();
    assert!(rest.is_empty());
    nesting(&fields).unwrap();
    fields
}

/// Field ids, without the content of environment groups
fn outline(fields: &[Field<'_>]) -> Vec<SfId> {
    let mut ids = Vec::new();
    let mut skipping = false;
    for field in fields {
        match field.id() {
            SfId::BAG | SfId::BOG => skipping = true,
            SfId::EAG | SfId::EOG => skipping = false,
            id if !skipping => ids.push(id),
            _ => {}
        }
    }
    ids
}

fn started(config: Config) -> DataStream<Vec<u8>> {
    let mut ds = DataStream::new(Vec::new(), config);
    ds.start_document().unwrap();
    ds
}

fn color_config() -> Config {
    Config {
        color_images: true,
        ..Config::default()
    }
}

#[test]
fn hello_page() {
    let mut ds = started(Config::default());
    ds.start_page(2040, 2640, Rotation::R0, 240, 240).unwrap();
    ds.create_font(1, "T1V10500", "C0H200B0", 0).unwrap();
    ds.create_text(&TextRun::new(240, 240, 1, "Hello")).unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();
    assert_eq!(ds.state(), StreamState::Complete);

    let out = ds.into_inner();
    let fields = parse(&out);
    assert_eq!(
        outline(&fields),
        vec![SfId::BDT, SfId::BPG, SfId::BPT, SfId::PTX, SfId::EPT, SfId::EPG, SfId::EDT]
    );
    assert_eq!(fields[0].name(), Some(Name::new("DOC00001")));
    assert_eq!(fields[1].name(), Some(Name::new("PGN00001")));
    assert!(fields.iter().any(|f| f.id() == SfId::MCF));
}

#[test]
fn content_needs_a_page() {
    let mut ds = DataStream::new(Vec::new(), Config::default());
    assert!(matches!(
        ds.create_text(&TextRun::new(0, 0, 1, "x")),
        Err(AfpError::NoActiveTarget(_))
    ));
    ds.start_document().unwrap();
    assert!(matches!(
        ds.create_shading(0, 0, 10, 10, Color::BLACK),
        Err(AfpError::NoActiveTarget(_))
    ));
    assert!(matches!(
        ds.create_tag_logical_element("Author", "Somebody"),
        Err(AfpError::NoActiveTarget(_))
    ));
    ds.create_no_operation("document comment").unwrap();
    ds.create_invoke_medium_map("MM1").unwrap();

    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.start_overlay(0, 0, 50, 50, 240, 240, Rotation::R0).unwrap();
    assert!(matches!(
        ds.create_include_page_overlay("O1", 0, 0, Rotation::R0),
        Err(AfpError::NoActiveTarget(_))
    ));
    ds.end_overlay().unwrap();
    ds.create_include_page_overlay("O1", 0, 0, Rotation::R0)
        .unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let ids = outline(&parse(&out));
    assert_eq!(&ids[..3], &[SfId::BDT, SfId::NOP, SfId::IMM]);
}

#[test]
fn saved_pages_keep_their_order() {
    let mut ds = started(Config::default());
    let first = ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.create_text(&TextRun::new(0, 10, 1, "first")).unwrap();
    assert_eq!(ds.save_page().unwrap(), first);
    assert_eq!(ds.state(), StreamState::InDocument);

    let second = ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.create_text(&TextRun::new(0, 10, 1, "second")).unwrap();
    assert!(matches!(ds.restore_page(first), Err(AfpError::IllegalState(_))));
    assert!(matches!(ds.end_page(), Err(AfpError::IllegalState(_))));
    assert_eq!(ds.save_page().unwrap(), second);

    ds.restore_page(first).unwrap();
    assert!(matches!(ds.restore_page(first), Err(AfpError::IllegalState(_))));
    ds.create_text(&TextRun::new(0, 20, 1, "more")).unwrap();
    let before = ds.bytes_written();
    ds.end_page().unwrap();
    assert!(ds.bytes_written() > before);

    assert!(matches!(ds.end_document(), Err(AfpError::IllegalState(_))));
    ds.restore_page(second).unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    let pages: Vec<_> = fields
        .iter()
        .filter(|f| f.id() == SfId::BPG)
        .map(|f| f.name())
        .collect();
    assert_eq!(
        pages,
        vec![Some(Name::new("PGN00001")), Some(Name::new("PGN00002"))]
    );
    assert_eq!(
        outline(&fields),
        vec![
            SfId::BDT,
            SfId::BPG,
            SfId::BPT,
            SfId::PTX,
            SfId::EPT,
            SfId::EPG,
            SfId::BPG,
            SfId::BPT,
            SfId::PTX,
            SfId::EPT,
            SfId::EPG,
            SfId::EDT
        ]
    );
}

#[test]
fn restored_page_resumes_overlay_and_graphics() {
    let mut ds = started(Config::default());
    let page = ds.start_page(2040, 2640, Rotation::R0, 240, 240).unwrap();
    ds.start_overlay(0, 0, 500, 500, 240, 240, Rotation::R0).unwrap();
    ds.start_graphics(0, 0, 500, 500).unwrap();
    let width = DrawingOrder::SetLineWidth(2);
    ds.add_drawing_order(&width).unwrap();
    assert_eq!(ds.save_page().unwrap(), page);
    assert_eq!(ds.state(), StreamState::InDocument);
    assert!(matches!(
        ds.add_drawing_order(&width),
        Err(AfpError::NoActiveTarget(_))
    ));

    ds.restore_page(page).unwrap();
    assert_eq!(ds.state(), StreamState::InOverlay);
    let line = DrawingOrder::Line {
        from: Point::new(0, 0),
        to: Point::new(100, 0),
    };
    ds.add_drawing_order(&line).unwrap();
    ds.end_graphics().unwrap();
    ds.end_overlay().unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    let at = |id: SfId| fields.iter().position(|f| f.id() == id).unwrap();
    assert!(at(SfId::BMO) < at(SfId::BGR));
    assert!(at(SfId::EGR) < at(SfId::EMO));
    assert!(at(SfId::EMO) < at(SfId::BPG));

    let segments: Vec<_> = fields.iter().filter(|f| f.id() == SfId::GAD).collect();
    assert_eq!(segments.len(), 1);
    let mut orders = width.encode().unwrap().to_vec();
    orders.extend_from_slice(&line.encode().unwrap());
    assert_eq!(segments[0].payload.len(), 27);
    assert_eq!(&segments[0].payload[14..], orders.as_slice());
}

#[test]
fn oversized_comments_are_rejected() {
    let mut ds = started(Config::default());
    let long = "x".repeat(40000);
    assert!(matches!(
        ds.create_no_operation(&long),
        Err(AfpError::PayloadTooLarge {
            id: SfId::NOP,
            len: 40000,
            max: 32759
        })
    ));
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    assert!(matches!(
        ds.create_no_operation(&long),
        Err(AfpError::PayloadTooLarge { .. })
    ));
    ds.create_no_operation("short").unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    assert_eq!(fields.iter().filter(|f| f.id() == SfId::NOP).count(), 1);
    assert_eq!(fields.last().map(|f| f.id()), Some(SfId::EDT));
}

#[test]
fn overlay_precedes_its_page() {
    let mut ds = started(Config::default());
    ds.start_page(2040, 2640, Rotation::R0, 240, 240).unwrap();
    ds.start_overlay(100, 100, 500, 500, 240, 240, Rotation::R0)
        .unwrap();
    ds.create_text(&TextRun::new(0, 50, 1, "stamp")).unwrap();
    ds.end_overlay().unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    assert_eq!(
        outline(&fields),
        vec![
            SfId::BDT,
            SfId::BRG,
            SfId::BMO,
            SfId::BPT,
            SfId::PTX,
            SfId::EPT,
            SfId::EMO,
            SfId::ERG,
            SfId::BPG,
            SfId::IPO,
            SfId::EPG,
            SfId::EDT
        ]
    );
    let overlay = fields.iter().find(|f| f.id() == SfId::BMO).unwrap();
    let include = fields.iter().find(|f| f.id() == SfId::IPO).unwrap();
    assert_eq!(overlay.name(), Some(Name::new("OVL00001")));
    assert_eq!(&include.payload[..8], Name::new("OVL00001").as_bytes());
    // x and y of the include
    assert_eq!(&include.payload[8..14], &[0x00, 0x00, 0x64, 0x00, 0x00, 0x64]);
    assert!(fields.iter().any(|f| f.id() == SfId::MPO));
}

#[test]
fn page_group_is_written_at_its_end() {
    let mut ds = started(Config::default());
    ds.start_page_group().unwrap();
    ds.create_tag_logical_element("Author", "Somebody").unwrap();
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.end_page().unwrap();
    let pending = ds.bytes_written();
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.end_page().unwrap();
    assert_eq!(ds.bytes_written(), pending);
    ds.end_page_group().unwrap();
    assert!(ds.bytes_written() > pending);
    ds.end_document().unwrap();

    let out = ds.into_inner();
    assert_eq!(
        outline(&parse(&out)),
        vec![
            SfId::BDT,
            SfId::BNG,
            SfId::TLE,
            SfId::BPG,
            SfId::EPG,
            SfId::BPG,
            SfId::EPG,
            SfId::ENG,
            SfId::EDT
        ]
    );
}

#[test]
fn open_containers_are_closed_at_the_end() {
    let mut ds = started(Config::default());
    ds.start_page_group().unwrap();
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.start_overlay(0, 0, 50, 50, 240, 240, Rotation::R0).unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let ids = outline(&parse(&out));
    assert_eq!(ids.first(), Some(&SfId::BDT));
    assert_eq!(ids.last(), Some(&SfId::EDT));
    assert!(ids.contains(&SfId::EMO));
    assert!(ids.contains(&SfId::ENG));
}

#[test]
fn large_images_are_split() {
    let mut ds = started(color_config());
    ds.start_page(2040, 2640, Rotation::R0, 240, 240).unwrap();
    let data = vec![0x80; 100 * 100 * 3];
    ds.create_image(0, 0, 100, 100, ImageContent::new(100, 100, ColorModel::Rgb, data))
        .unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    let pieces: Vec<_> = fields.iter().filter(|f| f.id() == SfId::IPD).collect();
    assert_eq!(pieces.len(), 4);
    assert!(pieces.iter().all(|f| f.payload.len() <= 8192));
    assert!(pieces[..3].iter().all(|f| f.payload.len() == 8192));
    let segment: Vec<u8> = pieces.iter().flat_map(|f| f.payload.to_vec()).collect();
    assert_eq!(&segment[..2], &[0x70, 0x04]);
    assert!(segment.ends_with(&[0x93, 0x00, 0x71, 0x00]));
    assert!(outline(&fields).contains(&SfId::BIM));
}

#[test]
fn color_images_become_gray() {
    let mut ds = started(Config::default());
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    let data = vec![0, 0, 0, 255, 255, 255];
    ds.create_image(0, 0, 2, 1, ImageContent::new(2, 1, ColorModel::Rgb, data))
        .unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    let ipd = fields.iter().find(|f| f.id() == SfId::IPD).unwrap();
    assert!(ipd
        .payload
        .ends_with(&[0xFE, 0x92, 0x00, 0x02, 0x00, 0xFF, 0x93, 0x00, 0x71, 0x00]));
}

#[test]
fn compressed_images_need_native_support() {
    let mut ds = started(Config::default());
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    let image = ImageContent::bilevel(8, 8, Compression::G4Mmr, vec![0x00; 4]);
    assert!(matches!(
        ds.create_image(0, 0, 8, 8, image.clone()),
        Err(AfpError::IllegalState(_))
    ));

    let config = Config {
        native_images: true,
        ..Config::default()
    };
    let mut ds = started(config);
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.create_image(0, 0, 8, 8, image).unwrap();
}

#[test]
fn graphics_are_chained() {
    let mut ds = started(Config::default());
    ds.start_page(2040, 2640, Rotation::R0, 240, 240).unwrap();
    ds.start_graphics(0, 0, 2040, 2640).unwrap();
    ds.add_drawing_order(&DrawingOrder::SetColor(1)).unwrap();
    for i in 0..2000 {
        ds.add_drawing_order(&DrawingOrder::Line {
            from: Point::new(0, i),
            to: Point::new(100, i),
        })
        .unwrap();
    }
    ds.begin_area(AreaFlags::BOUNDARY).unwrap();
    ds.add_drawing_order(&DrawingOrder::Box {
        from: Point::new(10, 10),
        to: Point::new(20, 20),
    })
    .unwrap();
    ds.end_area().unwrap();
    ds.end_graphics().unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();

    let out = ds.into_inner();
    let fields = parse(&out);
    let segments: Vec<_> = fields.iter().filter(|f| f.id() == SfId::GAD).collect();
    assert_eq!(segments.len(), 3);
    let first = segments[0].payload;
    assert_eq!(&first[..2], &[0x70, 0x0C]);
    assert_eq!(first[7], 0x00);
    for pair in segments.windows(2) {
        let (prev, next) = (pair[0].payload, pair[1].payload);
        assert_eq!(next[7], 0x10);
        assert_eq!(&next[10..14], &prev[2..6]);
        let own = u16::from_be_bytes([next[8], next[9]]) as usize;
        assert_eq!(own, next.len() - 14);
    }
    let total: usize = segments.iter().map(|f| f.payload.len() - 14).sum();
    assert_eq!(u16::from_be_bytes([first[8], first[9]]) as usize, total);
}

#[test]
fn open_graphics_are_finished_with_the_page() {
    let mut ds = started(Config::default());
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.start_graphics(0, 0, 100, 100).unwrap();
    ds.add_drawing_order(&DrawingOrder::SetLineWidth(2)).unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();
    let out = ds.into_inner();
    assert!(outline(&parse(&out)).contains(&SfId::BGR));

    let mut ds = started(Config::default());
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.start_graphics(0, 0, 100, 100).unwrap();
    ds.begin_area(AreaFlags::empty()).unwrap();
    assert!(matches!(ds.end_page(), Err(AfpError::UnterminatedArea)));
}

#[test]
fn shading_without_images_draws_a_rule() {
    let config = Config {
        shading: false,
        ..Config::default()
    };
    let mut ds = started(config);
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.create_shading(10, 10, 50, 20, Color::BLACK).unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();
    let out = ds.into_inner();
    let ids = outline(&parse(&out));
    assert!(ids.contains(&SfId::PTX));
    assert!(!ids.contains(&SfId::BII));

    let mut ds = started(Config::default());
    ds.start_page(100, 100, Rotation::R0, 240, 240).unwrap();
    ds.create_shading(10, 10, 50, 20, Color::BLACK).unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();
    let out = ds.into_inner();
    let ids = outline(&parse(&out));
    assert!(ids.contains(&SfId::BII));
    assert!(ids.contains(&SfId::IRD));
}

#[test]
fn rotated_pages_swap_their_extent() {
    let mut ds = started(Config::default());
    ds.start_page(2040, 2640, Rotation::R90, 240, 240).unwrap();
    ds.end_page().unwrap();
    ds.end_document().unwrap();
    let out = ds.into_inner();
    let fields = parse(&out);
    let pgd = fields.iter().find(|f| f.id() == SfId::PGD).unwrap();
    // width and height follow the units of measure
    assert_eq!(&pgd.payload[6..12], &[0x00, 0x0A, 0x50, 0x00, 0x07, 0xF8]);
}
