//! Presentation text content (PTOCA)
//!
//! Control sequences are written in chains. A chain starts with the escape
//! sequence, every control sequence in it has the chain bit set and the chain
//! is closed by an unchained no-operation. The resulting stream is cut into
//! presentation text data fields of at most 8192 bytes, each field holds
//! complete chains only.

use std::mem;

use smallvec::SmallVec;

use crate::{
    chunk::{write_chunks, ChunkHeader},
    common::{put_i16, Color, Rotation},
    encoding::ebcdic_encode,
    error::{AfpError, AfpResult},
    field::MAX_DATA_LEN,
};

/// Starts a chain of control sequences
pub const ESCAPE: [u8; 2] = [0x2B, 0xD3];

/// Marks all but the last control sequence of a chain
pub const CHAIN_BIT: u8 = 0x01;

/// Largest run of transparent data in one control sequence
pub const TRANSPARENT_MAX: usize = 253;

/// Control sequence function types (unchained)
pub mod function {
    /// Set extended text color
    pub const SEC: u8 = 0x80;
    /// Set intercharacter adjustment
    pub const SIA: u8 = 0xC2;
    /// Set variable space character increment
    pub const SVI: u8 = 0xC4;
    /// Absolute move inline
    pub const AMI: u8 = 0xC6;
    /// Relative move inline
    pub const RMI: u8 = 0xC8;
    /// Absolute move baseline
    pub const AMB: u8 = 0xD2;
    /// Transparent data
    pub const TRN: u8 = 0xDA;
    /// Draw I-axis rule
    pub const DIR: u8 = 0xE4;
    /// Draw B-axis rule
    pub const DBR: u8 = 0xE6;
    /// Set coded font local
    pub const SCFL: u8 = 0xF0;
    /// Set text orientation
    pub const STO: u8 = 0xF6;
    /// No operation
    pub const NOP: u8 = 0xF8;
}

const NOP_LEN: usize = 2;

/// Modal text state, used to skip redundant control sequences
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextState {
    x: Option<i32>,
    y: Option<i32>,
    font: Option<u8>,
    orientation: Rotation,
    color: Color,
    variable_space: i32,
    inter_char: i32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            font: None,
            orientation: Rotation::R0,
            color: Color::BLACK,
            variable_space: 0,
            inter_char: 0,
        }
    }
}

/// A run of text at a given position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Inline position
    pub x: i32,
    /// Baseline position
    pub y: i32,
    /// Local id of the coded font
    pub font: u8,
    /// Text color
    pub color: Color,
    /// Direction of the inline axis
    pub orientation: Rotation,
    /// Variable space character increment
    pub variable_space: i32,
    /// Intercharacter adjustment (may be negative)
    pub inter_char: i32,
    /// The text
    pub text: String,
}

impl TextRun {
    /// Black, unrotated text without adjustments
    pub fn new(x: i32, y: i32, font: u8, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            font,
            color: Color::BLACK,
            orientation: Rotation::R0,
            variable_space: 0,
            inter_char: 0,
            text: text.into(),
        }
    }
}

/// A horizontal or vertical rule
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Start inline position
    pub x1: i32,
    /// Start baseline position
    pub y1: i32,
    /// End inline position
    pub x2: i32,
    /// End baseline position
    pub y2: i32,
    /// Width of the rule
    pub thickness: i32,
    /// Color
    pub color: Color,
    /// Text orientation the rule is drawn in
    pub orientation: Rotation,
}

/// Builds the presentation text data of one text object
#[derive(Debug, Default)]
pub struct PtocaBuilder {
    fields: Vec<Vec<u8>>,
    current: Vec<u8>,
    chained: bool,
    state: TextState,
}

impl PtocaBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one encoded control sequence `len | function | data`
    fn push_sequence(&mut self, seq: &[u8]) {
        let escape = if self.chained { 0 } else { ESCAPE.len() };
        if !self.current.is_empty() && self.current.len() + escape + seq.len() + NOP_LEN > MAX_DATA_LEN
        {
            self.end_chain();
            self.fields.push(mem::take(&mut self.current));
        }
        if !self.chained {
            self.current.extend_from_slice(&ESCAPE);
            self.chained = true;
        }
        self.current.extend_from_slice(seq);
    }

    fn control(&mut self, function: u8, data: &[u8]) {
        let mut seq: SmallVec<[u8; 16]> = SmallVec::new();
        seq.push((data.len() + 2) as u8);
        seq.push(function | CHAIN_BIT);
        seq.extend_from_slice(data);
        self.push_sequence(&seq);
    }

    /// Close the current chain with an unchained no-operation
    pub fn end_chain(&mut self) {
        if self.chained {
            self.current.extend_from_slice(&[NOP_LEN as u8, function::NOP]);
            self.chained = false;
        }
    }

    /// Select the coded font with the given local id
    pub fn set_coded_font(&mut self, font: u8) {
        if self.state.font == Some(font) {
            return;
        }
        self.state.font = Some(font);
        self.control(function::SCFL, &[font]);
    }

    /// Move to an absolute inline position
    pub fn absolute_move_inline(&mut self, x: i32) {
        if self.state.x == Some(x) {
            return;
        }
        let mut data = Vec::with_capacity(2);
        put_i16(&mut data, x);
        self.control(function::AMI, &data);
        self.state.x = Some(x);
    }

    /// Move relative to the current inline position
    pub fn relative_move_inline(&mut self, dx: i32) {
        let mut data = Vec::with_capacity(2);
        put_i16(&mut data, dx);
        self.control(function::RMI, &data);
        self.state.x = self.state.x.map(|x| x + dx);
    }

    /// Move to an absolute baseline position
    pub fn absolute_move_baseline(&mut self, y: i32) {
        if self.state.y == Some(y) {
            return;
        }
        let mut data = Vec::with_capacity(2);
        put_i16(&mut data, y);
        self.control(function::AMB, &data);
        self.state.y = Some(y);
        self.state.x = None;
    }

    /// Set the inline and baseline directions
    pub fn set_text_orientation(&mut self, orientation: Rotation) {
        if self.state.orientation == orientation {
            return;
        }
        let inline = orientation.orientation();
        let baseline = orientation.then(Rotation::R90).orientation();
        self.control(
            function::STO,
            &[inline[0], inline[1], baseline[0], baseline[1]],
        );
        self.state.orientation = orientation;
        self.state.x = None;
        self.state.y = None;
    }

    /// Set the text color
    pub fn set_extended_text_color(&mut self, color: Color) {
        if self.state.color == color {
            return;
        }
        // RGB color space, 8 bits per component
        let data = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 8, 8, 8, 0, color.r, color.g, color.b,
        ];
        self.control(function::SEC, &data);
        self.state.color = color;
    }

    /// Set the extra space added to space characters
    pub fn set_variable_space_increment(&mut self, increment: i32) {
        if self.state.variable_space == increment {
            return;
        }
        let mut data = Vec::with_capacity(2);
        put_i16(&mut data, increment);
        self.control(function::SVI, &data);
        self.state.variable_space = increment;
    }

    /// Set the extra space added between characters
    pub fn set_inter_character_adjustment(&mut self, adjustment: i32) {
        if self.state.inter_char == adjustment {
            return;
        }
        let mut data = Vec::with_capacity(3);
        put_i16(&mut data, adjustment.abs());
        data.push(if adjustment >= 0 { 0x00 } else { 0x01 });
        self.control(function::SIA, &data);
        self.state.inter_char = adjustment;
    }

    /// Add encoded characters, split into runs of at most 253 bytes
    pub fn transparent_data(&mut self, data: &[u8]) -> AfpResult<()> {
        let template = [0x00, function::TRN | CHAIN_BIT];
        let header = ChunkHeader::short(&template, 0).with_bias(2);
        let mut encoded = Vec::with_capacity(data.len() + 2 * (data.len() / TRANSPARENT_MAX + 1));
        write_chunks(data, &header, TRANSPARENT_MAX, &mut encoded)?;
        for seq in encoded.chunks(TRANSPARENT_MAX + 2) {
            self.push_sequence(seq);
        }
        Ok(())
    }

    /// Draw a rule along the inline axis
    pub fn draw_i_axis_rule(&mut self, length: i32, width: i32) {
        self.control(function::DIR, &rule_data(length, width));
    }

    /// Draw a rule along the baseline axis
    pub fn draw_b_axis_rule(&mut self, length: i32, width: i32) {
        self.control(function::DBR, &rule_data(length, width));
    }

    /// Add a text run as its own chain
    pub fn add_text(&mut self, run: &TextRun) -> AfpResult<()> {
        self.set_text_orientation(run.orientation);
        self.set_coded_font(run.font);
        self.set_extended_text_color(run.color);
        self.absolute_move_baseline(run.y);
        self.absolute_move_inline(run.x);
        self.set_variable_space_increment(run.variable_space);
        self.set_inter_character_adjustment(run.inter_char);
        self.transparent_data(&ebcdic_encode(&run.text))?;
        self.state.x = None;
        self.end_chain();
        Ok(())
    }

    /// Add a rule as its own chain
    ///
    /// Rules that are neither horizontal nor vertical fail with
    /// [`AfpError::UnsupportedGeometry`].
    pub fn add_rule(&mut self, rule: &Rule) -> AfpResult<()> {
        let Rule { x1, y1, x2, y2, .. } = *rule;
        if x1 != x2 && y1 != y2 {
            return Err(AfpError::UnsupportedGeometry(x1, y1, x2, y2));
        }
        self.set_text_orientation(rule.orientation);
        self.absolute_move_baseline(y1);
        self.absolute_move_inline(x1);
        self.set_extended_text_color(rule.color);
        if y1 == y2 {
            self.draw_i_axis_rule(x2 - x1, rule.thickness);
        } else {
            self.draw_b_axis_rule(y2 - y1, rule.thickness);
        }
        self.end_chain();
        Ok(())
    }

    /// Whether nothing was added yet
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.current.is_empty()
    }

    /// The payloads of the text data fields so far, with the last chain closed
    pub fn fields(&self) -> Vec<Vec<u8>> {
        let mut fields = self.fields.clone();
        if !self.current.is_empty() {
            let mut last = self.current.clone();
            if self.chained {
                last.extend_from_slice(&[NOP_LEN as u8, function::NOP]);
            }
            fields.push(last);
        }
        fields
    }

    /// Close the last chain and return the payloads of the text data fields
    pub fn finish(mut self) -> Vec<Vec<u8>> {
        self.end_chain();
        if !self.current.is_empty() {
            self.fields.push(self.current);
        }
        self.fields
    }
}

fn rule_data(length: i32, width: i32) -> [u8; 5] {
    let mut data = Vec::with_capacity(5);
    put_i16(&mut data, length);
    put_i16(&mut data, width);
    [data[0], data[1], data[2], data[3], 0x00]
}

#[cfg(test)]
mod tests {
    use super::{function, PtocaBuilder, Rule, TextRun, CHAIN_BIT, ESCAPE};
    use crate::{
        common::{Color, Rotation},
        error::AfpError,
        field::MAX_DATA_LEN,
    };

    /// Split a chain into `(function, data)` pairs, skipping the escape
    fn sequences(mut data: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut out = vec![];
        while !data.is_empty() {
            if data.starts_with(&ESCAPE) {
                data = &data[2..];
                continue;
            }
            let len = usize::from(data[0]);
            out.push((data[1], data[2..len].to_vec()));
            data = &data[len..];
        }
        out
    }

    #[test]
    fn test_text_chain() {
        let mut b = PtocaBuilder::new();
        b.add_text(&TextRun::new(100, 200, 1, "Hello")).unwrap();
        let fields = b.finish();
        assert_eq!(fields.len(), 1);
        assert!(fields[0].starts_with(&ESCAPE));
        let seqs = sequences(&fields[0]);
        let functions: Vec<u8> = seqs.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            functions,
            vec![
                function::SCFL | CHAIN_BIT,
                function::AMB | CHAIN_BIT,
                function::AMI | CHAIN_BIT,
                function::TRN | CHAIN_BIT,
                function::NOP,
            ]
        );
        assert_eq!(seqs[3].1, vec![0xC8, 0x85, 0x93, 0x93, 0x96]);
    }

    #[test]
    fn test_redundant_state_is_elided() {
        let mut b = PtocaBuilder::new();
        b.add_text(&TextRun::new(100, 200, 1, "a")).unwrap();
        b.add_text(&TextRun::new(300, 200, 1, "b")).unwrap();
        let fields = b.finish();
        let functions: Vec<u8> = sequences(&fields[0]).iter().map(|(f, _)| *f).collect();
        assert_eq!(functions.iter().filter(|f| **f == 0xF1).count(), 1);
        assert_eq!(functions.iter().filter(|f| **f == 0xD3).count(), 1);
        assert_eq!(functions.iter().filter(|f| **f == 0xC7).count(), 2);
    }

    #[test]
    fn test_long_text_is_split() {
        let mut b = PtocaBuilder::new();
        b.add_text(&TextRun::new(0, 0, 1, "x".repeat(600))).unwrap();
        let fields = b.finish();
        let trn: Vec<usize> = sequences(&fields[0])
            .iter()
            .filter(|(f, _)| *f == 0xDB)
            .map(|(_, d)| d.len())
            .collect();
        assert_eq!(trn, vec![253, 253, 94]);
    }

    #[test]
    fn test_fields_are_bounded() {
        let mut b = PtocaBuilder::new();
        for i in 0..200 {
            let mut run = TextRun::new(i, i, 1, "y".repeat(100));
            run.color = Color::rgb(i as u8, 0, 0);
            b.add_text(&run).unwrap();
        }
        let fields = b.finish();
        assert!(fields.len() >= 3);
        for field in &fields {
            assert!(field.len() <= MAX_DATA_LEN);
            assert!(field.starts_with(&ESCAPE));
            assert_eq!(&field[field.len() - 2..], &[2, function::NOP]);
        }
    }

    #[test]
    fn test_relative_move() {
        let mut b = PtocaBuilder::new();
        b.absolute_move_inline(100);
        b.relative_move_inline(-20);
        b.absolute_move_inline(80);
        let seqs = sequences(&b.finish()[0]);
        assert_eq!(seqs.len(), 3);
        assert_eq!(seqs[1], (function::RMI | CHAIN_BIT, vec![0xFF, 0xEC]));
        assert_eq!(seqs[2], (function::NOP, vec![]));
    }

    #[test]
    fn test_rules() {
        let mut b = PtocaBuilder::new();
        let mut rule = Rule {
            x1: 10,
            y1: 10,
            x2: 110,
            y2: 10,
            thickness: 3,
            color: Color::BLACK,
            orientation: Rotation::R0,
        };
        b.add_rule(&rule).unwrap();
        let fields = b.finish();
        let seqs = sequences(&fields[0]);
        assert_eq!(seqs[2], (function::DIR | CHAIN_BIT, vec![0, 100, 0, 3, 0]));

        rule.x2 = 50;
        rule.y2 = 60;
        let mut b = PtocaBuilder::new();
        assert!(matches!(
            b.add_rule(&rule),
            Err(AfpError::UnsupportedGeometry(10, 10, 50, 60))
        ));
    }
}
