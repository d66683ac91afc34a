//! Segments and chains of drawing orders
//!
//! Each segment becomes the payload of one graphics data (GAD) field. A
//! segment is closed as soon as the next order would bring it to the budget,
//! the follow-up segment names it as its predecessor. Only the first segment
//! of a chain carries the length of the whole chain.

use log::debug;

use crate::{
    chunk::{write_chunks, ChunkHeader},
    common::Point,
    encoding::ebcdic_fixed,
    error::{AfpError, AfpResult},
    field::SfId,
    util::NextId,
};

use super::{code, AreaFlags, DrawingOrder, MAX_ORDER_DATA};

/// Bytes of drawing orders per segment
pub const SEGMENT_BUDGET: usize = 8192;

/// Length of the begin segment introducer
pub const SEGMENT_HEADER_LEN: usize = 14;

/// Segment names are four hex digits
const MAX_SEGMENTS: u32 = 0xFFFF;

const FLAG2_NEW: u8 = 0x00;
const FLAG2_APPEND: u8 = 0x10;

/// A run of drawing orders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: [u8; 4],
    predecessor: Option<[u8; 4]>,
    data: Vec<u8>,
    orders: usize,
}

impl Segment {
    fn new(name: [u8; 4], predecessor: Option<[u8; 4]>) -> Self {
        Self {
            name,
            predecessor,
            data: Vec::new(),
            orders: 0,
        }
    }

    /// The 4-byte EBCDIC name
    pub fn name(&self) -> [u8; 4] {
        self.name
    }

    /// The name of the previous segment of the same chain
    pub fn predecessor(&self) -> Option<[u8; 4]> {
        self.predecessor
    }

    /// Whether this segment starts a chain
    pub fn is_chain_start(&self) -> bool {
        self.predecessor.is_none()
    }

    /// The encoded drawing orders
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of drawing orders (an area counts all of its orders)
    pub fn order_count(&self) -> usize {
        self.orders
    }

    /// Byte length of the orders
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no order has been added yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encode the begin segment introducer followed by the orders
    ///
    /// `length` is what ends up in the length slot.
    fn encode(&self, length: u16) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEGMENT_HEADER_LEN + self.data.len());
        out.extend_from_slice(&[0x70, 0x0C]);
        out.extend_from_slice(&self.name);
        let flag2 = if self.predecessor.is_some() {
            FLAG2_APPEND
        } else {
            FLAG2_NEW
        };
        out.extend_from_slice(&[0x00, flag2]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&self.predecessor.unwrap_or([0x00; 4]));
        out.extend_from_slice(&self.data);
        out
    }
}

struct OpenArea {
    data: Vec<u8>,
    orders: usize,
}

/// The drawing orders of one graphics object
pub struct GraphicsChain {
    segments: Vec<Segment>,
    names: NextId,
    area: Option<OpenArea>,
    chain_start: usize,
}

impl Default for GraphicsChain {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            names: NextId::new(1),
            area: None,
            chain_start: 0,
        }
    }

    fn next_name(&mut self) -> AfpResult<[u8; 4]> {
        let id = self.names.next();
        if id > MAX_SEGMENTS {
            return Err(AfpError::NamesExhausted("graphics segments"));
        }
        Ok(ebcdic_fixed(&format!("{:04X}", id)))
    }

    /// The sum of the segment lengths since the start of the current chain
    fn chain_total(&self) -> usize {
        self.segments[self.chain_start..]
            .iter()
            .map(Segment::len)
            .sum()
    }

    fn open_segment(&mut self) -> AfpResult<()> {
        let predecessor = self.segments.last().map(Segment::name);
        let name = self.next_name()?;
        let segment = match predecessor {
            Some(prev) if self.chain_total() + SEGMENT_BUDGET <= u16::MAX as usize => {
                debug!("Continuing graphics chain with segment {:02X?}", name);
                Segment::new(name, Some(prev))
            }
            Some(_) => {
                debug!("Graphics chain full, starting a new one");
                self.chain_start = self.segments.len();
                Segment::new(name, None)
            }
            None => Segment::new(name, None),
        };
        self.segments.push(segment);
        Ok(())
    }

    /// Append an encoded unit of `orders` drawing orders
    fn commit(&mut self, data: &[u8], orders: usize) -> AfpResult<()> {
        if data.len() >= SEGMENT_BUDGET {
            return Err(AfpError::PayloadTooLarge {
                id: SfId::GAD,
                len: data.len(),
                max: SEGMENT_BUDGET - 1,
            });
        }
        let needs_new = match self.segments.last() {
            None => true,
            Some(current) => !current.is_empty() && current.len() + data.len() >= SEGMENT_BUDGET,
        };
        if needs_new {
            self.open_segment()?;
        }
        if let Some(current) = self.segments.last_mut() {
            current.data.extend_from_slice(data);
            current.orders += orders;
        }
        Ok(())
    }

    /// Add a drawing order
    ///
    /// Inside an area, the order is held back until the area is ended.
    pub fn add_drawing_order(&mut self, order: &DrawingOrder) -> AfpResult<()> {
        match order {
            DrawingOrder::BeginArea(flags) => return self.begin_area(*flags),
            DrawingOrder::EndArea => return self.end_area(),
            _ => {}
        }
        if let Some(area) = &mut self.area {
            order.encode_into(&mut area.data)?;
            area.orders += 1;
            Ok(())
        } else {
            let mut data = Vec::with_capacity(order.encoded_len());
            order.encode_into(&mut data)?;
            self.commit(&data, 1)
        }
    }

    /// Start a filled area
    pub fn begin_area(&mut self, flags: AreaFlags) -> AfpResult<()> {
        if self.area.is_some() {
            return Err(AfpError::IllegalState("graphics areas cannot be nested"));
        }
        let mut data = Vec::new();
        DrawingOrder::BeginArea(flags).encode_into(&mut data)?;
        self.area = Some(OpenArea { data, orders: 1 });
        Ok(())
    }

    /// End the current area, committing all of its orders at once
    pub fn end_area(&mut self) -> AfpResult<()> {
        let mut area = self
            .area
            .take()
            .ok_or(AfpError::IllegalState("no graphics area to end"))?;
        DrawingOrder::EndArea.encode_into(&mut area.data)?;
        self.commit(&area.data, area.orders + 1)
    }

    /// Whether an area is open
    pub fn in_area(&self) -> bool {
        self.area.is_some()
    }

    /// Add an inline image, with the data split into 255 byte orders
    pub fn add_image(&mut self, at: Point, width: u16, height: u16, data: &[u8]) -> AfpResult<()> {
        self.add_drawing_order(&DrawingOrder::BeginImage { at, width, height })?;
        let mut encoded = Vec::with_capacity(data.len() + 2 * (data.len() / MAX_ORDER_DATA + 1));
        let header = ChunkHeader::short(&[code::IMAGE_DATA, 0x00], 1);
        write_chunks(data, &header, MAX_ORDER_DATA, &mut encoded)?;
        for order in encoded.chunks(MAX_ORDER_DATA + 2) {
            if let Some(area) = &mut self.area {
                area.data.extend_from_slice(order);
                area.orders += 1;
            } else {
                self.commit(order, 1)?;
            }
        }
        self.add_drawing_order(&DrawingOrder::EndImage)
    }

    /// The segments built so far
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Finish the chain, returning one encoded segment per graphics data field
    pub fn finish(self) -> AfpResult<Vec<Vec<u8>>> {
        if self.area.is_some() {
            return Err(AfpError::UnterminatedArea);
        }
        let mut out = Vec::with_capacity(self.segments.len());
        let mut index = 0;
        while index < self.segments.len() {
            let end = self.segments[index + 1..]
                .iter()
                .position(Segment::is_chain_start)
                .map_or(self.segments.len(), |p| index + 1 + p);
            let chain = &self.segments[index..end];
            let total: usize = chain.iter().map(Segment::len).sum();
            for (i, segment) in chain.iter().enumerate() {
                let length = if i == 0 { total } else { segment.len() };
                out.push(segment.encode(length as u16));
            }
            index = end;
        }
        Ok(out)
    }
}
