//! Splitting long data into bounded records
//!
//! Image data, band data, inline graphics images and long text runs all use
//! the same scheme: a short header with a length slot, followed by at most
//! `max` bytes of data, repeated until the input is consumed.

use std::io::Write;

use smallvec::SmallVec;

use crate::error::{AfpError, AfpResult};

/// The header that is written in front of every chunk
#[derive(Debug, Copy, Clone)]
pub struct ChunkHeader<'a> {
    /// The header bytes, the length slot is overwritten for every chunk
    pub template: &'a [u8],
    /// Offset of the length slot within the template
    pub length_offset: usize,
    /// Width of the length slot, 1 or 2 bytes (big endian)
    pub length_width: usize,
    /// Added to the chunk length before it is stored
    pub length_bias: usize,
}

impl<'a> ChunkHeader<'a> {
    /// A header with a one byte length slot holding the exact chunk length
    pub const fn short(template: &'a [u8], length_offset: usize) -> Self {
        Self {
            template,
            length_offset,
            length_width: 1,
            length_bias: 0,
        }
    }

    /// A header with a two byte length slot holding the exact chunk length
    pub const fn long(template: &'a [u8], length_offset: usize) -> Self {
        Self {
            template,
            length_offset,
            length_width: 2,
            length_bias: 0,
        }
    }

    /// Store `length_bias` more than the data length
    pub const fn with_bias(mut self, bias: usize) -> Self {
        self.length_bias = bias;
        self
    }

    fn slot_max(&self) -> usize {
        match self.length_width {
            1 => u8::MAX as usize,
            _ => u16::MAX as usize,
        }
    }
}

/// Number of chunks `len` bytes split into
pub fn chunk_count(len: usize, max_chunk_payload: usize) -> usize {
    if max_chunk_payload == 0 {
        0
    } else {
        (len + max_chunk_payload - 1) / max_chunk_payload
    }
}

/// Write `data` as a sequence of chunks of at most `max_chunk_payload` bytes
///
/// Returns the number of chunks written. Empty data writes nothing.
pub fn write_chunks<S: Write + ?Sized>(
    data: &[u8],
    header: &ChunkHeader<'_>,
    max_chunk_payload: usize,
    sink: &mut S,
) -> AfpResult<usize> {
    if max_chunk_payload == 0 || max_chunk_payload + header.length_bias > header.slot_max() {
        return Err(AfpError::IllegalState(
            "chunk size does not fit the length slot",
        ));
    }
    if !matches!(header.length_width, 1 | 2)
        || header.length_offset + header.length_width > header.template.len()
    {
        return Err(AfpError::IllegalState(
            "length slot outside of the chunk header",
        ));
    }

    let mut head: SmallVec<[u8; 16]> = SmallVec::from_slice(header.template);
    let mut count = 0;
    for chunk in data.chunks(max_chunk_payload) {
        let len = chunk.len() + header.length_bias;
        let slot = &mut head[header.length_offset..][..header.length_width];
        match header.length_width {
            1 => slot[0] = len as u8,
            _ => slot.copy_from_slice(&(len as u16).to_be_bytes()),
        }
        sink.write_all(&head)?;
        sink.write_all(chunk)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::{chunk_count, write_chunks, ChunkHeader};

    fn payloads(out: &[u8], head_len: usize) -> Vec<Vec<u8>> {
        // two byte length at offset 2
        let mut rest = out;
        let mut result = vec![];
        while !rest.is_empty() {
            let len = u16::from_be_bytes([rest[2], rest[3]]) as usize;
            result.push(rest[head_len..][..len].to_vec());
            rest = &rest[head_len + len..];
        }
        result
    }

    #[test]
    fn test_image_data_chunks() {
        let data: Vec<u8> = (0..70000u32).map(|i| (i % 251) as u8).collect();
        let header = ChunkHeader::long(&[0xFE, 0x92, 0x00, 0x00], 2);
        let mut out = Vec::new();
        let count = write_chunks(&data, &header, 65535, &mut out).unwrap();
        assert_eq!(count, 2);
        let chunks = payloads(&out, 4);
        assert_eq!(chunks[0].len(), 65535);
        assert_eq!(chunks[1].len(), 4465);
        assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn test_completeness() {
        let header = ChunkHeader::long(&[0xFE, 0x92, 0x00, 0x00], 2);
        for (len, max) in [(1, 1), (100, 7), (255, 255), (256, 255), (8191 * 3, 8191)] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let mut out = Vec::new();
            let count = write_chunks(&data, &header, max, &mut out).unwrap();
            assert_eq!(count, chunk_count(len, max));
            let chunks = payloads(&out, 4);
            let (last, rest) = chunks.split_last().unwrap();
            assert!(rest.iter().all(|c| c.len() == max));
            assert!(!last.is_empty() && last.len() <= max);
            assert_eq!(chunks.concat(), data);
        }
    }

    #[test]
    fn test_empty() {
        let header = ChunkHeader::short(&[0x92, 0x00], 1);
        let mut out = Vec::new();
        assert_eq!(write_chunks(&[], &header, 255, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_short_header_with_bias() {
        let header = ChunkHeader::short(&[0x00, 0xDB], 0).with_bias(2);
        let mut out = Vec::new();
        write_chunks(&[0xC1; 300], &header, 253, &mut out).unwrap();
        assert_eq!(&out[..2], &[255, 0xDB]);
        assert_eq!(&out[255..257], &[49, 0xDB]);
        assert_eq!(out.len(), 300 + 4);
    }

    #[test]
    fn test_slot_too_small() {
        let header = ChunkHeader::short(&[0x92, 0x00], 1);
        assert!(write_chunks(&[0; 10], &header, 256, &mut Vec::new()).is_err());
        let header = ChunkHeader::long(&[0x92], 0);
        assert!(write_chunks(&[0; 10], &header, 10, &mut Vec::new()).is_err());
    }
}
