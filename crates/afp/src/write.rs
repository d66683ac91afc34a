//! Methods to produce the binary stream

use std::io::Write;

use log::trace;

use crate::{
    chunk::{write_chunks, ChunkHeader},
    error::AfpResult,
    field::{header_template, SfFlags, SfId, StructuredField, INTRODUCER_LEN},
    util::ByteCounter,
};

/// Formatter for an AFP data stream
///
/// Fields are first collected into a buffer and only reach the sink on
/// [`Formatter::flush`], so that a page can be built up completely before
/// any of its bytes are written.
pub struct Formatter<W> {
    inner: ByteCounter<W>,
    buffer: Vec<u8>,
    fields: usize,
}

impl<W: Write> Formatter<W> {
    /// Create a new formatter
    pub fn new(w: W) -> Self {
        Self {
            inner: ByteCounter::new(w),
            buffer: Vec::new(),
            fields: 0,
        }
    }

    /// Queue an encoded structured field
    pub fn field(&mut self, field: &StructuredField) -> AfpResult<()> {
        trace!("{} ({} bytes)", field.id, field.payload_len());
        field.encode_into(&mut self.buffer)?;
        self.fields += 1;
        Ok(())
    }

    /// Queue a data field
    pub fn data(&mut self, id: SfId, payload: &[u8]) -> AfpResult<()> {
        trace!("{} ({} bytes)", id, payload.len());
        crate::field::encode_field_into(&mut self.buffer, id, SfFlags::empty(), payload)?;
        self.fields += 1;
        Ok(())
    }

    /// Queue `data` as a run of fields of type `id`, each at most `max` bytes
    ///
    /// Empty data produces no field at all.
    pub fn split_data(&mut self, id: SfId, data: &[u8], max: usize) -> AfpResult<()> {
        let template = header_template(id, SfFlags::empty());
        let header = ChunkHeader {
            template: &template,
            length_offset: 1,
            length_width: 2,
            length_bias: INTRODUCER_LEN,
        };
        let count = write_chunks(data, &header, max, &mut self.buffer)?;
        self.fields += count;
        Ok(())
    }

    /// Write everything queued so far to the sink
    pub fn flush(&mut self) -> AfpResult<()> {
        if !self.buffer.is_empty() {
            self.inner.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.inner.flush()?;
        Ok(())
    }

    /// The number of bytes that reached the sink
    pub fn bytes_written(&self) -> usize {
        self.inner.bytes_written()
    }

    /// The number of fields produced (queued or written)
    pub fn fields_written(&self) -> usize {
        self.fields
    }

    /// Return the sink. Unflushed fields are discarded.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

/// Trait for objects that write themselves as structured fields
pub trait Serialize {
    /// Queue the fields of this object
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()>;
}

impl Serialize for StructuredField {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        f.field(self)
    }
}

impl<X: Serialize> Serialize for [X] {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        for elem in self {
            elem.write(f)?;
        }
        Ok(())
    }
}

impl<X: Serialize> Serialize for Vec<X> {
    fn write<W: Write>(&self, f: &mut Formatter<W>) -> AfpResult<()> {
        self.as_slice().write(f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Formatter, Serialize};
    use crate::{
        common::Name,
        field::{decode_header, SfId, StructuredField, HEADER_LEN},
    };

    #[test]
    fn test_buffered_until_flush() {
        let mut out = Vec::new();
        {
            let mut f = Formatter::new(&mut out);
            StructuredField::begin(SfId::BDT, Name::new("DOC00001"))
                .write(&mut f)
                .unwrap();
            assert_eq!(f.bytes_written(), 0);
            f.flush().unwrap();
            assert_eq!(f.bytes_written(), HEADER_LEN + 8);
            assert_eq!(f.fields_written(), 1);
        }
        assert_eq!(decode_header(&out).unwrap().id, SfId::BDT);
    }

    #[test]
    fn test_split_data() {
        let mut f = Formatter::new(Vec::new());
        f.split_data(SfId::IPD, &[7u8; 10000], 8192).unwrap();
        f.flush().unwrap();
        assert_eq!(f.fields_written(), 2);
        let out = f.into_inner();
        let first = decode_header(&out).unwrap();
        assert_eq!(first.id, SfId::IPD);
        assert_eq!(first.payload_len(), 8192);
        let second = decode_header(&out[HEADER_LEN + 8192..]).unwrap();
        assert_eq!(second.payload_len(), 10000 - 8192);
    }
}
