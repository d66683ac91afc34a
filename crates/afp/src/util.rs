//! Generic utilities

use std::io::{self, Write};

use crate::{
    common::Name,
    error::{AfpError, AfpResult},
};

/// Source: <https://stackoverflow.com/questions/42187591/>
pub struct ByteCounter<W> {
    inner: W,
    count: usize,
}

impl<W> ByteCounter<W>
where
    W: Write,
{
    /// Create a new byte counter
    pub fn new(inner: W) -> Self {
        ByteCounter { inner, count: 0 }
    }

    /// Return the inner writer
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Get the number of bytes written
    pub fn bytes_written(&self) -> usize {
        self.count
    }
}

impl<W> Write for ByteCounter<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res = self.inner.write(buf);
        if let Ok(size) = res {
            self.count += size
        }
        res
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Monotonic counter
#[derive(Debug)]
pub(crate) struct NextId {
    id: u32,
}

impl NextId {
    pub(crate) fn new(start: u32) -> Self {
        Self { id: start }
    }

    pub(crate) fn next(&mut self) -> u32 {
        let next = self.id;
        self.id += 1;
        next
    }
}

/// Generates `PFX00001`-style names for one kind of object
#[derive(Debug)]
pub(crate) struct NameGenerator {
    prefix: &'static str,
    ids: NextId,
}

impl NameGenerator {
    /// `prefix` should be three characters, leaving five digits
    pub(crate) fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ids: NextId::new(1),
        }
    }

    /// Fails once all numbers of the digits are used up
    pub(crate) fn next_name(&mut self) -> AfpResult<Name> {
        let digits = 8usize.saturating_sub(self.prefix.len());
        let id = self.ids.next();
        if id >= 10u32.pow(digits as u32) {
            return Err(AfpError::NamesExhausted(self.prefix));
        }
        Ok(Name::new(&format!(
            "{}{:0digits$}",
            self.prefix,
            id,
            digits = digits
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{ByteCounter, NameGenerator};
    use crate::error::AfpError;

    #[test]
    fn test_names() {
        let mut gen = NameGenerator::new("PGN");
        assert_eq!(gen.next_name().unwrap().to_string(), "PGN00001");
        assert_eq!(gen.next_name().unwrap().to_string(), "PGN00002");
    }

    #[test]
    fn test_names_run_out() {
        let mut gen = NameGenerator::new("PGN");
        for _ in 1..99999 {
            gen.next_name().unwrap();
        }
        assert_eq!(gen.next_name().unwrap().to_string(), "PGN99999");
        assert!(matches!(
            gen.next_name(),
            Err(AfpError::NamesExhausted("PGN"))
        ));
        assert!(gen.next_name().is_err());
    }

    #[test]
    fn test_byte_counter() {
        let mut out = ByteCounter::new(Vec::new());
        out.write_all(&[1, 2, 3]).unwrap();
        out.write_all(&[4]).unwrap();
        assert_eq!(out.bytes_written(), 4);
        assert_eq!(out.into_inner(), vec![1, 2, 3, 4]);
    }
}
