//! Copy one byte source to many destinations in a single read pass.
//!
//! Commit publishes a staged file under up to one plain name plus one hashed
//! name per algorithm. Writing every copy from the same buffer keeps sibling
//! copies byte-identical and reads the source only once.

use std::io::{self, Read, Write};

/// A writer that forwards every buffer, in full, to each inner writer.
#[derive(Debug)]
pub struct MultiWriter<W> {
    writers: Vec<W>,
}

impl<W: Write> MultiWriter<W> {
    /// Wrap a set of destinations.
    pub fn new(writers: Vec<W>) -> Self {
        Self { writers }
    }

    /// Number of destinations.
    pub fn len(&self) -> usize {
        self.writers.len()
    }

    /// Returns `true` if there are no destinations.
    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Recover the destinations.
    pub fn into_inner(self) -> Vec<W> {
        self.writers
    }
}

impl<W: Write> Write for MultiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // All-or-error per buffer, so no destination ever lags another.
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Copy `reader` to every writer. Returns the number of bytes read.
pub fn fan_out_copy<R, W>(reader: &mut R, writers: Vec<W>) -> io::Result<(u64, Vec<W>)>
where
    R: Read + ?Sized,
    W: Write,
{
    let mut multi = MultiWriter::new(writers);
    let copied = io::copy(reader, &mut multi)?;
    multi.flush()?;
    Ok((copied, multi.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most `limit` bytes, then fails.
    #[derive(Debug)]
    struct FailAfter {
        written: usize,
        limit: usize,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_destination_gets_identical_bytes() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (copied, outputs) =
            fan_out_copy(&mut data.as_slice(), vec![Vec::new(), Vec::new(), Vec::new()])
                .unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(outputs.len(), 3);
        for out in outputs {
            assert_eq!(out, data);
        }
    }

    #[test]
    fn zero_destinations_still_drains_source() {
        let data = b"nobody listens";
        let (copied, outputs) = fan_out_copy(&mut &data[..], Vec::<Vec<u8>>::new()).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert!(outputs.is_empty());
    }

    #[test]
    fn empty_source() {
        let (copied, outputs) = fan_out_copy(&mut io::empty(), vec![Vec::new()]).unwrap();
        assert_eq!(copied, 0);
        assert!(outputs[0].is_empty());
    }

    #[test]
    fn failing_destination_aborts_copy() {
        let data = vec![7u8; 64 * 1024];
        let writers = vec![
            FailAfter { written: 0, limit: usize::MAX },
            FailAfter { written: 0, limit: 10 },
        ];
        let err = fan_out_copy(&mut data.as_slice(), writers).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn multi_writer_len() {
        let multi = MultiWriter::new(vec![Vec::<u8>::new(), Vec::new()]);
        assert_eq!(multi.len(), 2);
        assert!(!multi.is_empty());
        assert!(MultiWriter::<Vec<u8>>::new(Vec::new()).is_empty());
    }
}
