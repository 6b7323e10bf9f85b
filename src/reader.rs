//! The reading facade.
//!
//! A [`Reader`] owns one input source, one tokenizer for the chosen
//! [`Format`] and the per-stream decoding state. It yields the stream's
//! top-level values one at a time, in input order.

use crate::builder::StructureBuilder;
use crate::json::JsonTokenizer;
use crate::msgpack::MsgPackTokenizer;
use crate::{Decoder, Error, Format, ReaderOptions, Result, Value};
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, trace};

enum Tokenizer<R: Read> {
    Json(JsonTokenizer<R>),
    MsgPack(MsgPackTokenizer<R>),
}

/// Reads Transit values from an [`io::Read`](std::io::Read) source.
///
/// The rolling cache is shared by every top-level value of the stream, so
/// values must be read in order from a single reader. After any error the
/// reader is finished: its cache is dropped and it produces no more values.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{Format, Reader, Value};
///
/// let input = br#"1 "a" true"#;
/// let values: Vec<Value> = Reader::new(Format::Json, &input[..])
///     .into_values()
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(values, vec![Value::from(1), Value::from("a"), Value::Bool(true)]);
/// ```
pub struct Reader<R: Read> {
    format: Format,
    tokenizer: Tokenizer<R>,
    builder: StructureBuilder,
    finished: bool,
}

impl<R: Read> Reader<R> {
    /// Creates a reader with the built-in handlers.
    pub fn new(format: Format, reader: R) -> Self {
        Self::with_options(format, reader, ReaderOptions::default())
    }

    pub fn with_options(format: Format, reader: R, options: ReaderOptions) -> Self {
        debug!(%format, "opening transit reader");
        let tokenizer = match format {
            Format::Json | Format::JsonVerbose => Tokenizer::Json(JsonTokenizer::new(reader)),
            Format::MsgPack => Tokenizer::MsgPack(MsgPackTokenizer::new(reader)),
        };
        let handlers = Arc::clone(options.handlers());
        Reader {
            format,
            tokenizer,
            builder: StructureBuilder::new(Decoder::new(handlers)),
            finished: false,
        }
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Reads the next top-level value.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnexpectedEof`] when the input holds no further
    /// value, or with whatever error decoding that value produced.
    pub fn read(&mut self) -> Result<Value> {
        self.next_value()?
            .ok_or_else(|| Error::unexpected_eof(0, 0, "a top-level value"))
    }

    /// Reads the next top-level value, or `Ok(None)` once the input is
    /// exhausted (or the reader has failed before).
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        if self.finished {
            return Ok(None);
        }
        let result = match &mut self.tokenizer {
            Tokenizer::Json(tokenizer) => tokenizer.next_value(&mut self.builder),
            Tokenizer::MsgPack(tokenizer) => tokenizer.next_value(&mut self.builder),
        };
        match result {
            Ok(Some(value)) => {
                trace!(kind = value.kind(), "decoded top-level value");
                Ok(Some(value))
            }
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(err) => {
                debug!(format = %self.format, error = %err, "transit reader failed");
                self.finished = true;
                self.builder.reset();
                Err(err)
            }
        }
    }

    /// Calls `f` with every remaining top-level value, in order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::{Format, Reader};
    ///
    /// let mut seen = Vec::new();
    /// Reader::new(Format::Json, &b"1 2 3"[..])
    ///     .for_each(|value| seen.push(value.as_i64().unwrap_or(0)))
    ///     .unwrap();
    /// assert_eq!(seen, vec![1, 2, 3]);
    /// ```
    pub fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Value),
    {
        while let Some(value) = self.next_value()? {
            f(value);
        }
        Ok(())
    }

    /// Turns the reader into a lazy iterator over its values.
    pub fn into_values(self) -> Values<R> {
        Values { reader: self }
    }
}

impl<R: Read> fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("format", &self.format)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`Reader::into_values`].
///
/// Yields at most one error, after which it is exhausted.
pub struct Values<R: Read> {
    reader: Reader<R>,
}

impl<R: Read> Iterator for Values<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_value().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for Values<R> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_empty_input_is_eof() {
        let mut reader = Reader::new(Format::Json, &b"   "[..]);
        assert!(matches!(reader.read(), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_next_value_after_end() {
        let mut reader = Reader::new(Format::Json, &b"1"[..]);
        assert_eq!(reader.next_value().unwrap(), Some(Value::from(1)));
        assert_eq!(reader.next_value().unwrap(), None);
        assert_eq!(reader.next_value().unwrap(), None);
    }

    #[test]
    fn test_reader_is_finished_after_error() {
        let mut reader = Reader::new(Format::Json, &br#"1 ["^3"] 2"#[..]);
        assert_eq!(reader.read().unwrap(), Value::from(1));
        assert!(reader.read().is_err());
        assert_eq!(reader.next_value().unwrap(), None);
    }

    #[test]
    fn test_values_iterator_is_fused() {
        let values: Vec<Result<Value>> = Reader::new(Format::Json, &b"1 ] 2"[..])
            .into_values()
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].is_ok());
        assert!(values[1].is_err());
    }

    #[test]
    fn test_msgpack_reader() {
        let mut reader = Reader::new(Format::MsgPack, &[0x92, 0x01, 0xc2][..]);
        assert_eq!(
            reader.read().unwrap(),
            Value::Array(vec![Value::from(1), Value::Bool(false)])
        );
        assert_eq!(reader.format(), Format::MsgPack);
    }

    #[test]
    fn test_verbose_json_reads_plain_maps() {
        let mut reader = Reader::new(Format::JsonVerbose, &br#"{"~:a":{"~#set":[1]}}"#[..]);
        let value = reader.read().unwrap();
        let map = value.as_map().unwrap();
        let inner = map.get(&Value::Keyword("a".into())).unwrap();
        assert_eq!(inner.as_set().map(|s| s.len()), Some(1));
    }
}
