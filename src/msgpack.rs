//! MessagePack tokenizer.
//!
//! Reads one marker byte at a time from an [`io::Read`] and reports scalars
//! and container boundaries to the [`StructureBuilder`] as they are read.
//! Positions are byte offsets from the start of the stream.

use crate::builder::StructureBuilder;
use crate::decoder::Token;
use crate::{Error, Result, Value};
use std::io::{self, Read};

const MAX_DEPTH: usize = 128;

pub(crate) struct MsgPackTokenizer<R: Read> {
    reader: R,
    offset: usize,
}

impl<R: Read> MsgPackTokenizer<R> {
    pub(crate) fn new(reader: R) -> Self {
        MsgPackTokenizer { reader, offset: 0 }
    }

    /// Reads the next top-level value, or `Ok(None)` when the input ends
    /// cleanly between values.
    pub(crate) fn next_value(&mut self, builder: &mut StructureBuilder) -> Result<Option<Value>> {
        let Some(marker) = self.try_byte()? else {
            return Ok(None);
        };
        let token = self.read_token(marker, builder, 0)?;
        builder.add_value(token).map(Some)
    }

    fn try_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(buf[0]));
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {
                self.offset += N;
                Ok(buf)
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(self.eof()),
            Err(err) => Err(err.into()),
        }
    }

    fn eof(&self) -> Error {
        Error::unexpected_eof(0, self.offset, "a complete MessagePack value")
    }

    fn marker(&mut self) -> Result<u8> {
        self.try_byte()?.ok_or_else(|| self.eof())
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.fill::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        self.fill().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        self.fill().map(u32::from_be_bytes)
    }

    fn u64(&mut self) -> Result<u64> {
        self.fill().map(u64::from_be_bytes)
    }

    fn buf(&mut self, size: usize) -> Result<Vec<u8>> {
        // Grows with the data actually present rather than the declared size.
        let mut data = Vec::new();
        (&mut self.reader).take(size as u64).read_to_end(&mut data)?;
        self.offset += data.len();
        if data.len() < size {
            return Err(self.eof());
        }
        Ok(data)
    }

    fn utf8(&mut self, size: usize) -> Result<Token> {
        let start = self.offset;
        let data = self.buf(size)?;
        String::from_utf8(data)
            .map(Token::Str)
            .map_err(|e| Error::invalid_format(start + e.utf8_error().valid_up_to(), "invalid UTF-8 in string"))
    }

    fn read_token(&mut self, marker: u8, builder: &mut StructureBuilder, depth: usize) -> Result<Token> {
        let at = self.offset - 1;
        match marker {
            // positive fixint
            0x00..=0x7f => Ok(Token::Int(i64::from(marker))),
            0x80..=0x8f => self.read_map(usize::from(marker & 0x0f), builder, depth),
            0x90..=0x9f => self.read_array(usize::from(marker & 0x0f), builder, depth),
            0xa0..=0xbf => self.utf8(usize::from(marker & 0x1f)),
            0xc0 => Ok(Token::Null),
            0xc2 => Ok(Token::Bool(false)),
            0xc3 => Ok(Token::Bool(true)),
            // bin8, bin16, bin32
            0xc4 => {
                let n = self.u8()?;
                self.buf(usize::from(n)).map(Token::Bytes)
            }
            0xc5 => {
                let n = self.u16()?;
                self.buf(usize::from(n)).map(Token::Bytes)
            }
            0xc6 => {
                let n = self.u32()?;
                self.buf(n as usize).map(Token::Bytes)
            }
            0xc7..=0xc9 | 0xd4..=0xd8 => {
                Err(Error::invalid_format(at, "extension types are not supported"))
            }
            // float32, float64
            0xca => Ok(Token::Float(f64::from(f32::from_be_bytes(self.fill()?)))),
            0xcb => Ok(Token::Float(f64::from_be_bytes(self.fill()?))),
            // uint8, uint16, uint32, uint64
            0xcc => Ok(Token::Int(i64::from(self.u8()?))),
            0xcd => Ok(Token::Int(i64::from(self.u16()?))),
            0xce => Ok(Token::Int(i64::from(self.u32()?))),
            0xcf => Ok(Token::UInt(self.u64()?)),
            // int8, int16, int32, int64
            0xd0 => Ok(Token::Int(i64::from(i8::from_be_bytes(self.fill()?)))),
            0xd1 => Ok(Token::Int(i64::from(i16::from_be_bytes(self.fill()?)))),
            0xd2 => Ok(Token::Int(i64::from(i32::from_be_bytes(self.fill()?)))),
            0xd3 => Ok(Token::Int(i64::from_be_bytes(self.fill()?))),
            // str8, str16, str32
            0xd9 => {
                let n = self.u8()?;
                self.utf8(usize::from(n))
            }
            0xda => {
                let n = self.u16()?;
                self.utf8(usize::from(n))
            }
            0xdb => {
                let n = self.u32()?;
                self.utf8(n as usize)
            }
            // array16, array32
            0xdc => {
                let n = self.u16()?;
                self.read_array(usize::from(n), builder, depth)
            }
            0xdd => {
                let n = self.u32()?;
                self.read_array(n as usize, builder, depth)
            }
            // map16, map32
            0xde => {
                let n = self.u16()?;
                self.read_map(usize::from(n), builder, depth)
            }
            0xdf => {
                let n = self.u32()?;
                self.read_map(n as usize, builder, depth)
            }
            // negative fixint
            0xe0..=0xff => Ok(Token::Int(i64::from(marker as i8))),
            0xc1 => Err(Error::invalid_format(at, "reserved marker 0xc1")),
        }
    }

    fn enter(&self, depth: usize) -> Result<usize> {
        if depth >= MAX_DEPTH {
            return Err(Error::invalid_format(self.offset, "recursion limit exceeded"));
        }
        Ok(depth + 1)
    }

    fn read_array(&mut self, size: usize, builder: &mut StructureBuilder, depth: usize) -> Result<Token> {
        let depth = self.enter(depth)?;
        let mut array = builder.array_start(Some(size));
        for _ in 0..size {
            let marker = self.marker()?;
            let token = self.read_token(marker, builder, depth)?;
            builder.array_append(&mut array, token)?;
        }
        builder.array_end(array)
    }

    fn read_map(&mut self, size: usize, builder: &mut StructureBuilder, depth: usize) -> Result<Token> {
        let depth = self.enter(depth)?;
        let mut hash = builder.hash_start(Some(size));
        for _ in 0..size {
            let marker = self.marker()?;
            let key = self.read_token(marker, builder, depth)?;
            builder.hash_key(&mut hash, key)?;
            let marker = self.marker()?;
            let value = self.read_token(marker, builder, depth)?;
            builder.hash_value(&mut hash, value)?;
        }
        builder.hash_end(hash)
    }
}
