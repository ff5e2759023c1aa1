use std::fmt;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use flate2::{Decompress, FlushDecompress, Status};
use serde_derive::Deserialize;
use tracing::{debug, trace};

use super::*;

const INFLATE_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Deepest tuple/list nesting accepted before decoding fails.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig { max_depth: 256 }
    }
}

/// Turns external-format bytes into [`Term`]s.
///
/// A decoder is immutable once built and can be shared between threads.
#[derive(Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
    native: Option<Arc<dyn NativeCodec>>,
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("config", &self.config)
            .field("native", &self.native.as_ref().map(|n| n.language()))
            .finish()
    }
}

/// Decodes one term with the default [`Decoder`], returning it together with
/// the bytes that follow it.
pub fn decode(buf: &[u8]) -> Result<(Term, &[u8]), Error> {
    Decoder::new().decode(buf)
}

/// Decodes one term with the default [`Decoder`] and rejects leftover bytes.
pub fn decode_exact(buf: &[u8]) -> Result<Term, Error> {
    Decoder::new().decode_exact(buf)
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Decoder {
            config,
            native: None,
        }
    }

    /// Resolves opaque objects tagged with `codec`'s language through `codec`.
    pub fn with_native(mut self, codec: impl NativeCodec + 'static) -> Self {
        self.native = Some(Arc::new(codec));
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes the term at the start of `buf`.
    ///
    /// A buffer that stops short of a complete term fails with
    /// [`ErrorKind::IncompleteData`]; the same call can be retried once more
    /// bytes are available.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> Result<(Term, &'a [u8]), Error> {
        let (&version, rest) = buf
            .split_first()
            .ok_or_else(|| Error::incomplete("version"))?;
        if version != VERSION {
            return Err(Error::BadVersion(version));
        }

        match rest.first() {
            None => Err(Error::incomplete("tag")),
            Some(&COMPRESSED) => self.compressed(&rest[1..]),
            Some(_) => self.term(rest, 0),
        }
    }

    pub fn decode_exact(&self, buf: &[u8]) -> Result<Term, Error> {
        let (term, tail) = self.decode(buf)?;
        if !tail.is_empty() {
            return Err(Error::TrailingBytes(tail.len()));
        }
        Ok(term)
    }

    // only containers recurse, scalars are decoded out of line
    fn term<'a>(&self, buf: &'a [u8], depth: usize) -> Result<(Term, &'a [u8]), Error> {
        let (&tag, mut buf) = buf
            .split_first()
            .ok_or_else(|| Error::incomplete("tag"))?;

        match tag {
            SMALL_TUPLE_EXT => {
                need(buf, 1, "tuple arity")?;
                let arity = buf.get_u8() as usize;
                self.tuple(buf, arity, depth)
            }
            LARGE_TUPLE_EXT => {
                need(buf, 4, "tuple arity")?;
                let arity = buf.get_u32() as usize;
                self.tuple(buf, arity, depth)
            }
            LIST_EXT => {
                need(buf, 4, "list length")?;
                let length = buf.get_u32() as usize;
                self.list(buf, length, depth)
            }
            _ => scalar(tag, buf),
        }
    }

    fn tuple<'a>(
        &self,
        mut buf: &'a [u8],
        arity: usize,
        depth: usize,
    ) -> Result<(Term, &'a [u8]), Error> {
        let depth = self.enter(depth)?;
        // every element takes at least one byte
        let mut elems = Vec::with_capacity(arity.min(buf.len()));
        for _ in 0..arity {
            let (term, rest) = self.term(buf, depth)?;
            elems.push(term);
            buf = rest;
        }

        Ok((self.opaque(elems)?, buf))
    }

    fn list<'a>(
        &self,
        mut buf: &'a [u8],
        length: usize,
        depth: usize,
    ) -> Result<(Term, &'a [u8]), Error> {
        let depth = self.enter(depth)?;
        let mut elems = Vec::with_capacity(length.min(buf.len()));
        for _ in 0..length {
            let (term, rest) = self.term(buf, depth)?;
            elems.push(term);
            buf = rest;
        }

        let (tail, buf) = self.term(buf, depth)?;
        if tail.is_nil() {
            return Ok((Term::List(elems), buf));
        }
        Ok((Term::ImproperList(ImproperList::new(elems, tail)?), buf))
    }

    fn enter(&self, depth: usize) -> Result<usize, Error> {
        if depth >= self.config.max_depth {
            debug!(max_depth = self.config.max_depth, "term nesting limit reached");
            return Err(Error::DepthExceeded(self.config.max_depth));
        }
        Ok(depth + 1)
    }

    /// Replaces `{'$erlport.opaque', Language, Data}` with the object it carries.
    #[inline(never)]
    fn opaque(&self, elems: Vec<Term>) -> Result<Term, Error> {
        match elems.as_slice() {
            [Term::Atom(tag), language, data] if tag == OPAQUE_TAG => {
                // the language atom may have been read as a predefined value
                let language = match language {
                    Term::Atom(v) => v.clone(),
                    Term::Boolean(true) => Atom::from_static("true"),
                    Term::Boolean(false) => Atom::from_static("false"),
                    Term::Undefined => Atom::from_static("undefined"),
                    _ => return Err(Error::InvalidOpaque("language must be an atom")),
                };
                let Term::Binary(data) = data else {
                    return Err(Error::InvalidOpaque("payload must be a binary"));
                };

                match &self.native {
                    Some(native) if native.language() == &language => {
                        trace!(%language, size = data.len(), "decoding native opaque object");
                        native.decode_native(data).map_err(Error::Native)
                    }
                    _ => {
                        trace!(%language, size = data.len(), "keeping foreign opaque object");
                        Ok(Term::Opaque(OpaqueObject::new(data.clone(), language)))
                    }
                }
            }
            _ => Ok(Term::Tuple(Tuple::new(elems))),
        }
    }

    ///
    /// 1	4	                N
    /// 80	UncompressedSize	Zlib-compressedData
    ///
    fn compressed<'a>(&self, mut buf: &'a [u8]) -> Result<(Term, &'a [u8]), Error> {
        need(buf, 4, "compressed size")?;
        let size = buf.get_u32() as usize;
        let (data, consumed) = inflate(buf, size)?;
        debug!(size, consumed, "inflated compressed term");

        let term = match self.term(&data, 0) {
            Ok((term, rest)) if rest.is_empty() => term,
            Ok((_, rest)) => {
                return Err(Error::Compressed(format!(
                    "{} bytes left after term",
                    rest.len()
                )))
            }
            Err(e) if e.is_incomplete() => {
                return Err(Error::Compressed("truncated term".to_string()))
            }
            Err(e) => return Err(e),
        };

        Ok((term, &buf[consumed..]))
    }
}

#[inline(never)]
fn scalar(tag: u8, mut buf: &[u8]) -> Result<(Term, &[u8]), Error> {
    let term = match tag {
        ATOM_EXT | ATOM_UTF8_EXT => {
            need(buf, 2, "atom length")?;
            let n = buf.get_u16() as usize;
            atom(take(&mut buf, n, "atom")?)?
        }
        SMALL_ATOM_EXT | SMALL_ATOM_UTF8_EXT => {
            need(buf, 1, "atom length")?;
            let n = buf.get_u8() as usize;
            atom(take(&mut buf, n, "atom")?)?
        }
        NIL_EXT => Term::nil(),
        STRING_EXT => {
            need(buf, 2, "string length")?;
            let n = buf.get_u16() as usize;
            let chars = take(&mut buf, n, "string")?;
            Term::List(chars.iter().map(|&c| Term::Integer(c as i64)).collect())
        }
        SMALL_INTEGER_EXT => {
            need(buf, 1, "small integer")?;
            Term::Integer(buf.get_u8() as i64)
        }
        INTEGER_EXT => {
            need(buf, 4, "integer")?;
            Term::Integer(buf.get_i32() as i64)
        }
        NEW_FLOAT_EXT => {
            need(buf, 8, "float")?;
            Term::Float(buf.get_f64())
        }
        FLOAT_EXT => Term::Float(legacy_float(take(&mut buf, 31, "float")?)?),
        BINARY_EXT => {
            need(buf, 4, "binary length")?;
            let n = buf.get_u32() as usize;
            Term::Binary(Bytes::copy_from_slice(take(&mut buf, n, "binary")?))
        }
        SMALL_BIG_EXT => {
            need(buf, 2, "big integer header")?;
            let n = buf.get_u8() as usize;
            let sign = buf.get_u8();
            Term::from(decode_magnitude(sign, take(&mut buf, n, "big integer")?))
        }
        LARGE_BIG_EXT => {
            need(buf, 5, "big integer header")?;
            let n = buf.get_u32() as usize;
            let sign = buf.get_u8();
            Term::from(decode_magnitude(sign, take(&mut buf, n, "big integer")?))
        }
        _ => return Err(Error::UnknownTag(tag)),
    };

    Ok((term, buf))
}

fn need(buf: &[u8], n: usize, needed: &'static str) -> Result<(), Error> {
    if buf.remaining() < n {
        return Err(Error::incomplete(needed));
    }
    Ok(())
}

fn take<'a>(buf: &mut &'a [u8], n: usize, needed: &'static str) -> Result<&'a [u8], Error> {
    need(buf, n, needed)?;
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

fn atom(name: &[u8]) -> Result<Term, Error> {
    Ok(match name {
        b"true" => Term::Boolean(true),
        b"false" => Term::Boolean(false),
        b"undefined" => Term::Undefined,
        _ => Term::Atom(Atom::new(name)?),
    })
}

/// Old-style float: a NUL padded `"%.20e"` string.
fn legacy_float(chars: &[u8]) -> Result<f64, Error> {
    let end = chars.iter().position(|&c| c == 0).unwrap_or(chars.len());
    std::str::from_utf8(&chars[..end])
        .ok()
        .map(str::trim)
        .filter(|s| {
            !s.is_empty()
                && s.bytes()
                    .all(|c| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.' | b'e' | b'E'))
        })
        .and_then(|s| s.parse().ok())
        .ok_or(Error::InvalidFloat)
}

/// Inflates a zlib stream that must produce exactly `size` bytes. Returns the
/// inflated data and the number of input bytes the stream occupied.
fn inflate(input: &[u8], size: usize) -> Result<(Vec<u8>, usize), Error> {
    // one spare byte so that overshooting `size` is observable
    let limit = size.saturating_add(1);
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(limit.min(INFLATE_CHUNK));

    loop {
        if out.len() == out.capacity() {
            out.reserve((limit - out.len()).min(INFLATE_CHUNK));
        }

        let (total_in, total_out) = (inflater.total_in(), inflater.total_out());
        let status = inflater
            .decompress_vec(&input[total_in as usize..], &mut out, FlushDecompress::None)
            .map_err(|e| Error::Compressed(e.to_string()))?;
        if out.len() > size {
            return Err(Error::Compressed(format!(
                "inflated data exceeds declared size {size}"
            )));
        }
        if status == Status::StreamEnd {
            break;
        }
        if inflater.total_in() == total_in && inflater.total_out() == total_out {
            return Err(Error::incomplete("compressed data"));
        }
    }

    if out.len() != size {
        return Err(Error::Compressed(format!(
            "declared {size} bytes, inflated {}",
            out.len()
        )));
    }

    Ok((out, inflater.total_in() as usize))
}
