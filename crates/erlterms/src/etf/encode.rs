use std::io::Write;

use bytes::BufMut;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde_derive::Deserialize;
use tracing::debug;

use super::*;
use crate::{Encode, Len};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// zlib level (1-9) for compressed output; `None` or `Some(0)` never compresses.
    pub compression: Option<u32>,
}

/// Turns [`Term`]s into external-format bytes.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

/// Encodes `term` with the default [`Encoder`].
pub fn encode(term: &Term) -> Result<Vec<u8>, Error> {
    Encoder::new().encode(term)
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        Encoder { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encode(&self, term: &Term) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::with_capacity(1 + term.encoded_len());
        self.encode_to(term, &mut buf)?;
        Ok(buf)
    }

    /// Appends the version byte and `term` to `w`.
    pub fn encode_to<W: BufMut>(&self, term: &Term, w: &mut W) -> Result<(), Error> {
        let level = match self.config.compression {
            Some(level) if level > 0 => level.min(9),
            _ => {
                w.put_u8(VERSION);
                return term.encode(w);
            }
        };

        let mut body = Vec::with_capacity(term.encoded_len());
        term.encode(&mut body)?;
        let size = u32::try_from(body.len()).map_err(|_| Error::TooLarge("term"))?;

        let mut z = ZlibEncoder::new(Vec::new(), Compression::new(level));
        z.write_all(&body)?;
        let data = z.finish()?;

        w.put_u8(VERSION);
        if data.len() + 5 <= body.len() {
            debug!(size, compressed = data.len(), "writing compressed term");
            w.put_u8(COMPRESSED);
            w.put_u32(size);
            w.put_slice(&data);
        } else {
            w.put_slice(&body);
        }

        Ok(())
    }
}

impl Encode for Term {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), Error> {
        match self {
            Term::Atom(v) => v.encode(w),
            Term::Boolean(true) => predefined(b"true", w),
            Term::Boolean(false) => predefined(b"false", w),
            Term::Undefined => predefined(b"undefined", w),
            Term::Integer(v) => integer(*v, w),
            Term::BigInteger(v) => match v.to_i64() {
                Some(v) => integer(v, w),
                None => big(v, w),
            },
            Term::Float(v) => {
                w.put_u8(NEW_FLOAT_EXT);
                w.put_f64(*v);
                Ok(())
            }
            Term::Binary(v) => {
                let length = u32::try_from(v.len()).map_err(|_| Error::TooLarge("binary"))?;
                w.put_u8(BINARY_EXT);
                w.put_u32(length);
                w.put_slice(v);
                Ok(())
            }
            Term::List(v) if v.is_empty() => {
                w.put_u8(NIL_EXT);
                Ok(())
            }
            Term::List(v) => {
                let length = u32::try_from(v.len()).map_err(|_| Error::TooLarge("list"))?;
                w.put_u8(LIST_EXT);
                w.put_u32(length);
                for e in v {
                    e.encode(w)?;
                }
                w.put_u8(NIL_EXT);
                Ok(())
            }
            Term::Tuple(v) => v.encode(w),
            Term::ImproperList(v) => v.encode(w),
            Term::Opaque(v) => v.encode(w),
        }
    }
}

impl Len for Term {
    fn encoded_len(&self) -> usize {
        match self {
            Term::Atom(v) => v.encoded_len(),
            Term::Boolean(true) => 1 + 2 + 4,
            Term::Boolean(false) => 1 + 2 + 5,
            Term::Undefined => 1 + 2 + 9,
            Term::Integer(v) => integer_len(*v),
            Term::BigInteger(v) => match v.to_i64() {
                Some(v) => integer_len(v),
                None => big_len((v.bits() as usize + 7) / 8),
            },
            Term::Float(_) => 1 + 8,
            Term::Binary(v) => 1 + 4 + v.len(),
            Term::List(v) if v.is_empty() => 1,
            Term::List(v) => 1 + 4 + v.iter().map(|e| e.encoded_len()).sum::<usize>() + 1,
            Term::Tuple(v) => v.encoded_len(),
            Term::ImproperList(v) => v.encoded_len(),
            Term::Opaque(v) => v.encoded_len(),
        }
    }
}

fn predefined<W: BufMut>(name: &'static [u8], w: &mut W) -> Result<(), Error> {
    w.put_u8(ATOM_EXT);
    w.put_u16(name.len() as u16);
    w.put_slice(name);
    Ok(())
}

fn integer<W: BufMut>(v: i64, w: &mut W) -> Result<(), Error> {
    match v {
        0..=255 => {
            w.put_u8(SMALL_INTEGER_EXT);
            w.put_u8(v as u8);
        }
        v if i32::try_from(v).is_ok() => {
            w.put_u8(INTEGER_EXT);
            w.put_i32(v as i32);
        }
        v => return big(&BigInt::from(v), w),
    }
    Ok(())
}

///
/// 1	1	1	    n
/// 110	n	Sign	d(0) ... d(n-1)
///
/// 1	4	1	    n
/// 111	n	Sign	d(0) ... d(n-1)
///
fn big<W: BufMut>(n: &BigInt, w: &mut W) -> Result<(), Error> {
    let (sign, magnitude) = encode_magnitude(n);
    match magnitude.len() {
        len if len <= u8::MAX as usize => {
            w.put_u8(SMALL_BIG_EXT);
            w.put_u8(len as u8);
        }
        len => {
            let len = u32::try_from(len).map_err(|_| Error::TooLarge("integer"))?;
            w.put_u8(LARGE_BIG_EXT);
            w.put_u32(len);
        }
    }
    w.put_u8(sign);
    w.put_slice(&magnitude);
    Ok(())
}

fn integer_len(v: i64) -> usize {
    match v {
        0..=255 => 2,
        v if i32::try_from(v).is_ok() => 5,
        v => {
            let magnitude = v.unsigned_abs();
            big_len((64 - magnitude.leading_zeros() as usize + 7) / 8)
        }
    }
}

fn big_len(magnitude: usize) -> usize {
    let header = if magnitude <= u8::MAX as usize { 3 } else { 6 };
    header + magnitude
}
