pub use bigint::{decode_magnitude, encode_magnitude};
pub use de::{from_term, Deserializer};
pub use decode::{decode, decode_exact, Decoder, DecoderConfig};
pub use encode::{encode, Encoder, EncoderConfig};
pub use error::{Error, ErrorKind};
pub use native::{FnNative, NativeCodec, TermNative};
pub use ser::{to_term, Serializer};
pub use term::{Atom, ImproperList, OpaqueObject, Term, Tuple};

pub mod bigint;
mod de;
pub mod decode;
pub mod encode;
mod error;
pub mod native;
mod ser;
pub mod term;

pub const VERSION: u8 = 131;

pub const COMPRESSED: u8 = 80;
pub const SMALL_INTEGER_EXT: u8 = 97;
pub const INTEGER_EXT: u8 = 98;
// deprecated, decode only
pub const FLOAT_EXT: u8 = 99;
pub const NEW_FLOAT_EXT: u8 = 70;
pub const ATOM_EXT: u8 = 100;
// decode only
pub const SMALL_ATOM_EXT: u8 = 115;
pub const ATOM_UTF8_EXT: u8 = 118;
pub const SMALL_ATOM_UTF8_EXT: u8 = 119;
pub const SMALL_TUPLE_EXT: u8 = 104;
pub const LARGE_TUPLE_EXT: u8 = 105;
pub const NIL_EXT: u8 = 106;
pub const STRING_EXT: u8 = 107;
pub const LIST_EXT: u8 = 108;
pub const BINARY_EXT: u8 = 109;
pub const SMALL_BIG_EXT: u8 = 110;
pub const LARGE_BIG_EXT: u8 = 111;

/// First element of the 3-tuple that carries an [`OpaqueObject`] over the wire.
pub const OPAQUE_TAG: &[u8] = b"$erlport.opaque";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl From<u8> for Sign {
    fn from(value: u8) -> Self {
        match value {
            0 => Sign::Positive,
            _ => Sign::Negative,
        }
    }
}

impl From<Sign> for u8 {
    fn from(value: Sign) -> Self {
        match value {
            Sign::Positive => 0,
            Sign::Negative => 1,
        }
    }
}

impl From<Sign> for num_bigint::Sign {
    fn from(value: Sign) -> Self {
        match value {
            Sign::Positive => Self::Plus,
            Sign::Negative => Self::Minus,
        }
    }
}
