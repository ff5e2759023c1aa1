pub mod codec;
pub use codec::TermCodec;

pub mod etf;
pub use etf::*;

use bytes::BufMut;

/// Writes a value in the external term format, without the leading version byte.
pub trait Encode {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), Error>;
}

/// Number of bytes [`Encode::encode`] writes for a value.
pub trait Len {
    fn encoded_len(&self) -> usize;
}
