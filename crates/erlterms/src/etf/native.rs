//! Local-language objects tunneled through opaque payloads.
//!
//! When the decoder meets `{'$erlport.opaque', Language, Data}` and `Language`
//! is the language of its [`NativeCodec`], `Data` is handed to the codec and
//! its result replaces the tuple. Any other language yields an
//! [`OpaqueObject`](super::OpaqueObject).

use bytes::Bytes;

use super::{decode_exact, encode, Atom, Term};

pub trait NativeCodec: Send + Sync {
    /// Language tag this codec owns.
    fn language(&self) -> &Atom;

    fn decode_native(&self, data: &[u8]) -> anyhow::Result<Term>;

    fn encode_native(&self, value: &Term) -> anyhow::Result<Bytes>;
}

/// A [`NativeCodec`] assembled from two closures.
pub struct FnNative<D, E> {
    language: Atom,
    decode: D,
    encode: E,
}

impl<D, E> FnNative<D, E>
where
    D: Fn(&[u8]) -> anyhow::Result<Term> + Send + Sync,
    E: Fn(&Term) -> anyhow::Result<Bytes> + Send + Sync,
{
    pub fn new(language: Atom, decode: D, encode: E) -> Self {
        FnNative {
            language,
            decode,
            encode,
        }
    }
}

impl<D, E> NativeCodec for FnNative<D, E>
where
    D: Fn(&[u8]) -> anyhow::Result<Term> + Send + Sync,
    E: Fn(&Term) -> anyhow::Result<Bytes> + Send + Sync,
{
    fn language(&self) -> &Atom {
        &self.language
    }

    fn decode_native(&self, data: &[u8]) -> anyhow::Result<Term> {
        (self.decode)(data)
    }

    fn encode_native(&self, value: &Term) -> anyhow::Result<Bytes> {
        (self.encode)(value)
    }
}

/// The `rust` language codec. Payloads are terms in this crate's own
/// external format, version byte included.
#[derive(Debug, Clone)]
pub struct TermNative {
    language: Atom,
}

impl TermNative {
    pub const LANGUAGE: &'static str = "rust";

    pub fn new() -> Self {
        TermNative {
            language: Atom::from_static(Self::LANGUAGE),
        }
    }
}

impl Default for TermNative {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeCodec for TermNative {
    fn language(&self) -> &Atom {
        &self.language
    }

    fn decode_native(&self, data: &[u8]) -> anyhow::Result<Term> {
        Ok(decode_exact(data)?)
    }

    fn encode_native(&self, value: &Term) -> anyhow::Result<Bytes> {
        Ok(encode(value)?.into())
    }
}
