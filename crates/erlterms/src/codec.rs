//! Adapter for reading and writing terms through `tokio_util` framing.

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::etf::{Decoder, Encoder, Error, Term};
use crate::Len;

/// Splits a byte stream into consecutive terms, and writes terms back.
///
/// A term that has not fully arrived yet is left in the buffer until more
/// bytes show up; any other decoding failure ends the stream.
#[derive(Debug, Clone, Default)]
pub struct TermCodec {
    decoder: Decoder,
    encoder: Encoder,
}

impl TermCodec {
    pub fn new(decoder: Decoder, encoder: Encoder) -> Self {
        TermCodec { decoder, encoder }
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }
}

impl tokio_util::codec::Decoder for TermCodec {
    type Item = Term;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Term>, Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let (term, used) = match self.decoder.decode(src) {
            Ok((term, rest)) => (term, src.len() - rest.len()),
            Err(e) if e.is_incomplete() => {
                trace!(buffered = src.len(), "{e}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        src.advance(used);
        trace!(used, remaining = src.len(), "decoded term");
        Ok(Some(term))
    }
}

impl tokio_util::codec::Encoder<Term> for TermCodec {
    type Error = Error;

    fn encode(&mut self, item: Term, dst: &mut BytesMut) -> Result<(), Error> {
        dst.reserve(1 + item.encoded_len());
        self.encoder.encode_to(&item, dst)
    }
}

#[cfg(test)]
mod test {
    use futures::{SinkExt, StreamExt};
    use tokio_util::codec::{Decoder as _, Encoder as _, FramedRead, FramedWrite};

    use super::*;
    use crate::etf::{encode, Atom, EncoderConfig, ErrorKind, Tuple};

    fn terms() -> Vec<Term> {
        vec![
            Term::Atom(Atom::new("hello").unwrap()),
            Term::Tuple(Tuple::new(vec![Term::Integer(1), Term::from("two")])),
            Term::List((0..300).map(Term::from).collect()),
            Term::Float(-0.25),
        ]
    }

    #[test]
    fn decode_byte_by_byte() {
        let mut stream = Vec::new();
        for t in terms() {
            stream.extend(encode(&t).unwrap());
        }

        let mut codec = TermCodec::default();
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();
        for b in stream {
            buf.extend_from_slice(&[b]);
            while let Some(term) = codec.decode(&mut buf).unwrap() {
                decoded.push(term);
            }
        }
        assert_eq!(decoded, terms());
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_error_is_reported() {
        let mut codec = TermCodec::default();
        let mut buf = BytesMut::from(&b"\x84j"[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::BadVersion(132)));
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn encode_appends() {
        let mut codec = TermCodec::default();
        let mut buf = BytesMut::from(&b"prefix"[..]);
        codec.encode(Term::nil(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"prefix\x83j");
    }

    #[tokio::test]
    async fn framed_round_trip() {
        let codec = TermCodec::new(
            Decoder::new(),
            Encoder::with_config(EncoderConfig {
                compression: Some(9),
            }),
        );

        let mut writer = FramedWrite::new(Vec::new(), codec.clone());
        for t in terms() {
            writer.send(t).await.unwrap();
        }
        let written = writer.into_inner();

        let reader = FramedRead::new(&written[..], codec);
        let decoded: Vec<Term> = reader.map(|r| r.unwrap()).collect().await;
        assert_eq!(decoded, terms());
    }

    #[tokio::test]
    async fn framed_truncated_stream() {
        let buf = encode(&Term::from("truncated")).unwrap();
        let mut reader = FramedRead::new(&buf[..buf.len() - 1], TermCodec::default());
        // leftover bytes at end of stream surface as an io error
        assert!(matches!(reader.next().await, Some(Err(Error::Io(_)))));
    }
}
