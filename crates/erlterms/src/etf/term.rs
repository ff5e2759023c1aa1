use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use bytes::{BufMut, Bytes};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::*;
use crate::{Encode, Len};

/// A decoded (or to-be-encoded) value.
///
/// Integers that fit in an `i64` are always held as [`Term::Integer`];
/// [`Term::BigInteger`] only carries values outside that range.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Atom(Atom),
    Boolean(bool),
    /// The `undefined` atom, standing in for a missing value.
    Undefined,
    Integer(i64),
    BigInteger(BigInt),
    Float(f64),
    Binary(Bytes),
    List(Vec<Term>),
    Tuple(Tuple),
    ImproperList(ImproperList),
    Opaque(OpaqueObject),
}

impl Term {
    /// The empty list.
    pub fn nil() -> Self {
        Term::List(Vec::new())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::List(v) if v.is_empty())
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Term::Atom(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Term::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn category(&self) -> &'static str {
        match self {
            Term::Atom(_) => "atom",
            Term::Boolean(_) => "boolean",
            Term::Undefined => "undefined",
            Term::Integer(_) | Term::BigInteger(_) => "integer",
            Term::Float(_) => "float",
            Term::Binary(_) => "binary",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
            Term::ImproperList(_) => "improper list",
            Term::Opaque(_) => "opaque object",
        }
    }
}

///
/// 1	2	Len
/// 100	Len	AtomName
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(Vec<u8>);

impl Atom {
    pub const MAX_LEN: usize = 255;

    pub fn new(value: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let value = value.into();
        if value.len() > Self::MAX_LEN {
            return Err(Error::AtomTooLong(value.len()));
        }
        Ok(Atom(value))
    }

    /// For compile-time spellings known to fit.
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(value.len() <= Self::MAX_LEN);
        Atom(value.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Encode for Atom {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), Error> {
        w.put_u8(ATOM_EXT);
        w.put_u16(self.0.len() as u16);
        w.put_slice(&self.0);
        Ok(())
    }
}

impl Len for Atom {
    fn encoded_len(&self) -> usize {
        1 + 2 + self.0.len()
    }
}

impl TryFrom<&str> for Atom {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Atom::new(value)
    }
}

impl AsRef<[u8]> for Atom {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Atom {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<[u8]> for Atom {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<Atom> for &str {
    fn eq(&self, other: &Atom) -> bool {
        self.as_bytes() == other.0
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

///
/// 1	 1	    N
/// 104	 Arity	Elements
///
/// 1	 4	    N
/// 105	 Arity	Elements
///
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tuple(Vec<Term>);

impl Tuple {
    pub fn new(elems: Vec<Term>) -> Self {
        Tuple(elems)
    }

    pub fn elems(&self) -> &[Term] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Term> {
        self.0
    }
}

impl Encode for Tuple {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), Error> {
        match self.0.len() {
            n if n <= u8::MAX as usize => {
                w.put_u8(SMALL_TUPLE_EXT);
                w.put_u8(n as u8);
            }
            n => {
                let arity = u32::try_from(n).map_err(|_| Error::TooLarge("tuple"))?;
                w.put_u8(LARGE_TUPLE_EXT);
                w.put_u32(arity);
            }
        }
        for e in &self.0 {
            e.encode(w)?;
        }

        Ok(())
    }
}

impl Len for Tuple {
    fn encoded_len(&self) -> usize {
        let header = if self.0.len() <= u8::MAX as usize { 2 } else { 5 };
        header + self.0.iter().map(|e| e.encoded_len()).sum::<usize>()
    }
}

impl Deref for Tuple {
    type Target = [Term];

    fn deref(&self) -> &[Term] {
        &self.0
    }
}

impl From<Vec<Term>> for Tuple {
    fn from(value: Vec<Term>) -> Self {
        Tuple(value)
    }
}

impl FromIterator<Term> for Tuple {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Tuple(iter.into_iter().collect())
    }
}

impl PartialEq<[Term]> for Tuple {
    fn eq(&self, other: &[Term]) -> bool {
        self.0 == other
    }
}

impl PartialEq<Vec<Term>> for Tuple {
    fn eq(&self, other: &Vec<Term>) -> bool {
        &self.0 == other
    }
}

///
/// 1	4	    N           1
/// 108	Length	Elements	Tail
///
/// A list whose last cell holds something other than the empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct ImproperList {
    head: Vec<Term>,
    tail: Box<Term>,
}

impl ImproperList {
    pub fn new(head: Vec<Term>, tail: impl Into<Term>) -> Result<Self, Error> {
        let tail = tail.into();
        if matches!(tail, Term::List(_) | Term::ImproperList(_)) {
            return Err(Error::ListTail);
        }
        if head.is_empty() {
            return Err(Error::EmptyHead);
        }
        Ok(ImproperList {
            head,
            tail: Box::new(tail),
        })
    }

    pub fn head(&self) -> &[Term] {
        &self.head
    }

    pub fn tail(&self) -> &Term {
        &self.tail
    }

    pub fn into_parts(self) -> (Vec<Term>, Term) {
        (self.head, *self.tail)
    }
}

impl Encode for ImproperList {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), Error> {
        let length = u32::try_from(self.head.len()).map_err(|_| Error::TooLarge("list"))?;
        w.put_u8(LIST_EXT);
        w.put_u32(length);
        for e in &self.head {
            e.encode(w)?;
        }
        self.tail.encode(w)
    }
}

impl Len for ImproperList {
    fn encoded_len(&self) -> usize {
        let head = self.head.iter().map(|e| e.encoded_len()).sum::<usize>();
        1 + 4 + head + self.tail.encoded_len()
    }
}

impl Deref for ImproperList {
    type Target = [Term];

    fn deref(&self) -> &[Term] {
        &self.head
    }
}

impl PartialEq<[Term]> for ImproperList {
    fn eq(&self, other: &[Term]) -> bool {
        self.head == other
    }
}

impl PartialEq<Vec<Term>> for ImproperList {
    fn eq(&self, other: &Vec<Term>) -> bool {
        &self.head == other
    }
}

///
/// {'$erlport.opaque', Language, Data}
///
/// A payload serialized by another language, carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueObject {
    data: Bytes,
    language: Atom,
}

impl OpaqueObject {
    pub fn new(data: impl Into<Bytes>, language: Atom) -> Self {
        OpaqueObject {
            data: data.into(),
            language,
        }
    }

    /// Serializes `value` with a local native codec so it can cross a peer
    /// that does not understand it.
    pub fn wrap<N: NativeCodec + ?Sized>(codec: &N, value: &Term) -> Result<Self, Error> {
        let data = codec.encode_native(value).map_err(Error::Native)?;
        Ok(OpaqueObject::new(data, codec.language().clone()))
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn language(&self) -> &Atom {
        &self.language
    }

    fn tag() -> Atom {
        Atom(OPAQUE_TAG.to_vec())
    }
}

impl Encode for OpaqueObject {
    fn encode<W: BufMut>(&self, w: &mut W) -> Result<(), Error> {
        let length = u32::try_from(self.data.len()).map_err(|_| Error::TooLarge("binary"))?;
        w.put_u8(SMALL_TUPLE_EXT);
        w.put_u8(3);
        Self::tag().encode(w)?;
        self.language.encode(w)?;
        w.put_u8(BINARY_EXT);
        w.put_u32(length);
        w.put_slice(&self.data);
        Ok(())
    }
}

impl Len for OpaqueObject {
    fn encoded_len(&self) -> usize {
        1 + 1 + (1 + 2 + OPAQUE_TAG.len()) + self.language.encoded_len() + 1 + 4 + self.data.len()
    }
}

macro_rules! impl_from_into_term {
    ($($t:ident),+) => {
        $(
            impl From<$t> for Term {
                fn from(value: $t) -> Self {
                    Term::$t(value)
                }
            }

            impl From<&$t> for Term {
                fn from(value: &$t) -> Self {
                    Term::$t(value.clone())
                }
            }

            impl TryFrom<Term> for $t {
                type Error = Term;

                fn try_from(value: Term) -> Result<Self, Self::Error> {
                    match value {
                        Term::$t(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_from_into_term!(Atom, Tuple, ImproperList);

impl From<OpaqueObject> for Term {
    fn from(value: OpaqueObject) -> Self {
        Term::Opaque(value)
    }
}

impl TryFrom<Term> for OpaqueObject {
    type Error = Term;

    fn try_from(value: Term) -> Result<Self, Self::Error> {
        match value {
            Term::Opaque(v) => Ok(v),
            other => Err(other),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Term {
                fn from(value: $t) -> Self {
                    Term::Integer(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Term {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Term::Integer(v),
            Err(_) => Term::BigInteger(value.into()),
        }
    }
}

impl From<i128> for Term {
    fn from(value: i128) -> Self {
        BigInt::from(value).into()
    }
}

impl From<u128> for Term {
    fn from(value: u128) -> Self {
        BigInt::from(value).into()
    }
}

impl From<BigInt> for Term {
    fn from(value: BigInt) -> Self {
        match value.to_i64() {
            Some(v) => Term::Integer(v),
            None => Term::BigInteger(value),
        }
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::Boolean(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Float(value)
    }
}

impl From<f32> for Term {
    fn from(value: f32) -> Self {
        Term::Float(value as f64)
    }
}

impl From<Bytes> for Term {
    fn from(value: Bytes) -> Self {
        Term::Binary(value)
    }
}

impl From<Vec<u8>> for Term {
    fn from(value: Vec<u8>) -> Self {
        Term::Binary(value.into())
    }
}

impl From<&[u8]> for Term {
    fn from(value: &[u8]) -> Self {
        Term::Binary(Bytes::copy_from_slice(value))
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::Binary(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Term {
    fn from(value: String) -> Self {
        Term::Binary(value.into())
    }
}

impl From<Vec<Term>> for Term {
    fn from(value: Vec<Term>) -> Self {
        Term::List(value)
    }
}
