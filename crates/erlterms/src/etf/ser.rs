use bytes::Bytes;
use serde::{ser, Serialize};

use super::{error::Error, term::*};

/// Builds a [`Term`] out of any `Serialize` value.
pub struct Serializer;

/// Converts `value` into a term.
///
/// Sequences become lists, tuples become tuples, maps and structs become
/// property lists of `{Key, Value}` pairs, and enum variants carrying data
/// become `{Variant, Value}` pairs.
pub fn to_term<T>(value: &T) -> Result<Term, Error>
where
    T: Serialize + ?Sized,
{
    let mut serializer = Serializer;
    value.serialize(&mut serializer)
}

fn variant_atom(variant: &'static str) -> Result<Term, Error> {
    Ok(Term::Atom(Atom::new(variant)?))
}

fn pair(key: Term, value: Term) -> Term {
    Term::Tuple(Tuple::new(vec![key, value]))
}

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = Term;

    type Error = Error;

    type SerializeSeq = SerializeSeq<'a>;

    type SerializeTuple = SerializeSeq<'a>;

    type SerializeTupleStruct = SerializeSeq<'a>;

    type SerializeTupleVariant = SerializeSeq<'a>;

    type SerializeMap = SerializeMap<'a>;

    type SerializeStruct = SerializeMap<'a>;

    type SerializeStructVariant = SerializeMap<'a>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Term::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Term::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        let mut buf = [0; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Term::from(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Ok(Term::Binary(Bytes::copy_from_slice(v)))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Term::Undefined)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        self.serialize_none()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        variant_atom(variant)
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        let value = value.serialize(self)?;
        Ok(pair(variant_atom(variant)?, value))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        let elems = len.map(Vec::with_capacity).unwrap_or_default();
        Ok(SerializeSeq {
            ser: self,
            elems,
            name: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Ok(SerializeSeq {
            ser: self,
            elems: Vec::with_capacity(len),
            name: None,
        })
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Ok(SerializeSeq {
            ser: self,
            elems: Vec::with_capacity(len),
            name: Some(variant),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        let pairs = len.map(Vec::with_capacity).unwrap_or_default();
        Ok(SerializeMap {
            ser: self,
            pairs,
            key: None,
            name: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(SerializeMap {
            ser: self,
            pairs: Vec::with_capacity(len),
            key: None,
            name: Some(variant),
        })
    }
}

pub struct SerializeSeq<'a> {
    ser: &'a mut Serializer,
    // only set for tuple variants
    name: Option<&'static str>,
    elems: Vec<Term>,
}

impl SerializeSeq<'_> {
    fn push<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        let v = value.serialize(&mut *self.ser)?;
        self.elems.push(v);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeSeq<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Term::List(self.elems))
    }
}

impl ser::SerializeTuple for SerializeSeq<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Term::Tuple(Tuple::new(self.elems)))
    }
}

impl ser::SerializeTupleStruct for SerializeSeq<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Term::Tuple(Tuple::new(self.elems)))
    }
}

impl ser::SerializeTupleVariant for SerializeSeq<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    // {Variant, {Elems...}}
    fn end(self) -> Result<Self::Ok, Self::Error> {
        let name = self.name.ok_or(Error::Unsupported("unnamed tuple variant"))?;
        Ok(pair(variant_atom(name)?, Term::Tuple(Tuple::new(self.elems))))
    }
}

pub struct SerializeMap<'a> {
    ser: &'a mut Serializer,
    // only set for struct variants
    name: Option<&'static str>,
    key: Option<Term>,
    pairs: Vec<Term>,
}

impl SerializeMap<'_> {
    fn field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        let v = value.serialize(&mut *self.ser)?;
        self.pairs.push(pair(Term::Atom(Atom::new(key)?), v));
        Ok(())
    }
}

impl ser::SerializeMap for SerializeMap<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(key.serialize(&mut *self.ser)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        let k = self
            .key
            .take()
            .ok_or_else(|| Error::Message("map value without a key".to_string()))?;
        let v = value.serialize(&mut *self.ser)?;
        self.pairs.push(pair(k, v));
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Term::List(self.pairs))
    }
}

impl ser::SerializeStruct for SerializeMap<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Term::List(self.pairs))
    }
}

impl ser::SerializeStructVariant for SerializeMap<'_> {
    type Ok = Term;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    // {Variant, [{Key, Value}...]}
    fn end(self) -> Result<Self::Ok, Self::Error> {
        let name = self.name.ok_or(Error::Unsupported("unnamed struct variant"))?;
        Ok(pair(variant_atom(name)?, Term::List(self.pairs)))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use serde_derive::Serialize;

    use super::*;
    use crate::etf::encode;

    fn atom(name: &str) -> Term {
        Term::Atom(Atom::new(name).unwrap())
    }

    fn tuple(elems: Vec<Term>) -> Term {
        Term::Tuple(Tuple::new(elems))
    }

    #[test]
    fn ser_primitives() {
        assert_eq!(to_term(&true).unwrap(), Term::Boolean(true));
        assert_eq!(to_term(&-3i8).unwrap(), Term::Integer(-3));
        assert_eq!(to_term(&u64::MAX).unwrap(), Term::from(u64::MAX));
        assert_eq!(to_term(&1.5f32).unwrap(), Term::Float(1.5));
        assert_eq!(to_term("text").unwrap(), Term::from("text"));
        assert_eq!(to_term(&'é').unwrap(), Term::from("é"));
        assert_eq!(to_term(&()).unwrap(), Term::Undefined);
        assert_eq!(to_term(&None::<u8>).unwrap(), Term::Undefined);
        assert_eq!(to_term(&Some(7u8)).unwrap(), Term::Integer(7));
        assert_eq!(
            to_term(serde_bytes::Bytes::new(b"raw")).unwrap(),
            Term::from(&b"raw"[..])
        );
    }

    #[test]
    fn ser_collections() {
        assert_eq!(
            to_term(&vec![1u8, 2]).unwrap(),
            Term::List(vec![Term::Integer(1), Term::Integer(2)])
        );
        assert_eq!(
            to_term(&(1u8, "two")).unwrap(),
            tuple(vec![Term::Integer(1), Term::from("two")])
        );

        let mut map = BTreeMap::new();
        map.insert(1u8, "one");
        map.insert(2u8, "two");
        assert_eq!(
            to_term(&map).unwrap(),
            Term::List(vec![
                tuple(vec![Term::Integer(1), Term::from("one")]),
                tuple(vec![Term::Integer(2), Term::from("two")]),
            ])
        );
    }

    #[test]
    fn ser_struct() {
        #[derive(Debug, Serialize)]
        struct T1 {
            k: u32,
            v: String,
        }

        let v1 = T1 {
            k: 2,
            v: "ser".to_string(),
        };
        let expected = Term::List(vec![
            tuple(vec![atom("k"), Term::Integer(2)]),
            tuple(vec![atom("v"), Term::from("ser")]),
        ]);
        assert_eq!(to_term(&v1).unwrap(), expected);

        #[derive(Debug, Serialize)]
        struct T2(u8, T1);
        let v2 = T2(3, v1);
        assert_eq!(
            to_term(&v2).unwrap(),
            tuple(vec![Term::Integer(3), expected])
        );

        #[derive(Debug, Serialize)]
        struct Unit;
        assert_eq!(to_term(&Unit).unwrap(), Term::Undefined);
    }

    #[test]
    fn ser_enum() {
        #[derive(Debug, Serialize)]
        enum T3 {
            Foo,
            Bar(i64),
            Qux(u8, u8),
            Baz { a: u16, b: String },
        }

        assert_eq!(to_term(&T3::Foo).unwrap(), atom("Foo"));
        assert_eq!(
            to_term(&T3::Bar(-1)).unwrap(),
            tuple(vec![atom("Bar"), Term::Integer(-1)])
        );
        assert_eq!(
            to_term(&T3::Qux(1, 2)).unwrap(),
            tuple(vec![
                atom("Qux"),
                tuple(vec![Term::Integer(1), Term::Integer(2)])
            ])
        );

        let v3 = T3::Baz {
            a: 10,
            b: "variants".to_string(),
        };
        let term = to_term(&v3).unwrap();
        assert_eq!(
            term,
            tuple(vec![
                atom("Baz"),
                Term::List(vec![
                    tuple(vec![atom("a"), Term::Integer(10)]),
                    tuple(vec![atom("b"), Term::from("variants")]),
                ])
            ])
        );
        assert!(encode(&term).is_ok());
    }
}
