use std::slice::Iter;

use num_traits::cast::*;
use serde::de::{self, DeserializeSeed, EnumAccess, VariantAccess, Visitor};

use super::{error::Error, term::*};

/// Reads `Deserialize` values back out of a [`Term`].
pub struct Deserializer<'de> {
    input: &'de Term,
}

impl<'de> Deserializer<'de> {
    pub fn from_term(input: &'de Term) -> Self {
        Deserializer { input }
    }
}

/// Converts a term into `T`, accepting the shapes [`to_term`](super::to_term)
/// produces.
pub fn from_term<'a, T>(input: &'a Term) -> Result<T, Error>
where
    T: de::Deserialize<'a>,
{
    let mut deserializer = Deserializer::from_term(input);
    T::deserialize(&mut deserializer)
}

impl<'de> Deserializer<'de> {
    fn unexpected(&self, expected: &str) -> Error {
        Error::Message(format!(
            "expected {expected}, found {}",
            self.input.category()
        ))
    }

    fn parse_bool(&self) -> Result<bool, Error> {
        match self.input {
            Term::Boolean(v) => Ok(*v),
            _ => Err(self.unexpected("boolean")),
        }
    }

    fn parse_integer<T: FromPrimitive>(&self) -> Result<T, Error> {
        let n = match self.input {
            Term::Integer(v) => T::from_i64(*v),
            Term::BigInteger(v) => v
                .to_i128()
                .and_then(T::from_i128)
                .or_else(|| v.to_u128().and_then(T::from_u128)),
            _ => return Err(self.unexpected("integer")),
        };
        n.ok_or_else(|| {
            Error::Message(format!(
                "integer out of range for {}",
                std::any::type_name::<T>()
            ))
        })
    }

    fn parse_float(&self) -> Result<f64, Error> {
        match self.input {
            Term::Float(v) => Ok(*v),
            Term::Integer(v) => Ok(*v as f64),
            Term::BigInteger(v) => v
                .to_f64()
                .ok_or_else(|| Error::Message("integer out of range for f64".to_string())),
            _ => Err(self.unexpected("float")),
        }
    }

    fn parse_str(&self) -> Result<&'de str, Error> {
        let bytes = match self.input {
            Term::Atom(v) => v.as_bytes(),
            Term::Binary(v) => v.as_ref(),
            _ => return Err(self.unexpected("string")),
        };
        std::str::from_utf8(bytes).map_err(|e| Error::Message(e.to_string()))
    }

    fn parse_binary(&self) -> Result<&'de [u8], Error> {
        match self.input {
            Term::Binary(v) => Ok(v.as_ref()),
            Term::Atom(v) => Ok(v.as_bytes()),
            _ => Err(self.unexpected("binary")),
        }
    }
}

impl<'de> de::Deserializer<'de> for &mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Term::Atom(v) => match std::str::from_utf8(v.as_bytes()) {
                Ok(s) => visitor.visit_borrowed_str(s),
                Err(_) => visitor.visit_borrowed_bytes(v.as_bytes()),
            },
            Term::Boolean(v) => visitor.visit_bool(*v),
            Term::Undefined => visitor.visit_unit(),
            Term::Integer(v) => visitor.visit_i64(*v),
            Term::BigInteger(v) => match (v.to_i128(), v.to_u128()) {
                (Some(v), _) => visitor.visit_i128(v),
                (None, Some(v)) => visitor.visit_u128(v),
                (None, None) => Err(Error::Unsupported("integer wider than 128 bits")),
            },
            Term::Float(v) => visitor.visit_f64(*v),
            Term::Binary(v) => visitor.visit_borrowed_bytes(v.as_ref()),
            Term::List(v) => visitor.visit_seq(DeserializerSeq::new(v)),
            Term::Tuple(v) => visitor.visit_seq(DeserializerSeq::new(v.elems())),
            Term::ImproperList(_) => Err(Error::Unsupported("improper list")),
            Term::Opaque(_) => Err(Error::Unsupported("opaque object")),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(self.parse_bool()?)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(self.parse_integer()?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i16(self.parse_integer()?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i32(self.parse_integer()?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.parse_integer()?)
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i128(self.parse_integer()?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(self.parse_integer()?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u16(self.parse_integer()?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u32(self.parse_integer()?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u64(self.parse_integer()?)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u128(self.parse_integer()?)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(self.parse_float()? as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.parse_float()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let mut chars = self.parse_str()?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.unexpected("single character")),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.parse_str()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.parse_binary()?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_byte_buf(self.parse_binary()?.to_vec())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Term::Undefined => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Term::Undefined => visitor.visit_unit(),
            _ => Err(self.unexpected("undefined")),
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    // newtype structs are transparent wrappers
    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Term::List(v) => visitor.visit_seq(DeserializerSeq::new(v)),
            Term::Binary(v) => visitor.visit_borrowed_bytes(v.as_ref()),
            _ => Err(self.unexpected("list")),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Term::Tuple(v) => visitor.visit_seq(DeserializerSeq::new(v.elems())),
            _ => Err(self.unexpected("tuple")),
        }
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    // a property list: [{Key, Value}...]
    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            Term::List(v) => visitor.visit_map(DeserializerMap::new(v)),
            _ => Err(self.unexpected("property list")),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.input {
            v @ Term::Atom(_) => visitor.visit_enum(DeserializerEnumUnit::new(v)),
            Term::Tuple(v) => match v.elems() {
                [variant, value] => visitor.visit_enum(DeserializerEnum::new((variant, value))),
                _ => Err(Error::Message(format!(
                    "expected {{Variant, Value}}, found tuple of {}",
                    v.len()
                ))),
            },
            _ => Err(self.unexpected("atom or tuple")),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct DeserializerSeq<'de> {
    input: Iter<'de, Term>,
}

impl<'de> DeserializerSeq<'de> {
    pub fn new(input: &'de [Term]) -> Self {
        DeserializerSeq {
            input: input.iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for DeserializerSeq<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.input.next() {
            Some(item) => seed
                .deserialize(&mut Deserializer::from_term(item))
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.input.len())
    }
}

struct DeserializerMap<'de> {
    input: Iter<'de, Term>,
    current_value: Option<&'de Term>,
}

impl<'de> DeserializerMap<'de> {
    pub fn new(input: &'de [Term]) -> Self {
        DeserializerMap {
            input: input.iter(),
            current_value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for DeserializerMap<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(item) = self.input.next() else {
            return Ok(None);
        };
        match item {
            Term::Tuple(pair) if pair.len() == 2 => {
                self.current_value = Some(&pair[1]);
                seed.deserialize(&mut Deserializer::from_term(&pair[0]))
                    .map(Some)
            }
            other => Err(Error::Message(format!(
                "expected {{Key, Value}} pair, found {}",
                other.category()
            ))),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current_value.take() {
            Some(v) => seed.deserialize(&mut Deserializer::from_term(v)),
            None => Err(Error::Message("property list value without a key".to_string())),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.input.len())
    }
}

/// `{Variant, Value}`
struct DeserializerEnum<'de> {
    input: (&'de Term, &'de Term),
}

impl<'de> DeserializerEnum<'de> {
    fn new(input: (&'de Term, &'de Term)) -> Self {
        DeserializerEnum { input }
    }
}

impl<'de> EnumAccess<'de> for DeserializerEnum<'de> {
    type Error = Error;

    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let v = seed.deserialize(&mut Deserializer::from_term(self.input.0))?;
        Ok((v, self))
    }
}

impl<'de> VariantAccess<'de> for DeserializerEnum<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Err(Error::Message(
            "unit variant must be a bare atom".to_string(),
        ))
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut Deserializer::from_term(self.input.1))
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let mut deserializer = Deserializer::from_term(self.input.1);
        de::Deserializer::deserialize_tuple(&mut deserializer, len, visitor)
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let mut deserializer = Deserializer::from_term(self.input.1);
        de::Deserializer::deserialize_map(&mut deserializer, visitor)
    }
}

/// A bare atom naming a unit variant.
struct DeserializerEnumUnit<'de> {
    input: &'de Term,
}

impl<'de> DeserializerEnumUnit<'de> {
    fn new(input: &'de Term) -> Self {
        DeserializerEnumUnit { input }
    }
}

impl<'de> EnumAccess<'de> for DeserializerEnumUnit<'de> {
    type Error = Error;

    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let v = seed.deserialize(&mut Deserializer::from_term(self.input))?;
        Ok((v, self))
    }
}

impl<'de> VariantAccess<'de> for DeserializerEnumUnit<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, _seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        Err(Error::Message("expected {Variant, Value}, found atom".to_string()))
    }

    fn tuple_variant<V>(self, _len: usize, _visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(Error::Message("expected {Variant, Value}, found atom".to_string()))
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        Err(Error::Message("expected {Variant, Value}, found atom".to_string()))
    }
}
