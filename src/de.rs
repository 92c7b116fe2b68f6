use std::sync::Arc;

use serde::de::{self, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::forward_to_deserialize_any;

use crate::params::Params;

type Error = de::value::Error;

/// Deserializer over captured path parameters.
///
/// Backs [`Params::load`]; structs are keyed by segment name, sequences and
/// tuples by segment position, and a lone scalar by the single captured value.
pub struct ParamsDeserializer<'de> {
    params: &'de Params,
}

impl<'de> ParamsDeserializer<'de> {
    pub fn new(params: &'de Params) -> Self {
        ParamsDeserializer { params }
    }

    fn single_value(&self) -> Result<Value<'de>, Error> {
        match self.params.segments() {
            [(_, value)] => Ok(Value { value }),
            segments => Err(de::Error::custom(format!(
                "wrong number of parameters: {} expected 1",
                segments.len()
            ))),
        }
    }
}

macro_rules! forward_to_single_value {
    ($($method:ident)+) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
                self.single_value()?.$method(visitor)
            }
        )+
    };
}

impl<'de> Deserializer<'de> for ParamsDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_map(ParamsAsMap {
            segments: self.params.segments(),
            value: None,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_seq(ParamsAsSeq {
            segments: self.params.segments(),
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        if self.params.len() != len {
            return Err(de::Error::custom(format!(
                "wrong number of parameters: {} expected {}",
                self.params.len(),
                len
            )));
        }
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.single_value()?.deserialize_enum(name, variants, visitor)
    }

    forward_to_single_value! {
        deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
        deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf
        deserialize_identifier
    }
}

struct ParamsAsMap<'de> {
    segments: &'de [(Arc<str>, String)],
    value: Option<&'de str>,
}

impl<'de> MapAccess<'de> for ParamsAsMap<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.segments.split_first() {
            Some(((name, value), rest)) => {
                self.segments = rest;
                self.value = Some(value);
                seed.deserialize(Value { value: name }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let value = self.value.take().expect("value is resolved after key");
        seed.deserialize(Value { value })
    }
}

struct ParamsAsSeq<'de> {
    segments: &'de [(Arc<str>, String)],
}

impl<'de> SeqAccess<'de> for ParamsAsSeq<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.segments.split_first() {
            Some(((_, value), rest)) => {
                self.segments = rest;
                seed.deserialize(Value { value }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.segments.len())
    }
}

/// One captured segment value.
struct Value<'de> {
    value: &'de str,
}

macro_rules! parse_value {
    ($($method:ident => $visit:ident: $ty:ty,)+) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
                let parsed = self.value.parse::<$ty>().map_err(|_| {
                    de::Error::custom(format!(
                        "can not parse {:?} as {}",
                        self.value,
                        stringify!($ty)
                    ))
                })?;
                visitor.$visit(parsed)
            }
        )+
    };
}

impl<'de> Deserializer<'de> for Value<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_borrowed_str(self.value)
    }

    parse_value! {
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let mut chars = self.value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(de::Error::custom(format!(
                "can not parse {:?} as char",
                self.value
            ))),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_borrowed_bytes(self.value.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_byte_buf(self.value.as_bytes().to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_enum(self)
    }

    forward_to_deserialize_any! {
        str string unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

impl<'de> EnumAccess<'de> for Value<'de> {
    type Error = Error;
    type Variant = UnitVariant;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        Ok((seed.deserialize(self)?, UnitVariant))
    }
}

struct UnitVariant;

impl<'de> VariantAccess<'de> for UnitVariant {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, _seed: T) -> Result<T::Value, Error>
    where
        T: de::DeserializeSeed<'de>,
    {
        Err(de::Error::custom("unexpected newtype variant"))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value, Error> {
        Err(de::Error::custom("unexpected tuple variant"))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Error> {
        Err(de::Error::custom("unexpected struct variant"))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::PathPattern;

    #[derive(Debug, Deserialize, PartialEq)]
    struct PostInfo {
        id: u32,
        slug: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Kind {
        Draft,
        Published,
    }

    #[test]
    fn load_struct() {
        let pattern = PathPattern::new("/post/{id:[0-9]+}-{slug}");
        let params = pattern.capture("/post/42-hello-world").unwrap();

        let info: PostInfo = params.load().unwrap();
        assert_eq!(
            info,
            PostInfo {
                id: 42,
                slug: "hello-world".to_owned(),
            }
        );
    }

    #[test]
    fn load_tuple_and_scalar() {
        let pattern = PathPattern::new("/post/{id:[0-9]+}-{slug}");
        let params = pattern.capture("/post/42-hello").unwrap();

        let (id, slug): (u32, String) = params.load().unwrap();
        assert_eq!(id, 42);
        assert_eq!(slug, "hello");

        let pattern = PathPattern::new("/user/{id}");
        let params = pattern.capture("/user/7").unwrap();
        let id: u64 = params.load().unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn load_unit_enum() {
        let pattern = PathPattern::new("/posts/{kind}");
        let params = pattern.capture("/posts/draft").unwrap();
        let kind: Kind = params.load().unwrap();
        assert_eq!(kind, Kind::Draft);
    }

    #[test]
    fn load_errors() {
        let pattern = PathPattern::new("/post/{id}-{slug}");
        let params = pattern.capture("/post/abc-hello").unwrap();

        assert!(params.load::<PostInfo>().is_err());
        assert!(params.load::<u32>().is_err());
        assert!(params.load::<(u32, String, String)>().is_err());
    }
}
