// Deserialization of the configuration tree.
//
// `Value` is read straight from whichever serde format the document uses, so mapping
// order is exactly the order the parser reports.

use crate::value::{Mapping, Value};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
  type Value = Value;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("a configuration value")
  }

  fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
    Ok(Value::Bool(b))
  }

  fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
    Ok(Value::Integer(i))
  }

  fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
    // Anything beyond i64 is kept as a float rather than rejected.
    Ok(match i64::try_from(u) {
      Ok(i) => Value::Integer(i),
      Err(_) => Value::Float(u as f64),
    })
  }

  fn visit_f64<E: de::Error>(self, x: f64) -> Result<Value, E> {
    Ok(Value::Float(x))
  }

  fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
    Ok(Value::String(s.to_string()))
  }

  fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
    Ok(Value::String(s))
  }

  fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_none<E: de::Error>(self) -> Result<Value, E> {
    Ok(Value::Null)
  }

  fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
    Value::deserialize(deserializer)
  }

  fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
    let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
    while let Some(item) = seq.next_element::<Value>()? {
      items.push(item);
    }
    Ok(Value::List(items))
  }

  fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
    MappingVisitor.visit_map(map).map(Value::Map)
  }
}

impl<'de> Deserialize<'de> for Value {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(ValueVisitor)
  }
}

struct MappingVisitor;

impl<'de> Visitor<'de> for MappingVisitor {
  type Value = Mapping;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("a mapping with string keys")
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Mapping, A::Error> {
    let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
    while let Some(MapKey(key)) = access.next_key::<MapKey>()? {
      let value = access.next_value::<Value>()?;
      if map.insert(key.clone(), value).is_some() {
        return Err(de::Error::custom(format!("duplicate key `{}`", key)));
      }
    }
    Ok(map)
  }
}

impl<'de> Deserialize<'de> for Mapping {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(MappingVisitor)
  }
}

/// A mapping key. YAML allows scalar keys of any type; they are stringified.
struct MapKey(String);

struct MapKeyVisitor;

impl<'de> Visitor<'de> for MapKeyVisitor {
  type Value = MapKey;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("a scalar mapping key")
  }

  fn visit_str<E: de::Error>(self, s: &str) -> Result<MapKey, E> {
    Ok(MapKey(s.to_string()))
  }

  fn visit_string<E: de::Error>(self, s: String) -> Result<MapKey, E> {
    Ok(MapKey(s))
  }

  fn visit_i64<E: de::Error>(self, i: i64) -> Result<MapKey, E> {
    Ok(MapKey(i.to_string()))
  }

  fn visit_u64<E: de::Error>(self, u: u64) -> Result<MapKey, E> {
    Ok(MapKey(u.to_string()))
  }

  fn visit_bool<E: de::Error>(self, b: bool) -> Result<MapKey, E> {
    Ok(MapKey(b.to_string()))
  }
}

impl<'de> Deserialize<'de> for MapKey {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(MapKeyVisitor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_keeps_key_order() {
    let value: Value = serde_json::from_str(r#"{"z": 1, "a": {"m": true, "b": null}}"#).unwrap();
    let root = value.as_map().unwrap();
    assert_eq!(root.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    let inner = root.get("a").and_then(Value::as_map).unwrap();
    assert_eq!(inner.keys().collect::<Vec<_>>(), vec!["m", "b"]);
    assert_eq!(inner.get("b"), Some(&Value::Null));
  }

  #[test]
  fn yaml_numeric_keys_are_stringified() {
    let value: Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
    let root = value.as_map().unwrap();
    assert_eq!(root.get("1"), Some(&Value::from("one")));
    assert!(root.contains_key("true"));
  }

  #[test]
  fn duplicate_keys_are_rejected() {
    let result: Result<Value, _> = serde_json::from_str(r#"{"a": 1, "a": 2}"#);
    assert!(result.unwrap_err().to_string().contains("duplicate key `a`"));
  }

  #[test]
  fn yaml_scalars_keep_their_kind() {
    let value: Value = serde_yaml::from_str("lr: 6.5e-5\nepochs: 3\nname: trec\n").unwrap();
    assert_eq!(value.lookup("lr"), Some(&Value::Float(6.5e-5)));
    assert_eq!(value.lookup("epochs"), Some(&Value::Integer(3)));
    assert_eq!(value.lookup("name"), Some(&Value::from("trec")));
  }
}
