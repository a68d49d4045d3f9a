// Serialization of the configuration tree, in document order.

use crate::value::{Mapping, Value};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Value::Null => serializer.serialize_unit(),
      Value::Bool(b) => serializer.serialize_bool(*b),
      Value::Integer(i) => serializer.serialize_i64(*i),
      Value::Float(x) => serializer.serialize_f64(*x),
      Value::String(s) => serializer.serialize_str(s),
      Value::List(items) => {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
          seq.serialize_element(item)?;
        }
        seq.end()
      }
      Value::Map(map) => map.serialize(serializer),
    }
  }
}

impl Serialize for Mapping {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut out = serializer.serialize_map(Some(self.len()))?;
    for (key, value) in self.iter() {
      out.serialize_entry(key, value)?;
    }
    out.end()
  }
}
