//! Optional-reference, sequence and map converters.
use std::any::Any;

use crate::convert::{child_path, Converter, RecordSet};
use crate::error::{Error, Result};
use crate::reflect::{check_slot, MapShape, OptionalShape, SequenceShape, TypeDescriptor};
use crate::value::{Key, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// `Option<Box<T>>`: an empty slot gets a fresh default `T`, an occupied one
/// is converted into in place.
#[derive(Debug)]
pub struct OptionalConverter {
    pub descriptor: TypeDescriptor,
    pub elem: TypeDescriptor,
    pub inner: Converter,
    shape: OptionalShape,
}

/// `Vec<T>`: replaced wholesale by one element per source element.
#[derive(Debug)]
pub struct SequenceConverter {
    pub descriptor: TypeDescriptor,
    pub elem: TypeDescriptor,
    pub inner: Converter,
    shape: SequenceShape,
}

/// `IndexMap<String, T>`: source entries are merged into the destination.
#[derive(Debug)]
pub struct MapConverter {
    pub descriptor: TypeDescriptor,
    pub value: TypeDescriptor,
    pub inner: Converter,
    shape: MapShape,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl OptionalConverter {
    pub fn new(descriptor: TypeDescriptor, shape: OptionalShape, elem: TypeDescriptor, inner: Converter) -> Self {
        Self { descriptor, elem, inner, shape }
    }

    pub(crate) fn convert(&self, set: &RecordSet, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        check_slot(dst, &self.descriptor);
        let target = (self.shape.fill)(dst);
        self.inner.convert(set, src, target, path)
    }
}

impl SequenceConverter {
    pub fn new(descriptor: TypeDescriptor, shape: SequenceShape, elem: TypeDescriptor, inner: Converter) -> Self {
        Self { descriptor, elem, inner, shape }
    }

    pub(crate) fn convert(&self, set: &RecordSet, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        check_slot(dst, &self.descriptor);
        let Value::Seq(items) = src else {
            return Err(Error::invalid_type(path, "sequence", src.shape_name()));
        };
        (self.shape.reset)(dst, items.len());
        for (i, item) in items.iter().enumerate() {
            let target = (self.shape.index)(dst, i);
            self.inner.convert(set, item, target, &format!("{path}[{i}]"))?;
        }
        Ok(())
    }
}

impl MapConverter {
    pub fn new(descriptor: TypeDescriptor, shape: MapShape, value: TypeDescriptor, inner: Converter) -> Self {
        Self { descriptor, value, inner, shape }
    }

    pub(crate) fn convert(&self, set: &RecordSet, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        check_slot(dst, &self.descriptor);
        match src {
            Value::StrMap(m) => {
                for (k, v) in m {
                    self.put(set, dst, k.clone(), v, path)?;
                }
            }
            Value::Map(m) => {
                for (k, v) in m {
                    let key = match k {
                        Key::Str(s) => s.clone(),
                        Key::Int(_) | Key::I64(_) | Key::U64(_) => k.to_string(),
                        Key::Bool(_) => {
                            return Err(Error::invalid_type(&format!("{path}.(key)"), "string", "bool"));
                        }
                    };
                    self.put(set, dst, key, v, path)?;
                }
            }
            Value::IntMap(m) => {
                for (k, v) in m {
                    self.put(set, dst, k.to_string(), v, path)?;
                }
            }
            Value::Int64Map(m) => {
                for (k, v) in m {
                    self.put(set, dst, k.to_string(), v, path)?;
                }
            }
            other => return Err(Error::invalid_type(path, "map", other.shape_name())),
        }
        Ok(())
    }

    fn put(&self, set: &RecordSet, dst: &mut dyn Any, key: String, value: &Value, path: &str) -> Result<()> {
        let entry_path = child_path(path, &key);
        let target = (self.shape.entry)(dst, key);
        self.inner.convert(set, value, target, &entry_path)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use crate::reflect::Reflect;
    use crate::registry::Registry;
    use crate::value::{Key, Value};

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Bag {
            #[map_to = "label"]
            label: Option<Box<String>>,
            #[map_to = "counts"]
            counts: Vec<u8>,
            #[map_to = "nested"]
            nested: Vec<Vec<i32>>,
            #[map_to = "env"]
            env: IndexMap<String, i64>,
            #[map_to = "raw"]
            raw: Vec<Value>,
            #[map_to = "point"]
            point: Option<Box<Point>>,
        }
    }

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Point {
            #[map_to = "x"]
            x: i32,
            #[map_to = "y"]
            y: i32,
        }
    }

    fn convert(src: Value, bag: &mut Bag) -> crate::Result<()> {
        Registry::new().compile::<Bag>()?.convert_into(&src, bag)
    }

    #[test]
    fn optional_allocates_when_empty_and_reuses_otherwise() {
        let mut bag = Bag::default();
        convert(Value::str_map([("label", "a")]), &mut bag).unwrap();
        assert_eq!(bag.label.as_deref().map(String::as_str), Some("a"));

        convert(Value::str_map([("label", "b")]), &mut bag).unwrap();
        assert_eq!(bag.label.as_deref().map(String::as_str), Some("b"));
    }

    #[test]
    fn optional_records_are_converted_in_place() {
        let mut bag = Bag { point: Some(Box::new(Point { x: 1, y: 9 })), ..Bag::default() };
        convert(Value::str_map([("point", Value::str_map([("x", 5i64)]))]), &mut bag).unwrap();
        assert_eq!(bag.point.as_deref(), Some(&Point { x: 5, y: 9 }));

        let mut empty = Bag::default();
        convert(Value::str_map([("point", Value::str_map([("y", 2i64)]))]), &mut empty).unwrap();
        assert_eq!(empty.point.as_deref(), Some(&Point { x: 0, y: 2 }));
    }

    #[test]
    fn sequences_are_rebuilt_to_source_length() {
        let mut bag = Bag { counts: vec![9, 9, 9, 9], ..Bag::default() };
        convert(Value::str_map([("counts", Value::seq([Value::I64(1), Value::from("2"), Value::U8(3)]))]), &mut bag).unwrap();
        assert_eq!(bag.counts, [1, 2, 3]);

        convert(Value::str_map([("counts", Value::Seq(vec![]))]), &mut bag).unwrap();
        assert!(bag.counts.is_empty());
    }

    #[test]
    fn sequence_errors_carry_the_index() {
        let mut bag = Bag::default();
        let src = Value::str_map([(
            "nested",
            Value::seq([Value::seq([1i64, 2]), Value::seq([Value::from(3i64), Value::Bool(false)])]),
        )]);
        let err = convert(src, &mut bag).unwrap_err();
        assert_eq!(err, crate::Error::invalid_type("nested[1][1]", "i64", "bool"));
    }

    #[test]
    fn sequence_requires_a_sequence() {
        let mut bag = Bag::default();
        let err = convert(Value::str_map([("counts", 3i64)]), &mut bag).unwrap_err();
        assert_eq!(err, crate::Error::invalid_type("counts", "sequence", "i64"));
    }

    #[test]
    fn maps_accept_every_key_flavour() {
        let mut bag = Bag::default();
        bag.env.insert("keep".into(), 1);

        let int_keyed = Value::IntMap([(3isize, Value::I64(30))].into_iter().collect());
        convert(Value::str_map([("env", int_keyed)]), &mut bag).unwrap();
        let generic = Value::map([(Key::from("a"), Value::from("0x10")), (Key::I64(7), Value::U8(70))]);
        convert(Value::str_map([("env", generic)]), &mut bag).unwrap();

        let keys: Vec<_> = bag.env.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(keys, [("keep", 1), ("3", 30), ("a", 16), ("7", 70)]);
    }

    #[test]
    fn map_entry_errors_carry_the_key() {
        let mut bag = Bag::default();
        let err = convert(Value::str_map([("env", Value::str_map([("port", "x")]))]), &mut bag).unwrap_err();
        assert_eq!(err.path(), Some("env.port"));

        let err = convert(Value::str_map([("env", Value::map([(true, 1i64)]))]), &mut bag).unwrap_err();
        assert_eq!(err, crate::Error::invalid_type("env.(key)", "string", "bool"));
    }

    #[test]
    fn dynamic_elements_are_cloned() {
        let mut bag = Bag::default();
        convert(Value::str_map([("raw", Value::seq([Value::Null, Value::from("x")]))]), &mut bag).unwrap();
        assert_eq!(bag.raw, [Value::Null, Value::from("x")]);
        assert!(Bag::descriptor().is_record());
    }
}
