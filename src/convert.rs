//! Conversion strategies.
//!
//! [`Converter`] is the closed set of strategies the registry can hand out:
//! a scalar table entry, one of the container wrappers, the dynamic
//! passthrough, or a compiled record.
//!
//! Records compiled in one pass share a [`RecordSet`] and refer to each other
//! by position in it, so a handle on any of them keeps the whole set alive
//! and recursive plans never form reference cycles.
pub mod container;
pub mod literal;
pub mod record;
pub mod scalar;

use std::any::Any;
use std::sync::Arc;

pub use container::{MapConverter, OptionalConverter, SequenceConverter};
pub use record::{FieldRule, RecordConverter, RecordSet};
pub(crate) use record::RecordPlan;

use crate::error::Result;
use crate::reflect::{downcast_slot, ScalarKind};
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Converter {
    Scalar(ScalarKind),
    Optional(Arc<OptionalConverter>),
    Sequence(Arc<SequenceConverter>),
    Map(Arc<MapConverter>),
    Dynamic,
    Record(RecordRef),
}

/// Handle on a compiled record from inside another record's plan.
#[derive(Debug, Clone)]
pub enum RecordRef {
    /// Compiled earlier, in a set of its own.
    Owned(Arc<RecordConverter>),
    /// Compiled in the same pass as the referring record; `index` is its
    /// position in the shared [`RecordSet`]. Recursive references are
    /// always of this kind.
    Local { index: usize, name: &'static str },
}

impl Converter {
    /// `set` is the record set of the plan this converter belongs to.
    pub(crate) fn convert(&self, set: &RecordSet, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        match self {
            Converter::Scalar(kind) => scalar::for_kind(*kind)(src, dst, path),
            Converter::Optional(c) => c.convert(set, src, dst, path),
            Converter::Sequence(c) => c.convert(set, src, dst, path),
            Converter::Map(c) => c.convert(set, src, dst, path),
            Converter::Dynamic => {
                *downcast_slot::<Value>(dst) = src.clone();
                Ok(())
            }
            Converter::Record(RecordRef::Owned(record)) => record.convert(src, dst, path),
            Converter::Record(RecordRef::Local { index, .. }) => set.convert(*index, src, dst, path),
        }
    }

    /// One-line rendering of the target type, for plan listings.
    pub fn describe(&self) -> String {
        match self {
            Converter::Scalar(kind) => kind.name().to_owned(),
            Converter::Optional(c) => format!("optional<{}>", c.inner.describe()),
            Converter::Sequence(c) => format!("sequence<{}>", c.inner.describe()),
            Converter::Map(c) => format!("map<string, {}>", c.inner.describe()),
            Converter::Dynamic => "dynamic".to_owned(),
            Converter::Record(r) => format!("record {}", r.name()),
        }
    }
}

impl RecordRef {
    pub fn name(&self) -> &'static str {
        match self {
            RecordRef::Owned(record) => record.name(),
            RecordRef::Local { name, .. } => name,
        }
    }
}

/// `parent.key`, or bare `key` at the root.
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_paths() {
        assert_eq!(child_path("", "name"), "name");
        assert_eq!(child_path("info", "version"), "info.version");
        assert_eq!(child_path("children[0]", "name"), "children[0].name");
    }

    #[test]
    fn dynamic_passthrough_clones_the_source() {
        let mut out = Value::Null;
        let src = Value::seq([1i64, 2]);
        Converter::Dynamic.convert(&RecordSet::default(), &src, &mut out, "raw").unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn describe_nested_containers() {
        let inner = Converter::Scalar(ScalarKind::U8);
        let descriptor = <Vec<u8> as crate::reflect::Reflect>::descriptor();
        let crate::reflect::Kind::Sequence(shape) = descriptor.kind else { panic!() };
        let seq = Converter::Sequence(Arc::new(SequenceConverter::new(descriptor, shape, (shape.elem)(), inner)));
        assert_eq!(seq.describe(), "sequence<u8>");
    }
}
