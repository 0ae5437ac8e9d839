//! Compiled record plans and their runtime execution.
//!
//! One compilation pass produces a [`RecordSet`]: the plans of every record
//! it had to compile, in the order compilation started them. Plans refer to
//! records of the same pass by position, which is what lets a record type
//! mention itself. A [`RecordConverter`] is a handle on one position in a set
//! and keeps the whole set alive.
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::convert::{child_path, literal, Converter, RecordRef};
use crate::error::{Error, Result};
use crate::reflect::{check_slot, Access, Reflect, TypeDescriptor};
use crate::value::{Key, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone)]
pub struct RecordConverter {
    set: Arc<RecordSet>,
    index: usize,
}

/// Plans compiled together; see the module docs.
#[derive(Debug, Default)]
pub struct RecordSet {
    plans: Vec<RecordPlan>,
}

#[derive(Debug)]
pub(crate) struct RecordPlan {
    descriptor: TypeDescriptor,
    new: fn() -> Box<dyn Any>,
    rules: Vec<FieldRule>,
    allow_integer_keys: bool,
}

/// How one annotated field is filled.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub converter: Converter,
    /// Rust field name.
    pub field: &'static str,
    /// Source key; empty for embedded fields.
    pub key: String,
    /// `key` as an integer, when it parses as one.
    pub key_number: Option<i64>,
    /// Declaration position of the field.
    pub index: usize,
    pub required: bool,
    pub embed: bool,
    /// `key` as a generic-map key.
    pub(crate) map_key: Key,
    pub(crate) access: Access,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FieldRule {
    pub(crate) fn keyed(
        converter: Converter,
        field: &'static str,
        key: String,
        index: usize,
        required: bool,
        access: Access,
    ) -> Self {
        let key_number = literal::parse_signed(&key).ok();
        let map_key = Key::Str(key.clone());
        FieldRule { converter, field, key, key_number, index, required, embed: false, map_key, access }
    }

    pub(crate) fn embedded(converter: Converter, field: &'static str, index: usize, access: Access) -> Self {
        FieldRule {
            converter,
            field,
            key: String::new(),
            key_number: None,
            index,
            required: false,
            embed: true,
            map_key: Key::Str(String::new()),
            access,
        }
    }
}

impl RecordPlan {
    pub(crate) fn new(descriptor: TypeDescriptor, new: fn() -> Box<dyn Any>, rules: Vec<FieldRule>) -> Self {
        let allow_integer_keys = rules.iter().filter(|r| !r.embed).all(|r| r.key_number.is_some());
        RecordPlan { descriptor, new, rules, allow_integer_keys }
    }

    fn name(&self) -> &'static str {
        self.descriptor.name
    }

    fn convert(&self, set: &RecordSet, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        check_slot(dst, &self.descriptor);
        match src {
            Value::Map(m) => self.apply(set, src, dst, path, |rule| {
                m.get(&rule.map_key).or_else(|| {
                    let n = rule.key_number.filter(|_| self.allow_integer_keys)?;
                    m.get(&Key::Int(n as isize)).or_else(|| m.get(&Key::I64(n)))
                })
            }),
            Value::StrMap(m) => self.apply(set, src, dst, path, |rule| m.get(rule.key.as_str())),
            Value::IntMap(m) if self.allow_integer_keys => {
                self.apply(set, src, dst, path, |rule| m.get(&(rule.key_number? as isize)))
            }
            Value::Int64Map(m) if self.allow_integer_keys => {
                self.apply(set, src, dst, path, |rule| m.get(&rule.key_number?))
            }
            other => {
                let expected = if self.allow_integer_keys {
                    "map<any | string | isize | i64, any>"
                } else {
                    "map<any | string, any>"
                };
                Err(Error::invalid_type(path, expected, other.shape_name()))
            }
        }
    }

    fn apply<'v>(
        &self,
        set: &RecordSet,
        src: &'v Value,
        dst: &mut dyn Any,
        path: &str,
        lookup: impl Fn(&FieldRule) -> Option<&'v Value>,
    ) -> Result<()> {
        for rule in &self.rules {
            let (found, field_path) = if rule.embed {
                (Some(src), path.to_owned())
            } else {
                (lookup(rule), child_path(path, &rule.key))
            };
            match found {
                Some(value) => {
                    trace!(record = self.name(), path = %field_path, "converting field");
                    rule.converter.convert(set, value, (rule.access)(dst), &field_path)?;
                }
                None if rule.required => return Err(Error::required(&field_path)),
                None => {}
            }
        }
        Ok(())
    }
}

impl RecordSet {
    pub(crate) fn new(plans: Vec<RecordPlan>) -> Arc<Self> {
        Arc::new(RecordSet { plans })
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Handle on the record at `index`.
    pub fn handle(self: &Arc<Self>, index: usize) -> RecordConverter {
        assert!(index < self.plans.len(), "record set has no record at {index}");
        RecordConverter { set: self.clone(), index }
    }

    pub(crate) fn convert(&self, index: usize, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        self.plans[index].convert(self, src, dst, path)
    }
}

impl RecordConverter {
    fn plan(&self) -> &RecordPlan {
        &self.set.plans[self.index]
    }

    pub fn name(&self) -> &'static str {
        self.plan().name()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.plan().descriptor
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.plan().rules
    }

    /// True only when every keyed field's key is an integer literal.
    pub fn allows_integer_keys(&self) -> bool {
        self.plan().allow_integer_keys
    }

    /// The set this record was compiled in.
    pub fn set(&self) -> &Arc<RecordSet> {
        &self.set
    }

    /// Handle on a record this one refers to.
    pub fn resolve(&self, record: &RecordRef) -> RecordConverter {
        match record {
            RecordRef::Owned(owned) => (**owned).clone(),
            RecordRef::Local { index, .. } => self.set.handle(*index),
        }
    }

    /// Convert `src` into an existing record. Fields without a rule, or whose
    /// key the source does not carry, keep their current value.
    pub fn convert(&self, src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
        self.set.convert(self.index, src, dst, path)
    }

    pub fn convert_into<T: Reflect>(&self, src: &Value, dst: &mut T) -> Result<()> {
        self.convert(src, dst, "")
    }

    /// Convert into a freshly defaulted record.
    pub fn generate<T: Reflect>(&self, src: &Value) -> Result<T> {
        let mut out = T::default();
        self.convert(src, &mut out, "")?;
        Ok(out)
    }

    /// [`generate`](Self::generate) for callers that only hold the converter.
    pub fn generate_any(&self, src: &Value) -> Result<Box<dyn Any>> {
        let mut out = (self.plan().new)();
        self.convert(src, &mut *out, "")?;
        Ok(out)
    }

    /// Like [`generate_any`](Self::generate_any), downcast to `T`.
    pub fn generate_boxed<T: Reflect>(&self, src: &Value) -> Result<Box<T>> {
        let out = self.generate_any(src)?;
        match out.downcast::<T>() {
            Ok(out) => Ok(out),
            Err(_) => panic!("{} is not a `{}`", self.name(), std::any::type_name::<T>()),
        }
    }
}

impl fmt::Debug for RecordConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan();
        f.debug_struct("RecordConverter")
            .field("name", &plan.name())
            .field("fields", &plan.rules.iter().map(|r| r.field).collect::<Vec<_>>())
            .field("allow_integer_keys", &plan.allow_integer_keys)
            .finish()
    }
}

impl fmt::Display for RecordConverter {
    /// Plan listing: one line per field rule.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan();
        let integer_keys = if plan.allow_integer_keys { "yes" } else { "no" };
        writeln!(f, "{} (integer keys: {integer_keys})", plan.name())?;
        for rule in &plan.rules {
            let source = if rule.embed { "<embedded>".to_owned() } else { format!("{:?}", rule.key) };
            let required = if rule.required { " required" } else { "" };
            writeln!(
                f,
                "  {:>2} {:<16} <- {:<16}{required} {}",
                rule.index,
                rule.field,
                source,
                rule.converter.describe()
            )?;
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //
