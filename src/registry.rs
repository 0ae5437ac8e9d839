//! Type dispatch and the compiled-record cache.
//!
//! A [`Registry`] is the compiler context: it maps fully-qualified type names
//! to compiled [`RecordConverter`]s. There is one process-wide registry
//! ([`Registry::shared`]) and any number of throwaway ones ([`Registry::new`]).
//!
//! Compilation of one top-level type is atomic. It runs under the registry
//! lock against a session table of records started in this pass; the cache
//! is only written once every record of the pass is compiled, so a failed
//! (or panicking) compilation leaves it untouched.
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::annotation::{self, Annotation};
use crate::convert::{
    Converter, FieldRule, MapConverter, OptionalConverter, RecordConverter, RecordPlan, RecordRef, RecordSet,
    SequenceConverter,
};
use crate::error::{Error, Result};
use crate::reflect::{Kind, RecordShape, Reflect, TypeDescriptor};

type Records = HashMap<String, Arc<RecordConverter>>;

static SHARED: Lazy<Registry> = Lazy::new(Registry::new);

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct Registry {
    records: Mutex<Records>,
}

/// One top-level compilation against a locked cache.
struct Session<'a> {
    /// Records compiled by earlier passes.
    compiled: &'a Records,
    /// Records of this pass, by position. A record is started (and findable
    /// through `started`) before its fields are resolved, so recursion
    /// terminates; its rules are filled in once they are.
    pending: Vec<Pending>,
    started: HashMap<&'static str, usize>,
}

struct Pending {
    descriptor: TypeDescriptor,
    new: fn() -> Box<dyn Any>,
    rules: Option<Vec<FieldRule>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry. Entries are never evicted.
    pub fn shared() -> &'static Registry {
        &SHARED
    }

    pub fn compile<T: Reflect>(&self) -> Result<Arc<RecordConverter>> {
        self.compile_descriptor(&T::descriptor())
    }

    /// Return the cached converter for `descriptor`, compiling it (and every
    /// record it reaches) on first use.
    pub fn compile_descriptor(&self, descriptor: &TypeDescriptor) -> Result<Arc<RecordConverter>> {
        let Kind::Record(shape) = descriptor.kind else {
            return Err(Error::NotARecord { name: descriptor.name.to_owned() });
        };
        let mut records = self.lock();
        if let Some(found) = records.get(descriptor.name) {
            trace!(record = descriptor.name, "record cache hit");
            return Ok(found.clone());
        }

        let mut session = Session { compiled: &*records, pending: Vec::new(), started: HashMap::new() };
        if let Err(error) = session.record(descriptor, &shape) {
            debug!(record = descriptor.name, %error, "compilation failed, cache untouched");
            return Err(error);
        }
        let set = session.finish();

        // the root is always the first record a pass starts
        let root = Arc::new(set.handle(0));
        records.insert(root.name().to_owned(), root.clone());
        for index in 1..set.len() {
            let record = set.handle(index);
            records.insert(record.name().to_owned(), Arc::new(record));
        }
        debug!(record = descriptor.name, installed = set.len(), "installed record set");
        Ok(root)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<RecordConverter>> {
        self.lock().get(name).cloned()
    }

    // A panic mid-compile poisons the lock, but the cache is only written
    // after a pass succeeds.
    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Session<'_> {
    /// The single dispatch point: pick a strategy for any descriptor.
    fn resolve(&mut self, descriptor: &TypeDescriptor) -> Result<Converter> {
        match descriptor.kind {
            Kind::Scalar(kind) => Ok(Converter::Scalar(kind)),
            Kind::Optional(shape) => {
                let elem = (shape.elem)();
                let inner = self.resolve(&elem)?;
                Ok(Converter::Optional(Arc::new(OptionalConverter::new(*descriptor, shape, elem, inner))))
            }
            Kind::Sequence(shape) => {
                let elem = (shape.elem)();
                let inner = self.resolve(&elem)?;
                Ok(Converter::Sequence(Arc::new(SequenceConverter::new(*descriptor, shape, elem, inner))))
            }
            Kind::Map(shape) => {
                let value = (shape.value)();
                let inner = self.resolve(&value)?;
                Ok(Converter::Map(Arc::new(MapConverter::new(*descriptor, shape, value, inner))))
            }
            Kind::Dynamic => Ok(Converter::Dynamic),
            Kind::Record(shape) => Ok(Converter::Record(self.record(descriptor, &shape)?)),
            Kind::Opaque => Err(Error::UnsupportedType { name: descriptor.name.to_owned() }),
        }
    }

    /// A record compiled by an earlier pass, one already started by this
    /// pass, or a new one.
    fn record(&mut self, descriptor: &TypeDescriptor, shape: &RecordShape) -> Result<RecordRef> {
        let name = descriptor.name;
        if let Some(found) = self.compiled.get(name) {
            trace!(record = name, "record cache hit");
            return Ok(RecordRef::Owned(found.clone()));
        }
        if let Some(&index) = self.started.get(name) {
            trace!(record = name, index, "recursive record reference");
            return Ok(RecordRef::Local { index, name });
        }

        debug!(record = name, fields = shape.fields.len(), "compiling record");
        let index = self.pending.len();
        self.pending.push(Pending { descriptor: *descriptor, new: shape.new, rules: None });
        self.started.insert(name, index);

        let rules = self.compile_fields(descriptor, shape)?;
        debug!(record = name, rules = rules.len(), "compiled record");
        self.pending[index].rules = Some(rules);
        Ok(RecordRef::Local { index, name })
    }

    fn compile_fields(&mut self, descriptor: &TypeDescriptor, shape: &RecordShape) -> Result<Vec<FieldRule>> {
        let mut rules = Vec::with_capacity(shape.fields.len());
        for (index, field) in shape.fields.iter().enumerate() {
            let key = match annotation::parse(field.annotation) {
                Annotation::Key { key, required } => Some((key, required)),
                Annotation::Embed => None,
                Annotation::Skip => {
                    trace!(record = descriptor.name, field = field.name, "no map_to annotation, skipped");
                    continue;
                }
            };
            let converter = self.resolve(&(field.descriptor)())?;
            rules.push(match key {
                Some((key, required)) => FieldRule::keyed(converter, field.name, key, index, required, field.access),
                None => FieldRule::embedded(converter, field.name, index, field.access),
            });
        }
        Ok(rules)
    }

    /// Seal a successful pass into its record set.
    fn finish(self) -> Arc<RecordSet> {
        let plans = self
            .pending
            .into_iter()
            .map(|pending| match pending.rules {
                Some(rules) => RecordPlan::new(pending.descriptor, pending.new, rules),
                None => panic!("record {} was started but never compiled", pending.descriptor.name),
            })
            .collect();
        RecordSet::new(plans)
    }
}

// ------------------------------- Tests ------------------------------------ //
