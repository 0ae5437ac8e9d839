//! Convert loosely typed, map-shaped values into strongly typed records.
//!
//! Record types are declared with [`record!`], which tags fields with the
//! source key they are filled from. The first conversion of a type compiles a
//! plan for it (cached by type name) and every later conversion just runs the
//! plan.
//!
//! ```
//! use mapto::Value;
//!
//! mapto::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Sample {
//!         #[map_to = "name!"]
//!         pub name: String,
//!         #[map_to = "date"]
//!         pub date: i64,
//!     }
//! }
//!
//! let src = Value::str_map([("name", Value::from("John")), ("date", Value::from("19950216"))]);
//! let sample: Sample = mapto::compile::<Sample>()?.generate(&src)?;
//! assert_eq!(sample.date, 19950216);
//! # Ok::<(), mapto::Error>(())
//! ```
pub mod annotation;
pub mod convert;
pub mod demo;
pub mod error;
pub mod reflect;
pub mod registry;
pub mod value;

use std::sync::Arc;

pub use convert::RecordConverter;
pub use error::{Error, ParseError, Result};
pub use reflect::Reflect;
pub use registry::Registry;
pub use value::{Key, Value};

/// Compile `T` through the process-wide cache.
pub fn compile<T: Reflect>() -> Result<Arc<RecordConverter>> {
    Registry::shared().compile::<T>()
}

/// Compile `T` (and every record it reaches) into a throwaway cache. The
/// result is not shared with anyone.
pub fn compile_independent<T: Reflect>() -> Result<Arc<RecordConverter>> {
    Registry::new().compile::<T>()
}

/// [`compile`], panicking on error.
pub fn compile_force<T: Reflect>() -> Arc<RecordConverter> {
    match compile::<T>() {
        Ok(converter) => converter,
        Err(error) => panic!("cannot compile {}: {error}", std::any::type_name::<T>()),
    }
}

/// [`compile_independent`], panicking on error.
pub fn compile_independent_force<T: Reflect>() -> Arc<RecordConverter> {
    match compile_independent::<T>() {
        Ok(converter) => converter,
        Err(error) => panic!("cannot compile {}: {error}", std::any::type_name::<T>()),
    }
}

/// Compile (or fetch) `T` from the shared cache and convert `src` into `dst`.
pub fn direct_convert<T: Reflect>(src: &Value, dst: &mut T) -> Result<()> {
    compile::<T>()?.convert_into(src, dst)
}
