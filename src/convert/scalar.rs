//! Scalar converters.
//!
//! Only `i64`, `u64`, `f64`, `bool` and `String` read the source themselves.
//! Every narrower target goes through its same-signedness 64-bit reader and
//! then truncates with a plain cast, so the 64-bit read is the only overflow
//! check (300 into an `i8` gives 44).
use std::any::Any;

use crate::convert::literal;
use crate::error::{Error, Result};
use crate::reflect::{downcast_slot, ScalarKind};
use crate::value::Value;

pub type ScalarFn = fn(&Value, &mut dyn Any, &str) -> Result<()>;

/// The converter table, one entry per scalar kind.
pub fn for_kind(kind: ScalarKind) -> ScalarFn {
    match kind {
        ScalarKind::I64 => convert_i64,
        ScalarKind::I32 => convert_i32,
        ScalarKind::I16 => convert_i16,
        ScalarKind::I8 => convert_i8,
        ScalarKind::Isize => convert_isize,
        ScalarKind::U64 => convert_u64,
        ScalarKind::U32 => convert_u32,
        ScalarKind::U16 => convert_u16,
        ScalarKind::U8 => convert_u8,
        ScalarKind::Usize => convert_usize,
        ScalarKind::F64 => convert_f64,
        ScalarKind::F32 => convert_f32,
        ScalarKind::Bool => convert_bool,
        ScalarKind::String => convert_string,
    }
}

// -------------------------------- Readers --------------------------------- //

pub fn read_i64(src: &Value, path: &str) -> Result<i64> {
    Ok(match src {
        Value::I64(v) => *v,
        Value::I32(v) => i64::from(*v),
        Value::I16(v) => i64::from(*v),
        Value::I8(v) => i64::from(*v),
        Value::Int(v) => *v as i64,
        Value::U64(v) => i64::try_from(*v).map_err(|_| Error::invalid_type(path, "i64", "u64"))?,
        Value::Uint(v) => i64::try_from(*v).map_err(|_| Error::invalid_type(path, "i64", "usize"))?,
        Value::U32(v) => i64::from(*v),
        Value::U16(v) => i64::from(*v),
        Value::U8(v) => i64::from(*v),
        Value::Str(s) => literal::parse_signed(s).map_err(|e| Error::parse(path, e))?,
        other => return Err(Error::invalid_type(path, "i64", other.shape_name())),
    })
}

pub fn read_u64(src: &Value, path: &str) -> Result<u64> {
    let negative = |shape: &str| Error::invalid_type(path, "u64", shape);
    Ok(match src {
        Value::I64(v) => u64::try_from(*v).map_err(|_| negative("i64"))?,
        Value::I32(v) => u64::try_from(*v).map_err(|_| negative("i32"))?,
        Value::I16(v) => u64::try_from(*v).map_err(|_| negative("i16"))?,
        Value::I8(v) => u64::try_from(*v).map_err(|_| negative("i8"))?,
        Value::Int(v) => u64::try_from(*v).map_err(|_| negative("isize"))?,
        Value::U64(v) => *v,
        Value::U32(v) => u64::from(*v),
        Value::U16(v) => u64::from(*v),
        Value::U8(v) => u64::from(*v),
        Value::Uint(v) => *v as u64,
        Value::Str(s) => literal::parse_unsigned(s).map_err(|e| Error::parse(path, e))?,
        other => return Err(Error::invalid_type(path, "u64", other.shape_name())),
    })
}

pub fn read_f64(src: &Value, path: &str) -> Result<f64> {
    Ok(match src {
        Value::F64(v) => *v,
        Value::F32(v) => f64::from(*v),
        Value::I64(v) => *v as f64,
        Value::I32(v) => f64::from(*v),
        Value::I16(v) => f64::from(*v),
        Value::I8(v) => f64::from(*v),
        Value::Int(v) => *v as f64,
        Value::U64(v) => *v as f64,
        Value::U32(v) => f64::from(*v),
        Value::U16(v) => f64::from(*v),
        Value::U8(v) => f64::from(*v),
        Value::Uint(v) => *v as f64,
        Value::Str(s) => literal::parse_float(s).map_err(|e| Error::parse(path, e))?,
        other => return Err(Error::invalid_type(path, "f64", other.shape_name())),
    })
}

pub fn read_bool(src: &Value, path: &str) -> Result<bool> {
    match src {
        Value::Bool(b) => Ok(*b),
        Value::Str(s) => literal::parse_bool(s).map_err(|e| Error::parse(path, e)),
        other => Err(Error::invalid_type(path, "bool", other.shape_name())),
    }
}

pub fn read_string(src: &Value, path: &str) -> Result<String> {
    match src {
        Value::Str(s) => Ok(s.clone()),
        other => Err(Error::invalid_type(path, "string", other.shape_name())),
    }
}

// ------------------------------- Converters ------------------------------- //

/// The destination is checked before the source is read.
fn store<T: Any>(dst: &mut dyn Any, read: impl FnOnce() -> Result<T>) -> Result<()> {
    let slot = downcast_slot::<T>(dst);
    *slot = read()?;
    Ok(())
}

macro_rules! converters {
    ($($name:ident: $ty:ty = $read:ident),* $(,)?) => {
        $(
            pub fn $name(src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
                store::<$ty>(dst, || Ok($read(src, path)? as $ty))
            }
        )*
    };
}

converters! {
    convert_i64: i64 = read_i64,
    convert_i32: i32 = read_i64,
    convert_i16: i16 = read_i64,
    convert_i8: i8 = read_i64,
    convert_isize: isize = read_i64,
    convert_u64: u64 = read_u64,
    convert_u32: u32 = read_u64,
    convert_u16: u16 = read_u64,
    convert_u8: u8 = read_u64,
    convert_usize: usize = read_u64,
    convert_f64: f64 = read_f64,
    convert_f32: f32 = read_f64,
}

pub fn convert_bool(src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
    store::<bool>(dst, || read_bool(src, path))
}

pub fn convert_string(src: &Value, dst: &mut dyn Any, path: &str) -> Result<()> {
    store::<String>(dst, || read_string(src, path))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn convert<T: Any + Default>(kind: ScalarKind, src: Value) -> Result<T> {
        let mut out = T::default();
        for_kind(kind)(&src, &mut out, "x")?;
        Ok(out)
    }

    #[test]
    fn integers_widen_from_every_integer_source() {
        assert_eq!(convert::<i64>(ScalarKind::I64, Value::I8(-3)), Ok(-3));
        assert_eq!(convert::<i64>(ScalarKind::I64, Value::U32(7)), Ok(7));
        assert_eq!(convert::<i64>(ScalarKind::I64, Value::Int(-9)), Ok(-9));
        assert_eq!(convert::<u64>(ScalarKind::U64, Value::I64(12)), Ok(12));
        assert_eq!(convert::<u64>(ScalarKind::U64, Value::Uint(5)), Ok(5));
    }

    #[test]
    fn integer_strings_are_parsed() {
        assert_eq!(convert::<i64>(ScalarKind::I64, "19950216".into()), Ok(19950216));
        assert_eq!(convert::<i32>(ScalarKind::I32, "0x10".into()), Ok(16));
        assert_eq!(convert::<u16>(ScalarKind::U16, "0b11".into()), Ok(3));
        let err = convert::<i64>(ScalarKind::I64, "nope".into()).unwrap_err();
        assert!(matches!(err, Error::Parse { ref path, source: ParseError::Int { .. } } if path == "x"));
    }

    #[test]
    fn sign_loss_and_overflow_are_rejected() {
        let err = convert::<u64>(ScalarKind::U64, Value::I32(-1)).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "u64", "i32"));
        let err = convert::<u8>(ScalarKind::U8, Value::Int(-1)).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "u64", "isize"));
        let err = convert::<i64>(ScalarKind::I64, Value::U64(u64::MAX)).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "i64", "u64"));
        // the narrower signed targets share the 64-bit check
        assert!(convert::<i8>(ScalarKind::I8, Value::U64(1 << 63)).is_err());
    }

    #[test]
    fn narrowing_truncates_without_range_check() {
        assert_eq!(convert::<i8>(ScalarKind::I8, Value::I64(300)), Ok(44));
        assert_eq!(convert::<u8>(ScalarKind::U8, Value::U64(256)), Ok(0));
        assert_eq!(convert::<i16>(ScalarKind::I16, Value::I64(65535)), Ok(-1));
        assert_eq!(convert::<u32>(ScalarKind::U32, Value::U64(u64::from(u32::MAX) + 2)), Ok(1));
    }

    #[test]
    fn floats() {
        assert_eq!(convert::<f64>(ScalarKind::F64, Value::I32(2)), Ok(2.0));
        assert_eq!(convert::<f64>(ScalarKind::F64, Value::F32(0.5)), Ok(0.5));
        assert_eq!(convert::<f64>(ScalarKind::F64, "0.11".into()), Ok(0.11));
        assert_eq!(convert::<f32>(ScalarKind::F32, Value::F64(1.25)), Ok(1.25));
        let err = convert::<f64>(ScalarKind::F64, Value::Bool(true)).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "f64", "bool"));
    }

    #[test]
    fn bools_and_strings() {
        assert_eq!(convert::<bool>(ScalarKind::Bool, Value::Bool(true)), Ok(true));
        assert_eq!(convert::<bool>(ScalarKind::Bool, "F".into()), Ok(false));
        assert!(matches!(
            convert::<bool>(ScalarKind::Bool, "maybe".into()),
            Err(Error::Parse { source: ParseError::Bool { .. }, .. })
        ));
        assert_eq!(convert::<String>(ScalarKind::String, "John".into()), Ok("John".to_owned()));
        // no stringification of other scalars
        let err = convert::<String>(ScalarKind::String, Value::I64(1)).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "string", "i64"));
    }

    #[test]
    fn mismatched_source_shapes() {
        let err = convert::<i64>(ScalarKind::I64, Value::Seq(vec![])).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "i64", "sequence"));
        let err = convert::<u64>(ScalarKind::U64, Value::Null).unwrap_err();
        assert_eq!(err, Error::invalid_type("x", "u64", "null"));
    }

    #[test]
    #[should_panic(expected = "destination is not")]
    fn wrong_destination_is_a_contract_violation() {
        let mut out = 0i32;
        let _ = convert_i64(&Value::I64(1), &mut out, "x");
    }
}
