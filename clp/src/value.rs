//! Destination cells and typed retrieval.
//!
//! Every option or positional parameter that has a converter owns one
//! [`Value`].  The table stores the caller's initial value; each parse works
//! on a fresh copy, which the caller reads back through [`FromValue`].

use std::any::Any;
use std::fs::File;
use std::os::fd::OwnedFd;
use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Str(Option<String>),
    File(Option<Arc<File>>),
    Fd(Option<Arc<OwnedFd>>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    Isize(Vec<isize>),
    Usize(Vec<usize>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    /// Anything a custom converter wants to hand back.
    Any(Option<Arc<dyn Any + Send + Sync>>),
}

impl Value {
    /// An unset string cell.
    pub fn string() -> Self {
        Value::Str(None)
    }

    /// An unset file cell (for [`crate::convert::fopen`]).
    pub fn file() -> Self {
        Value::File(None)
    }

    /// An unset descriptor cell (for [`crate::convert::open`]).
    pub fn fd() -> Self {
        Value::Fd(None)
    }

    /// An unset cell for a custom converter.
    pub fn any() -> Self {
        Value::Any(None)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::File(_) => "file",
            Value::Fd(_) => "fd",
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::Isize(_) => "isize",
            Value::Usize(_) => "usize",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Any(_) => "any",
        }
    }

    /// Number of elements held by a numeric vector cell; 1 or 0 for the rest.
    pub fn len(&self) -> usize {
        match self {
            Value::I8(v) => v.len(),
            Value::U8(v) => v.len(),
            Value::I16(v) => v.len(),
            Value::U16(v) => v.len(),
            Value::I32(v) => v.len(),
            Value::U32(v) => v.len(),
            Value::I64(v) => v.len(),
            Value::U64(v) => v.len(),
            Value::Isize(v) => v.len(),
            Value::Usize(v) => v.len(),
            Value::F32(v) => v.len(),
            Value::F64(v) => v.len(),
            Value::Bool(_) => 1,
            Value::Str(s) => s.is_some() as usize,
            Value::File(f) => f.is_some() as usize,
            Value::Fd(f) => f.is_some() as usize,
            Value::Any(a) => a.is_some() as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downcast the payload of a [`Value::Any`] cell.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Any(Some(a)) => a.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

fn mismatch(expected: &str, got: &Value) -> Error {
    Error::Software(format!(
        "type mismatch: expected {} but destination holds {}",
        expected,
        got.kind()
    ))
}

/// Conversion of Rust values into initial destination cells.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Typed retrieval of a destination cell.
pub trait FromValue: Sized {
    fn from_value(v: &Value) -> Result<Self>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(Some(self.to_string()))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(Some(self))
    }
}

impl IntoValue for Option<String> {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl FromValue for bool {
    fn from_value(v: &Value) -> Result<Self> {
        match v {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch("bool", v)),
        }
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> Result<Self> {
        match v {
            Value::Str(Some(s)) => Ok(s.clone()),
            Value::Str(None) => Err(Error::Software("string destination is unset".to_string())),
            _ => Err(mismatch("string", v)),
        }
    }
}

impl FromValue for Option<String> {
    fn from_value(v: &Value) -> Result<Self> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(mismatch("string", v)),
        }
    }
}

impl FromValue for Option<Arc<File>> {
    fn from_value(v: &Value) -> Result<Self> {
        match v {
            Value::File(f) => Ok(f.clone()),
            _ => Err(mismatch("file", v)),
        }
    }
}

impl FromValue for Option<Arc<OwnedFd>> {
    fn from_value(v: &Value) -> Result<Self> {
        match v {
            Value::Fd(f) => Ok(f.clone()),
            _ => Err(mismatch("fd", v)),
        }
    }
}

macro_rules! numeric_value {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(vec![self])
                }
            }

            impl IntoValue for Vec<$ty> {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl FromValue for $ty {
                fn from_value(v: &Value) -> Result<Self> {
                    match v {
                        Value::$variant(n) => n.first().copied().ok_or_else(|| {
                            Error::Software(concat!(stringify!($ty), " destination is empty").to_string())
                        }),
                        _ => Err(mismatch(stringify!($ty), v)),
                    }
                }
            }

            impl FromValue for Vec<$ty> {
                fn from_value(v: &Value) -> Result<Self> {
                    match v {
                        Value::$variant(n) => Ok(n.clone()),
                        _ => Err(mismatch(concat!("Vec<", stringify!($ty), ">"), v)),
                    }
                }
            }
        )*
    };
}

numeric_value! {
    I8 => i8,
    U8 => u8,
    I16 => i16,
    U16 => u16,
    I32 => i32,
    U32 => u32,
    I64 => i64,
    U64 => u64,
    Isize => isize,
    Usize => usize,
    F32 => f32,
    F64 => f64,
}
