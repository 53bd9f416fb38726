//! Value converters.
//!
//! A converter turns the raw text of an option argument (or of one
//! positional argument) into a typed value and stores it in the
//! destination cell.  Converters never keep a reference to the text.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{FromRawFd, OwnedFd};
use std::sync::Arc;

use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use crate::value::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Not a number, trailing garbage, or a bad radix/mode.
    #[error("Invalid argument")]
    Invalid,

    /// Outside the range of the target type or the caller's domain.
    #[error("Numerical result out of range")]
    Range,

    /// The text held fewer values than the vector minimum.
    #[error("at least {0} values required")]
    TooFew(usize),

    /// The text held more values than the vector can take.
    #[error("Argument list too long")]
    TooMany,

    #[error("{0}")]
    Open(#[source] io::Error),

    /// The destination cell holds a different kind of value.
    #[error("destination holds {found}, expected {expected}")]
    Dst {
        expected: &'static str,
        found: &'static str,
    },

    /// A custom converter rejected user input.
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Conversion capability bound to an option or positional parameter.
pub trait Convert: Send + Sync {
    fn convert(&self, text: &str, dst: &mut Value) -> Result<()>;

    /// Whether an option using this converter requires an argument.
    fn takes_arg(&self) -> bool {
        true
    }
}

fn wrong_dst(expected: &'static str, dst: &Value) -> ConvertError {
    ConvertError::Dst {
        expected,
        found: dst.kind(),
    }
}

// ============================================================================
// Flags
// ============================================================================

/// Flips a boolean each time the option is seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toggle;

pub fn toggle() -> Toggle {
    Toggle
}

impl Convert for Toggle {
    fn convert(&self, _text: &str, dst: &mut Value) -> Result<()> {
        match dst {
            Value::Bool(b) => {
                *b = !*b;
                Ok(())
            }
            _ => Err(wrong_dst("bool", dst)),
        }
    }

    fn takes_arg(&self) -> bool {
        false
    }
}

/// Adds one to an integer each time the option is seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct Incr;

pub fn incr() -> Incr {
    Incr
}

fn bump<T: Copy>(cell: &mut Vec<T>, one: T, add: impl Fn(T, T) -> Option<T>) -> Result<()> {
    match cell.first_mut() {
        Some(n) => *n = add(*n, one).ok_or(ConvertError::Range)?,
        None => cell.push(one),
    }
    Ok(())
}

impl Convert for Incr {
    fn convert(&self, _text: &str, dst: &mut Value) -> Result<()> {
        match dst {
            Value::I32(v) => bump(v, 1, i32::checked_add),
            Value::U32(v) => bump(v, 1, u32::checked_add),
            Value::I64(v) => bump(v, 1, i64::checked_add),
            Value::U64(v) => bump(v, 1, u64::checked_add),
            Value::Usize(v) => bump(v, 1, usize::checked_add),
            _ => Err(wrong_dst("integer", dst)),
        }
    }

    fn takes_arg(&self) -> bool {
        false
    }
}

// ============================================================================
// Strings and files
// ============================================================================

/// Stores an owned copy of the text, replacing any earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

pub fn string() -> Str {
    Str
}

impl Convert for Str {
    fn convert(&self, text: &str, dst: &mut Value) -> Result<()> {
        match dst {
            Value::Str(s) => {
                *s = Some(text.to_string());
                Ok(())
            }
            _ => Err(wrong_dst("string", dst)),
        }
    }
}

/// Opens the named file with an fopen(3)-style mode ("r", "w+", "a", ...).
#[derive(Debug, Clone)]
pub struct Fopen {
    mode: String,
}

pub fn fopen(mode: &str) -> Fopen {
    Fopen {
        mode: if mode.is_empty() { "r" } else { mode }.to_string(),
    }
}

impl Default for Fopen {
    fn default() -> Self {
        fopen("r")
    }
}

fn open_options(mode: &str) -> Result<OpenOptions> {
    let mut opts = OpenOptions::new();
    let mut chars = mode.chars();
    let plus = mode.contains('+');

    match chars.next() {
        Some('r') => {
            opts.read(true).write(plus);
        }
        Some('w') => {
            opts.write(true).create(true).truncate(true).read(plus);
        }
        Some('a') => {
            opts.append(true).create(true).read(plus);
        }
        _ => return Err(ConvertError::Invalid),
    }

    for c in chars {
        match c {
            '+' | 'b' | 'e' => {}
            'x' => {
                opts.create_new(true);
            }
            _ => return Err(ConvertError::Invalid),
        }
    }

    Ok(opts)
}

impl Convert for Fopen {
    fn convert(&self, text: &str, dst: &mut Value) -> Result<()> {
        let opts = open_options(&self.mode)?;
        match dst {
            Value::File(f) => {
                let file: File = opts.open(text).map_err(ConvertError::Open)?;
                *f = Some(Arc::new(file));
                Ok(())
            }
            _ => Err(wrong_dst("file", dst)),
        }
    }
}

/// Opens the named file with open(2) flags, storing the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Open {
    flags: OFlag,
    mode: Mode,
}

pub fn open(flags: OFlag) -> Open {
    Open {
        flags,
        mode: Mode::from_bits_truncate(0o644),
    }
}

impl Default for Open {
    fn default() -> Self {
        open(OFlag::O_RDONLY)
    }
}

impl Open {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl Convert for Open {
    fn convert(&self, text: &str, dst: &mut Value) -> Result<()> {
        match dst {
            Value::Fd(f) => {
                let raw = nix::fcntl::open(text, self.flags | OFlag::O_CLOEXEC, self.mode)
                    .map_err(|e| ConvertError::Open(io::Error::from(e)))?;
                // SAFETY: open(2) just returned this descriptor and nothing else owns it.
                let fd = unsafe { OwnedFd::from_raw_fd(raw) };
                *f = Some(Arc::new(fd));
                Ok(())
            }
            _ => Err(wrong_dst("fd", dst)),
        }
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// A numeric type the [`Numeric`] converter can produce.
pub trait Number: Copy + PartialOrd + fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;
    const ZERO: Self;

    /// Strict whole-token parse; trailing garbage is an error.
    fn parse(tok: &str, radix: u32) -> Result<Self>;

    fn cell(dst: &mut Value) -> Option<&mut Vec<Self>>;
}

/// strtol(3)-style integer parse.  Radix 0 auto-detects `0x` (hex) and a
/// leading `0` (octal).
fn parse_integer(tok: &str, radix: u32) -> Result<i128> {
    let s = tok.trim_start();
    let (neg, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let hex = |s: &'_ str| -> Option<String> {
        s.strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .map(|r| r.to_string())
    };

    let (radix, digits) = match radix {
        0 => {
            if let Some(rest) = hex(s) {
                (16, rest)
            } else if s.len() > 1 && s.starts_with('0') {
                (8, s[1..].to_string())
            } else {
                (10, s.to_string())
            }
        }
        16 => (16, hex(s).unwrap_or_else(|| s.to_string())),
        r => (r, s.to_string()),
    };

    if digits.is_empty() {
        return Err(ConvertError::Invalid);
    }

    let mut acc: i128 = 0;
    for c in digits.chars() {
        let d = c.to_digit(radix).ok_or(ConvertError::Invalid)?;
        acc = acc
            .checked_mul(radix as i128)
            .and_then(|a| a.checked_add(d as i128))
            .ok_or(ConvertError::Range)?;
    }

    Ok(if neg { -acc } else { acc })
}

macro_rules! integer_number {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl Number for $ty {
                const NAME: &'static str = stringify!($ty);
                const ZERO: Self = 0;

                fn parse(tok: &str, radix: u32) -> Result<Self> {
                    let v = parse_integer(tok, radix)?;
                    <$ty>::try_from(v).map_err(|_| ConvertError::Range)
                }

                fn cell(dst: &mut Value) -> Option<&mut Vec<Self>> {
                    match dst {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_number! {
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
}

fn parse_float(tok: &str) -> Result<f64> {
    let v: f64 = tok.trim_start().parse().map_err(|_| ConvertError::Invalid)?;
    if !v.is_finite() {
        return Err(ConvertError::Range);
    }
    Ok(v)
}

impl Number for f64 {
    const NAME: &'static str = "f64";
    const ZERO: Self = 0.0;

    fn parse(tok: &str, _radix: u32) -> Result<Self> {
        parse_float(tok)
    }

    fn cell(dst: &mut Value) -> Option<&mut Vec<Self>> {
        match dst {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }
}

impl Number for f32 {
    const NAME: &'static str = "f32";
    const ZERO: Self = 0.0;

    fn parse(tok: &str, _radix: u32) -> Result<Self> {
        let v = parse_float(tok)?;
        if v.abs() > f32::MAX as f64 {
            return Err(ConvertError::Range);
        }
        Ok(v as f32)
    }

    fn cell(dst: &mut Value) -> Option<&mut Vec<Self>> {
        match dst {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }
}

/// Parses a single number, or a delimited list of up to `max` numbers.
#[derive(Debug, Clone)]
pub struct Numeric<T: Number> {
    radix: u32,
    range: Option<(T, T)>,
    min: usize,
    max: usize,
    delim: String,
}

pub fn number<T: Number>() -> Numeric<T> {
    Numeric {
        radix: 0,
        range: None,
        min: 1,
        max: 1,
        delim: String::new(),
    }
}

impl<T: Number> Numeric<T> {
    /// 0 (auto-detect) or 2..=36.  Ignored for floating point.
    pub fn radix(mut self, radix: u32) -> Self {
        self.radix = radix;
        self
    }

    /// Restrict accepted values to `lo..=hi`.
    pub fn range(mut self, lo: T, hi: T) -> Self {
        self.range = Some((lo, hi));
        self
    }

    /// Accept between `min` and `max` values separated by any of `delim`.
    pub fn vector(mut self, min: usize, max: usize, delim: &str) -> Self {
        self.min = min;
        self.max = max;
        self.delim = delim.to_string();
        self
    }

    fn parse_all(&self, text: &str) -> Result<Vec<T>> {
        if self.radix == 1 || self.radix > 36 || self.max == 0 || self.min > self.max {
            return Err(ConvertError::Invalid);
        }

        let delim = self.delim.as_str();
        let mut tokens: Box<dyn Iterator<Item = &str> + '_> = if delim.is_empty() {
            Box::new(std::iter::once(text))
        } else {
            Box::new(text.split(move |c: char| delim.contains(c)))
        };

        let mut out = Vec::new();
        while out.len() < self.max {
            let tok = match tokens.next() {
                Some(tok) => tok,
                None => break,
            };
            if tok.is_empty() {
                out.push(T::ZERO);
                continue;
            }

            let v = T::parse(tok, self.radix)?;
            if let Some((lo, hi)) = self.range {
                if v < lo || v > hi {
                    return Err(ConvertError::Range);
                }
            }
            out.push(v);
        }

        if out.len() < self.min {
            return Err(ConvertError::TooFew(self.min));
        }
        if tokens.next().is_some() {
            return Err(ConvertError::TooMany);
        }

        Ok(out)
    }
}

impl<T: Number> Convert for Numeric<T> {
    fn convert(&self, text: &str, dst: &mut Value) -> Result<()> {
        let found = dst.kind();
        let cell = T::cell(dst).ok_or(ConvertError::Dst {
            expected: T::NAME,
            found,
        })?;
        *cell = self.parse_all(text)?;
        Ok(())
    }
}

// ============================================================================
// Custom
// ============================================================================

/// Adapts a closure into a converter.
pub struct Custom<F> {
    func: F,
}

pub fn custom<F>(func: F) -> Custom<F>
where
    F: Fn(&str, &mut Value) -> Result<()> + Send + Sync,
{
    Custom { func }
}

impl<F> Convert for Custom<F>
where
    F: Fn(&str, &mut Value) -> Result<()> + Send + Sync,
{
    fn convert(&self, text: &str, dst: &mut Value) -> Result<()> {
        (self.func)(text, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FromValue, IntoValue};
    use std::io::{Read, Write};

    fn run<C: Convert>(c: &C, text: &str, dst: &mut Value) -> Result<()> {
        c.convert(text, dst)
    }

    #[test]
    fn toggle_flips_each_time() {
        let mut v = false.into_value();
        run(&toggle(), "", &mut v).unwrap();
        assert!(bool::from_value(&v).unwrap());
        run(&toggle(), "", &mut v).unwrap();
        assert!(!bool::from_value(&v).unwrap());
        assert!(!toggle().takes_arg());
    }

    #[test]
    fn incr_counts() {
        let mut v = 0i32.into_value();
        for _ in 0..3 {
            run(&incr(), "", &mut v).unwrap();
        }
        assert_eq!(i32::from_value(&v).unwrap(), 3);
        assert!(!incr().takes_arg());
    }

    #[test]
    fn incr_rejects_bool_cell() {
        let mut v = false.into_value();
        assert!(matches!(
            run(&incr(), "", &mut v),
            Err(ConvertError::Dst { .. })
        ));
    }

    #[test]
    fn string_replaces_previous() {
        let mut v = Value::string();
        run(&string(), "first", &mut v).unwrap();
        run(&string(), "second", &mut v).unwrap();
        assert_eq!(String::from_value(&v).unwrap(), "second");
    }

    #[test]
    fn number_in_range() {
        let c = number::<i32>().range(0, 100);
        let mut v = 0i32.into_value();
        run(&c, "42", &mut v).unwrap();
        assert_eq!(i32::from_value(&v).unwrap(), 42);
    }

    #[test]
    fn number_out_of_range() {
        let c = number::<i32>().range(0, 100);
        let mut v = 7i32.into_value();
        assert!(matches!(run(&c, "999", &mut v), Err(ConvertError::Range)));
        assert_eq!(i32::from_value(&v).unwrap(), 7);
    }

    #[test]
    fn number_not_a_number() {
        let c = number::<i32>();
        let mut v = 0i32.into_value();
        assert!(matches!(run(&c, "abc", &mut v), Err(ConvertError::Invalid)));
        assert!(matches!(run(&c, "12abc", &mut v), Err(ConvertError::Invalid)));
        assert!(matches!(run(&c, "", &mut v), Ok(())));
    }

    #[test]
    fn number_type_width_limits() {
        let mut v = 0i8.into_value();
        run(&number::<i8>(), "-128", &mut v).unwrap();
        assert_eq!(i8::from_value(&v).unwrap(), -128);
        assert!(matches!(
            run(&number::<i8>(), "128", &mut v),
            Err(ConvertError::Range)
        ));

        let mut v = 0u8.into_value();
        assert!(matches!(
            run(&number::<u8>(), "-1", &mut v),
            Err(ConvertError::Range)
        ));

        let mut v = 0u64.into_value();
        run(&number::<u64>(), "18446744073709551615", &mut v).unwrap();
        assert_eq!(u64::from_value(&v).unwrap(), u64::MAX);
    }

    #[test]
    fn number_radix_detection() {
        let mut v = 0i32.into_value();
        run(&number::<i32>(), "0x1f", &mut v).unwrap();
        assert_eq!(i32::from_value(&v).unwrap(), 31);
        run(&number::<i32>(), "017", &mut v).unwrap();
        assert_eq!(i32::from_value(&v).unwrap(), 15);
        run(&number::<i32>().radix(10), "017", &mut v).unwrap();
        assert_eq!(i32::from_value(&v).unwrap(), 17);
        run(&number::<i32>().radix(2), "101", &mut v).unwrap();
        assert_eq!(i32::from_value(&v).unwrap(), 5);
        assert!(matches!(
            run(&number::<i32>().radix(1), "1", &mut v),
            Err(ConvertError::Invalid)
        ));
    }

    #[test]
    fn number_vector() {
        let c = number::<i32>().vector(2, 4, ",");
        let mut v = Vec::<i32>::new().into_value();
        run(&c, "1,2,,4", &mut v).unwrap();
        assert_eq!(Vec::<i32>::from_value(&v).unwrap(), vec![1, 2, 0, 4]);
        assert_eq!(v.len(), 4);

        assert!(matches!(run(&c, "1", &mut v), Err(ConvertError::TooFew(2))));
        assert!(matches!(
            run(&c, "1,2,3,4,5", &mut v),
            Err(ConvertError::TooMany)
        ));
    }

    #[test]
    fn float_parses() {
        let mut v = 0.0f64.into_value();
        run(&number::<f64>(), "2.5", &mut v).unwrap();
        assert_eq!(f64::from_value(&v).unwrap(), 2.5);
        assert!(matches!(
            run(&number::<f64>(), "2.5x", &mut v),
            Err(ConvertError::Invalid)
        ));

        let mut v = 0.0f32.into_value();
        assert!(matches!(
            run(&number::<f32>(), "1e300", &mut v),
            Err(ConvertError::Range)
        ));
    }

    #[test]
    fn number_needs_matching_cell() {
        let mut v = 0u16.into_value();
        assert!(matches!(
            run(&number::<i32>(), "1", &mut v),
            Err(ConvertError::Dst {
                expected: "i32",
                found: "u16"
            })
        ));
    }

    #[test]
    fn fopen_reads_and_fails() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "hello").unwrap();
        let path = tmp.path().to_str().unwrap().to_string();

        let mut v = Value::file();
        run(&fopen("r"), &path, &mut v).unwrap();
        let f = Option::<Arc<File>>::from_value(&v).unwrap().unwrap();
        let mut s = String::new();
        (&*f).read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello");

        let mut v = Value::file();
        let missing = tmp.path().with_extension("missing");
        assert!(matches!(
            run(&fopen("r"), missing.to_str().unwrap(), &mut v),
            Err(ConvertError::Open(_))
        ));
        assert!(matches!(
            run(&fopen("q"), &path, &mut v),
            Err(ConvertError::Invalid)
        ));
    }

    #[test]
    fn open_stores_descriptor() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut v = Value::fd();
        run(&open(OFlag::O_RDONLY), tmp.path().to_str().unwrap(), &mut v).unwrap();
        assert!(Option::<Arc<OwnedFd>>::from_value(&v).unwrap().is_some());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            run(&Open::default(), missing.to_str().unwrap(), &mut v),
            Err(ConvertError::Open(_))
        ));
    }

    #[test]
    fn custom_closure() {
        let c = custom(|text, dst| match dst {
            Value::Str(s) => {
                *s = Some(text.to_uppercase());
                Ok(())
            }
            _ => Err(ConvertError::Other("bad cell".into())),
        });
        let mut v = Value::string();
        run(&c, "abc", &mut v).unwrap();
        assert_eq!(String::from_value(&v).unwrap(), "ABC");
    }
}
