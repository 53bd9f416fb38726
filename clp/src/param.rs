//! Positional parameter tables.
//!
//! A parameter's display name encodes its multiplicity: leading `[`
//! brackets make it optional (minimum 0, else 1) and a trailing `...`
//! makes it variadic (maximum [`POSMAX_UNBOUNDED`], else 1).

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::convert::Convert;
use crate::parse::ParamEvent;
use crate::value::{IntoValue, Value};

/// The effective cap on a variadic parameter.
pub const POSMAX_UNBOUNDED: usize = 1024;

pub type ParamCallback = Arc<dyn Fn(&ParamEvent<'_>) + Send + Sync + 'static>;

/// Count the leading open brackets of `name` (white space around them is
/// ignored) and return the name proper, cut at the first white space or
/// bracket.
pub fn unbracket(name: &str) -> (usize, &str) {
    let mut depth = 0;
    let mut rest = name;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            depth += 1;
        } else if !c.is_whitespace() {
            break;
        }
        rest = &rest[c.len_utf8()..];
    }

    let end = rest
        .find(|c: char| c.is_whitespace() || c == '[' || c == ']')
        .unwrap_or(rest.len());

    (depth, &rest[..end])
}

#[derive(Clone)]
pub struct Param {
    name: String,
    help: Option<String>,
    convert: Option<Arc<dyn Convert>>,
    dst: Option<Value>,
    before: Option<ParamCallback>,
    after: Option<ParamCallback>,
}

impl Param {
    pub fn new(name: &str) -> Self {
        Param {
            name: name.to_string(),
            help: None,
            convert: None,
            dst: None,
            before: None,
            after: None,
        }
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    pub fn convert<C: Convert + 'static>(mut self, c: C) -> Self {
        self.convert = Some(Arc::new(c));
        self
    }

    pub fn dst<V: IntoValue>(mut self, v: V) -> Self {
        self.dst = Some(v.into_value());
        self
    }

    pub fn before<F>(mut self, func: F) -> Self
    where
        F: Fn(&ParamEvent<'_>) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(func));
        self
    }

    pub fn after<F>(mut self, func: F) -> Self
    where
        F: Fn(&ParamEvent<'_>) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(func));
        self
    }

    /// The name as declared, brackets included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name with brackets and white space stripped.
    pub fn display_name(&self) -> &str {
        unbracket(&self.name).1
    }

    pub fn is_optional(&self) -> bool {
        unbracket(&self.name).0 > 0
    }

    pub fn posmin(&self) -> usize {
        if self.is_optional() {
            0
        } else {
            1
        }
    }

    pub fn posmax(&self) -> usize {
        if self.display_name().ends_with("...") {
            POSMAX_UNBOUNDED
        } else {
            1
        }
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn converter(&self) -> Option<&dyn Convert> {
        self.convert.as_deref()
    }

    pub fn initial(&self) -> Option<&Value> {
        self.dst.as_ref()
    }

    pub fn before_hook(&self) -> Option<&ParamCallback> {
        self.before.as_ref()
    }

    pub fn after_hook(&self) -> Option<&ParamCallback> {
        self.after.as_ref()
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("posmin", &self.posmin())
            .field("posmax", &self.posmax())
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParamTable {
    params: Vec<Param>,
}

impl ParamTable {
    pub fn new() -> Self {
        ParamTable { params: Vec::new() }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// The shared table that accepts no positional arguments.
    pub fn none() -> Arc<ParamTable> {
        static NONE: OnceLock<Arc<ParamTable>> = OnceLock::new();
        NONE.get_or_init(|| Arc::new(ParamTable::new())).clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.name == name || p.display_name() == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Sum of every parameter's minimum and maximum argument count.
    pub fn minmax(&self) -> (usize, usize) {
        self.params
            .iter()
            .fold((0, 0), |(lo, hi), p| (lo + p.posmin(), hi + p.posmax()))
    }
}

impl<'a> IntoIterator for &'a ParamTable {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbracket_counts_depth() {
        assert_eq!(unbracket("src..."), (0, "src..."));
        assert_eq!(unbracket("[file]"), (1, "file"));
        assert_eq!(unbracket(" [ [files...]]"), (2, "files..."));
        assert_eq!(unbracket("dst extra"), (0, "dst"));
        assert_eq!(unbracket(""), (0, ""));
    }

    #[test]
    fn multiplicity_classes() {
        let one = Param::new("dst");
        assert_eq!((one.posmin(), one.posmax()), (1, 1));
        let opt = Param::new("[dst]");
        assert_eq!((opt.posmin(), opt.posmax()), (0, 1));
        let many = Param::new("src...");
        assert_eq!((many.posmin(), many.posmax()), (1, POSMAX_UNBOUNDED));
        let any = Param::new("[src...]");
        assert_eq!((any.posmin(), any.posmax()), (0, POSMAX_UNBOUNDED));
    }

    #[test]
    fn table_minmax() {
        let t = ParamTable::new()
            .param(Param::new("[left]"))
            .param(Param::new("[middle...]"))
            .param(Param::new("right"));
        assert_eq!(t.minmax(), (1, 2 + POSMAX_UNBOUNDED));
        assert_eq!(t.position("middle..."), Some(1));
        assert_eq!(t.position("[left]"), Some(0));
        assert_eq!(ParamTable::new().minmax(), (0, 0));
    }

    #[test]
    fn none_table_is_shared() {
        assert!(Arc::ptr_eq(&ParamTable::none(), &ParamTable::none()));
        assert!(ParamTable::none().is_empty());
    }
}
