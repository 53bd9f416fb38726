//! Option descriptors and option tables.

use std::fmt;
use std::sync::Arc;

use crate::convert::{self, Convert};
use crate::param::ParamTable;
use crate::parse::OptionEvent;
use crate::value::{IntoValue, Value};

pub type OptionCallback = Arc<dyn Fn(&OptionEvent<'_>) + Send + Sync + 'static>;

/// What happens after scanning for an option that was given.
#[derive(Clone)]
pub enum OptionHook {
    /// Print the usage lines and the help list to stdout.
    Help,
    /// Print the given text to stdout.
    Version(String),
    Call(OptionCallback),
}

impl fmt::Debug for OptionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionHook::Help => write!(f, "Help"),
            OptionHook::Version(v) => write!(f, "Version({:?})", v),
            OptionHook::Call(_) => write!(f, "Call(..)"),
        }
    }
}

/// The set of options an option excludes.
///
/// Spelled as a string: `"*"` excludes everything, `"^abc"` excludes
/// everything except `a`, `b` and `c`, and `"abc"` excludes exactly those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Excludes {
    All,
    Only(String),
    AllBut(String),
}

impl Excludes {
    pub fn parse(spec: &str) -> Self {
        if spec.starts_with('*') {
            Excludes::All
        } else if let Some(rest) = spec.strip_prefix('^') {
            Excludes::AllBut(rest.to_string())
        } else {
            Excludes::Only(spec.to_string())
        }
    }

    pub fn excludes(&self, tag: char) -> bool {
        match self {
            Excludes::All => true,
            Excludes::Only(set) => set.contains(tag),
            Excludes::AllBut(set) => !set.contains(tag),
        }
    }
}

// ============================================================================
// Opt: one recognized option
// ============================================================================

#[derive(Clone)]
pub struct Opt {
    optopt: char,
    longopt: Option<String>,
    argname: Option<String>,
    excludes: Option<Excludes>,
    help: Option<String>,
    convert: Option<Arc<dyn Convert>>,
    dst: Option<Value>,
    before: Option<OptionCallback>,
    after: Option<OptionHook>,
    paramv: Option<Arc<ParamTable>>,
}

impl Opt {
    pub fn new(optopt: char) -> Self {
        Opt {
            optopt,
            longopt: None,
            argname: None,
            excludes: None,
            help: None,
            convert: None,
            dst: None,
            before: None,
            after: None,
            paramv: None,
        }
    }

    pub fn long(mut self, name: &str) -> Self {
        self.longopt = Some(name.to_string());
        self
    }

    /// Name of the option argument, shown in usage and help.
    pub fn arg_description(mut self, name: &str) -> Self {
        self.argname = Some(name.to_string());
        self
    }

    pub fn excludes(mut self, spec: &str) -> Self {
        self.excludes = Some(Excludes::parse(spec));
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_string());
        self
    }

    pub fn convert<C: Convert + 'static>(mut self, c: C) -> Self {
        self.convert = Some(Arc::new(c));
        self
    }

    /// Initial contents of the destination cell.
    pub fn dst<V: IntoValue>(mut self, v: V) -> Self {
        self.dst = Some(v.into_value());
        self
    }

    pub fn before<F>(mut self, func: F) -> Self
    where
        F: Fn(&OptionEvent<'_>) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(func));
        self
    }

    pub fn after<F>(mut self, func: F) -> Self
    where
        F: Fn(&OptionEvent<'_>) + Send + Sync + 'static,
    {
        self.after = Some(OptionHook::Call(Arc::new(func)));
        self
    }

    pub fn hook(mut self, hook: OptionHook) -> Self {
        self.after = Some(hook);
        self
    }

    /// Positional parameters that replace the default ones when this
    /// option is given.
    pub fn paramv(mut self, params: impl Into<Arc<ParamTable>>) -> Self {
        self.paramv = Some(params.into());
        self
    }

    // ------------------------------------------------------------------------
    // Standard options
    // ------------------------------------------------------------------------

    /// `-v`: count verbosity into an `i32`.
    pub fn verbose() -> Self {
        Opt::new('v')
            .convert(convert::incr())
            .dst(0i32)
            .help("increase verbosity")
    }

    /// `-V, --version`: print `text` and accept nothing else.
    pub fn version(text: &str) -> Self {
        Opt::new('V')
            .long("version")
            .excludes("*")
            .hook(OptionHook::Version(text.to_string()))
            .paramv(ParamTable::none())
            .help("print version")
    }

    /// `-n, --dryrun`: count into an `i32`.
    pub fn dryrun() -> Self {
        Opt::new('n')
            .long("dryrun")
            .convert(convert::incr())
            .dst(0i32)
            .help("trace execution but do not change anything")
    }

    /// `-C, --conf FILE`: open a configuration file for reading.
    pub fn conf() -> Self {
        Opt::new('C')
            .long("conf")
            .arg_description("conf")
            .convert(convert::fopen("r"))
            .dst(Value::file())
            .help("specify a configuration file")
    }

    /// `-h, --help`: print usage and help, accepting only `-v` alongside.
    pub fn help_option() -> Self {
        Opt::new('h')
            .long("help")
            .excludes("^v")
            .hook(OptionHook::Help)
            .paramv(ParamTable::none())
            .help("print this help list")
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn optopt(&self) -> char {
        self.optopt
    }

    /// Whether the tag can be given in short form (and shown in usage).
    pub fn is_printable(&self) -> bool {
        self.optopt.is_ascii_graphic()
    }

    pub fn longopt(&self) -> Option<&str> {
        self.longopt.as_deref()
    }

    /// The argument name, unless the converter takes no argument.
    pub fn argname(&self) -> Option<&str> {
        match &self.convert {
            Some(c) if !c.takes_arg() => None,
            _ => self.argname.as_deref(),
        }
    }

    pub fn takes_arg(&self) -> bool {
        self.argname().is_some()
    }

    pub fn exclusions(&self) -> Option<&Excludes> {
        self.excludes.as_ref()
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

    pub fn before_hook(&self) -> Option<&OptionCallback> {
        self.before.as_ref()
    }

    pub fn after_hook(&self) -> Option<&OptionHook> {
        self.after.as_ref()
    }

    pub fn params(&self) -> Option<&Arc<ParamTable>> {
        self.paramv.as_ref()
    }

    pub fn is_help(&self) -> bool {
        matches!(self.after, Some(OptionHook::Help))
    }

    pub(crate) fn option_name(&self, long: bool) -> String {
        match (long, self.longopt()) {
            (true, Some(name)) => format!("--{}", name),
            _ => format!("-{}", self.optopt),
        }
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt")
            .field("optopt", &self.optopt)
            .field("longopt", &self.longopt)
            .field("argname", &self.argname)
            .field("excludes", &self.excludes)
            .field("after", &self.after)
            .field("paramv", &self.paramv.as_ref().map(|p| p.len()))
            .finish()
    }
}

// ============================================================================
// OptionTable
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct OptionTable {
    options: Vec<Opt>,
}

impl OptionTable {
    pub fn new() -> Self {
        OptionTable {
            options: Vec::new(),
        }
    }

    pub fn option(mut self, opt: Opt) -> Self {
        self.options.push(opt);
        self
    }

    pub fn find(&self, optopt: char) -> Option<&Opt> {
        self.options.iter().find(|o| o.optopt == optopt)
    }

    pub fn position(&self, optopt: char) -> Option<usize> {
        self.options.iter().position(|o| o.optopt == optopt)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Opt> {
        self.options.iter()
    }

    pub fn as_slice(&self) -> &[Opt] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Tag of the option bound to the help renderer, if any.
    pub fn help_tag(&self) -> Option<char> {
        self.options.iter().find(|o| o.is_help()).map(|o| o.optopt)
    }
}

impl<'a> IntoIterator for &'a OptionTable {
    type Item = &'a Opt;
    type IntoIter = std::slice::Iter<'a, Opt>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}
