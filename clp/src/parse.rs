//! The parse engine.
//!
//! A parse runs in phases:
//! - validate the tables and build the scanner configuration;
//! - call every option's `before` hook;
//! - scan options, checking exclusions and converting arguments;
//! - check the positional argument count against the active table;
//! - call the `after` hook of every option that was given;
//! - distribute the remaining arguments over the positional parameters,
//!   convert them, and call the parameter hooks.
//!
//! Tables are never modified.  Everything a parse produces lands in the
//! returned [`Matches`].

use log::{debug, trace, warn};

use crate::breakargs::breakargs;
use crate::convert::ConvertError;
use crate::error::{Error, Result};
use crate::exclude::find_excluding;
use crate::getopt::{Found, Getopt, HasArg, LongOpt};
use crate::option::{Opt, OptionHook, OptionTable};
use crate::param::{Param, ParamTable};
use crate::usage;
use crate::value::{FromValue, Value};

// ============================================================================
// Per-parse state
// ============================================================================

/// What a parse recorded for one option.
#[derive(Debug, Clone)]
pub struct OptionState {
    given: usize,
    optarg: Option<String>,
    longidx: Option<usize>,
    value: Option<Value>,
}

impl OptionState {
    fn new(option: &Opt) -> Self {
        OptionState {
            given: 0,
            optarg: None,
            longidx: None,
            value: option.initial().cloned(),
        }
    }

    /// Number of times the option was given.
    pub fn given(&self) -> usize {
        self.given
    }

    /// Argument of the last occurrence.
    pub fn optarg(&self) -> Option<&str> {
        self.optarg.as_deref()
    }

    /// Index into the long option table if the last occurrence was long.
    pub fn longidx(&self) -> Option<usize> {
        self.longidx
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// What a parse recorded for one positional parameter of the active table.
#[derive(Debug, Clone)]
pub struct ParamMatch {
    name: String,
    display: String,
    posmin: usize,
    posmax: usize,
    args: Vec<String>,
    value: Option<Value>,
}

impl ParamMatch {
    fn new(param: &Param) -> Self {
        ParamMatch {
            name: param.name().to_string(),
            display: param.display_name().to_string(),
            posmin: param.posmin(),
            posmax: param.posmax(),
            args: Vec::new(),
            value: param.initial().cloned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display
    }

    pub fn posmin(&self) -> usize {
        self.posmin
    }

    pub fn posmax(&self) -> usize {
        self.posmax
    }

    /// Arguments claimed by this parameter.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

// ============================================================================
// Hook context
// ============================================================================

/// The parse in progress, as seen from a hook.
pub struct Clp<'a> {
    basename: &'a str,
    options: &'a OptionTable,
    default_params: Option<&'a ParamTable>,
    active: Option<&'a ParamTable>,
    opthelp: Option<char>,
    states: &'a [OptionState],
}

impl<'a> Clp<'a> {
    pub fn basename(&self) -> &str {
        self.basename
    }

    pub fn options(&self) -> &OptionTable {
        self.options
    }

    /// The positional table selected by the options given so far.
    pub fn params(&self) -> Option<&ParamTable> {
        self.active
    }

    pub fn help_tag(&self) -> Option<char> {
        self.opthelp
    }

    pub fn state(&self, tag: char) -> Option<&OptionState> {
        self.options.position(tag).and_then(|i| self.states.get(i))
    }

    pub fn given(&self, tag: char) -> usize {
        self.state(tag).map_or(0, |s| s.given)
    }

    /// True if the help option was given by its long name.
    pub fn is_longhelp(&self) -> bool {
        self.opthelp
            .and_then(|tag| self.state(tag))
            .is_some_and(|s| s.longidx.is_some())
    }

    /// The usage line for `limit`, or the default usage line.
    pub fn usage(&self, limit: Option<&Opt>) -> Option<String> {
        usage::usage_line(self.basename, self.options, self.default_params, limit)
    }

    /// Usage lines followed by one line of help per option and parameter.
    pub fn help(&self) -> String {
        usage::help_text(
            self.basename,
            self.options,
            self.default_params,
            self.is_longhelp(),
        )
    }
}

/// Passed to an option's `before` and `after` hooks.
pub struct OptionEvent<'a> {
    pub clp: &'a Clp<'a>,
    pub option: &'a Opt,
    pub state: &'a OptionState,
}

/// Passed to a positional parameter's `before` and `after` hooks.
pub struct ParamEvent<'a> {
    pub clp: &'a Clp<'a>,
    pub param: &'a Param,
    pub args: &'a [String],
    pub value: Option<&'a Value>,
}

// ============================================================================
// Matches
// ============================================================================

/// The result of a successful parse.
#[derive(Debug, Clone, Default)]
pub struct Matches {
    argv: Vec<String>,
    basename: String,
    optind: usize,
    tags: Vec<char>,
    options: Vec<OptionState>,
    params: Vec<ParamMatch>,
    param_errors: Vec<String>,
}

impl Matches {
    fn option(&self, tag: char) -> Option<&OptionState> {
        self.tags
            .iter()
            .position(|&t| t == tag)
            .and_then(|i| self.options.get(i))
    }

    fn param_match(&self, name: &str) -> Option<&ParamMatch> {
        self.params
            .iter()
            .find(|p| p.name == name || p.display == name)
    }

    pub fn given(&self, tag: char) -> usize {
        self.option(tag).map_or(0, |s| s.given)
    }

    pub fn optarg(&self, tag: char) -> Option<&str> {
        self.option(tag).and_then(|s| s.optarg())
    }

    pub fn longidx(&self, tag: char) -> Option<usize> {
        self.option(tag).and_then(|s| s.longidx)
    }

    pub fn state(&self, tag: char) -> Option<&OptionState> {
        self.option(tag)
    }

    /// The option's destination value, converted to `T`.
    pub fn get<T: FromValue>(&self, tag: char) -> Result<T> {
        let state = self
            .option(tag)
            .ok_or_else(|| Error::Software(format!("no such option -{}", tag)))?;
        let value = state
            .value
            .as_ref()
            .ok_or_else(|| Error::Software(format!("option -{} has no destination", tag)))?;
        T::from_value(value)
    }

    /// The parameter's destination value, converted to `T`.
    pub fn param<T: FromValue>(&self, name: &str) -> Result<T> {
        let pm = self
            .param_match(name)
            .ok_or_else(|| Error::Software(format!("no such parameter {}", name)))?;
        let value = pm
            .value
            .as_ref()
            .ok_or_else(|| Error::Software(format!("parameter {} has no destination", name)))?;
        T::from_value(value)
    }

    /// Arguments claimed by the named parameter of the active table.
    pub fn param_args(&self, name: &str) -> &[String] {
        self.param_match(name).map_or(&[], |p| p.args())
    }

    /// The active positional parameters, in table order.
    pub fn params(&self) -> &[ParamMatch] {
        &self.params
    }

    /// Index of the first argument that is not an option.
    pub fn optind(&self) -> usize {
        self.optind
    }

    /// The arguments after the options.
    pub fn rest(&self) -> &[String] {
        self.argv.get(self.optind..).unwrap_or(&[])
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Positional conversions that failed; the parse carries on past them.
    pub fn param_errors(&self) -> &[String] {
        &self.param_errors
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Configures and runs a parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser<'t> {
    options: Option<&'t OptionTable>,
    params: Option<&'t ParamTable>,
    report: bool,
}

impl<'t> Parser<'t> {
    pub fn new() -> Self {
        Parser::default()
    }

    pub fn options(mut self, options: &'t OptionTable) -> Self {
        self.options = Some(options);
        self
    }

    /// Default positional parameters.  Without them, positional arguments
    /// are left to the caller (see [`Matches::rest`]).
    pub fn params(mut self, params: &'t ParamTable) -> Self {
        self.params = Some(params);
        self
    }

    /// Print `basename: message` to stderr when the parse fails.
    pub fn report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> Result<Matches> {
        let argv: Vec<String> = args.iter().map(|s| s.as_ref().to_string()).collect();
        let name = argv.first().map(|a| basename(a).to_string());

        let res = run(self.options, self.params, argv);
        if let Err(ref e) = res {
            self.eprint(name.as_deref(), e);
        }
        res
    }

    /// Split `line` with [`breakargs`] and parse the result.  The first
    /// word plays the part of the program name.
    pub fn parse_line(&self, line: &str, delims: Option<&str>) -> Result<Matches> {
        match breakargs(line, delims) {
            Ok(argv) => self.parse(&argv),
            Err(e) => {
                self.eprint(None, &e);
                Err(e)
            }
        }
    }

    fn eprint(&self, name: Option<&str>, e: &Error) {
        if self.report {
            eprintln!("{}: {}", name.unwrap_or("clp"), e);
        }
    }
}

/// Parse `args` (program name first), reporting errors to stderr.
pub fn parsev<S: AsRef<str>>(
    args: &[S],
    options: Option<&OptionTable>,
    params: Option<&ParamTable>,
) -> Result<Matches> {
    parser(options, params).parse(args)
}

/// Split `line` into arguments and parse them, reporting errors to stderr.
pub fn parsel(
    line: &str,
    delims: Option<&str>,
    options: Option<&OptionTable>,
    params: Option<&ParamTable>,
) -> Result<Matches> {
    parser(options, params).parse_line(line, delims)
}

fn parser<'t>(options: Option<&'t OptionTable>, params: Option<&'t ParamTable>) -> Parser<'t> {
    Parser {
        options,
        params,
        report: true,
    }
}

/// The final path component of `argv0`.
pub fn basename(argv0: &str) -> &str {
    argv0.rsplit('/').next().unwrap_or(argv0)
}

// ============================================================================
// Engine
// ============================================================================

/// Scanner configuration derived from an option table.
struct Config {
    optstring: String,
    longopts: Vec<LongOpt>,
    opthelp: Option<char>,
}

fn validate_params(params: &ParamTable) -> Result<()> {
    for p in params {
        if p.display_name().is_empty() {
            return Err(Error::DataFormat(format!(
                "positional parameter '{}' has an empty name",
                p.name()
            )));
        }
        if p.converter().is_some() && p.initial().is_none() {
            return Err(Error::DataFormat(format!(
                "positional parameter {} has a converter but no destination",
                p.display_name()
            )));
        }
    }
    Ok(())
}

impl Config {
    fn build(options: &OptionTable, params: Option<&ParamTable>) -> Result<Config> {
        let mut opthelp = None;

        for (i, o) in options.iter().enumerate() {
            let tag = o.optopt();
            if tag == '\0' {
                return Err(Error::DataFormat("option tag must not be NUL".into()));
            }
            if options.iter().take(i).any(|p| p.optopt() == tag) {
                return Err(Error::DataFormat(format!("duplicate option -{}", tag)));
            }
            if o.argname().is_some() && o.converter().is_none() {
                return Err(Error::DataFormat(format!(
                    "option -{} has an argument name but no converter",
                    tag
                )));
            }
            if o.converter().is_some_and(|c| c.takes_arg()) && o.argname().is_none() {
                return Err(Error::DataFormat(format!(
                    "option -{} has a converter but no argument name",
                    tag
                )));
            }
            if o.converter().is_some() && o.initial().is_none() {
                return Err(Error::DataFormat(format!(
                    "option -{} has a converter but no destination",
                    tag
                )));
            }
            if o.is_help() {
                if let Some(prev) = opthelp {
                    return Err(Error::DataFormat(format!(
                        "options -{} and -{} both print help",
                        prev, tag
                    )));
                }
                opthelp = Some(tag);
            }
            if let Some(pv) = o.params() {
                validate_params(pv)?;
            }
        }

        if let Some(pv) = params {
            validate_params(pv)?;
        }

        let mut optstring = String::new();
        optstring.try_reserve(2 + options.len() * 2)?;
        let mut longopts = Vec::new();
        longopts.try_reserve(options.len())?;

        optstring.push_str("+:");
        for o in options {
            if o.is_printable() {
                optstring.push(o.optopt());
                if o.takes_arg() {
                    optstring.push(':');
                }
            }
            if let Some(name) = o.longopt() {
                longopts.push(LongOpt {
                    name: name.to_string(),
                    has_arg: if o.takes_arg() {
                        HasArg::Required
                    } else {
                        HasArg::No
                    },
                    val: o.optopt(),
                });
            }
        }

        debug!(
            "optstring {:?}, {} long options, help {:?}",
            optstring,
            longopts.len(),
            opthelp
        );

        Ok(Config {
            optstring,
            longopts,
            opthelp,
        })
    }

    fn usehelp(&self) -> String {
        match self.opthelp {
            Some(tag) => format!(", use -{} for help", tag),
            None => String::new(),
        }
    }
}

fn convert_error(option: &Opt, long: bool, optarg: Option<&str>, e: ConvertError) -> Error {
    let what = match optarg {
        Some(arg) => format!("{} {}", option.option_name(long), arg),
        None => option.option_name(long),
    };
    let message = format!("unable to convert '{}': {}", what, e);

    match e {
        ConvertError::Open(source) => Error::Io { message, source },
        ConvertError::Usage(_) => Error::Usage(message),
        _ => Error::DataFormat(message),
    }
}

/// Split `argc` arguments over `params`, left to right.
///
/// A mandatory parameter always takes one argument; an optional one takes
/// one only while more arguments remain than are needed by the mandatory
/// parameters still to come.  The first variadic parameter to qualify
/// takes every argument not reserved for those mandatory parameters.
fn distribute(params: &[ParamMatch], argc: usize) -> Vec<usize> {
    let mut posmin: usize = params.iter().map(|p| p.posmin).sum();
    let mut left = argc;
    let mut counts = vec![0; params.len()];

    for (p, count) in params.iter().zip(counts.iter_mut()) {
        if left == 0 {
            break;
        }

        if p.posmin == 1 {
            *count = 1;
            if p.posmax > 1 {
                *count += left.saturating_sub(posmin);
            }
            posmin = posmin.saturating_sub(1);
        } else if left > posmin {
            *count = if p.posmax > 1 { left - posmin } else { 1 };
        }

        debug!(
            "left={} posmin={} param={} {},{},{}",
            left, posmin, p.name, p.posmin, p.posmax, *count
        );

        left -= (*count).min(left);
    }

    if left > 0 {
        debug!("args left over: {} posmin={}", left, posmin);
    }

    counts
}

fn run(
    options: Option<&OptionTable>,
    default_params: Option<&ParamTable>,
    argv: Vec<String>,
) -> Result<Matches> {
    let argv0 = match argv.first() {
        Some(a) => a.clone(),
        None => return Ok(Matches::default()),
    };
    let basename = basename(&argv0);

    let empty = OptionTable::new();
    let options = options.unwrap_or(&empty);
    let config = Config::build(options, default_params)?;
    let usehelp = config.usehelp();

    let mut states: Vec<OptionState> = options.iter().map(OptionState::new).collect();
    let mut active = default_params;

    {
        let clp = Clp {
            basename,
            options,
            default_params,
            active,
            opthelp: config.opthelp,
            states: &states,
        };
        for (o, state) in options.iter().zip(states.iter()) {
            if let Some(before) = o.before_hook() {
                before(&OptionEvent {
                    clp: &clp,
                    option: o,
                    state,
                });
            }
        }
    }

    let mut getopt = Getopt::new(&argv, &config.optstring, &config.longopts);

    for scan in getopt.by_ref() {
        let token = &argv[scan.curind];

        let (tag, optarg, longidx) = match scan.found {
            Found::Unknown => {
                return Err(Error::Usage(format!(
                    "invalid option {}{}",
                    token, usehelp
                )));
            }
            Found::MissingArg => {
                return Err(Error::Usage(format!(
                    "option {} requires a parameter{}",
                    token, usehelp
                )));
            }
            Found::Opt {
                val,
                optarg,
                longidx,
            } => (val, optarg, longidx),
        };

        let idx = options.position(tag).ok_or_else(|| {
            Error::Software(format!("program error: unexpected option {}", token))
        })?;
        let o = &options.as_slice()[idx];

        let given: Vec<usize> = states.iter().map(|s| s.given).collect();
        if let Some(x) = find_excluding(options.as_slice(), &given, o, 1) {
            return Err(Error::Usage(format!(
                "option -{} excludes -{}{}",
                x.optopt(),
                tag,
                usehelp
            )));
        }

        trace!("option -{} optarg {:?} longidx {:?}", tag, optarg, longidx);

        let state = &mut states[idx];
        state.longidx = longidx;
        state.optarg = optarg;
        state.given += 1;

        if let Some(pv) = o.params() {
            active = Some(&**pv);
        }

        if let (Some(c), Some(value)) = (o.converter(), state.value.as_mut()) {
            let text = state.optarg.as_deref().unwrap_or("");
            if let Err(e) = c.convert(text, value) {
                return Err(convert_error(
                    o,
                    longidx.is_some(),
                    state.optarg.as_deref(),
                    e,
                ));
            }
        }
    }

    let optind = getopt.optind();
    let posargs = &argv[optind..];

    if let Some(pv) = active {
        let (posmin, posmax) = pv.minmax();
        if posargs.len() < posmin {
            return Err(Error::Usage(format!(
                "mandatory positional parameters required{}",
                usehelp
            )));
        }
        if posargs.len() > posmax {
            return Err(Error::Usage(format!(
                "extraneous positional parameters detected{}",
                usehelp
            )));
        }
    }

    let clp = Clp {
        basename,
        options,
        default_params,
        active,
        opthelp: config.opthelp,
        states: &states,
    };

    for (o, state) in options.iter().zip(states.iter()) {
        if state.given == 0 {
            continue;
        }
        match o.after_hook() {
            Some(OptionHook::Help) => print!("{}", clp.help()),
            Some(OptionHook::Version(text)) => println!("{}", text),
            Some(OptionHook::Call(after)) => after(&OptionEvent {
                clp: &clp,
                option: o,
                state,
            }),
            None => {}
        }
    }

    let mut params: Vec<ParamMatch> = Vec::new();
    let mut param_errors = Vec::new();

    if let Some(pv) = active {
        params = pv.iter().map(ParamMatch::new).collect();

        for (p, pm) in pv.iter().zip(params.iter()) {
            if let Some(before) = p.before_hook() {
                before(&ParamEvent {
                    clp: &clp,
                    param: p,
                    args: &[],
                    value: pm.value.as_ref(),
                });
            }
        }

        let counts = distribute(&params, posargs.len());
        let mut rest = posargs;
        for (pm, n) in params.iter_mut().zip(counts) {
            let (mine, tail) = rest.split_at(n.min(rest.len()));
            pm.args = mine.to_vec();
            rest = tail;
        }

        for (p, pm) in pv.iter().zip(params.iter_mut()) {
            let (c, value) = match (p.converter(), pm.value.as_mut()) {
                (Some(c), Some(value)) => (c, value),
                _ => continue,
            };
            for arg in &pm.args {
                if let Err(e) = c.convert(arg, value) {
                    let msg = format!("unable to convert {} '{}': {}", pm.display, arg, e);
                    warn!("{}", msg);
                    param_errors.push(msg);
                }
            }
        }

        for (p, pm) in pv.iter().zip(params.iter()) {
            if pm.args.is_empty() {
                continue;
            }
            if let Some(after) = p.after_hook() {
                after(&ParamEvent {
                    clp: &clp,
                    param: p,
                    args: &pm.args,
                    value: pm.value.as_ref(),
                });
            }
        }
    }

    let matches = Matches {
        basename: basename.to_string(),
        optind,
        tags: options.iter().map(|o| o.optopt()).collect(),
        options: states,
        params,
        param_errors,
        argv,
    };

    Ok(matches)
}
