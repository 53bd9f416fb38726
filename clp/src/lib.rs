//! Declarative command-line option and positional parameter parsing.
//!
//! Programs describe their command line with two tables and get back a
//! per-parse [`Matches`]:
//! - an [`OptionTable`] of [`Opt`] descriptors (short tag, optional long
//!   name, argument name, converter, exclusions, hooks, and an optional
//!   positional table the option switches to);
//! - a [`ParamTable`] of [`Param`] positional parameters whose names
//!   encode multiplicity (`name`, `[name]`, `name...`, `[name...]`).
//!
//! Values are read back with `matches.get::<T>('x')` and
//! `matches.param::<T>("name")`; the tables themselves are never modified,
//! so one set of tables serves any number of parses on any thread.
//!
//! ```no_run
//! use clp::{convert, parsev, Opt, OptionTable, Param, ParamTable};
//!
//! let options = OptionTable::new()
//!     .option(Opt::verbose())
//!     .option(Opt::help_option())
//!     .option(
//!         Opt::new('i')
//!             .arg_description("int")
//!             .convert(convert::number::<i32>())
//!             .dst(0i32)
//!             .help("specify an integer"),
//!     );
//! let params = ParamTable::new().param(Param::new("src...")).param(Param::new("dst"));
//!
//! let args: Vec<String> = std::env::args().collect();
//! match parsev(&args, Some(&options), Some(&params)) {
//!     Ok(m) => println!("{} sources", m.param_args("src...").len()),
//!     Err(e) => std::process::exit(e.exit_code()),
//! }
//! ```

pub mod breakargs;
pub mod convert;
pub mod error;
pub mod exclude;
pub mod getopt;
pub mod option;
pub mod param;
pub mod parse;
pub mod usage;
pub mod value;

pub use breakargs::breakargs;
pub use convert::{Convert, ConvertError};
pub use error::{Error, Result};
pub use option::{Excludes, Opt, OptionHook, OptionTable};
pub use param::{Param, ParamTable, POSMAX_UNBOUNDED};
pub use parse::{
    basename, parsel, parsev, Clp, Matches, OptionEvent, OptionState, ParamEvent, ParamMatch,
    Parser,
};
pub use value::{FromValue, IntoValue, Value};
