//! A getopt_long(3)-style scanner over an argument vector.
//!
//! The scanner is configured exactly like its C counterpart: an option
//! string (`"+:ab:c"`) plus a table of long options.  It never permutes
//! the argument vector; scanning stops at the first non-option, at a lone
//! `-`, or after a `--` terminator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasArg {
    No,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongOpt {
    pub name: String,
    pub has_arg: HasArg,
    pub val: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    Opt {
        val: char,
        optarg: Option<String>,
        longidx: Option<usize>,
    },
    /// Unrecognized option character or name ('?').
    Unknown,
    /// Recognized option without its required argument (':').
    MissingArg,
}

/// One scanner step: what was found and the index of the token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub curind: usize,
    pub found: Found,
}

pub struct Getopt<'a> {
    args: &'a [String],
    optstring: &'a str,
    longopts: &'a [LongOpt],
    optind: usize,
    nextchar: usize,
    colon: bool,
}

impl<'a> Getopt<'a> {
    /// Scanning starts at `args[1]`; `args[0]` is the program name.
    pub fn new(args: &'a [String], optstring: &'a str, longopts: &'a [LongOpt]) -> Self {
        let flags = optstring.trim_start_matches(['+', '-']);
        Getopt {
            args,
            optstring,
            longopts,
            optind: 1,
            nextchar: 0,
            colon: flags.starts_with(':'),
        }
    }

    /// Index of the first argument not yet consumed.
    pub fn optind(&self) -> usize {
        self.optind.min(self.args.len())
    }

    fn short_spec(&self, c: char) -> Option<HasArg> {
        if c == ':' || c == '+' || c == '-' {
            return None;
        }
        let pos = self.optstring.find(c)?;
        if self.optstring[pos + c.len_utf8()..].starts_with(':') {
            Some(HasArg::Required)
        } else {
            Some(HasArg::No)
        }
    }

    fn missing(&self) -> Found {
        if self.colon {
            Found::MissingArg
        } else {
            Found::Unknown
        }
    }

    fn advance(&mut self) {
        self.optind += 1;
        self.nextchar = 0;
    }

    fn long(&mut self, body: &'a str) -> Found {
        let args = self.args;
        self.advance();

        let (name, value) = match body.split_once('=') {
            Some((n, v)) => (n, Some(v)),
            None => (body, None),
        };

        let idx = match self.longopts.iter().position(|l| l.name == name) {
            Some(i) => i,
            None => {
                let candidates: Vec<usize> = self
                    .longopts
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| l.name.starts_with(name))
                    .map(|(i, _)| i)
                    .collect();
                let first = match candidates.first() {
                    Some(&i) => i,
                    None => return Found::Unknown,
                };
                let same = candidates.iter().all(|&i| {
                    self.longopts[i].val == self.longopts[first].val
                        && self.longopts[i].has_arg == self.longopts[first].has_arg
                });
                if name.is_empty() || !same {
                    return Found::Unknown;
                }
                first
            }
        };

        let lo = &self.longopts[idx];
        let optarg = match (lo.has_arg, value) {
            (HasArg::No, Some(_)) => return Found::Unknown,
            (HasArg::No, None) => None,
            (HasArg::Required, Some(v)) => Some(v.to_string()),
            (HasArg::Required, None) => match args.get(self.optind) {
                Some(v) => {
                    self.optind += 1;
                    Some(v.clone())
                }
                None => return self.missing(),
            },
        };

        Found::Opt {
            val: lo.val,
            optarg,
            longidx: Some(idx),
        }
    }
}

impl<'a> Iterator for Getopt<'a> {
    type Item = Scan;

    fn next(&mut self) -> Option<Scan> {
        let args = self.args;

        if self.nextchar == 0 {
            let arg = args.get(self.optind)?;
            if arg == "--" {
                self.optind += 1;
                return None;
            }
            if !arg.starts_with('-') || arg == "-" {
                return None;
            }
            if let Some(body) = arg.strip_prefix("--") {
                let curind = self.optind;
                let found = self.long(body);
                return Some(Scan { curind, found });
            }
            self.nextchar = 1;
        }

        let curind = self.optind;
        let arg = &args[curind];
        let c = arg[self.nextchar..].chars().next()?;
        self.nextchar += c.len_utf8();
        let at_end = self.nextchar >= arg.len();

        let found = match self.short_spec(c) {
            None => {
                if at_end {
                    self.advance();
                }
                Found::Unknown
            }
            Some(HasArg::No) => {
                if at_end {
                    self.advance();
                }
                Found::Opt {
                    val: c,
                    optarg: None,
                    longidx: None,
                }
            }
            Some(HasArg::Required) => {
                let optarg = if !at_end {
                    let v = arg[self.nextchar..].to_string();
                    self.advance();
                    Some(v)
                } else {
                    self.advance();
                    match args.get(self.optind) {
                        Some(v) => {
                            self.optind += 1;
                            Some(v.clone())
                        }
                        None => None,
                    }
                };
                match optarg {
                    Some(v) => Found::Opt {
                        val: c,
                        optarg: Some(v),
                        longidx: None,
                    },
                    None => self.missing(),
                }
            }
        };

        Some(Scan { curind, found })
    }
}
