//! Usage lines and help text.

use std::fmt::Write;

use log::debug;

use crate::exclude::{excludes2, exclusion_groups};
use crate::option::{Opt, OptionTable};
use crate::param::ParamTable;

/// Render one usage line, newline included.
///
/// Without `limit` the line covers the options that do not select their
/// own positional table, followed by `params`.  With `limit` it covers
/// `-limit` together with every option it does not exclude, followed by
/// the limit's own positional table; a limit without one renders nothing.
///
/// Options are grouped as `[-abc]` flags, then `[-x arg]` for each option
/// taking an argument, then one `[-a|-b]` cluster per exclusion group.
pub fn usage_line(
    basename: &str,
    options: &OptionTable,
    params: Option<&ParamTable>,
    limit: Option<&Opt>,
) -> Option<String> {
    let params = match limit {
        Some(l) => Some(&**l.params()?),
        None => params,
    };

    let mut flags = String::new();
    let mut with_args: Vec<&Opt> = Vec::new();
    let mut exclusive: Vec<char> = Vec::new();

    for o in options {
        match limit {
            Some(l) if excludes2(l, o) => continue,
            None if o.params().is_some() => continue,
            _ => {}
        }
        if limit.is_some_and(|l| l.optopt() == o.optopt()) || !o.is_printable() {
            continue;
        }

        if o.exclusions().is_some() {
            exclusive.push(o.optopt());
        } else if o.argname().is_some() {
            with_args.push(o);
        } else {
            flags.push(o.optopt());
        }
    }

    debug!(
        "usage for -{}: excludes {:?} optarg {} opt {:?}",
        limit.map_or('?', |l| l.optopt()),
        exclusive,
        with_args.len(),
        flags
    );

    let mut line = format!("usage: {}", basename);
    if let Some(l) = limit {
        let _ = write!(line, " -{}", l.optopt());
    }
    if !flags.is_empty() {
        let _ = write!(line, " [-{}]", flags);
    }
    for o in &with_args {
        let _ = write!(line, " [-{} {}]", o.optopt(), o.argname().unwrap_or_default());
    }
    for group in exclusion_groups(options, &exclusive) {
        let cluster: Vec<String> = group.iter().map(|c| format!("-{}", c)).collect();
        let _ = write!(line, " [{}]", cluster.join("|"));
    }

    if let Some(pv) = params {
        let mut open = 0;
        for (i, p) in pv.iter().enumerate() {
            if p.is_optional() {
                open += 1;
                let _ = write!(line, " [{}", p.display_name());
            } else {
                let _ = write!(line, " {}", p.display_name());
            }

            let next_optional = pv.get(i + 1).is_some_and(|n| n.is_optional());
            if !next_optional {
                line.extend(std::iter::repeat(']').take(open));
                open = 0;
            }
        }
    }

    line.push('\n');
    Some(line)
}

/// Help sort order: case-insensitive, lowercase before uppercase.
fn help_order(o: &Opt) -> (char, bool) {
    let c = o.optopt();
    (c.to_ascii_lowercase(), c.is_ascii_uppercase())
}

/// Render the full help text: the default usage line, a usage line for
/// each documented option that has its own positional table, one line per
/// documented option, one line per default positional parameter, and a
/// trailing blank line.
///
/// In `longhelp` mode option lines include long names, and options whose
/// tag cannot be given in short form are listed too.
pub fn help_text(
    basename: &str,
    options: &OptionTable,
    params: Option<&ParamTable>,
    longhelp: bool,
) -> String {
    let mut sorted: Vec<&Opt> = options.iter().collect();
    sorted.sort_by_key(|o| help_order(o));

    let mut out = usage_line(basename, options, params, None).unwrap_or_default();

    let mut width = 0;
    for o in sorted.iter().filter(|o| o.help_text().is_some()) {
        if let Some(line) = usage_line(basename, options, params, Some(*o)) {
            out.push_str(&line);
        }

        let mut len = o.argname().map_or(0, |a| a.len() + 1);
        if longhelp {
            len += o.longopt().map_or(0, |l| l.len() + 4);
        }
        width = width.max(len);
    }

    for o in &sorted {
        let help = match o.help_text() {
            Some(h) => h,
            None => continue,
        };
        if !o.is_printable() && !longhelp {
            continue;
        }

        let mut buf = String::new();
        if let (true, Some(long)) = (longhelp, o.longopt()) {
            if o.is_printable() {
                buf.push(',');
            }
            let _ = write!(buf, " --{}", long);
        }
        if let Some(arg) = o.argname() {
            let _ = write!(buf, " {}", arg);
        }

        if o.is_printable() {
            let _ = writeln!(out, "-{}{:<width$}  {}", o.optopt(), buf, help);
        } else {
            let _ = writeln!(out, "   {:<width$}  {}", buf, help);
        }
    }

    if let Some(pv) = params {
        let width = pv.iter().map(|p| p.display_name().len()).max().unwrap_or(0);
        for p in pv {
            let _ = writeln!(
                out,
                "{:<width$}  {}",
                p.display_name(),
                p.help_text().unwrap_or_default()
            );
        }
    }

    out.push('\n');
    out
}
