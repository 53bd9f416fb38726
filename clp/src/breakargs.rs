//! Split one text line into an argument vector.

use crate::error::{Error, Result};

/// Break `line` into arguments.
///
/// A backslash takes the next character literally.  Double quotes group
/// text unless inside single quotes, and vice versa; the quote characters
/// themselves are dropped.  Arguments are separated by white space, or by
/// any character of `delims` when given.  Empty arguments are elided.
pub fn breakargs(line: &str, delims: Option<&str>) -> Result<Vec<String>> {
    let is_delim = |c: char| match delims {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    };

    let mut args = Vec::new();
    let mut cur = String::new();
    let mut dquote = false;
    let mut squote = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    cur.push(next);
                }
            }
            '"' if !squote => dquote = !dquote,
            '\'' if !dquote => squote = !squote,
            c if !dquote && !squote && is_delim(c) => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }

    if dquote {
        return Err(Error::DataFormat("unterminated double quote".into()));
    }
    if squote {
        return Err(Error::DataFormat("unterminated single quote".into()));
    }
    if !cur.is_empty() {
        args.push(cur);
    }

    Ok(args)
}
