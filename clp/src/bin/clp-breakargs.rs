// Read lines from stdin and show how each one breaks into arguments.
// Blank lines and lines starting with '#' are skipped.

use std::io::{self, BufRead};

use clp::{breakargs, convert, Opt, OptionTable, Parser, Value};

fn main() {
    env_logger::init();

    let options = OptionTable::new().option(Opt::help_option()).option(
        Opt::new('d')
            .arg_description("delims")
            .convert(convert::string())
            .dst(Value::string())
            .help("specify the delimiter characters"),
    );

    let args: Vec<String> = std::env::args().collect();
    let m = match Parser::new().options(&options).report(true).parse(&args) {
        Ok(m) => m,
        Err(e) => std::process::exit(e.exit_code()),
    };

    if m.given('h') > 0 {
        return;
    }

    let delims: Option<String> = m.get('d').unwrap_or_default();

    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{}: {}", m.basename(), e);
                std::process::exit(clp::error::EX_IOERR);
            }
        };
        let lineno = n + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match breakargs(&line, delims.as_deref()) {
            Ok(words) => {
                println!("{:4}: nargc={}", lineno, words.len());
                for (i, w) in words.iter().enumerate() {
                    println!("{:4}: {:4} [{}]", lineno, i, w);
                }
                println!();
            }
            Err(e) => println!("{:4}: rc={} {}", lineno, e.exit_code(), e),
        }
    }
}
