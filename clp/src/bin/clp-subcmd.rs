// Sub-command dispatch: the top-level table takes the standard options and
// a `cmd...` parameter whose converter picks the sub-command.  The residual
// arguments are then parsed again with the sub-command's own tables.

use clp::{convert, ConvertError, Opt, OptionTable, Param, ParamTable, Parser, Value};

const SUBCMDS: [(&str, &str, &str); 3] = [
    ("foo", "do foo action...", "files..."),
    ("bar", "do bar action...", "[files...]"),
    ("baz", "do baz action...", "[file]"),
];

fn std_options() -> OptionTable {
    OptionTable::new()
        .option(Opt::verbose())
        .option(Opt::version(env!("CARGO_PKG_VERSION")))
        .option(Opt::dryrun())
        .option(Opt::help_option())
}

fn select(text: &str, dst: &mut Value) -> Result<(), ConvertError> {
    match dst {
        // Only the first argument names the sub-command.
        Value::Str(Some(_)) => Ok(()),
        Value::Str(slot) => {
            let (name, _, _) = SUBCMDS
                .iter()
                .find(|(name, _, _)| name.eq_ignore_ascii_case(text))
                .ok_or_else(|| ConvertError::Usage(format!("unknown subcommand {}", text)))?;
            *slot = Some(name.to_string());
            Ok(())
        }
        _ => Err(ConvertError::Other("subcommand cell must hold a string".into())),
    }
}

fn main() {
    env_logger::init();

    let options = std_options();
    let params = ParamTable::new().param(
        Param::new("cmd...")
            .help("subcommand to run")
            .convert(convert::custom(select))
            .dst(Value::string()),
    );

    let args: Vec<String> = std::env::args().collect();
    let parser = Parser::new().options(&options).params(&params).report(true);
    let m = match parser.parse(&args) {
        Ok(m) => m,
        Err(e) => std::process::exit(e.exit_code()),
    };

    if m.given('V') > 0 {
        return;
    }
    if m.given('h') > 0 {
        for (name, help, _) in SUBCMDS {
            println!("{:<4}  {}", name, help);
        }
        println!();
        return;
    }

    if let Some(err) = m.param_errors().first() {
        eprintln!("{}: {}", m.basename(), err);
        std::process::exit(clp::error::EX_USAGE);
    }

    let cmd: String = match m.param("cmd...") {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("{}: {}", m.basename(), e);
            std::process::exit(e.exit_code());
        }
    };
    let spec = SUBCMDS
        .iter()
        .find(|(name, _, _)| *name == cmd)
        .map_or("[args...]", |(_, _, spec)| *spec);

    let sub_options = std_options();
    let sub_params = ParamTable::new().param(Param::new(spec));
    let sub = match Parser::new()
        .options(&sub_options)
        .params(&sub_params)
        .report(true)
        .parse(m.rest())
    {
        Ok(sub) => sub,
        Err(e) => std::process::exit(e.exit_code()),
    };

    println!("cmd {} verbosity {}", cmd, sub.get::<i32>('v').unwrap_or_default());
    for (i, arg) in sub.rest().iter().enumerate() {
        println!("argv[{}] {}", i, arg);
    }
}
