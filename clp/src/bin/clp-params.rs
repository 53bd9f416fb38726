// Each of -a, -b and -c selects its own positional parameters, which makes
// them mutually exclusive.  Without any of them the default table applies.

use std::sync::Arc;

use clp::{convert, Opt, OptionTable, Param, ParamEvent, ParamTable, Parser, Value};

fn show(ev: &ParamEvent<'_>) {
    println!("{}: {}", ev.param.display_name(), ev.args.join(" "));
}

fn main() {
    env_logger::init();

    let copy = Arc::new(
        ParamTable::new()
            .param(Param::new("src...").help("one or more sources").after(show))
            .param(
                Param::new("dst")
                    .help("destination")
                    .convert(convert::string())
                    .dst(Value::string())
                    .after(show),
            ),
    );
    let list = Arc::new(
        ParamTable::new().param(Param::new("[file...]").help("zero or more files").after(show)),
    );
    let count = Arc::new(
        ParamTable::new().param(
            Param::new("n")
                .help("how many")
                .convert(convert::number::<u32>())
                .dst(0u32)
                .after(show),
        ),
    );

    let params = ParamTable::new().param(Param::new("[args...]").help("anything").after(show));

    let options = OptionTable::new()
        .option(Opt::verbose())
        .option(Opt::help_option())
        .option(Opt::new('a').long("copy").help("copy sources to dst").paramv(copy))
        .option(Opt::new('b').long("list").help("list files").paramv(list))
        .option(Opt::new('c').long("count").help("count to n").paramv(count))
        .option(
            Opt::new('f')
                .long("force")
                .excludes("c")
                .convert(convert::toggle())
                .dst(false)
                .help("overwrite existing files"),
        );

    let args: Vec<String> = std::env::args().collect();
    let m = match Parser::new()
        .options(&options)
        .params(&params)
        .report(true)
        .parse(&args)
    {
        Ok(m) => m,
        Err(e) => std::process::exit(e.exit_code()),
    };

    if m.given('c') > 0 {
        if let Ok(n) = m.param::<u32>("n") {
            println!("count is {}", n);
        }
    }
    for err in m.param_errors() {
        eprintln!("{}: {}", m.basename(), err);
    }
}
