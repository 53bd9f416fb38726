// Demonstration driver: standard options, an integer option, a list mode
// with its own positional parameters, and a secret long-only option.

use std::sync::Arc;

use clp::{convert, Opt, OptionTable, Param, ParamEvent, ParamTable, Parser};

fn default_after(ev: &ParamEvent<'_>) {
    if ev.args.is_empty() {
        println!("default_after: name={:<12}  unfilled", ev.param.name());
    }
    for (i, arg) in ev.args.iter().enumerate() {
        println!("default_after: name={:<12}  argv[{}]={}", ev.param.name(), i, arg);
    }
}

fn list_after(ev: &ParamEvent<'_>) {
    for arg in ev.args {
        println!("list_after: {}", arg);
    }
}

fn main() {
    env_logger::init();

    let list = Arc::new(
        ParamTable::new().param(
            Param::new("[file...]")
                .help("zero or more files")
                .after(list_after),
        ),
    );

    let params = ParamTable::new()
        .param(
            Param::new("[leftmost]")
                .help("optional left-most parameter")
                .after(default_after),
        )
        .param(
            Param::new("[left]")
                .help("optional left parameter")
                .after(default_after),
        )
        .param(
            Param::new("src...")
                .help("one or more source files")
                .after(default_after),
        );

    let options = OptionTable::new()
        .option(Opt::verbose())
        .option(Opt::dryrun())
        .option(Opt::version(env!("CARGO_PKG_VERSION")))
        .option(Opt::conf())
        .option(Opt::help_option())
        .option(
            Opt::new('i')
                .arg_description("int")
                .convert(convert::number::<i32>().radix(10))
                .dst(0i32)
                .help("specify an int"),
        )
        .option(Opt::new('l').long("list").help("list...").paramv(list))
        .option(Opt::new('s').long("secret"))
        .option(Opt::new('\u{1}').long("long-only").help("an option with no short form"));

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

    if m.given('i') > 0 {
        if let Ok(n) = m.get::<i32>('i') {
            println!("int is {}", n);
        }
    }
}
