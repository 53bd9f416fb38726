// Parse the same command line ten times with the same tables.  Every pass
// must report the same counts and values.

use std::sync::Arc;

use clp::{convert, Opt, OptionTable, Param, ParamEvent, ParamTable, Parser, Value};

fn show(ev: &ParamEvent<'_>) {
    if ev.args.is_empty() {
        println!("after: name={:<12}  unfilled", ev.param.name());
    }
    for (i, arg) in ev.args.iter().enumerate() {
        println!("after: name={:<12}  argv[{}]={}", ev.param.name(), i, arg);
    }
}

fn main() {
    env_logger::init();

    let list = Arc::new(
        ParamTable::new().param(Param::new("[file...]").help("zero or more files").after(show)),
    );

    let params = ParamTable::new()
        .param(Param::new("[leftmost]").help("optional left-most parameter").after(show))
        .param(Param::new("[left]").help("optional left parameter").after(show))
        .param(Param::new("src...").help("one or more source files").after(show));

    let options = OptionTable::new()
        .option(Opt::verbose())
        .option(Opt::version("version..."))
        .option(Opt::dryrun())
        .option(Opt::conf())
        .option(Opt::help_option())
        .option(Opt::new('l').long("list").help("list...").paramv(list))
        .option(
            Opt::new('L')
                .convert(convert::incr())
                .dst(0i32)
                .help("increment a counter"),
        )
        .option(
            Opt::new('s')
                .arg_description("string")
                .convert(convert::string())
                .dst(Value::Str(Some("default is non-null".into())))
                .help("specify a string"),
        );

    let args: Vec<String> = std::env::args().collect();
    let parser = Parser::new().options(&options).params(&params).report(true);

    for pass in 0..10 {
        let m = match parser.parse(&args) {
            Ok(m) => m,
            Err(e) => std::process::exit(e.exit_code()),
        };

        println!("pass {}", pass);
        for tag in ['v', 'n', 'L'] {
            if m.given(tag) > 0 {
                println!(
                    "-{} is {} {}",
                    tag,
                    m.get::<i32>(tag).unwrap_or_default(),
                    m.given(tag)
                );
            }
        }
        if m.given('C') > 0 {
            println!("cf is open {}", m.given('C'));
        }
        if m.given('s') > 0 {
            println!(
                "mystring is {} {}",
                m.get::<String>('s').unwrap_or_default(),
                m.given('s')
            );
        }
        for (i, arg) in m.rest().iter().enumerate() {
            println!("posparams: {} {}", m.optind() + i, arg);
        }
    }
}
