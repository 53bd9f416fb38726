// Numeric converter family, a vector option, a string option and three
// mutually exclusive flags.  Positional arguments are left to the caller.

use std::fs::File;
use std::sync::Arc;

use clp::{convert, Opt, OptionTable, Parser};

fn main() {
    env_logger::init();

    let options = OptionTable::new()
        .option(Opt::verbose())
        .option(Opt::version("version..."))
        .option(Opt::dryrun())
        .option(Opt::conf())
        .option(Opt::help_option())
        .option(
            Opt::new('f')
                .arg_description("float")
                .convert(convert::number::<f32>())
                .dst(0.0f32)
                .help("specify a float"),
        )
        .option(
            Opt::new('d')
                .arg_description("double")
                .convert(convert::number::<f64>())
                .dst(0.0f64)
                .help("specify a double"),
        )
        .option(
            Opt::new('i')
                .arg_description("int")
                .convert(convert::number::<i32>())
                .dst(0i32)
                .help("specify an int"),
        )
        .option(
            Opt::new('I')
                .arg_description("uint")
                .convert(convert::number::<u32>())
                .dst(0u32)
                .help("specify a u_int"),
        )
        .option(
            Opt::new('l')
                .arg_description("long")
                .convert(convert::number::<i64>())
                .dst(0i64)
                .help("specify a long"),
        )
        .option(
            Opt::new('L')
                .arg_description("ulong")
                .convert(convert::number::<u64>())
                .dst(0u64)
                .help("specify a u_long"),
        )
        .option(
            Opt::new('s')
                .arg_description("string")
                .convert(convert::string())
                .dst("default")
                .help("specify a string"),
        )
        .option(
            Opt::new('j')
                .arg_description("intv")
                .convert(convert::number::<i32>().vector(1, 5, ","))
                .dst(Vec::<i32>::new())
                .help("specify a vector of ints"),
        )
        .option(
            Opt::new('x')
                .excludes("yz")
                .convert(convert::toggle())
                .dst(false)
                .help("specify x flag"),
        )
        .option(
            Opt::new('y')
                .excludes("xz")
                .convert(convert::toggle())
                .dst(false)
                .help("specify y flag"),
        )
        .option(
            Opt::new('z')
                .excludes("xy")
                .convert(convert::toggle())
                .dst(true)
                .help("specify z flag"),
        );

    let args: Vec<String> = std::env::args().collect();
    let m = match Parser::new().options(&options).report(true).parse(&args) {
        Ok(m) => m,
        Err(e) => std::process::exit(e.exit_code()),
    };

    if m.given('h') > 0 || m.given('V') > 0 {
        return;
    }

    println!("progname is {}", m.basename());
    println!("verbosity is {} {}", m.get::<i32>('v').unwrap_or_default(), m.given('v'));
    println!("argc={} optind={}", m.argv().len(), m.optind());
    for (i, arg) in m.rest().iter().enumerate() {
        println!("posparams: {} {}", i, arg);
    }
    println!("dryrun is {} {}", m.get::<i32>('n').unwrap_or_default(), m.given('n'));

    match m.get::<Option<Arc<File>>>('C') {
        Ok(Some(_)) => println!("cf is open {}", m.given('C')),
        _ => println!("cf is nil {}", m.given('C')),
    }

    println!("myint is {} {}", m.get::<i32>('i').unwrap_or_default(), m.given('i'));
    println!("myuint is {} {}", m.get::<u32>('I').unwrap_or_default(), m.given('I'));
    println!("mylong is {} {}", m.get::<i64>('l').unwrap_or_default(), m.given('l'));
    println!("myulong is {} {}", m.get::<u64>('L').unwrap_or_default(), m.given('L'));
    println!(
        "mystring is {} {}",
        m.get::<String>('s').unwrap_or_default(),
        m.given('s')
    );

    for tag in ['x', 'y', 'z'] {
        println!(
            "{} is {} {}",
            tag,
            m.get::<bool>(tag).unwrap_or_default(),
            m.given(tag)
        );
    }

    if m.given('f') > 0 {
        println!("f is {}", m.get::<f32>('f').unwrap_or_default());
    }
    if m.given('d') > 0 {
        println!("d is {}", m.get::<f64>('d').unwrap_or_default());
    }
    if m.given('j') > 0 {
        let v: Vec<i32> = m.get('j').unwrap_or_default();
        let shown: Vec<String> = v.iter().map(|n| n.to_string()).collect();
        println!("intv is: {}", shown.join(" "));
    }
}
