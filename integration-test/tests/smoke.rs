use std::process::Command;
use std::sync::Once;
use clp::error::{EX_DATAERR, EX_NOINPUT, EX_USAGE};
use test_driver::{binary, run, TestSession};

static BUILD_INIT: Once = Once::new();

fn ensure_binaries() {
    BUILD_INIT.call_once(|| {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        let workspace_root = format!("{manifest_dir}/..");
        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".into());
        let status = Command::new(cargo)
            .args(["build", "-p", "clp", "--bins"])
            .current_dir(&workspace_root)
            .status()
            .expect("failed to run cargo build");
        assert!(status.success(), "cargo build -p clp failed");
    });
}

fn clp_test(args: &[&str], code: i32) -> test_driver::SessionOutput {
    ensure_binaries();
    run(&binary("clp-test"), args, code)
}

// ============================================================================
// clp-test
// ============================================================================

#[test]
fn short_help_lists_usage_and_options() {
    let out = clp_test(&["-h"], 0);
    assert!(
        out.stdout
            .contains("usage: clp-test [-vns] [-C conf] [-i int] [leftmost [left]] src...\n"),
        "stdout:\n{}",
        out.stdout
    );
    assert!(out.stdout.contains("usage: clp-test -h [-v]\n"));
    assert!(out
        .stdout
        .contains("usage: clp-test -l [-vns] [-C conf] [-i int] [file...]\n"));
    assert!(out.stdout.contains("-C conf  specify a configuration file\n"));
    assert!(out.stdout.contains("-i int   specify an int\n"));
    assert!(out.stdout.contains("src...    one or more source files\n"));
    assert!(!out.stdout.contains("--long-only"));
    assert!(out.stdout.ends_with("\n\n"));
    assert!(out.stderr.is_empty());
}

#[test]
fn long_help_shows_long_names() {
    let out = clp_test(&["--help"], 0);
    assert!(out.stdout.contains("-h, --help"), "stdout:\n{}", out.stdout);
    assert!(out.stdout.contains("-C, --conf conf"));
    assert!(out.stdout.contains("    --long-only   an option with no short form\n"));
}

#[test]
fn help_ignores_missing_positionals() {
    let out = clp_test(&["-v", "-h"], 0);
    assert!(out.stdout.starts_with("usage: clp-test"));
}

#[test]
fn version_prints_and_excludes() {
    let out = clp_test(&["-V"], 0);
    assert_eq!(out.stdout, format!("{}\n", env!("CARGO_PKG_VERSION")));

    let out = clp_test(&["-v", "-V"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-test: option -v excludes -V, use -h for help\n"
    );
}

#[test]
fn default_positionals_are_distributed() {
    let out = clp_test(&["a", "b", "c"], 0);
    assert_eq!(
        out.stdout,
        "default_after: name=[leftmost]    argv[0]=a\n\
         default_after: name=[left]        argv[0]=b\n\
         default_after: name=src...        argv[0]=c\n"
    );

    let out = clp_test(&["x"], 0);
    assert_eq!(out.stdout, "default_after: name=src...        argv[0]=x\n");
}

#[test]
fn list_mode_switches_positionals() {
    let out = clp_test(&["-l", "f1", "f2"], 0);
    assert_eq!(out.stdout, "list_after: f1\nlist_after: f2\n");

    let out = clp_test(&["--list"], 0);
    assert!(out.stdout.is_empty());
}

#[test]
fn usage_errors_exit_64() {
    let out = clp_test(&[], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-test: mandatory positional parameters required, use -h for help\n"
    );

    let out = clp_test(&["-q", "x"], EX_USAGE);
    assert_eq!(out.stderr, "clp-test: invalid option -q, use -h for help\n");

    let out = clp_test(&["x", "-i"], 0);
    assert!(out.stdout.contains("argv[0]=-i"));

    let out = clp_test(&["-i"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-test: option -i requires a parameter, use -h for help\n"
    );
}

#[test]
fn int_option_converts() {
    let out = clp_test(&["-i", "42", "x"], 0);
    assert!(out.stdout.contains("int is 42\n"));

    let out = clp_test(&["-i", "abc", "x"], EX_DATAERR);
    assert_eq!(
        out.stderr,
        "clp-test: unable to convert '-i abc': Invalid argument\n"
    );
}

#[test]
fn conf_open_failure_exits_66() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.conf");
    let out = clp_test(&["-C", missing.to_str().unwrap(), "x"], EX_NOINPUT);
    assert!(out.stderr.starts_with("clp-test: unable to convert '-C "));
}

#[test]
fn conf_opens_existing_file() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    clp_test(&["--conf", tmp.path().to_str().unwrap(), "x"], 0);
}

// ============================================================================
// clp-params
// ============================================================================

#[test]
fn params_per_option_tables() {
    ensure_binaries();
    let bin = binary("clp-params");

    let out = run(&bin, &["-a", "s1", "s2", "d"], 0);
    assert_eq!(out.stdout, "src...: s1 s2\ndst: d\n");

    let out = run(&bin, &["x", "y"], 0);
    assert_eq!(out.stdout, "args...: x y\n");

    let out = run(&bin, &["-c", "7"], 0);
    assert_eq!(out.stdout, "n: 7\ncount is 7\n");

    let out = run(&bin, &["-a", "-b"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-params: option -a excludes -b, use -h for help\n"
    );

    let out = run(&bin, &["-f", "-c", "1"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-params: option -f excludes -c, use -h for help\n"
    );
}

// Positional conversion failures are reported but do not fail the parse.
#[test]
fn params_conversion_failure_is_not_fatal() {
    ensure_binaries();
    let out = run(&binary("clp-params"), &["-c", "seven"], 0);
    assert_eq!(out.stdout, "n: seven\ncount is 0\n");
    assert_eq!(
        out.stderr,
        "clp-params: unable to convert n 'seven': Invalid argument\n"
    );
}

// ============================================================================
// clp-simple
// ============================================================================

#[test]
fn simple_reports_values() {
    ensure_binaries();
    let out = run(&binary("clp-simple"), &["-i", "5", "-x", "-vv", "a", "b"], 0);
    let expected = [
        "progname is clp-simple",
        "verbosity is 2 2",
        "argc=7 optind=5",
        "posparams: 0 a",
        "posparams: 1 b",
        "dryrun is 0 0",
        "cf is nil 0",
        "myint is 5 1",
        "mystring is default 0",
        "x is true 1",
        "y is false 0",
        "z is true 0",
    ];
    for line in expected {
        assert!(
            out.stdout.lines().any(|l| l == line),
            "missing {line:?} in:\n{}",
            out.stdout
        );
    }
}

#[test]
fn simple_vector_and_errors() {
    ensure_binaries();
    let bin = binary("clp-simple");

    let out = run(&bin, &["-j", "1,2,3"], 0);
    assert!(out.stdout.contains("intv is: 1 2 3\n"));

    let out = run(&bin, &["-j", "1,2,3,4,5,6"], EX_DATAERR);
    assert_eq!(
        out.stderr,
        "clp-simple: unable to convert '-j 1,2,3,4,5,6': Argument list too long\n"
    );

    let out = run(&bin, &["-I", "-1"], EX_DATAERR);
    assert!(out.stderr.contains("Numerical result out of range"));

    let out = run(&bin, &["-x", "-y"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-simple: option -x excludes -y, use -h for help\n"
    );

    let out = run(&bin, &["-z", "-s", "hello"], 0);
    assert!(out.stdout.contains("z is false 1\n"));
    assert!(out.stdout.contains("mystring is hello 1\n"));
}

// ============================================================================
// clp-recycle
// ============================================================================

#[test]
fn recycle_gives_identical_passes() {
    ensure_binaries();
    let out = run(&binary("clp-recycle"), &["-v", "-L", "-L", "a"], 0);
    assert_eq!(out.stdout.matches("-v is 1 1\n").count(), 10);
    assert_eq!(out.stdout.matches("-L is 2 2\n").count(), 10);
    assert_eq!(
        out.stdout
            .matches("after: name=src...        argv[0]=a\n")
            .count(),
        10
    );
    assert!(out.stdout.contains("pass 9\n"));
}

// ============================================================================
// clp-breakargs
// ============================================================================

#[test]
fn breakargs_splits_lines() {
    ensure_binaries();
    let mut session = TestSession::spawn(&binary("clp-breakargs"), &[], &[]).unwrap();
    session.feed("a 'b c' d\n# comment\n\nx \"y\n");
    let out = session.wait_exit(0);
    assert_eq!(
        out.stdout,
        "   1: nargc=3\n   1:    0 [a]\n   1:    1 [b c]\n   1:    2 [d]\n\n   4: rc=65 unterminated double quote\n"
    );
}

#[test]
fn breakargs_custom_delimiters() {
    ensure_binaries();
    let mut session = TestSession::spawn(&binary("clp-breakargs"), &["-d", ":"], &[]).unwrap();
    session.feed("a:b c\n");
    let out = session.wait_exit(0);
    assert_eq!(out.stdout, "   1: nargc=2\n   1:    0 [a]\n   1:    1 [b c]\n\n");
}

// ============================================================================
// clp-subcmd
// ============================================================================

#[test]
fn subcmd_reparses_residual_arguments() {
    ensure_binaries();
    let bin = binary("clp-subcmd");

    let out = run(&bin, &["foo", "-v", "f1", "f2"], 0);
    assert_eq!(out.stdout, "cmd foo verbosity 1\nargv[0] f1\nargv[1] f2\n");

    let out = run(&bin, &["BAZ"], 0);
    assert_eq!(out.stdout, "cmd baz verbosity 0\n");

    let out = run(&bin, &["qux"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "clp-subcmd: unable to convert cmd... 'qux': unknown subcommand qux\n"
    );

    let out = run(&bin, &["foo"], EX_USAGE);
    assert_eq!(
        out.stderr,
        "foo: mandatory positional parameters required, use -h for help\n"
    );
}

#[test]
fn subcmd_help_lists_commands() {
    ensure_binaries();
    let out = run(&binary("clp-subcmd"), &["-h"], 0);
    assert!(out.stdout.contains("foo   do foo action...\n"));
    assert!(out.stdout.contains("baz   do baz action...\n"));
}
