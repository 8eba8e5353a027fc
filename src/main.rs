//! prettify - highlight source code as annotated HTML
//!
//! Reads a source file (or stdin) and writes a `<pre>` block with
//! `<span class="...">` markup, or highlights every `prettyprint`
//! element of an HTML page with `--page`.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use prettify::{escape_html, highlight_page, Config, Prettifier, PrettifyError, Result};

/// Command line settings
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    lang: Option<String>,
    line_numbers: Option<usize>,
    page: bool,
    legacy: bool,
    file: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Run(Args),
    Help,
    Version,
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr, filtered by RUST_LOG
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args)? {
        Action::Help => {
            print_usage();
            return Ok(());
        }
        Action::Version => {
            print_version();
            return Ok(());
        }
        Action::Run(args) => args,
    };

    let config = Config::load();
    let mut options = config.highlight_options();
    if args.line_numbers.is_some() {
        options.line_numbers = args.line_numbers;
    }
    options.legacy_line_breaks |= args.legacy;

    let prettifier = Prettifier::new(config.registry()?, options);
    let input = read_input(args.file.as_deref())?;

    let output = if args.page {
        highlight_page(&prettifier, &input)
    } else {
        let lang = args.lang.clone().or_else(|| extension_of(args.file.as_deref()));
        let body = prettifier.highlight_fragment(&escape_html(&input), lang.as_deref());
        format!("<pre class=\"prettyprint prettyprinted\">{}</pre>\n", body)
    };

    io::stdout().lock().write_all(output.as_bytes())?;
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Action> {
    let mut parsed = Args::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Action::Help),
            "--version" | "-V" => return Ok(Action::Version),
            "--lang" | "-l" => {
                let lang = iter
                    .next()
                    .ok_or_else(|| PrettifyError::Message(format!("{} needs a language", arg)))?;
                parsed.lang = Some(lang.clone());
            }
            "--linenums" | "-n" => parsed.line_numbers = Some(1),
            "--page" | "-p" => parsed.page = true,
            "--legacy" => parsed.legacy = true,
            "-" => parsed.file = None,
            _ => {
                if let Some(first) = arg.strip_prefix("--linenums=").or_else(|| arg.strip_prefix("-n=")) {
                    let first = first
                        .parse::<usize>()
                        .map_err(|_| PrettifyError::Message(format!("bad line number: {}", first)))?;
                    parsed.line_numbers = Some(first.max(1));
                } else if arg.starts_with('-') {
                    return Err(PrettifyError::Message(format!("unknown option: {}", arg)));
                } else {
                    parsed.file = Some(PathBuf::from(arg));
                }
            }
        }
    }

    Ok(Action::Run(parsed))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Language tag implied by a file name
fn extension_of(file: Option<&Path>) -> Option<String> {
    file?.extension().and_then(|ext| ext.to_str()).map(str::to_string)
}

fn print_usage() {
    println!("prettify {} - highlight source code as HTML", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: prettify [OPTIONS] [FILE]");
    println!();
    println!("Reads FILE, or stdin when FILE is absent or '-'.");
    println!();
    println!("Options:");
    println!("  -l, --lang LANG      Language of the source (default: file extension, then guessed)");
    println!("  -n, --linenums[=N]   Number lines, starting at N");
    println!("  -p, --page           Input is an HTML page; highlight its prettyprint elements");
    println!("      --legacy         Pad line breaks for engines that collapse them");
    println!("  -h, --help           Show this help message");
    println!("  -V, --version        Show version information");
    println!();
    println!("Settings are read from ~/.prettify.conf; RUST_LOG controls diagnostics.");
}

fn print_version() {
    println!("prettify {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Action> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args(&args)
    }

    #[test]
    fn test_parse_options() {
        let action = parse(&["-l", "py", "--linenums=3", "--legacy", "x.txt"]).unwrap();
        assert_eq!(
            action,
            Action::Run(Args {
                lang: Some("py".to_string()),
                line_numbers: Some(3),
                page: false,
                legacy: true,
                file: Some(PathBuf::from("x.txt")),
            })
        );
    }

    #[test]
    fn test_parse_help_and_errors() {
        assert_eq!(parse(&["--page", "-h"]).unwrap(), Action::Help);
        assert_eq!(parse(&["-V"]).unwrap(), Action::Version);
        assert!(parse(&["-l"]).is_err());
        assert!(parse(&["-n=x"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Some(Path::new("src/a.rb"))), Some("rb".to_string()));
        assert_eq!(extension_of(Some(Path::new("Makefile"))), None);
        assert_eq!(extension_of(None), None);
    }
}
