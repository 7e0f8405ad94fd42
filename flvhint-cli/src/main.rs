use std::path::PathBuf;
use std::process;

use flv_hint::{process as run_hint, HintOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    options: HintOptions,
}

fn print_usage() {
    println!("flvhint {}", env!("CARGO_PKG_VERSION"));
    println!("usage: flvhint [options] <input> [<output>]");
    println!("  -nodump: do not dump the metadata when done");
    println!("  -nomerge: do not merge existing data from the onMetaData tag (if present) in the input file");
    println!("  -nometapackets: do not copy extra metadata packets from the input file (besides the initial onMetaData packet)");
    println!("  -strip: do not emit any metadata to the output file; implies -nometapackets");
    println!("  -tag name value: set a metadata tag named 'name' to the (string) value 'value'");
    println!("Note that manually set tags override automatically generated tags.");
}

/// The published interface uses single-dash long options, so the loop is
/// hand-rolled rather than derived.
fn parse_args(raw: Vec<String>) -> Result<Args, String> {
    let mut input = None;
    let mut output = None;
    let mut options = HintOptions::default();

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-nodump" => options.nodump = true,
            "-nomerge" => options.nomerge = true,
            "-nometapackets" => options.nometapackets = true,
            "-strip" => {
                options.strip = true;
                options.nometapackets = true;
            }
            "-tag" => {
                let name = iter.next();
                let value = iter.next();
                match (name, value) {
                    (Some(name), Some(value)) => options.tags.push((name, value)),
                    _ => return Err("-tag requires a name and a value".to_string()),
                }
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {other}"));
            }
            path => {
                if input.is_none() {
                    input = Some(PathBuf::from(path));
                } else {
                    output = Some(PathBuf::from(path));
                }
            }
        }
    }

    let Some(input) = input else {
        return Err("need an input filename".to_string());
    };

    Ok(Args {
        input,
        output,
        options,
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() {
        print_usage();
        process::exit(2);
    }

    init_logging();

    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            process::exit(2);
        }
    };

    if args.output.is_none() {
        info!("no output filename; showing existing metadata only");
    }

    if let Err(e) = run_hint(&args.input, args.output.as_deref(), &args.options) {
        error!("{e}");
        process::exit(1);
    }
}
