mod aggregate;
mod collector;
mod config;
mod error;
mod model;
mod pipeline;
mod pool;
mod probe;
mod report;
mod sources;
mod utils;

pub use error::{Error, Result};

use clap::{Arg, ArgAction, ArgMatches, Command};
use config::{RunConfig, DEFAULT_THREADS, DEFAULT_TIMEOUT_MS};
use model::export_to_json;
use pipeline::{Pipeline, RunReport};
use probe::{probe_url, HttpProber, ProbeTarget};
use sources::dictionary::{Dictionary, DictionaryConfig, DICTIONARY_FILE};
use sources::enumeration::{EnumerationConfig, ExternalEnumeration, DEFAULT_INTERPRETER};
use sources::fixed::Fixed;
use sources::list::ListFile;
use sources::CandidateSource;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;
use utils::{ensure_dir, log::init_tracing_subscriber};

fn main() -> ExitCode {
    let res = match cli().get_matches().subcommand() {
        Some(("subdomains", args)) => run(Mode::Subdomains, args),
        Some(("words", args)) => run(Mode::Words, args),

        // fallback if a cmd is not handled (should not possible)
        _ => Err(Error::configuration("Command not handled")),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn cli() -> Command {
    Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about("Find which subdomains or dictionary paths of a host answer over HTTP")
        .subcommand(common_args(
            Command::new("subdomains")
                .about("Enumerate the subdomains of a host and probe each of them")
                .arg(
                    Arg::new("sublist3r")
                        .long("sublist3r")
                        .value_name("PATH")
                        .help("Full path to sublist3r.py, defaults to the SUBLIST3R_PY env variable"),
                )
                .arg(
                    Arg::new("interpreter")
                        .long("interpreter")
                        .value_name("PROGRAM")
                        .default_value(DEFAULT_INTERPRETER)
                        .help("Program used to run the enumeration tool"),
                )
                .arg(
                    Arg::new("from_file")
                        .long("from-file")
                        .value_name("FILE")
                        .help("File of already live subdomains, skips enumeration and probing"),
                )
                .arg(
                    Arg::new("test")
                        .long("test")
                        .action(ArgAction::SetTrue)
                        .help("Use fixed test subdomains instead of the enumeration tool"),
                ),
        ))
        .subcommand(common_args(
            Command::new("words")
                .about("Probe https://<host>/<word> for every dictionary word")
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_name("WORD")
                        .help("Skip the words sorting before this one"),
                )
                .arg(
                    Arg::new("scheme")
                        .long("scheme")
                        .value_name("SCHEME")
                        .default_value(sources::dictionary::DEFAULT_SCHEME),
                )
                .arg(
                    Arg::new("dictionary")
                        .long("dictionary")
                        .value_name("FILE")
                        .default_value(DICTIONARY_FILE),
                ),
        ))
        .arg_required_else_help(true)
}

fn common_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("host")
            .long("host")
            .value_name("HOST")
            .help("The host to check"),
    )
    .arg(
        Arg::new("threads")
            .long("threads")
            .value_name("N")
            .value_parser(clap::value_parser!(usize))
            .help(format!("Number of probing workers [default: {}]", DEFAULT_THREADS)),
    )
    .arg(
        Arg::new("timeout_ms")
            .long("timeout-ms")
            .value_name("MS")
            .value_parser(clap::value_parser!(u64))
            .help(format!("Timeout of each probe [default: {}]", DEFAULT_TIMEOUT_MS)),
    )
    .arg(
        Arg::new("limit")
            .long("limit")
            .value_name("N")
            .value_parser(clap::value_parser!(usize))
            .help("Only probe the first N candidates"),
    )
    .arg(
        Arg::new("html")
            .long("html")
            .action(ArgAction::SetTrue)
            .help("Write the report to <host>.html, --out-html wins if both are set"),
    )
    .arg(
        Arg::new("out_html")
            .long("out-html")
            .value_name("FILE")
            .help("Output HTML file"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .value_name("FILE")
            .help("Also export the result as JSON"),
    )
    .arg(
        Arg::new("logs")
            .short('s')
            .long("logs")
            .action(ArgAction::SetTrue)
            .help("Save logs into a .log file"),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::SetTrue)
            .help("Debug logs, RUST_LOG takes precedence"),
    )
}

// region:        --- Run

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Subdomains,
    Words,
}

fn run(mode: Mode, args: &ArgMatches) -> Result<()> {
    let host = string_arg(args, "host").unwrap_or_default();

    // log file next to the outputs
    let log_dir = format!("output/subcheck/{}", sanitize(&host));
    let filename = format!("{}", SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs());
    let log_file = if args.get_flag("logs") {
        ensure_dir(log_dir.as_ref())?;
        Some((Path::new(&log_dir), filename.as_str()))
    } else {
        None
    };
    init_tracing_subscriber(args.get_flag("verbose"), log_file);

    let config = RunConfig {
        concurrency: args.get_one::<usize>("threads").copied().unwrap_or(DEFAULT_THREADS),
        timeout: Duration::from_millis(
            args.get_one::<u64>("timeout_ms").copied().unwrap_or(DEFAULT_TIMEOUT_MS),
        ),
        candidate_limit: args.get_one::<usize>("limit").copied(),
    };
    config.validate()?;

    let (source, target) = build_source(mode, &host, args)?;
    let prober = match target {
        ProbeTarget::Host => HttpProber::for_hosts(config.timeout)?,
        ProbeTarget::Uri => HttpProber::for_uris(config.timeout)?,
    };

    info!("Checking {} ({:?} mode)", host, mode);
    let outcome = check(&host, config, source, Arc::new(prober))?;
    info!(
        "{} live out of {} candidates ({} probe errors)",
        outcome.result.len(),
        outcome.emitted,
        outcome.summary.errors
    );

    // display result
    for (i, candidate) in outcome.result.candidates.iter().enumerate() {
        println!("{:4}) {}", i, probe_url(target, candidate));
    }

    if let Some(path) = string_arg(args, "json") {
        export_to_json(&outcome.result, Path::new(&path))?;
    }

    if let Some(path) = html_output_file(&host, args) {
        report::export_to_html(&outcome.result, target, &path)?;
    }

    Ok(())
}

#[tokio::main]
async fn check(
    host: &str,
    config: RunConfig,
    source: Box<dyn CandidateSource>,
    prober: Arc<HttpProber>,
) -> Result<RunReport> {
    let mut pipeline = Pipeline::new(host, config, source, prober)?;
    pipeline.run().await
}

fn build_source(
    mode: Mode,
    host: &str,
    args: &ArgMatches,
) -> Result<(Box<dyn CandidateSource>, ProbeTarget)> {
    match mode {
        Mode::Subdomains => {
            if let Some(path) = string_arg(args, "from_file") {
                return Ok((Box::new(ListFile::new(path)), ProbeTarget::Host));
            }
            if host.is_empty() {
                return Err(Error::configuration("--host required"));
            }
            if args.get_flag("test") {
                return Ok((Box::new(Fixed::test_domains()), ProbeTarget::Host));
            }

            let config = EnumerationConfig {
                tool_path: string_arg(args, "sublist3r"),
                interpreter: string_arg(args, "interpreter")
                    .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
                ..EnumerationConfig::new(host)
            };
            Ok((Box::new(ExternalEnumeration::new(config)?), ProbeTarget::Host))
        }
        Mode::Words => {
            let mut config = DictionaryConfig::new(host);
            config.start = string_arg(args, "start");
            if let Some(scheme) = string_arg(args, "scheme") {
                config.scheme = scheme;
            }
            if let Some(path) = string_arg(args, "dictionary") {
                config.path = PathBuf::from(path);
            }
            Ok((Box::new(Dictionary::new(config)?), ProbeTarget::Uri))
        }
    }
}

// endregion:     --- Run

// region:        --- Args utils

fn string_arg(args: &ArgMatches, id: &str) -> Option<String> {
    args.get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `--out-html` first, then `<host>.html` when `--html` is set.
fn html_output_file(host: &str, args: &ArgMatches) -> Option<PathBuf> {
    if let Some(path) = string_arg(args, "out_html") {
        return Some(PathBuf::from(path));
    }
    if args.get_flag("html") {
        return Some(PathBuf::from(format!("{}.html", sanitize(host))));
    }
    None
}

fn sanitize(host: &str) -> String {
    if host.is_empty() {
        return "unknown".to_string();
    }
    host.replace(['/', '\\', ':'], "_")
}

// endregion:     --- Args utils
