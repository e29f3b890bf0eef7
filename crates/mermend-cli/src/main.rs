use mermend_core::{
    DiagramKind, NormalizeConfig, Normalizer, RepairRegistry, detect_kind, rewrite_mermaid_blocks,
};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    UnknownPass(String),
    Io(std::io::Error),
    Core(mermend_core::Error),
    Json(serde_json::Error),
    NoDiagram,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::UnknownPass(id) => write!(
                f,
                "Unknown repair pass `{id}` (known: {})",
                known_pass_ids().join(", ")
            ),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Core(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::NoDiagram => write!(f, "No Mermaid diagram detected"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mermend_core::Error> for CliError {
    fn from(value: mermend_core::Error) -> Self {
        Self::Core(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Normalize,
    Markdown,
    Detect,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    explain: bool,
    report: bool,
    pretty: bool,
    config: Option<String>,
    disable: Vec<String>,
    out: Option<String>,
    verbose: u8,
}

#[derive(Serialize)]
struct DiagramReport<'a> {
    kind: Option<&'static str>,
    applied: &'a [&'static str],
    code: &'a str,
}

#[derive(Serialize)]
struct BlockReport {
    index: usize,
    kind: Option<&'static str>,
    applied: Vec<&'static str>,
}

#[derive(Serialize)]
struct MarkdownReport<'a> {
    blocks: &'a [BlockReport],
    markdown: &'a str,
}

fn usage() -> &'static str {
    "mermend-cli\n\
\n\
USAGE:\n\
  mermend-cli [normalize] [--explain] [--report [--pretty]] [--config <path>] [--disable <pass>]... [--out <path>] [-v] [<path>|-]\n\
  mermend-cli markdown [--explain] [--report [--pretty]] [--config <path>] [--disable <pass>]... [--out <path>] [-v] [<path>|-]\n\
  mermend-cli detect [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - normalize prints the repaired diagram source; markdown rewrites every ```mermaid fence of a document.\n\
  - --explain lists the repair passes that changed the text on stderr.\n\
  - --report prints a JSON report (detected kind, applied passes, output) instead of the text.\n\
  - --config reads switches from a JSON or YAML file; --disable turns off one pass (labelQuoting, er, gantt).\n\
  - -v / -vv raise log verbosity; RUST_LOG overrides both.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "normalize" => args.command = Command::Normalize,
            "markdown" => args.command = Command::Markdown,
            "detect" => args.command = Command::Detect,
            "--explain" => args.explain = true,
            "--report" => args.report = true,
            "--pretty" => args.pretty = true,
            "-v" | "--verbose" => args.verbose = args.verbose.saturating_add(1),
            "-vv" => args.verbose = args.verbose.saturating_add(2),
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--disable" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.disable.push(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_tracing(verbose: u8) {
    // Default: warnings only, on stderr, so stdout stays the repaired text.
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,mermend_core=debug".to_string(),
            _ => "info,mermend_core=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    write_text(&text, out)
}

fn known_pass_ids() -> Vec<&'static str> {
    RepairRegistry::default_passes()
        .passes()
        .iter()
        .map(|p| p.id)
        .collect()
}

fn load_config(path: &str) -> Result<NormalizeConfig, CliError> {
    let text = std::fs::read_to_string(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let config = match ext.as_deref() {
        Some("json") => NormalizeConfig::from_json_str(&text)?,
        // `.yaml`, `.yml` and anything else; YAML also reads plain JSON.
        _ => NormalizeConfig::from_yaml_str(&text)?,
    };
    tracing::debug!(path, "loaded normalizer config");
    Ok(config)
}

fn build_normalizer(args: &Args) -> Result<Normalizer, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => NormalizeConfig::default(),
    };

    let registry = RepairRegistry::default_passes();
    for id in &args.disable {
        if registry.get(id).is_none() {
            return Err(CliError::UnknownPass(id.clone()));
        }
        config.disable_pass(id);
    }

    Ok(Normalizer::with_registry(registry).with_config(&config))
}

fn explain(label: &str, applied: &[&str]) {
    if applied.is_empty() {
        eprintln!("{label}: no repairs applied");
    } else {
        eprintln!("{label}: {}", applied.join(", "));
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;

    match args.command {
        Command::Detect => {
            let Some(kind) = detect_kind(&text) else {
                return Err(CliError::NoDiagram);
            };
            println!("{kind}");
            Ok(())
        }
        Command::Normalize => {
            let normalizer = build_normalizer(&args)?;
            let outcome = normalizer.normalize_with_report(&text);
            if args.explain {
                explain("diagram", &outcome.applied);
            }

            if args.report {
                let report = DiagramReport {
                    kind: detect_kind(&text).map(DiagramKind::as_str),
                    applied: &outcome.applied,
                    code: &outcome.code,
                };
                return write_json(&report, args.pretty, args.out.as_deref());
            }
            write_text(&outcome.code, args.out.as_deref())
        }
        Command::Markdown => {
            let normalizer = build_normalizer(&args)?;
            let mut blocks: Vec<BlockReport> = Vec::new();
            let markdown = rewrite_mermaid_blocks(&text, |code| {
                let outcome = normalizer.normalize_with_report(code);
                let index = blocks.len();
                blocks.push(BlockReport {
                    index,
                    kind: detect_kind(code).map(DiagramKind::as_str),
                    applied: outcome.applied,
                });
                outcome.code
            });
            tracing::debug!(blocks = blocks.len(), "rewrote mermaid fences");

            if args.explain {
                for block in &blocks {
                    explain(&format!("block {}", block.index), &block.applied);
                }
            }

            if args.report {
                let report = MarkdownReport {
                    blocks: &blocks,
                    markdown: &markdown,
                };
                return write_json(&report, args.pretty, args.out.as_deref());
            }
            write_text(&markdown, args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(err @ CliError::UnknownPass(_)) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(CliError::NoDiagram) => {
            eprintln!("{}", CliError::NoDiagram);
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
