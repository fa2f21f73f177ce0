use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser as ClapParser};
use tracing_subscriber::EnvFilter;

use wirefold::{
    ParseError, ParserConfig, Request, RequestBuffer, format_debug, format_headers_only,
    format_json,
};

/// wirefold CLI: incremental HTTP/1.x request parser.
///
/// Reads a raw HTTP request from a file, --raw string, or stdin in chunks
/// and outputs a structured representation in the chosen format.
///
/// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted so
/// you can pass a full HTTP request as a single shell argument.
#[derive(ClapParser)]
#[command(name = "wirefold-cli", version, about, long_about = None)]
struct Cli {
    /// Path to a file containing a raw HTTP request.
    /// Reads from stdin when neither FILE nor --raw is given.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Raw HTTP request string (escape sequences \r \n \t \\ are expanded).
    #[arg(long)]
    raw: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// Number of bytes handed to the parser per read.
    #[arg(long, default_value = "8192")]
    chunk_size: usize,

    /// Maximum allowed body size in bytes.
    #[arg(long, default_value = "10485760")]
    max_body_size: u64,

    /// Maximum number of headers allowed.
    #[arg(long, default_value = "128")]
    max_headers: usize,

    /// Log parser progress to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable debug output
    Debug,
    /// Request-line + headers only
    Headers,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if cli.file.is_none() && cli.raw.is_none() && io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let config = ParserConfig {
        max_body_size: cli.max_body_size,
        max_headers_count: cli.max_headers,
        ..ParserConfig::default()
    };

    let request = match parse_input(&cli, config) {
        Ok(r) => r,
        Err(ParseError::Read(e)) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Parse error: {e}");
            process::exit(2);
        }
    };

    let output = match cli.format {
        OutputFormat::Json => format_json(&request, cli.pretty),
        OutputFormat::Debug => format_debug(&request),
        OutputFormat::Headers => format_headers_only(&request),
    };

    print!("{output}");
}

/// `-v` flags win over `RUST_LOG`; without either only warnings are shown.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("wirefold=debug"),
        _ => EnvFilter::new("wirefold=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Stream raw HTTP bytes from --raw, a file, or stdin into the parser.
fn parse_input(cli: &Cli, config: ParserConfig) -> Result<Request, ParseError> {
    let buffer = RequestBuffer::with_config(config);
    if let Some(raw) = &cli.raw {
        return buffer.read_from(unescape(raw).as_bytes(), cli.chunk_size);
    }
    let reader: Box<dyn Read> = match &cli.file {
        Some(path) => Box::new(File::open(path).map_err(|e| ParseError::Read(e.to_string()))?),
        None => Box::new(io::stdin().lock()),
    };
    buffer.read_from(reader, cli.chunk_size)
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
