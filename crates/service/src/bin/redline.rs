// ABOUTME: CLI binary for redline: tags bill amendments, fetches bills, streams analyses, or runs the API.
// ABOUTME: Reads markup from files, URLs or stdin and writes results to stdout or a file.

use std::fs;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use redline_parser::{copy_prompt, ParsedBill};
use redline_service::{Analyzer, Client, ClientBuilder, Options};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(about = "Tag and explain amendments in legislative bill text")]
struct Args {
    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks", global = true)]
    allow_private_networks: bool,

    /// Accept bill URLs on any host instead of ilga.gov only
    #[arg(long = "any-host", global = true)]
    any_host: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse bill markup into tagged segments
    Parse {
        /// HTML file, bill URL, or - for stdin
        input: String,

        /// Output format
        #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file path (default: stdout)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Print elapsed time in ms to stderr
        #[arg(long = "timing")]
        timing: bool,
    },
    /// Fetch a bill's raw markup
    Fetch {
        url: String,
    },
    /// Stream an analysis of tagged bill text
    Analyze {
        /// Tagged text file, or - for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long = "addr", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Tagged,
    Prompt,
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(input)
}

fn render(parsed: &ParsedBill, format: Format, analyzer: &Analyzer) -> String {
    match format {
        Format::Json => serde_json::to_string_pretty(parsed).unwrap_or_default(),
        Format::Tagged => parsed.tagged_text.clone(),
        Format::Prompt => copy_prompt(&parsed.tagged_text),
        Format::Stats => serde_json::to_string_pretty(&json!({
            "stats": parsed.stats,
            "length": analyzer.check_length(&parsed.tagged_text),
        }))
        .unwrap_or_default(),
    }
}

async fn run_parse(
    client: &Client,
    input: &str,
    format: Format,
    output: Option<PathBuf>,
    timing: bool,
) -> ExitCode {
    let start = Instant::now();

    let html = if is_url(input) {
        match client.fetch_bill(input).await {
            Ok(html) => html,
            Err(e) => {
                eprintln!("error fetching {}: {}", input, e.message());
                return ExitCode::from(1);
            }
        }
    } else {
        match read_input(input) {
            Ok(html) => html,
            Err(e) => {
                eprintln!("error reading {}: {}", input, e);
                return ExitCode::from(1);
            }
        }
    };

    let parsed = match client.parse_bill(&html) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {}", e.message());
            return ExitCode::from(1);
        }
    };
    let elapsed = start.elapsed();

    let rendered = render(&parsed, format, client.analyzer());
    let mut code = ExitCode::SUCCESS;
    if let Some(path) = &output {
        if let Err(e) = fs::write(path, &rendered) {
            eprintln!("error writing to {:?}: {}", path, e);
            code = ExitCode::from(1);
        }
    } else {
        println!("{}", rendered);
    }

    if timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }
    code
}

async fn run_fetch(client: &Client, url: &str) -> ExitCode {
    match client.fetch_bill(url).await {
        Ok(html) => {
            println!("{}", html);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error fetching {}: {}", url, e.message());
            ExitCode::from(1)
        }
    }
}

async fn run_analyze(client: &Client, input: &str) -> ExitCode {
    let tagged = match read_input(input) {
        Ok(tagged) => tagged,
        Err(e) => {
            eprintln!("error reading {}: {}", input, e);
            return ExitCode::from(1);
        }
    };

    let mut stdout = io::stdout();
    let mut fragments = client.analyze(tagged.trim());
    while let Some(item) = fragments.next().await {
        match item {
            Ok(fragment) => {
                let _ = stdout.write_all(fragment.as_bytes());
                let _ = stdout.flush();
            }
            Err(e) => {
                let _ = writeln!(stdout);
                eprintln!("error: {}", e.message());
                return ExitCode::from(1);
            }
        }
    }
    let _ = writeln!(stdout);
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    let mut builder = ClientBuilder::from_options(Options::from_env())
        .allow_private_networks(args.allow_private_networks);
    if args.any_host {
        builder = builder.allowed_host(None);
    }
    let client = builder.build();

    match args.command {
        Command::Parse {
            input,
            format,
            output,
            timing,
        } => run_parse(&client, &input, format, output, timing).await,
        Command::Fetch { url } => run_fetch(&client, &url).await,
        Command::Analyze { input } => run_analyze(&client, &input).await,
        Command::Serve { addr } => match redline_service::serve(addr, Arc::new(client)).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error serving on {}: {}", addr, e);
                ExitCode::from(1)
            }
        },
    }
}
