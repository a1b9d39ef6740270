use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "slip-ocr",
    version,
    about = "Interpret OCR output of sportsbook bet slips"
)]
struct Cli {
    /// OCR payload file (plain text, JSON string or JSON object). Reads stdin when omitted.
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Parse mode: auto, receipt or pending_list
    #[arg(short = 'm', long = "mode")]
    mode: Option<String>,

    /// Sportsbook name to report when the slip does not name one
    #[arg(short = 'b', long = "book")]
    book: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long = "pretty", overrides_with = "compact")]
    pretty: bool,

    /// Print the JSON output on one line
    #[arg(long = "compact")]
    compact: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Serve the HTTP API on this address instead of parsing once
    #[arg(long = "server", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

impl Cli {
    fn pretty_flag(&self) -> Option<bool> {
        match (self.pretty, self.compact) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }

    fn config(&self) -> slip_ocr::Config {
        slip_ocr::Config {
            mode: self.mode.clone(),
            book: self.book.clone(),
            pretty: self.pretty_flag(),
            settings_path: self.read_settings.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    slip_ocr::logging::init(cli.verbose)?;

    if let Some(addr) = cli.server.as_deref() {
        let settings = slip_ocr::settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
        let addr = if addr.trim().is_empty() {
            settings.server_addr.clone()
        } else {
            addr.to_string()
        };
        return slip_ocr::server::run_server(settings, addr).await;
    }

    let input = read_input(cli.data.as_deref())?;
    let output = slip_ocr::run(cli.config(), Some(input))?;
    println!("{}", output);
    Ok(())
}

fn read_input(data: Option<&str>) -> Result<String> {
    if let Some(path) = data {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read OCR payload: {}", path));
    }
    if io::stdin().is_terminal() {
        return Err(anyhow!("no input: pass --data <file> or pipe OCR output on stdin"));
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .with_context(|| "failed to read stdin")?;
    Ok(buffer)
}
