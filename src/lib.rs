use anyhow::{Context, Result};
use std::path::Path;

pub mod logging;
pub mod server;
pub mod settings;
pub mod slip;
#[cfg(test)]
mod test_util;

pub use slip::{
    decode_payload, parse_slip, BetKind, BetStyle, MarketKind, MarketType, OcrInput, OcrPayload,
    ParseMode, ParseOptions, ParsePath, ParsedBet, ParsedSlip, Side, SlipMeta, Vertex,
    WordAnnotation, PARSER_VERSION,
};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub mode: Option<String>,
    pub book: Option<String>,
    pub pretty: Option<bool>,
    pub settings_path: Option<String>,
}

/// Parses one OCR payload and renders the slip as JSON.
pub fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let options = resolve_options(&config, &settings)?;
    let pretty = config.pretty.unwrap_or(settings.pretty);

    let input = decode_payload(input.as_deref().unwrap_or_default())?;
    let slip = parse_slip(input, &options);
    render_slip(&slip, pretty)
}

/// Parse options from CLI flags, falling back to settings.
pub fn resolve_options(config: &Config, settings: &settings::Settings) -> Result<ParseOptions> {
    let mode = match config.mode.as_deref() {
        Some(raw) => raw
            .parse::<ParseMode>()
            .with_context(|| format!("invalid --mode '{}'", raw))?,
        None => settings.mode,
    };
    let book_hint = config
        .book
        .clone()
        .or_else(|| settings.book_hint.clone())
        .filter(|value| !value.trim().is_empty());
    Ok(ParseOptions { book_hint, mode })
}

pub fn render_slip(slip: &ParsedSlip, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(slip)
    } else {
        serde_json::to_string(slip)
    };
    rendered.with_context(|| "failed to serialize parsed slip")
}
