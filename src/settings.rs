use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::slip::ParseMode;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8787";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: ParseMode,
    pub book_hint: Option<String>,
    pub pretty: bool,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: ParseMode::Auto,
            book_hint: None,
            pretty: true,
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    parser: Option<ParserSettings>,
    output: Option<OutputSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ParserSettings {
    mode: Option<String>,
    book_hint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSettings {
    pretty: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings
                .merge(parsed)
                .with_context(|| format!("invalid settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(parser) = incoming.parser {
            if let Some(mode) = parser.mode {
                self.mode = mode.parse()?;
            }
            if let Some(book) = parser.book_hint {
                // an empty value clears a hint set by an earlier layer
                self.book_hint = Some(book).filter(|value| !value.trim().is_empty());
            }
        }
        if let Some(output) = incoming.output {
            if let Some(pretty) = output.pretty {
                self.pretty = pretty;
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr;
                }
            }
        }
        Ok(())
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".slip-ocr"))
        }
    })
}
