use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static DEBUG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\[?debug\b").expect("debug line regex"));

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }
}

/// One OCR-recognised token and its on-image bounding polygon.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawAnnotation")]
pub struct WordAnnotation {
    pub description: String,
    pub bounding_polygon: Vec<Vertex>,
}

impl WordAnnotation {
    pub fn new(description: impl Into<String>, bounding_polygon: Vec<Vertex>) -> Self {
        Self {
            description: description.into(),
            bounding_polygon,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default, rename = "boundingPolygon", alias = "bounding_polygon")]
    bounding_polygon: Option<Vec<Vertex>>,
    #[serde(default, rename = "boundingPoly", alias = "bounding_poly")]
    bounding_poly: Option<RawPoly>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

impl From<RawAnnotation> for WordAnnotation {
    fn from(raw: RawAnnotation) -> Self {
        let bounding_polygon = raw
            .bounding_polygon
            .or_else(|| raw.bounding_poly.map(|poly| poly.vertices))
            .unwrap_or_default();
        Self {
            description: raw.description,
            bounding_polygon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OcrInput {
    Text(String),
    Annotated {
        text: String,
        annotations: Vec<WordAnnotation>,
    },
}

impl From<&str> for OcrInput {
    fn from(value: &str) -> Self {
        OcrInput::Text(value.to_string())
    }
}

impl From<String> for OcrInput {
    fn from(value: String) -> Self {
        OcrInput::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    #[default]
    Auto,
    Receipt,
    PendingList,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Auto => "auto",
            ParseMode::Receipt => "receipt",
            ParseMode::PendingList => "pending_list",
        }
    }
}

impl FromStr for ParseMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "auto" => Ok(ParseMode::Auto),
            "receipt" => Ok(ParseMode::Receipt),
            "pending_list" | "pending" => Ok(ParseMode::PendingList),
            other => Err(anyhow!(
                "unknown parse mode '{}' (expected auto, receipt or pending_list)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOptions {
    pub book_hint: Option<String>,
    pub mode: ParseMode,
}

/// Structured OCR payload as posted by the upload flow or returned by a
/// Vision-style OCR service.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OcrPayload {
    pub text: Option<String>,
    pub annotations: Option<Vec<WordAnnotation>>,
    #[serde(rename = "textAnnotations", alias = "text_annotations")]
    pub text_annotations: Option<Vec<WordAnnotation>>,
    #[serde(rename = "fullTextAnnotation", alias = "full_text_annotation")]
    pub full_text_annotation: Option<FullTextAnnotation>,
    pub responses: Option<Vec<OcrPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FullTextAnnotation {
    pub text: Option<String>,
}

impl OcrPayload {
    pub fn into_input(self) -> OcrInput {
        if let Some(responses) = self.responses {
            if self.text.is_none() && self.annotations.is_none() && self.text_annotations.is_none()
            {
                if let Some(first) = responses.into_iter().next() {
                    return first.into_input();
                }
                return OcrInput::Text(String::new());
            }
        }

        let annotations = self
            .annotations
            .filter(|list| !list.is_empty())
            .or(self.text_annotations)
            .unwrap_or_default();
        let text = self
            .text
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                annotations
                    .first()
                    .map(|page| page.description.clone())
                    .filter(|value| !value.trim().is_empty())
            })
            .or_else(|| self.full_text_annotation.and_then(|full| full.text))
            .unwrap_or_default();

        if annotations.is_empty() {
            OcrInput::Text(text)
        } else {
            OcrInput::Annotated { text, annotations }
        }
    }
}

/// Decodes a raw payload: a JSON object becomes a structured payload, a JSON
/// string or anything else is plain OCR text.
pub fn decode_payload(raw: &str) -> Result<OcrInput> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') {
        let payload: OcrPayload =
            serde_json::from_str(trimmed).with_context(|| "failed to parse OCR payload JSON")?;
        return Ok(payload.into_input());
    }
    if trimmed.starts_with('"') {
        if let Ok(text) = serde_json::from_str::<String>(trimmed.trim_end()) {
            return Ok(OcrInput::Text(text));
        }
    }
    Ok(OcrInput::Text(raw.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NormalizedInput {
    pub(crate) text: String,
    pub(crate) annotations: Vec<WordAnnotation>,
}

pub(crate) fn normalize(input: OcrInput) -> NormalizedInput {
    let (text, annotations) = match input {
        OcrInput::Text(text) => (text, Vec::new()),
        OcrInput::Annotated { text, annotations } => (text, annotations),
    };
    NormalizedInput {
        text: strip_debug_lines(&text.replace('\r', "")),
        annotations,
    }
}

fn strip_debug_lines(text: &str) -> String {
    let mut kept = Vec::new();
    let mut in_block = false;
    for line in text.lines() {
        if in_block {
            if line.trim().is_empty() {
                in_block = false;
            }
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with("---") && trimmed.to_lowercase().contains("debug") {
            in_block = true;
            continue;
        }
        if DEBUG_LINE.is_match(trimmed) {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n")
}
