use serde::{Deserialize, Serialize};

use crate::slip::OcrPayload;

/// Body of `POST /parse`: the OCR payload plus per-request options.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct ParseRequest {
    #[serde(flatten)]
    pub(crate) payload: OcrPayload,
    #[serde(alias = "bookHint")]
    pub(crate) book_hint: Option<String>,
    pub(crate) mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
