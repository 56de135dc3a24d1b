use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, XlError, XlErrorKind, XlResult};

/// Where to find one key/value pair of columns: the header cells of the keys and of the
/// values, on a worksheet of a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub book: String,
    pub sheet: String,
    pub key: String,
    pub value: String,
}

impl Instruction {
    pub fn new(
        book: impl Into<String>,
        sheet: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            book: book.into(),
            sheet: sheet.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A migration request, as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPayload {
    #[serde(rename = "Overwriting", default)]
    pub overwriting: bool,
    #[serde(rename = "To")]
    pub target: Instruction,
    #[serde(rename = "From")]
    pub sources: Vec<Instruction>,
}

impl MigrationPayload {
    pub fn from_json(json: &str) -> XlResult<Self> {
        let payload: Self = serde_json::from_str(json)?;
        payload.validate()?;
        Ok(payload)
    }

    /// Decodes a base64 (standard alphabet) encoded JSON payload.
    pub fn from_base64(encoded: &str) -> XlResult<Self> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|err| {
            XlError::from(XlErrorKind::InvalidPayload(format!("invalid base64: {err}")))
        })?;
        let json = String::from_utf8(bytes).map_err(|err| {
            XlError::from(XlErrorKind::InvalidPayload(format!("invalid utf-8: {err}")))
        })?;
        Self::from_json(&json).with_context(|| "could not decode the migration payload")
    }

    pub fn to_json(&self) -> XlResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_base64(&self) -> XlResult<String> {
        self.to_json().map(|json| STANDARD.encode(json))
    }

    fn validate(&self) -> XlResult<()> {
        if self.sources.is_empty() {
            return Err(
                XlErrorKind::InvalidPayload("at least one source is required".to_string()).into(),
            );
        }
        Ok(())
    }
}
