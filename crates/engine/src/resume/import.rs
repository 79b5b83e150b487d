//! Resume import helpers: data-URI decoding and PDF text extraction.
//! The document payload stays an opaque string in storage; these helpers run
//! only when a structured profile is being extracted.

use base64::Engine as _;

use crate::errors::EngineError;

/// Decodes a `data:<mime>;base64,<payload>` URI (or a bare base64 string)
/// into raw document bytes.
pub fn decode_data_uri(data: &str) -> Result<Vec<u8>, EngineError> {
    let payload = match data.split_once(";base64,") {
        Some((_, payload)) => payload,
        None => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| EngineError::Validation(format!("resume payload is not valid base64: {e}")))
}

/// Extracts plain text from PDF bytes. Non-PDF or corrupt documents are a
/// validation failure, not a crash.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, EngineError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| EngineError::Validation(format!("cannot extract text from resume: {e}")))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(EngineError::Validation(
            "resume document contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}
