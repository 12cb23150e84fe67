use common::error::AppError;
use encoding_rs::{Encoding, UTF_8};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
    pub used_fallback: bool,
}

/// Decodes a question file as UTF-8, retrying once with `fallback_label`
/// (a WHATWG encoding label such as `windows-1252`) when that fails.
pub fn decode_text(bytes: &[u8], fallback_label: &str) -> Result<DecodedText, AppError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let utf8_error = match std::str::from_utf8(bytes) {
        Ok(text) => {
            return Ok(DecodedText {
                text: text.to_owned(),
                encoding: UTF_8.name(),
                used_fallback: false,
            })
        }
        Err(err) => err,
    };

    let fallback = Encoding::for_label(fallback_label.trim().as_bytes()).ok_or_else(|| {
        AppError::Decode(format!("Unknown fallback encoding '{fallback_label}'"))
    })?;

    let text = fallback
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            AppError::Decode(format!(
                "{} could not decode input rejected as UTF-8 ({utf8_error})",
                fallback.name()
            ))
        })?;

    Ok(DecodedText {
        text: text.into_owned(),
        encoding: fallback.name(),
        used_fallback: true,
    })
}
