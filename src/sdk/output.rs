//! Text returned by the capture system.
//!
//! Names and labels come back from the system as raw byte buffers. They are
//! always decoded as UTF-8; invalid sequences are an error, not replaced.

use super::SdkError;

/// Decodes a raw text buffer returned by the capture system.
///
/// Trailing NUL padding from fixed-size buffers is dropped.
pub fn decode_text(mut raw: Vec<u8>) -> Result<String, SdkError> {
    while raw.last() == Some(&0) {
        raw.pop();
    }
    Ok(String::from_utf8(raw)?)
}

/// Runs a call returning raw text and decodes its output.
pub fn text_output<F>(call: F) -> Result<String, SdkError>
where
    F: FnOnce() -> Result<Vec<u8>, SdkError>,
{
    decode_text(call()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_utf8() {
        let text = decode_text("Prime 17W #10187".as_bytes().to_vec()).unwrap();
        assert_eq!(text, "Prime 17W #10187");
    }

    #[test]
    fn test_strips_nul_padding() {
        let mut raw = b"Prime 13".to_vec();
        raw.extend_from_slice(&[0, 0, 0]);
        assert_eq!(decode_text(raw).unwrap(), "Prime 13");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let result = text_output(|| Ok(vec![0x50, 0xff, 0xfe]));
        assert!(matches!(result, Err(SdkError::InvalidText(_))));
    }

    #[test]
    fn test_propagates_call_error() {
        let result = text_output(|| Err(SdkError::ShutDown));
        assert!(matches!(result, Err(SdkError::ShutDown)));
    }
}
