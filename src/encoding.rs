use encoding_rs::{Encoding, UTF_8};
use xhtmlchardet::detect;

use crate::error::Error;

// byte order mark or declared encoding; UTF-8 when nothing is found
fn detect_encoding(data: &[u8]) -> &'static Encoding {
    let mut cursor = std::io::Cursor::new(data);
    detect(&mut cursor, None)
        .ok()
        .and_then(|labels| {
            labels
                .iter()
                .find_map(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or(UTF_8)
}

/// Decode a document's bytes into text.
///
/// Malformed input for the detected encoding is an error rather than being
/// replaced, so two documents never compare equal by accident.
pub(crate) fn decode(data: &[u8]) -> Result<String, Error> {
    let (decoded, used, had_errors) = detect_encoding(data).decode(data);
    if had_errors {
        return Err(Error::Encoding(used.name().to_string()));
    }
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>", "UTF-8")]
    #[case(b"<a/>", "UTF-8")]
    // windows-1252 is what encoding_rs uses for 8859-1
    #[case(b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a/>", "windows-1252")]
    fn test_detect_encoding(#[case] data: &[u8], #[case] name: &str) {
        assert_eq!(detect_encoding(data).name(), name);
    }

    #[test]
    fn test_decode_latin1() {
        let data = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>\xe9</a>";
        let decoded = decode(data).unwrap();
        assert!(decoded.ends_with("<a>\u{e9}</a>"));
    }
}
