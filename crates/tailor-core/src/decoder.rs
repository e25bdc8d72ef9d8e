//! Decoding of command text written by older history formats.
//!
//! Some history files store commands backslash-escaped (marked by a literal `\0`
//! or `\1` sequence), others percent-encoded. [`CommandDecoder::decode`] undoes
//! whichever applies and repeats until the text stops changing.

use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDecoder;

impl CommandDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Returns the plain form of `code`.
    ///
    /// The result is a fixed point: decoding it again returns it unchanged.
    /// Each successful step makes the text strictly shorter, so this terminates.
    pub fn decode(&self, code: &str) -> String {
        let mut current = code.to_string();
        while let Some(next) = decode_step(&current) {
            current = next;
        }
        current
    }
}

/// One decoding pass, or `None` when nothing applies.
fn decode_step(code: &str) -> Option<String> {
    let decoded = if is_backslash_encoded(code) {
        String::from_utf8(unescape(code.as_bytes())).ok()?
    } else {
        percent_decode_str(code).decode_utf8().ok()?.into_owned()
    };
    (decoded != code).then_some(decoded)
}

fn is_backslash_encoded(code: &str) -> bool {
    code.contains("\\0") || code.contains("\\1")
}

/// C-style unescape: `\n \t \r \v \f \a \b`, `\xHH`, octal `\NNN`, and `\c` → `c`.
fn unescape(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let byte = input[i];
        if byte != b'\\' || i + 1 == input.len() {
            out.push(byte);
            i += 1;
            continue;
        }
        i += 1;
        match input[i] {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'f' => out.push(0x0c),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'x' if input.get(i + 1).is_some_and(u8::is_ascii_hexdigit) => {
                let digits = take_while(&input[i + 1..], 2, u8::is_ascii_hexdigit);
                out.push(parse_radix(digits, 16));
                i += digits.len();
            }
            b'0'..=b'7' => {
                let digits = take_while(&input[i..], 3, |b| (b'0'..=b'7').contains(b));
                out.push(parse_radix(digits, 8));
                i += digits.len() - 1;
            }
            other => out.push(other),
        }
        i += 1;
    }
    out
}

fn take_while(input: &[u8], max: usize, pred: impl Fn(&u8) -> bool) -> &[u8] {
    let len = input.iter().take(max).take_while(|b| pred(b)).count();
    &input[..len]
}

fn parse_radix(digits: &[u8], radix: u32) -> u8 {
    digits.iter().fold(0u32, |acc, d| {
        acc * radix + char::from(*d).to_digit(radix).unwrap_or(0)
    }) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode(code: &str) -> String {
        CommandDecoder::new().decode(code)
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(decode("$a = 1 + 2"), "$a = 1 + 2");
        assert_eq!(decode(""), "");
    }

    #[test]
    fn test_percent_encoding() {
        assert_eq!(decode("echo%20%22hi%22"), "echo \"hi\"");
        assert_eq!(decode("%24a%20%3D%201"), "$a = 1");
    }

    #[test]
    fn test_plus_is_not_a_space() {
        assert_eq!(decode("1+2"), "1+2");
        assert_eq!(decode("1%2B2"), "1+2");
    }

    #[test]
    fn test_invalid_utf8_percent_is_kept() {
        assert_eq!(decode("%FF%FE"), "%FF%FE");
    }

    #[test]
    fn test_backslash_encoding() {
        assert_eq!(decode("a\\040b"), "a b");
        assert_eq!(decode("line\\012next\\011tab"), "line\nnext\ttab");
        assert_eq!(decode("\\101\\102 \\x43"), "AB C");
        assert_eq!(decode("say \\\"hi\\\"\\0"), "say \"hi\"\0");
    }

    #[test]
    fn test_backslash_without_marker_is_percent_path() {
        assert_eq!(decode("path\\n%20x"), "path\\n x");
    }

    #[test]
    fn test_nested_encoding_reaches_fixed_point() {
        // "%2541" -> "%41" -> "A"
        assert_eq!(decode("%2541"), "A");
    }

    proptest! {
        #[test]
        fn prop_decode_is_idempotent(code in "[a-zA-Z0-9 %+\\\\\"'$=.x]{0,32}") {
            let once = decode(&code);
            prop_assert_eq!(decode(&once), once);
        }

        #[test]
        fn prop_decode_is_idempotent_on_any_text(code in any::<String>()) {
            let once = decode(&code);
            prop_assert_eq!(decode(&once), once);
        }
    }
}
