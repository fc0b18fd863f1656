use memchr::memchr;

/// Named references we decode. Anything else passes through untouched.
const NAMED: &[(&str, char)] = &[
    ("amp;", '&'),
    ("lt;", '<'),
    ("gt;", '>'),
    ("quot;", '"'),
    ("apos;", '\''),
    ("nbsp;", '\u{00A0}'),
    ("times;", '\u{00D7}'),
    ("hellip;", '\u{2026}'),
];

const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

/// Decode the narrow set of character references server fragments actually use.
///
/// Numeric references must be well-formed and `;`-terminated and name a valid scalar value;
/// malformed or unknown references are copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return s.to_string();
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;

    while i < bytes.len() {
        let Some(rel) = memchr(b'&', &bytes[i..]) else {
            out.push_str(&s[i..]);
            break;
        };
        let amp = i + rel;
        out.push_str(&s[i..amp]);

        match decode_one(&s[amp + 1..]) {
            Some((ch, consumed)) => {
                out.push(ch);
                i = amp + 1 + consumed;
            }
            None => {
                out.push('&');
                i = amp + 1;
            }
        }
    }

    out
}

/// `rest` starts right after `&`. Returns the decoded char and the bytes consumed after `&`.
fn decode_one(rest: &str) -> Option<(char, usize)> {
    if let Some(numeric) = rest.strip_prefix('#') {
        let (digits, radix, prefix) = match numeric.as_bytes().first() {
            Some(b'x' | b'X') => (&numeric[1..], 16, 2),
            _ => (numeric, 10, 1),
        };
        let max = if radix == 16 {
            MAX_HEX_DIGITS
        } else {
            MAX_DEC_DIGITS
        };
        let end = digits.find(';')?;
        if end == 0 || end > max {
            return None;
        }
        let run = &digits[..end];
        let valid = if radix == 16 {
            run.bytes().all(|b| b.is_ascii_hexdigit())
        } else {
            run.bytes().all(|b| b.is_ascii_digit())
        };
        if !valid {
            return None;
        }
        let ch = u32::from_str_radix(run, radix).ok().and_then(char::from_u32)?;
        return Some((ch, prefix + end + 1));
    }

    NAMED
        .iter()
        .find(|(name, _)| rest.starts_with(name))
        .map(|(name, ch)| (*ch, name.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(decode_entities("120×32 π"), "120×32 π");
    }

    #[test]
    fn named_references_decode() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
        assert_eq!(decode_entities("&times;"), "×");
    }

    #[test]
    fn numeric_references_decode() {
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;"), "×");
        assert_eq!(decode_entities("&#x10FFFF;"), "\u{10FFFF}");
    }

    #[test]
    fn malformed_references_pass_through() {
        assert_eq!(decode_entities("&notanentity;"), "&notanentity;");
        assert_eq!(decode_entities("&amp"), "&amp");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#x110000;"), "&#x110000;");
        assert_eq!(decode_entities("&#11141111;"), "&#11141111;");
        assert_eq!(decode_entities("&#;"), "&#;");
        assert_eq!(decode_entities("&&"), "&&");
    }

    #[test]
    fn malformed_reference_does_not_swallow_the_next_one() {
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
    }
}
