//! Lenient HTML tokenizer for server-rendered fragments and documents.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are lowercased. `<script>` and
//! `<style>` bodies are raw text up to the matching close tag; `<textarea>` and `<title>` bodies
//! are the same except that character references are decoded. There is no parse-error
//! recovery beyond "keep going": unterminated constructs run to end of input.
use crate::entities::decode_entities;
use crate::types::{Attributes, Token};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub(crate) fn is_raw_text_element(name: &str) -> bool {
    name == "script" || name == "style"
}

pub(crate) fn is_escapable_raw_text_element(name: &str) -> bool {
    name == "textarea" || name == "title"
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Find `close_tag` (e.g. `</script`) followed by optional ASCII whitespace and `>`.
/// Returns (start of close tag, index just past `>`), relative to `haystack`.
fn find_raw_text_close(haystack: &[u8], close_tag: &[u8]) -> Option<(usize, usize)> {
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= haystack.len() {
        i += memchr(b'<', &haystack[i..])?;
        if starts_with_ignore_ascii_case_at(haystack, i, close_tag) {
            let mut k = i + n;
            while k < haystack.len() && haystack[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < haystack.len() && haystack[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    out: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            out: Vec::new(),
        }
    }

    pub fn run(mut self) -> Vec<Token> {
        // Slice endpoints are only ever taken at ASCII structural bytes, so they stay on
        // UTF-8 char boundaries.
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() {
            if bytes[self.pos] != b'<' {
                self.text();
                continue;
            }
            let rest = &self.input[self.pos..];
            if rest.starts_with(COMMENT_START) {
                self.comment();
            } else if starts_with_ignore_ascii_case_at(bytes, self.pos, b"<!doctype") {
                self.doctype();
            } else if bytes.get(self.pos + 1) == Some(&b'/') {
                self.end_tag();
            } else if bytes.get(self.pos + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
                self.start_tag();
            } else {
                // A lone `<` is text.
                self.push_text(self.pos, self.pos + 1);
                self.pos += 1;
            }
        }
        self.out
    }

    fn push_text(&mut self, start: usize, end: usize) {
        let decoded = decode_entities(&self.input[start..end]);
        if decoded.is_empty() {
            return;
        }
        if let Some(Token::Text(prev)) = self.out.last_mut() {
            prev.push_str(&decoded);
        } else {
            self.out.push(Token::Text(decoded));
        }
    }

    fn text(&mut self) {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let end = memchr(b'<', &bytes[start..]).map_or(bytes.len(), |rel| start + rel);
        self.push_text(start, end);
        self.pos = end;
    }

    fn comment(&mut self) {
        let body_start = self.pos + COMMENT_START.len();
        match self.input[body_start..].find(COMMENT_END) {
            Some(rel) => {
                let body = &self.input[body_start..body_start + rel];
                self.out.push(Token::Comment(body.to_string()));
                self.pos = body_start + rel + COMMENT_END.len();
            }
            None => {
                self.out
                    .push(Token::Comment(self.input[body_start..].to_string()));
                self.pos = self.input.len();
            }
        }
    }

    fn doctype(&mut self) {
        let start = self.pos + 2;
        match self.input[start..].find('>') {
            Some(rel) => {
                let raw = self.input[start..start + rel].trim();
                // Drop the `doctype` keyword itself.
                let value = raw.get(7..).map(str::trim).unwrap_or("");
                self.out.push(Token::Doctype(value.to_string()));
                self.pos = start + rel + 1;
            }
            None => self.pos = self.input.len(),
        }
    }

    fn end_tag(&mut self) {
        let bytes = self.input.as_bytes();
        let start = self.pos + 2;
        let mut j = start;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        let name = self.input[start..j].to_ascii_lowercase();
        let close = memchr(b'>', &bytes[j..]).map_or(bytes.len(), |rel| j + rel + 1);
        if !name.is_empty() {
            self.out.push(Token::EndTag(name));
        }
        self.pos = close;
    }

    fn start_tag(&mut self) {
        let bytes = self.input.as_bytes();
        let len = bytes.len();
        let start = self.pos + 1;
        let mut k = start;
        while k < len && is_name_byte(bytes[k]) {
            k += 1;
        }
        let name = self.input[start..k].to_ascii_lowercase();
        let mut attributes: Attributes = Vec::new();
        let mut self_closing = false;

        loop {
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= len {
                break;
            }
            match bytes[k] {
                b'>' => {
                    k += 1;
                    break;
                }
                b'/' => {
                    if bytes.get(k + 1) == Some(&b'>') {
                        self_closing = true;
                        k += 2;
                        break;
                    }
                    k += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = k;
            while k < len && is_name_byte(bytes[k]) {
                k += 1;
            }
            if name_start == k {
                // Unsupported attribute-name byte; skip it.
                k += 1;
                continue;
            }
            let attr_name = self.input[name_start..k].to_ascii_lowercase();

            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            let value = if k < len && bytes[k] == b'=' {
                k += 1;
                while k < len && bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                    let quote = bytes[k];
                    k += 1;
                    let vstart = k;
                    k = memchr(quote, &bytes[k..]).map_or(len, |rel| k + rel);
                    let raw = &self.input[vstart..k];
                    if k < len {
                        k += 1;
                    }
                    Some(decode_entities(raw))
                } else {
                    let vstart = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        if bytes[k] == b'/' && bytes.get(k + 1) == Some(&b'>') {
                            break;
                        }
                        k += 1;
                    }
                    Some(decode_entities(&self.input[vstart..k]))
                }
            } else {
                None
            };

            // First occurrence of an attribute wins.
            if !attributes.iter().any(|(n, _)| *n == attr_name) {
                attributes.push((attr_name, value));
            }
        }

        let void = is_void_element(&name);
        let raw_text = is_raw_text_element(&name);
        let escapable = is_escapable_raw_text_element(&name);
        let text_body = (raw_text || escapable) && !self_closing;
        self.out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing: self_closing || void,
        });
        self.pos = k;

        if text_body {
            let close_tag = format!("</{name}");
            let body_start = self.pos;
            // Missing close tag: the rest of the input is the body.
            let (body_end, next) = match find_raw_text_close(&bytes[body_start..], close_tag.as_bytes())
            {
                Some((rel_start, rel_end)) => (body_start + rel_start, body_start + rel_end),
                None => (len, len),
            };
            let body = &self.input[body_start..body_end];
            let text = if escapable {
                decode_entities(body)
            } else {
                body.to_string()
            };
            if !text.is_empty() {
                self.out.push(Token::Text(text));
            }
            self.pos = next;
            self.out.push(Token::EndTag(name));
        }
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer::new(input).run()
}
