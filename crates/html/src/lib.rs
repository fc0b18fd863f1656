pub mod collect;
pub mod form;
pub mod head;
pub mod serialize;

mod dom;
mod dom_builder;
mod entities;
mod tokenizer;
mod types;

use memchr::{memchr, memchr2};

pub fn is_html(ct: &Option<String>) -> bool {
    let Some(value) = ct.as_deref() else {
        return false;
    };
    contains_ignore_ascii_case(value, b"text/html")
        || contains_ignore_ascii_case(value, b"application/xhtml")
}

fn contains_ignore_ascii_case(haystack: &str, needle: &[u8]) -> bool {
    let hay = haystack.as_bytes();
    let n = needle.len();
    if n == 0 {
        return true;
    }
    let hay_len = hay.len();
    if hay_len < n {
        return false;
    }
    let first = needle[0];
    let (a, b) = if first.is_ascii_alphabetic() {
        (first.to_ascii_lowercase(), first.to_ascii_uppercase())
    } else {
        (first, first)
    };
    if n == 1 {
        if a == b {
            return memchr(a, hay).is_some();
        }
        return memchr2(a, b, hay).is_some();
    }
    let mut i = 0;
    while i + n <= hay_len {
        let rel = if a == b {
            memchr(a, &hay[i..])
        } else {
            memchr2(a, b, &hay[i..])
        };
        let Some(rel) = rel else {
            return false;
        };
        let pos = i + rel;
        if pos + n <= hay_len && hay[pos..pos + n].eq_ignore_ascii_case(needle) {
            return true;
        }
        i = pos + 1;
    }
    false
}

pub use crate::collect::{ScriptDescriptor, collect_scripts};
pub use crate::dom::{Descendants, Dom, DomError, DomResult};
pub use crate::dom_builder::{parse_document, parse_fragment};
pub use crate::form::{form_entries, form_owner, urlencode_pairs};
pub use crate::head::{HeadMetadata, document_title, extract_head_metadata};
pub use crate::serialize::{inner_html, outer_html};
pub use crate::tokenizer::{Tokenizer, tokenize};
pub use crate::types::{Attributes, Element, NodeData, NodeId, Token};
