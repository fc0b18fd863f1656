use crate::dom::Dom;
use crate::types::NodeId;

/// What a `<script>` element asks for, captured before its markup is inserted anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptDescriptor {
    /// `<script src="…">`; the value is the raw attribute, not yet resolved.
    External { src: String },
    Inline { text: String },
}

impl ScriptDescriptor {
    pub fn is_external(&self) -> bool {
        matches!(self, ScriptDescriptor::External { .. })
    }
}

fn describe(dom: &Dom, script: NodeId) -> ScriptDescriptor {
    match dom.attr(script, "src").map(str::trim) {
        Some(src) if !src.is_empty() => ScriptDescriptor::External {
            src: src.to_string(),
        },
        _ => ScriptDescriptor::Inline {
            text: dom.text_content(script),
        },
    }
}

/// Every `<script>` at or below `from`, in document order.
pub fn collect_scripts(dom: &Dom, from: NodeId) -> Vec<ScriptDescriptor> {
    dom.descendants(from)
        .filter(|&n| dom.is_element_named(n, "script"))
        .map(|n| describe(dom, n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_builder::{parse_document, parse_fragment};

    #[test]
    fn scripts_are_collected_in_document_order() {
        let dom = parse_fragment(
            "<script>one()</script><div><script src=\"/a.js\"></script><p><script>two()</script></p></div>",
        );
        assert_eq!(
            collect_scripts(&dom, dom.root()),
            vec![
                ScriptDescriptor::Inline {
                    text: "one()".to_string()
                },
                ScriptDescriptor::External {
                    src: "/a.js".to_string()
                },
                ScriptDescriptor::Inline {
                    text: "two()".to_string()
                },
            ]
        );
    }

    #[test]
    fn blank_src_counts_as_inline() {
        let dom = parse_fragment("<script src=\" \">x()</script>");
        let scripts = collect_scripts(&dom, dom.root());
        assert!(!scripts[0].is_external());
    }

    #[test]
    fn head_scripts_come_before_body_scripts() {
        let dom = parse_document(
            "<html><head><script>h()</script></head><body><script>b()</script></body></html>",
        );
        let root = dom.document_element().expect("html");
        let texts: Vec<_> = collect_scripts(&dom, root)
            .into_iter()
            .map(|s| match s {
                ScriptDescriptor::Inline { text } => text,
                ScriptDescriptor::External { src } => src,
            })
            .collect();
        assert_eq!(texts, vec!["h()", "b()"]);
    }
}
