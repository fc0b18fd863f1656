//! Markup serialization of arena nodes.
use crate::dom::Dom;
use crate::tokenizer::{is_raw_text_element, is_void_element};
use crate::types::{NodeData, NodeId};

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn write_node(dom: &Dom, id: NodeId, raw_parent: bool, out: &mut String) {
    match dom.data(id) {
        NodeData::Document { .. } => write_children(dom, id, false, out),
        NodeData::Text(text) => {
            if raw_parent {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (name, value) in &element.attributes {
                out.push(' ');
                out.push_str(name);
                if let Some(value) = value {
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_element(&element.name) {
                return;
            }
            write_children(dom, id, is_raw_text_element(&element.name), out);
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

fn write_children(dom: &Dom, id: NodeId, raw: bool, out: &mut String) {
    for &child in dom.children(id) {
        write_node(dom, child, raw, out);
    }
}

/// Markup of the children of `id`.
pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    let raw = dom.tag_name(id).is_some_and(is_raw_text_element);
    write_children(dom, id, raw, &mut out);
    out
}

/// Markup of `id` itself, including its own tag.
pub fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_builder::parse_fragment;

    #[test]
    fn escapes_text_and_attributes() {
        let dom = parse_fragment("<a title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2</a>");
        assert_eq!(
            inner_html(&dom, dom.root()),
            "<a title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2</a>"
        );
    }

    #[test]
    fn void_and_valueless_attributes() {
        let dom = parse_fragment("<input type=checkbox checked><br/>");
        assert_eq!(
            inner_html(&dom, dom.root()),
            "<input type=\"checkbox\" checked><br>"
        );
    }

    #[test]
    fn script_text_is_not_escaped() {
        let dom = parse_fragment("<script>if (a < b && c) {}</script>");
        let script = dom.find_first(dom.root(), "script").expect("script");
        assert_eq!(inner_html(&dom, script), "if (a < b && c) {}");
        assert_eq!(
            outer_html(&dom, script),
            "<script>if (a < b && c) {}</script>"
        );
    }
}
