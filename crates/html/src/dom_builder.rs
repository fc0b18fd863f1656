use crate::dom::Dom;
use crate::tokenizer::tokenize;
use crate::types::{Element, NodeData, NodeId, Token};

/// Build `tokens` into `dom`, appending top-level nodes under `dom.root()`.
///
/// End tags close the nearest open element with the same name; end tags with no matching
/// open element are dropped.
fn build_into(dom: &mut Dom, tokens: Vec<Token>) {
    let root = dom.root();
    let mut open_elements: Vec<NodeId> = Vec::new();

    for token in tokens {
        let parent = open_elements.last().copied().unwrap_or(root);
        match token {
            Token::Doctype(value) => dom.set_doctype(Some(value)),
            Token::Comment(text) => {
                let node = dom.create_comment(text);
                attach(dom, parent, node);
            }
            Token::Text(text) => {
                if !text.is_empty() {
                    let node = dom.create_text(text);
                    attach(dom, parent, node);
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let node = dom.create_element(Element::with_attributes(&name, attributes));
                attach(dom, parent, node);
                if !self_closing {
                    open_elements.push(node);
                }
            }
            Token::EndTag(name) => {
                if let Some(pos) = open_elements
                    .iter()
                    .rposition(|&n| dom.is_element_named(n, &name))
                {
                    open_elements.truncate(pos);
                }
            }
        }
    }
}

fn attach(dom: &mut Dom, parent: NodeId, node: NodeId) {
    // Freshly created nodes under an element/document parent cannot fail to attach.
    if let Err(err) = dom.append_child(parent, node) {
        log::trace!("dropping node during tree build: {err}");
    }
}

/// Parse markup into a detached fragment: the returned arena's root holds the top-level
/// nodes. Nothing is executed; `<script>` elements are inert data.
pub fn parse_fragment(html: &str) -> Dom {
    let mut dom = Dom::new();
    build_into(&mut dom, tokenize(html));
    dom
}

fn is_head_content(dom: &Dom, node: NodeId) -> bool {
    matches!(
        dom.tag_name(node),
        Some("title" | "meta" | "link" | "base" | "style")
    )
}

fn is_inter_element_whitespace(dom: &Dom, node: NodeId) -> bool {
    matches!(dom.data(node), NodeData::Text(text) if text.trim().is_empty())
}

/// Parse a full document and normalize it to `html > (head, body)`.
pub fn parse_document(html: &str) -> Dom {
    let mut dom = parse_fragment(html);
    let root = dom.root();

    let html_el = match dom
        .children(root)
        .iter()
        .copied()
        .find(|&n| dom.is_element_named(n, "html"))
    {
        Some(existing) => {
            // Stray top-level nodes around <html> move inside it.
            let strays: Vec<NodeId> = dom
                .children(root)
                .iter()
                .copied()
                .filter(|&n| n != existing && dom.element(n).is_some())
                .collect();
            for node in strays {
                attach(&mut dom, existing, node);
            }
            existing
        }
        None => {
            let created = dom.create_element(Element::new("html"));
            let top: Vec<NodeId> = dom.children(root).to_vec();
            for node in top {
                attach(&mut dom, created, node);
            }
            attach(&mut dom, root, created);
            created
        }
    };

    let children: Vec<NodeId> = dom.children(html_el).to_vec();
    let head = children
        .iter()
        .copied()
        .find(|&n| dom.is_element_named(n, "head"));
    let body = children
        .iter()
        .copied()
        .find(|&n| dom.is_element_named(n, "body"));

    let body_index = body.and_then(|b| children.iter().position(|&n| n == b));
    let head = head.unwrap_or_else(|| dom.create_element(Element::new("head")));
    let body = body.unwrap_or_else(|| dom.create_element(Element::new("body")));
    let body_first = dom.children(body).first().copied();

    for (index, node) in children.into_iter().enumerate() {
        if node == head || node == body {
            continue;
        }
        if is_inter_element_whitespace(&dom, node) {
            dom.remove(node);
        } else if is_head_content(&dom, node) {
            attach(&mut dom, head, node);
        } else if let (Some(first), true) = (body_first, body_index.is_some_and(|b| index < b)) {
            // Content written before an explicit <body> stays ahead of the body's own content.
            if let Err(err) = dom.insert_before(body, node, first) {
                log::trace!("could not move node into <body>: {err}");
            }
        } else {
            attach(&mut dom, body, node);
        }
    }

    if let Err(err) = dom.prepend_child(html_el, head) {
        log::trace!("could not place <head>: {err}");
    }
    attach(&mut dom, html_el, body);
    dom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{inner_html, outer_html};

    #[test]
    fn fragment_keeps_top_level_siblings() {
        let dom = parse_fragment("<p>a</p>text<!--c--><b>b</b>");
        assert_eq!(dom.children(dom.root()).len(), 4);
        assert_eq!(inner_html(&dom, dom.root()), "<p>a</p>text<!--c--><b>b</b>");
    }

    #[test]
    fn unmatched_end_tag_is_ignored() {
        let dom = parse_fragment("<div><span>x</em></span></div>");
        assert_eq!(inner_html(&dom, dom.root()), "<div><span>x</span></div>");
    }

    #[test]
    fn unclosed_elements_close_at_end() {
        let dom = parse_fragment("<ul><li>one<li>two");
        assert_eq!(
            inner_html(&dom, dom.root()),
            "<ul><li>one<li>two</li></li></ul>"
        );
    }

    #[test]
    fn document_without_skeleton_is_normalized() {
        let dom = parse_document("<title>T</title><p>hi</p>");
        let html = dom.document_element().expect("html");
        assert_eq!(
            outer_html(&dom, html),
            "<html><head><title>T</title></head><body><p>hi</p></body></html>"
        );
    }

    #[test]
    fn full_document_keeps_its_structure() {
        let src = "<!DOCTYPE html><html><head><title>X</title></head><body><div id=\"b\">y</div></body></html>";
        let dom = parse_document(src);
        assert_eq!(dom.doctype(), Some("html"));
        let body = dom.body().expect("body");
        assert_eq!(inner_html(&dom, body), "<div id=\"b\">y</div>");
        let head = dom.head().expect("head");
        assert_eq!(inner_html(&dom, head), "<title>X</title>");
    }

    #[test]
    fn script_in_fragment_is_inert_element() {
        let dom = parse_fragment("<div>a</div><script>run()</script>");
        let script = dom.find_first(dom.root(), "script").expect("script");
        assert_eq!(dom.text_content(script), "run()");
    }
}
