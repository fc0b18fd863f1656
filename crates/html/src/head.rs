use crate::dom::Dom;
use crate::types::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadMetadata {
    pub title: Option<String>,
    pub base_href: Option<String>,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_in(dom: &Dom, scope: Option<NodeId>, tag: &str) -> Option<NodeId> {
    scope.and_then(|s| dom.find_first(s, tag))
}

/// Title and `<base href>` from the document head, falling back to a whole-document search
/// for the title when the head does not carry one.
pub fn extract_head_metadata(dom: &Dom) -> HeadMetadata {
    let head = dom.head();
    let title = first_in(dom, head, "title")
        .or_else(|| dom.find_first(dom.root(), "title"))
        .map(|t| collapse_whitespace(&dom.text_content(t)));
    let base_href = first_in(dom, head, "base")
        .and_then(|b| dom.attr(b, "href"))
        .map(str::to_string)
        .filter(|href| !href.trim().is_empty());
    HeadMetadata { title, base_href }
}

/// The document title with whitespace collapsed; `""` when there is no `<title>`.
pub fn document_title(dom: &Dom) -> String {
    extract_head_metadata(dom).title.unwrap_or_default()
}
