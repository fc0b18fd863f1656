use html::{Dom, NodeId};
use url::Url;

const NON_NAV_SCHEMES: [&str; 3] = ["javascript:", "data:", "mailto:"];

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// The in-place navigation target for a click on `node`, or `None` when the click should
/// keep its default behavior.
pub fn smooth_nav_target(dom: &Dom, node: NodeId, location: &Url) -> Option<Url> {
    let link = dom.closest(node, "a")?;
    let href = dom.attr(link, "href")?.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if NON_NAV_SCHEMES
        .iter()
        .any(|scheme| starts_with_ignore_case(href, scheme))
    {
        return None;
    }
    if let Some(target) = dom.attr(link, "target")
        && !target.trim().is_empty()
        && !target.trim().eq_ignore_ascii_case("_self")
    {
        return None;
    }
    if dom.has_attr(link, "download") {
        return None;
    }
    if dom.attr(link, "onclick").is_some_and(|v| !v.trim().is_empty()) {
        return None;
    }

    let resolved = location.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    (resolved.origin() == location.origin()).then_some(resolved)
}
