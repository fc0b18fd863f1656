//! Form controls to `application/x-www-form-urlencoded` pairs.
use crate::dom::Dom;
use crate::types::NodeId;

fn is_listed_control(dom: &Dom, id: NodeId) -> bool {
    matches!(
        dom.tag_name(id),
        Some("input" | "select" | "textarea" | "button")
    )
}

/// The `<form>` a control belongs to: its `form="id"` owner if that names a form, otherwise
/// the nearest enclosing form.
pub fn form_owner(dom: &Dom, control: NodeId) -> Option<NodeId> {
    if let Some(owner_id) = dom.attr(control, "form") {
        return dom
            .get_element_by_id(owner_id)
            .filter(|&f| dom.is_element_named(f, "form"));
    }
    dom.closest(control, "form")
}

/// Listed controls owned by `form`, in tree order.
fn form_elements(dom: &Dom, form: NodeId) -> Vec<NodeId> {
    let scope = if dom.is_connected(form) {
        dom.root()
    } else {
        form
    };
    dom.descendants(scope)
        .filter(|&n| is_listed_control(dom, n) && form_owner(dom, n) == Some(form))
        .collect()
}

fn input_type(dom: &Dom, control: NodeId) -> String {
    dom.attr(control, "type")
        .unwrap_or("text")
        .trim()
        .to_ascii_lowercase()
}

fn option_value(dom: &Dom, option: NodeId) -> String {
    match dom.attr(option, "value") {
        Some(value) => value.to_string(),
        None => dom
            .text_content(option)
            .split_ascii_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn select_values(dom: &Dom, select: NodeId) -> Vec<String> {
    let options: Vec<NodeId> = dom
        .descendants(select)
        .filter(|&n| dom.is_element_named(n, "option") && !dom.has_attr(n, "disabled"))
        .collect();
    let selected: Vec<NodeId> = options
        .iter()
        .copied()
        .filter(|&o| dom.has_attr(o, "selected"))
        .collect();

    if dom.has_attr(select, "multiple") {
        return selected.iter().map(|&o| option_value(dom, o)).collect();
    }
    selected
        .first()
        .or(options.first())
        .map(|&o| vec![option_value(dom, o)])
        .unwrap_or_default()
}

/// `(name, value)` pairs for every successful control of `form`, in tree order.
///
/// Disabled and unnamed controls are skipped, as are buttons and `submit`/`reset`/`file`/`image`
/// inputs. Checkboxes and radios count only when `checked` and default to `on`.
pub fn form_entries(dom: &Dom, form: NodeId) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for control in form_elements(dom, form) {
        if dom.has_attr(control, "disabled") {
            continue;
        }
        let name = match dom.attr(control, "name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        match dom.tag_name(control) {
            Some("input") => {
                let kind = input_type(dom, control);
                match kind.as_str() {
                    "button" | "submit" | "reset" | "file" | "image" => {}
                    "checkbox" | "radio" => {
                        if dom.has_attr(control, "checked") {
                            let value = dom.attr(control, "value").unwrap_or("");
                            let value = if value.is_empty() { "on" } else { value };
                            out.push((name, value.to_string()));
                        }
                    }
                    _ => {
                        let value = dom.attr(control, "value").unwrap_or("").to_string();
                        out.push((name, value));
                    }
                }
            }
            Some("textarea") => out.push((name, dom.text_content(control))),
            Some("select") => {
                for value in select_values(dom, control) {
                    out.push((name.clone(), value));
                }
            }
            _ => {}
        }
    }
    out
}

/// Percent-encode keys and values and join them as `k=v&k=v`.
pub fn urlencode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
