//! Fragment splicing and ordered script replay.
//!
//! Markup is parsed into a detached arena first, so collecting `<script>` descriptors never
//! runs anything. Inserted script elements stay inert; only the explicit replay pass hands
//! code to the host.
use core_types::SwapMode;
use html::{
    Dom, DomError, DomResult, Element, NodeId, ScriptDescriptor, collect_scripts, parse_fragment,
};
use url::Url;

use crate::host::PageHost;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    Applied { scripts: usize },
    /// No connected element has the target id. Not an error.
    TargetMissing,
    /// `SwapMode::None`: the response is dropped.
    Skipped,
    Failed(DomError),
}

/// Merge `html` into `target` according to `mode` and return the scripts it carried, in
/// document order.
pub(crate) fn splice(
    dom: &mut Dom,
    target: NodeId,
    mode: SwapMode,
    html: &str,
) -> DomResult<Vec<ScriptDescriptor>> {
    let fragment = parse_fragment(html);
    let scripts = collect_scripts(&fragment, fragment.root());
    let nodes = dom.import_children(&fragment, fragment.root());

    match mode {
        SwapMode::ReplaceOuter => dom.replace_with(target, &nodes)?,
        SwapMode::Append => {
            for &node in &nodes {
                dom.append_child(target, node)?;
            }
        }
        SwapMode::Prepend => match dom.children(target).first().copied() {
            Some(first) => {
                for &node in &nodes {
                    dom.insert_before(target, node, first)?;
                }
            }
            None => {
                for &node in &nodes {
                    dom.append_child(target, node)?;
                }
            }
        },
        SwapMode::ReplaceInner => {
            dom.clear_children(target)?;
            for &node in &nodes {
                dom.append_child(target, node)?;
            }
        }
        SwapMode::None => return Ok(Vec::new()),
    }
    Ok(scripts)
}

fn replay_parent(dom: &Dom) -> DomResult<NodeId> {
    dom.body()
        .or_else(|| dom.document_element())
        .ok_or(DomError::NoBody)
}

fn resolve_src(location: &Url, src: &str) -> String {
    match location.join(src) {
        Ok(url) => url.to_string(),
        Err(err) => {
            log::debug!("script src {src:?} not resolvable ({err}); using it as is");
            src.to_string()
        }
    }
}

/// Replay `scripts` in order as fresh elements at the end of the body.
///
/// External scripts are attached with an absolute `src` and left in place. Inline scripts
/// are attached, run, then removed again.
pub(crate) fn replay_scripts(
    dom: &mut Dom,
    host: &mut dyn PageHost,
    location: &Url,
    scripts: &[ScriptDescriptor],
) -> DomResult<usize> {
    if scripts.is_empty() {
        return Ok(0);
    }
    let parent = replay_parent(dom)?;
    for script in scripts {
        match script {
            ScriptDescriptor::External { src } => {
                let src = resolve_src(location, src);
                let mut el = Element::new("script");
                el.set_attr("src", &src);
                let node = dom.create_element(el);
                dom.append_child(parent, node)?;
                host.load_external(&src);
            }
            ScriptDescriptor::Inline { text } => {
                let node = dom.create_element(Element::new("script"));
                dom.set_text_content(node, text)?;
                dom.append_child(parent, node)?;
                host.run_inline(text);
                dom.remove(node);
            }
        }
    }
    Ok(scripts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::{inner_html, parse_document};

    #[derive(Default)]
    struct Log(Vec<String>);

    impl PageHost for Log {
        fn run_inline(&mut self, code: &str) {
            self.0.push(format!("run:{code}"));
        }
        fn load_external(&mut self, src: &str) {
            self.0.push(format!("load:{src}"));
        }
        fn alert(&mut self, _message: &str) {}
    }

    fn page() -> Dom {
        parse_document("<body><div id=\"t\"><p>old</p></div></body>")
    }

    fn target(dom: &Dom) -> NodeId {
        dom.get_element_by_id("t").expect("target")
    }

    #[test]
    fn modes_merge_content() {
        let cases = [
            (SwapMode::ReplaceInner, "<div id=\"t\"><i>new</i></div>"),
            (SwapMode::Append, "<div id=\"t\"><p>old</p><i>new</i></div>"),
            (SwapMode::Prepend, "<div id=\"t\"><i>new</i><p>old</p></div>"),
            (SwapMode::ReplaceOuter, "<i>new</i>"),
            (SwapMode::None, "<div id=\"t\"><p>old</p></div>"),
        ];
        for (mode, expected) in cases {
            let mut dom = page();
            let t = target(&dom);
            splice(&mut dom, t, mode, "<i>new</i>").unwrap();
            let body = dom.body().unwrap();
            assert_eq!(inner_html(&dom, body), expected, "{mode}");
        }
    }

    #[test]
    fn prepend_keeps_fragment_order() {
        let mut dom = page();
        let t = target(&dom);
        splice(&mut dom, t, SwapMode::Prepend, "<a></a><b></b>").unwrap();
        assert_eq!(inner_html(&dom, t), "<a></a><b></b><p>old</p>");
    }

    #[test]
    fn replace_outer_with_nothing_removes_target() {
        let mut dom = page();
        let t = target(&dom);
        splice(&mut dom, t, SwapMode::ReplaceOuter, "").unwrap();
        assert!(dom.get_element_by_id("t").is_none());
    }

    #[test]
    fn replay_runs_inline_once_and_keeps_external() {
        let mut dom = page();
        let mut host = Log::default();
        let location = Url::parse("http://example.test/app/page").unwrap();
        let t = target(&dom);
        let scripts = splice(
            &mut dom,
            t,
            SwapMode::ReplaceInner,
            "<script>a()</script><script src=\"lib.js\"></script><script>b()</script>",
        )
        .unwrap();
        let count = replay_scripts(&mut dom, &mut host, &location, &scripts).unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            host.0,
            vec!["run:a()", "load:http://example.test/app/lib.js", "run:b()"]
        );
        let body = dom.body().unwrap();
        let last = *dom.children(body).last().unwrap();
        assert_eq!(dom.attr(last, "src"), Some("http://example.test/app/lib.js"));
        assert_eq!(dom.children(body).len(), 2);
    }
}
