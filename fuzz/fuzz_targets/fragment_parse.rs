#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    let fragment = html::parse_fragment(&input);
    let markup = html::inner_html(&fragment, fragment.root());
    // Serialized output must parse again without panicking.
    let again = html::parse_fragment(&markup);
    let _ = html::inner_html(&again, again.root());
    let _ = html::collect_scripts(&fragment, fragment.root());

    let document = html::parse_document(&input);
    let _ = html::document_title(&document);
    if let Some(body) = document.body() {
        let _ = html::inner_html(&document, body);
    }
});
