use net::Method;
use page::notify::ERROR_TEXT_ID;
use page::{GENERIC_ERROR, IndicatorPhase, TriggerEvent};
use page_test_support::{Harness, HostCall};

const HOME: &str = "<html><head><title>One</title></head><body><p id=\"x\">one</p></body></html>";

#[test]
fn successful_navigation_replaces_title_and_body() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/two", None);
    let (id, request) = h.expect_fetch();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "http://app.test/two");

    h.respond_ok(
        id,
        "<html><head><title>Two</title></head><body><main id=\"m\">second</main></body></html>",
    );
    assert_eq!(h.page.title(), "Two");
    assert_eq!(h.body_html(), "<main id=\"m\">second</main>");
    assert_eq!(h.page.location().as_str(), "http://app.test/two");
    let current = h.page.history().current().unwrap();
    assert_eq!(current.title, "Two");
    assert_eq!(current.url, "http://app.test/two");
    assert!(h.page.is_idle());
}

#[test]
fn navigation_replays_head_then_body_scripts() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/two", None);
    let (id, _) = h.expect_fetch();
    h.respond_ok(
        id,
        "<html><head><title>T</title><script src=\"/h.js\"></script></head>\
         <body><p>x</p><script>b()</script></body></html>",
    );
    assert_eq!(
        *h.host.calls(),
        vec![
            HostCall::External("http://app.test/h.js".to_string()),
            HostCall::Inline("b()".to_string()),
        ]
    );
    assert_eq!(
        h.body_html(),
        "<p>x</p><script>b()</script><script src=\"http://app.test/h.js\"></script>"
    );
}

#[test]
fn failed_navigation_keeps_document_and_shows_generic_error() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/broken", None);
    let (id, _) = h.expect_fetch();
    h.respond(id, 500, "<html><head><title>Err</title></head><body>boom</body></html>");

    assert_eq!(h.page.title(), "One");
    assert_eq!(h.inner_html("x"), "one");
    assert!(h.body_html().starts_with("<p id=\"x\">one</p>"));
    assert!(h.page.history().is_empty());
    assert_eq!(h.page.location().as_str(), "http://app.test/");
    assert_eq!(h.page.notifier().error_invocations(), 1);
    assert_eq!(h.inner_html(ERROR_TEXT_ID), GENERIC_ERROR);
}

#[test]
fn transport_failure_also_surfaces_the_banner() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/two", None);
    let (id, _) = h.expect_fetch();
    h.fail(id, "connection refused");
    assert_eq!(h.page.notifier().error_invocations(), 1);
    assert_eq!(h.page.title(), "One");
}

#[test]
fn overlapping_navigations_apply_in_completion_order() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/a", None);
    let _ = h.page.navigate("/b", None);
    let (first, _) = h.expect_fetch();
    let (second, _) = h.expect_fetch();

    h.respond_ok(second, "<title>B</title><p>b</p>");
    h.respond_ok(first, "<title>A</title><p>a</p>");

    let urls: Vec<&str> = h
        .page
        .history()
        .entries()
        .iter()
        .map(|e| e.url.as_str())
        .collect();
    assert_eq!(urls, ["http://app.test/b", "http://app.test/a"]);
    assert_eq!(h.page.title(), "A");
    assert_eq!(h.body_html(), "<p>a</p>");
}

#[test]
fn fast_response_never_shows_the_overlay() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/two", None);
    let (id, _) = h.expect_fetch();
    h.advance_ms(40);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Idle);
    h.respond_ok(id, "<p>two</p>");
    h.advance_ms(500);
    assert_eq!(h.page.loading().shown_count(), 0);
    assert_eq!(h.page.next_deadline(), None);
}

#[test]
fn response_inside_indicator_grace_cancels_it() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/two", None);
    let (id, _) = h.expect_fetch();
    h.advance_ms(50);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Armed);
    assert_eq!(h.page.loading().active_count(), 1);
    h.advance_ms(100);
    h.respond_ok(id, "<p>two</p>");
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Idle);
    assert!(!h.page.loading().has_pending_timer());
    h.advance_ms(500);
    assert_eq!(h.page.loading().shown_count(), 0);
}

#[test]
fn slow_response_shows_then_fades_the_overlay() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/two", None);
    let (id, _) = h.expect_fetch();
    h.advance_ms(169);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Armed);
    h.advance_ms(1);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Visible);
    let overlay = h.page.loading().overlay().unwrap();
    assert!(h.page.dom().is_connected(overlay));
    assert!(h.page.dom().text_content(overlay).contains("Loading"));

    h.respond_ok(id, "<p>two</p>");
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Fading);
    assert!(!h.page.is_idle());
    h.advance_ms(160);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Idle);
    assert!(h.page.is_idle());
    assert_eq!(h.page.loading().shown_count(), 1);
}

#[test]
fn overlay_stays_up_while_a_later_navigation_is_outstanding() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/a", None);
    let _ = h.page.navigate("/b", None);
    let (first, _) = h.expect_fetch();
    let (second, _) = h.expect_fetch();
    h.advance_ms(200);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Visible);
    let overlay = h.page.loading().overlay().unwrap();

    h.respond_ok(first, "<title>A</title><p>a</p>");
    let body = h.page.dom().body().unwrap();
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Visible);
    assert_eq!(h.page.loading().active_count(), 1);
    assert_eq!(h.page.dom().parent(overlay), Some(body));
    assert!(h.page.dom().text_content(overlay).contains("Please wait"));

    h.respond_ok(second, "<title>B</title><p>b</p>");
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Fading);
    h.advance_ms(160);
    assert_eq!(h.page.loading().phase(), IndicatorPhase::Idle);
    assert_eq!(h.body_html(), "<p>b</p>");
    assert_eq!(h.page.loading().shown_count(), 1);
}

#[test]
fn back_and_forward_refetch_without_pushing() {
    let mut h = Harness::new(HOME);
    for path in ["/a", "/b"] {
        let _ = h.page.navigate(path, None);
        let (id, _) = h.expect_fetch();
        h.respond_ok(id, &format!("<title>{path}</title><p>{path}</p>"));
    }
    assert!(!h.page.forward());

    assert!(h.page.back());
    let (id, request) = h.expect_fetch();
    assert_eq!(request.url, "http://app.test/a");
    h.respond_ok(id, "<title>/a</title><p>/a</p>");
    assert_eq!(h.page.history().len(), 2);
    assert_eq!(h.page.history().index(), 0);
    assert_eq!(h.page.location().as_str(), "http://app.test/a");
    assert!(!h.page.back());

    assert!(h.page.forward());
    let (_, request) = h.expect_fetch();
    assert_eq!(request.url, "http://app.test/b");
}

#[test]
fn reload_refetches_the_current_location() {
    let mut h = Harness::new(HOME);
    h.page.reload();
    let (id, request) = h.expect_fetch();
    assert_eq!(request.url, "http://app.test/");
    h.respond_ok(id, "<title>One again</title><p>fresh</p>");
    assert_eq!(h.page.title(), "One again");
    assert!(h.page.history().is_empty());
}

#[test]
fn navigate_with_event_prevents_default() {
    let mut h = Harness::new(HOME);
    let mut event = h.event_on("x");
    let _ = h.page.navigate("/two", Some(&mut event));
    assert!(event.default_prevented());
    assert!(h.take_fetch().is_some());
}

#[test]
fn same_origin_link_click_navigates_in_place() {
    let mut h = Harness::new(
        "<body><a id=\"in\" href=\"/next\"><span id=\"label\">next</span></a>\
         <a id=\"out\" href=\"https://elsewhere.test/\">away</a></body>",
    );
    let label = h.id("label");
    let mut event = TriggerEvent::new(label);
    assert!(h.page.click(label, &mut event));
    assert!(event.default_prevented());
    let (_, request) = h.expect_fetch();
    assert_eq!(request.url, "http://app.test/next");

    let out = h.id("out");
    let mut event = TriggerEvent::new(out);
    assert!(!h.page.click(out, &mut event));
    assert!(!event.default_prevented());
    assert!(h.take_fetch().is_none());
}

#[test]
fn smooth_nav_can_be_switched_off() {
    let config = page::RuntimeConfig {
        smooth_nav: false,
        ..Default::default()
    };
    let mut h = Harness::with_config("<body><a id=\"in\" href=\"/next\">next</a></body>", config);
    let link = h.id("in");
    assert!(!h.page.click(link, &mut TriggerEvent::new(link)));
    assert!(h.take_fetch().is_none());
}

#[test]
fn unreachable_network_shows_the_banner() {
    let mut h = Harness::new(HOME);
    h.disconnect_network();
    let _ = h.page.navigate("/two", None);
    assert_eq!(h.page.notifier().error_invocations(), 1);
    assert_eq!(h.page.pending_requests(), 0);
    assert!(h.page.is_idle());
}

#[test]
fn script_src_honours_incoming_base_href() {
    let mut h = Harness::new(HOME);
    let _ = h.page.navigate("/shop/list", None);
    let (id, _) = h.expect_fetch();
    h.respond_ok(
        id,
        "<html><head><base href=\"/static/\"><script src=\"app.js\"></script></head><body></body></html>",
    );
    assert_eq!(h.host.loaded(), ["http://app.test/static/app.js"]);
}
