//! Dispatch behaviour end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spa_router::config::RouterConfig;
use spa_router::routing::{match_path, normalize, DynamicMap, RouteOptions, SurfaceOp, View};
use spa_router::Outcome;

mod common;
use common::{load, not_found, path, Fixture};

#[test]
fn test_static_patterns_match_iff_normalized_equal() {
    let cases = [
        ("/about", "/about", true),
        ("/about", "//about", true),
        ("/about/", "/about", false),
        ("/a\\b", "/a/b", true),
        ("/about", "/About", false),
        ("/a.b", "/axb", false),
        ("/", "/", true),
    ];
    for (pattern, source, expected) in cases {
        assert_eq!(
            match_path(pattern, source).is_match(),
            expected,
            "{pattern} vs {source}"
        );
        assert_eq!(
            normalize(pattern, false) == normalize(source, false),
            expected,
            "{pattern} vs {source}"
        );
    }
}

#[test]
fn test_dynamic_and_wildcard_capture() {
    let params = match_path("/[home]", "/hello").into_params().unwrap();
    assert_eq!(params.get("home").map(String::as_str), Some("hello"));

    let params = match_path("/a/*", "/a/b/c/d").into_params().unwrap();
    assert!(params.is_empty());

    assert!(!match_path("/a/[x]/[y]", "/a/1").is_match());

    let params = match_path("/[name]", "/%5Bfoo%5D").into_params().unwrap();
    assert_eq!(params.get("name").map(String::as_str), Some("[foo]"));
}

#[tokio::test]
async fn test_dispatch_is_idempotent() {
    let fx = Fixture::new();
    fx.router
        .add("/[home]", |params: DynamicMap| async move {
            View::new(format!("hi {}", params["home"]))
        })
        .unwrap();

    fx.router.navigate("/hello").await.unwrap();
    let first = fx.surface.children("#app");
    fx.router.navigate("/hello").await.unwrap();
    let second = fx.surface.children("#app");

    assert_eq!(first, second);
    assert_eq!(second, Some(vec![View::new("hi hello")]));

    let loads: Vec<_> = fx
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, spa_router::RouterEvent::Load { .. }))
        .collect();
    assert_eq!(loads, vec![load("/hello", false), load("/hello", false)]);
}

#[tokio::test]
async fn test_lower_priority_number_wins() {
    let fx = Fixture::new();
    let low_calls = Arc::new(AtomicUsize::new(0));
    let high_calls = Arc::new(AtomicUsize::new(0));

    let calls = high_calls.clone();
    fx.router
        .add_with("/[any]", RouteOptions::default().priority(10), move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { "generic" }
        })
        .unwrap();
    let calls = low_calls.clone();
    fx.router
        .add_with("/special", RouteOptions::default().priority(1), move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { "special" }
        })
        .unwrap();

    let dispatch = fx.router.navigate("/special").await.unwrap();
    assert_eq!(
        dispatch.outcome,
        Outcome::Rendered {
            route: "/special".to_string()
        }
    );
    assert_eq!(low_calls.load(Ordering::SeqCst), 1);
    assert_eq!(high_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_equal_priority_keeps_registration_order() {
    let fx = Fixture::new();
    fx.router.add("/[a]", |_| async { "first" }).unwrap();
    fx.router.add("/[b]", |_| async { "second" }).unwrap();

    fx.router.navigate("/x").await.unwrap();
    assert_eq!(fx.surface.children("#app"), Some(vec![View::new("first")]));
}

#[tokio::test]
async fn test_fallback_renders_and_reports() {
    let fx = Fixture::new();
    fx.router.add("/a", |_| async { "a" }).unwrap();
    fx.router.add("404", |_| async { "missing" }).unwrap();

    let dispatch = fx.router.navigate("/z").await.unwrap();
    assert!(dispatch.is_error());
    assert_eq!(fx.surface.children("#app"), Some(vec![View::new("missing")]));
    assert_eq!(
        fx.take_events(),
        vec![path("/z"), not_found("/z"), load("/z", true)]
    );

    let dispatch = fx.router.navigate("/a").await.unwrap();
    assert!(!dispatch.is_error());
    assert_eq!(fx.surface.children("#app"), Some(vec![View::new("a")]));
    assert_eq!(fx.take_events(), vec![path("/a"), load("/a", false)]);
}

#[tokio::test]
async fn test_no_fallback_still_reports() {
    let fx = Fixture::new();
    fx.router.add("/a", |_| async { "a" }).unwrap();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    fx.router
        .set_not_found_listener(move |p| sink.lock().unwrap().push(p.to_string()));

    let dispatch = fx.router.navigate("/nowhere").await.unwrap();
    assert_eq!(dispatch.outcome, Outcome::NotFound);
    assert_eq!(*seen.lock().unwrap(), vec!["/nowhere".to_string()]);
    assert_eq!(fx.surface.child_count("#app"), 0);
}

#[tokio::test]
async fn test_clear_before_render() {
    let fx = Fixture::new();
    fx.router.add("/a", |_| async { "A" }).unwrap();
    fx.router.add("/b", |_| async { "B" }).unwrap();

    fx.router.navigate("/a").await.unwrap();
    fx.router.navigate("/b").await.unwrap();

    let app = "#app".to_string();
    assert_eq!(
        fx.surface.journal(),
        vec![
            SurfaceOp::Clear { target: app.clone() },
            SurfaceOp::Render {
                target: app.clone(),
                view: View::new("A")
            },
            SurfaceOp::Clear { target: app.clone() },
            SurfaceOp::Render {
                target: app,
                view: View::new("B")
            },
        ]
    );
    assert_eq!(fx.surface.children("#app"), Some(vec![View::new("B")]));
}

#[tokio::test]
async fn test_non_clearing_routes_accumulate() {
    let fx = Fixture::new();
    fx.router
        .add_with("/log", RouteOptions::default().clear(false), |_| async { "line" })
        .unwrap();

    fx.router.navigate("/log").await.unwrap();
    fx.router.navigate("/log").await.unwrap();
    assert_eq!(fx.surface.child_count("#app"), 2);
}

#[tokio::test]
async fn test_history_back_and_forward() {
    let fx = Fixture::new();
    fx.router.add("/[page]", |p: DynamicMap| async move { p["page"].clone() }).unwrap();

    fx.router.navigate("/one").await.unwrap();
    fx.router.update(Some("/two"), Some("?tab=2"), true).await.unwrap();
    assert_eq!(fx.history.len(), 2);
    assert_eq!(fx.router.query_parameter("tab").as_deref(), Some("2"));

    fx.router.pop_state(fx.history.back()).await.unwrap();
    assert_eq!(fx.router.dynamic_path("page").as_deref(), Some("one"));
    assert_eq!(fx.router.query_parameter("tab"), None);

    fx.router.pop_state(fx.history.forward()).await.unwrap();
    assert_eq!(fx.router.state().current_path.as_deref(), Some("/two"));
    assert_eq!(fx.router.query_parameter("tab").as_deref(), Some("2"));
    assert_eq!(fx.history.len(), 2);
}

#[tokio::test]
async fn test_default_search_applies_to_first_navigation() {
    let fx = Fixture::with_config(RouterConfig {
        default_search: "?lang=nl".to_string(),
        ..RouterConfig::default()
    });
    fx.router.add("/[x]", |_| async {}).unwrap();

    fx.router.navigate("/first").await.unwrap();
    assert_eq!(fx.router.query_parameter("lang").as_deref(), Some("nl"));

    fx.router.navigate("/second").await.unwrap();
    assert_eq!(fx.router.query_parameter("lang"), None);
}
