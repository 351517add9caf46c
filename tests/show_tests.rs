mod common;

use common::{CATALOG_URL, FakeWebfonts, catalog, render_loop};
use fontpeek::FontpeekError;
use fontpeek::commands::{list, show};
use fontpeek_http::{CacheOptions, CancelToken, DiskCache};
use tempfile::TempDir;

const FAMILIES: &[&str] = &["Roboto", "Open Sans", "Oswald", "Lato"];

fn patterns(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn run_show(
    service: &FakeWebfonts,
    pats: &[&str],
    all: bool,
    cancel: &CancelToken,
) -> (Result<fontpeek::RenderSummary, FontpeekError>, String) {
    let mut out = Vec::new();
    let result = show(
        cancel,
        "test-key",
        &patterns(pats),
        all,
        &catalog(service),
        &render_loop(service),
        &mut out,
    );
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_prefix_glob_renders_matches_in_catalog_order() {
    let service = FakeWebfonts::new(FAMILIES);
    let (result, out) = run_show(&service, &["O*"], false, &CancelToken::new());

    assert_eq!(out, "Open Sans:\n<image 2x1>\nOswald:\n<image 2x1>\n");
    assert_eq!(result.unwrap().rendered, 2);
    assert!(service.requests()[0].starts_with(CATALOG_URL));
    assert!(service.requests()[0].contains("key=test-key"));
}

#[test]
fn test_all_renders_every_family() {
    let service = FakeWebfonts::new(FAMILIES);
    let (result, out) = run_show(&service, &[], true, &CancelToken::new());

    let headers: Vec<&str> = out.lines().filter(|l| l.ends_with(':')).collect();
    assert_eq!(headers, vec!["Roboto:", "Open Sans:", "Oswald:", "Lato:"]);
    assert_eq!(result.unwrap().total(), 4);
}

#[test]
fn test_missing_font_file_is_reported_inline() {
    let service = FakeWebfonts::new(FAMILIES).missing("Roboto");
    let (result, out) = run_show(&service, &["Roboto", "Lato"], false, &CancelToken::new());

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Roboto:");
    assert!(lines[1].starts_with("error: bad font data, status: 404"), "{out}");
    assert_eq!(&lines[2..], &["Lato:", "<image 2x1>"]);

    let summary = result.unwrap();
    assert_eq!(summary.rendered, 1);
    assert_eq!(summary.failed, 1);
}

#[test]
fn test_rasterizer_panic_does_not_stop_the_batch() {
    let service = FakeWebfonts::new(FAMILIES).body("Roboto", b"panic");
    let (result, out) = run_show(&service, &["Roboto", "Oswald"], false, &CancelToken::new());

    assert_eq!(
        out,
        "Roboto:\nerror: unable to rasterize font: caught panic: glyph outline out of bounds\nOswald:\n<image 2x1>\n"
    );
    assert_eq!(result.unwrap().rendered, 1);
}

#[test]
fn test_no_match_renders_nothing() {
    let service = FakeWebfonts::new(FAMILIES);
    let (result, out) = run_show(&service, &["Zilla*"], false, &CancelToken::new());

    assert!(out.is_empty());
    assert_eq!(result.unwrap().total(), 0);
    assert_eq!(service.request_count(), 1);
}

#[test]
fn test_invalid_pattern_makes_no_requests() {
    let service = FakeWebfonts::new(FAMILIES);
    let (result, out) = run_show(&service, &["Roboto", "[a-"], false, &CancelToken::new());

    match result {
        Err(FontpeekError::InvalidPattern { pattern, index, .. }) => {
            assert_eq!(pattern, "[a-");
            assert_eq!(index, 1);
        }
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
    assert!(out.is_empty());
    assert_eq!(service.request_count(), 0);
}

#[test]
fn test_canceled_run_stops_early() {
    let service = FakeWebfonts::new(FAMILIES);
    let cancel = CancelToken::new();
    cancel.cancel();
    let (result, out) = run_show(&service, &["*"], false, &cancel);

    assert!(matches!(result, Err(FontpeekError::Canceled)));
    assert!(out.is_empty());
    assert_eq!(service.request_count(), 0);
}

#[test]
fn test_cancel_mid_run_keeps_finished_blocks() {
    let cancel = CancelToken::new();
    let service = FakeWebfonts::new(FAMILIES).cancel_on("Oswald", &cancel);
    let (result, out) = run_show(&service, &["*"], false, &cancel);

    assert!(matches!(result, Err(FontpeekError::Canceled)));
    assert_eq!(
        out,
        "Roboto:\n<image 2x1>\nOpen Sans:\n<image 2x1>\nOswald:\nerror: operation canceled\n"
    );
    // Catalog plus stylesheet and file for each finished family; nothing
    // for Oswald or Lato reached the service.
    let requests = service.requests();
    assert_eq!(requests.len(), 5);
    assert!(!requests.iter().any(|url| url.contains("Oswald") || url.contains("Lato")));
}

#[test]
fn test_second_run_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let service = FakeWebfonts::new(FAMILIES);
    let cache = DiskCache::new(&service, CacheOptions::new(dir.path())).unwrap();

    let mut first = Vec::new();
    show(
        &CancelToken::new(),
        "test-key",
        &patterns(&["Lato"]),
        false,
        &catalog(&cache),
        &render_loop(&cache),
        &mut first,
    )
    .unwrap();
    let after_first = service.request_count();
    assert_eq!(after_first, 3);

    let mut second = Vec::new();
    show(
        &CancelToken::new(),
        "test-key",
        &patterns(&["Lato"]),
        false,
        &catalog(&cache),
        &render_loop(&cache),
        &mut second,
    )
    .unwrap();

    assert_eq!(service.request_count(), after_first);
    assert_eq!(first, second);
}

#[test]
fn test_failed_download_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let service = FakeWebfonts::new(FAMILIES).missing("Oswald");
    let cache = DiskCache::new(&service, CacheOptions::new(dir.path())).unwrap();

    for _ in 0..2 {
        let mut out = Vec::new();
        let summary = show(
            &CancelToken::new(),
            "test-key",
            &patterns(&["Oswald"]),
            false,
            &catalog(&cache),
            &render_loop(&cache),
            &mut out,
        )
        .unwrap();
        assert_eq!(summary.failed, 1);
    }

    let font_requests = service
        .requests()
        .iter()
        .filter(|url| url.ends_with("Oswald.ttf"))
        .count();
    assert_eq!(font_requests, 2);
}

#[test]
fn test_list_prints_catalog() {
    let service = FakeWebfonts::new(FAMILIES);
    let mut out = Vec::new();
    let count = list(&CancelToken::new(), "test-key", &catalog(&service), false, &mut out).unwrap();

    assert_eq!(count, 4);
    assert_eq!(String::from_utf8(out).unwrap(), "Roboto\nOpen Sans\nOswald\nLato\n");
}
