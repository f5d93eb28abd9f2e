//! Counter, gauge and untyped behaviour and exposition.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use promkit_client::{encode_text, CollectorRegistry, MetricFactory, MetricOpts};
use promkit_core::ErrorCode;

use vector_loader::{load, parse_text, ExpositionVector};

fn setup() -> (Arc<CollectorRegistry>, MetricFactory) {
    let registry = Arc::new(CollectorRegistry::new());
    let factory = MetricFactory::new(Arc::clone(&registry));
    (registry, factory)
}

fn text(registry: &CollectorRegistry) -> String {
    String::from_utf8(encode_text(registry).unwrap().to_vec()).unwrap()
}

#[test]
fn counter_rejects_negative_increment() {
    let (_, f) = setup();
    let c = f.create_counter("jobs_total", "", &[]).unwrap();
    c.inc_by(2.0).unwrap();

    let err = c.inc_by(-1.0).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(c.inc_by(f64::NAN).unwrap_err().code(), ErrorCode::InvalidArgument);
    assert_eq!(c.get(), 2.0);
}

#[test]
fn counter_inc_to_never_lowers() {
    let (_, f) = setup();
    let c = f.create_counter("bytes_total", "", &[]).unwrap();
    c.inc_to(10.0);
    c.inc_to(4.0);
    assert_eq!(c.get(), 10.0);
    c.inc();
    assert_eq!(c.get(), 11.0);
}

#[test]
fn ineffective_inc_to_and_dec_to_leave_series_untouched() {
    let (r, f) = setup();
    let c = f.create_counter("idle_total", "", &[]).unwrap();
    let g = f.create_gauge("idle_level", "", &[]).unwrap();
    c.inc_to(0.0);
    c.inc_to(-1.0);
    g.inc_to(-1.0);
    g.dec_to(1.0);
    assert_eq!(text(&r), "# TYPE idle_total counter\n# TYPE idle_level gauge\n");

    g.dec_to(-1.0);
    c.inc_to(2.0);
    assert_eq!(
        text(&r),
        "# TYPE idle_total counter\nidle_total 2\n# TYPE idle_level gauge\nidle_level -1\n"
    );
}

#[test]
fn ineffective_inc_to_keeps_timestamp() {
    let (r, f) = setup();
    let opts = MetricOpts {
        include_timestamp: true,
        ..MetricOpts::default()
    };
    let g = f.create_gauge_with("peak", "", &[], opts).unwrap();
    g.inc_to(20.0);
    let first = parse_text(&text(&r)).find("peak", &[]).unwrap().timestamp;

    thread::sleep(std::time::Duration::from_millis(5));
    g.inc_to(10.0);
    let second = parse_text(&text(&r)).find("peak", &[]).unwrap().timestamp;
    assert_eq!(first, second);
    assert_eq!(g.get(), 20.0);
}

#[test]
fn gauge_moves_both_ways() {
    let (_, f) = setup();
    let g = f.create_gauge("temperature", "", &[]).unwrap();
    g.set(10.0);
    g.inc();
    g.inc_by(2.5);
    g.dec();
    g.dec_by(0.5);
    assert_eq!(g.get(), 12.0);

    g.inc_to(11.0);
    assert_eq!(g.get(), 12.0);
    g.inc_to(20.0);
    assert_eq!(g.get(), 20.0);
    g.dec_to(25.0);
    assert_eq!(g.get(), 20.0);
    g.dec_to(-3.0);
    assert_eq!(g.get(), -3.0);
}

#[test]
fn gauge_set_to_current_time() {
    let (_, f) = setup();
    let g = f.create_gauge("last_run_seconds", "", &[]).unwrap();
    g.set_to_current_time();
    // Any time after 2020-01-01.
    assert!(g.get() > 1_577_836_800.0);
}

#[test]
fn scalar_exposition_matches_golden() {
    let v: ExpositionVector = load("scalar_exposition.json");

    let (r, f) = setup();
    let c = f
        .create_counter("http_requests_total", "Requests served.", &["method", "code"])
        .unwrap();
    c.with_labels(&["POST", "200"]).unwrap().inc_by(2.5).unwrap();
    c.with_labels(&["GET", "500"]).unwrap().inc();
    let ok = c.with_labels(&["GET", "200"]).unwrap();
    ok.inc();
    ok.inc();
    ok.inc();
    assert_eq!(text(&r), v.case("counter_labelled"));

    let (r, f) = setup();
    let g = f.create_gauge("queue_depth", "Items waiting.", &[]).unwrap();
    g.dec_by(2.0);
    assert_eq!(text(&r), v.case("gauge_unlabelled"));

    let (r, f) = setup();
    let u = f.create_untyped("build_number", "", &[]).unwrap();
    u.set(42.0);
    assert_eq!(u.get(), 42.0);
    assert_eq!(text(&r), v.case("untyped_no_help"));

    let (r, f) = setup();
    let p = f
        .create_counter("paths_total", "Paths with \\ and\nnewline.", &["path"])
        .unwrap();
    p.with_labels(&["C:\\tmp\"x\"\n"]).unwrap().inc();
    assert_eq!(text(&r), v.case("escaped_label"));
}

#[test]
fn untouched_scalar_is_suppressed_by_default() {
    let (r, f) = setup();
    f.create_gauge("idle", "", &[]).unwrap();
    assert_eq!(text(&r), "# TYPE idle gauge\n");

    let (r, f) = setup();
    let opts = MetricOpts {
        suppress_empty: false,
        ..MetricOpts::default()
    };
    f.create_gauge_with("idle", "", &[], opts).unwrap();
    assert_eq!(text(&r), "# TYPE idle gauge\nidle 0\n");
}

#[test]
fn unlabelled_instance_of_labelled_counter_appears_once_used() {
    let (r, f) = setup();
    let c = f.create_counter("events_total", "", &["kind"]).unwrap();
    c.with_labels(&["a"]).unwrap().inc();
    assert!(parse_text(&text(&r)).find("events_total", &[]).is_none());

    c.inc();
    let parsed = parse_text(&text(&r));
    assert_eq!(parsed.find("events_total", &[]).unwrap().value, 1.0);
    assert_eq!(parsed.find("events_total", &[("kind", "a")]).unwrap().value, 1.0);
}

#[test]
fn timestamps_follow_last_update() {
    let (r, f) = setup();
    let opts = MetricOpts {
        include_timestamp: true,
        ..MetricOpts::default()
    };
    let c = f.create_counter_with("stamped_total", "", &[], opts).unwrap();
    let plain = f.create_counter("plain_total", "", &[]).unwrap();
    c.inc();
    plain.inc();

    let parsed = parse_text(&text(&r));
    let ts = parsed.find("stamped_total", &[]).unwrap().timestamp.unwrap();
    assert!(ts > 1_577_836_800_000, "ts={ts}");
    assert_eq!(parsed.find("plain_total", &[]).unwrap().timestamp, None);
}

#[test]
fn reset_clears_values_but_keeps_instances() {
    let (_, f) = setup();
    let c = f.create_counter("resets_total", "", &["k"]).unwrap();
    let a = c.with_labels(&["a"]).unwrap();
    a.inc_by(5.0).unwrap();
    c.inc();
    c.reset();
    assert_eq!(a.get(), 0.0);
    assert_eq!(c.get(), 0.0);
    assert!(Arc::ptr_eq(&a, &c.with_labels(&["a"]).unwrap()));
}

#[test]
fn label_identity_across_threads() {
    let (_, f) = setup();
    let c = f.create_counter("shared_total", "", &["worker"]).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                let inst = c.with_labels(&["same"]).unwrap();
                for _ in 0..1_000 {
                    c.with_labels(&["same"]).unwrap().inc();
                }
                inst
            })
        })
        .collect();
    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(c.labelled_count(), 1);
    assert_eq!(instances[0].get(), 8_000.0);
}

#[test]
fn with_no_values_on_unlabelled_family_is_the_default_instance() {
    let (_, f) = setup();
    let g = f.create_gauge("solo", "", &[]).unwrap();
    g.with_labels(&[]).unwrap().set(3.0);
    assert_eq!(g.get(), 3.0);
}
