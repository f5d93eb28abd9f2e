//! Registry: name uniqueness, shape checks, ordering, text round trip.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;
use std::sync::{Arc, Barrier, Once};
use std::thread;

use promkit_client::{
    default_factory, default_registry, encode_text, write_text, Collector, CollectorRegistry,
    Family, HistogramOpts, LabelledCounter, MetricFactory, MetricOpts, TEXT_CONTENT_TYPE,
};
use promkit_core::ErrorCode;

use vector_loader::parse_text;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn setup() -> (Arc<CollectorRegistry>, MetricFactory) {
    init_tracing();
    let registry = Arc::new(CollectorRegistry::new());
    let factory = MetricFactory::new(Arc::clone(&registry));
    (registry, factory)
}

#[test]
fn register_conflict_keeps_first() {
    let (r, _) = setup();
    let first: Family<LabelledCounter> =
        Family::new("requests_total", "first", &["path"], MetricOpts::default(), ()).unwrap();
    let first = Arc::new(first);
    first.with_labels(&["/"]).unwrap().inc();
    r.register(first.clone()).unwrap();

    let second: Family<LabelledCounter> =
        Family::new("requests_total", "second", &[], MetricOpts::default(), ()).unwrap();
    let err = r.register(Arc::new(second)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    assert_eq!(r.len(), 1);
    let still = r.get("requests_total").unwrap();
    assert_eq!(still.shape().label_names, vec!["path".to_string()]);
    let parsed = parse_text(&String::from_utf8(encode_text(&r).unwrap().to_vec()).unwrap());
    assert_eq!(parsed.help["requests_total"], "first");
    assert_eq!(
        parsed.find("requests_total", &[("path", "/")]).unwrap().value,
        1.0
    );
}

#[test]
fn concurrent_register_has_one_winner() {
    let (r, _) = setup();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let r = Arc::clone(&r);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let help = format!("from thread {i}");
                let c: Family<LabelledCounter> =
                    Family::new("raced_total", &help, &[], MetricOpts::default(), ()).unwrap();
                barrier.wait();
                r.register(Arc::new(c))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|res| res.is_ok()).count(), 1);
    for err in results.iter().filter_map(|res| res.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::Conflict);
    }
    assert_eq!(r.len(), 1);
}

#[test]
fn concurrent_factory_calls_share_one_collector() {
    let (r, f) = setup();
    let f = Arc::new(f);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                f.create_counter("shared_create_total", "", &["k"]).unwrap()
            })
        })
        .collect();
    let counters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(counters.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(r.len(), 1);
}

#[test]
fn factory_returns_existing_collector_for_same_shape() {
    let (_, f) = setup();
    let a = f.create_counter("hits_total", "", &["kind"]).unwrap();
    let b = f.create_counter("hits_total", "", &["kind"]).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn factory_rejects_incompatible_reuse() {
    let (_, f) = setup();
    f.create_counter("things", "", &["a"]).unwrap();

    let other_labels = f.create_counter("things", "", &["b"]).unwrap_err();
    assert_eq!(other_labels.code(), ErrorCode::Conflict);
    let other_type = f.create_gauge("things", "", &["a"]).unwrap_err();
    assert_eq!(other_type.code(), ErrorCode::Conflict);
    let histogram = f
        .create_histogram_with("things", "", &["a"], HistogramOpts::default())
        .unwrap_err();
    assert_eq!(histogram.code(), ErrorCode::Conflict);
}

#[test]
fn invalid_metric_names_fail_at_construction() {
    let (r, f) = setup();
    for name in ["", "1abc", "has space", "dash-name"] {
        let err = f.create_counter(name, "", &[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument, "name={name:?}");
    }
    assert!(r.is_empty());
}

#[test]
fn output_follows_registration_order() {
    let (r, f) = setup();
    for name in ["zeta", "alpha", "mid"] {
        f.create_gauge(name, "", &[]).unwrap().set(1.0);
    }
    assert_eq!(r.names(), vec!["zeta", "alpha", "mid"]);

    let parsed = parse_text(&String::from_utf8(encode_text(&r).unwrap().to_vec()).unwrap());
    let order: Vec<&str> = parsed.samples.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(order, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn remove_unregisters() {
    let (r, f) = setup();
    f.create_gauge("temp", "", &[]).unwrap();
    assert!(r.remove("temp").is_some());
    assert!(r.remove("temp").is_none());
    assert!(r.get("temp").is_none());
    assert!(r.is_empty());
    f.create_counter("temp", "", &[]).unwrap();
    assert_eq!(r.len(), 1);
}

#[test]
fn text_round_trip() {
    let (r, f) = setup();
    let c = f.create_counter("rt_total", "Round trip.", &["a", "b"]).unwrap();
    c.with_labels(&["x\"y", "multi\nline"]).unwrap().inc_by(0.1).unwrap();
    c.with_labels(&["back\\slash", ""]).unwrap().inc_by(1e-7).unwrap();
    let g = f.create_gauge("rt_gauge", "", &[]).unwrap();
    g.set(f64::NEG_INFINITY);
    let h = f
        .create_histogram_with("rt_hist", "", &[], HistogramOpts::new([0.5, 1.0]))
        .unwrap();
    h.observe(0.75);

    let parsed = parse_text(&String::from_utf8(encode_text(&r).unwrap().to_vec()).unwrap());
    assert_eq!(parsed.help["rt_total"], "Round trip.");
    assert_eq!(parsed.types["rt_total"], "counter");
    assert_eq!(parsed.types["rt_hist"], "histogram");
    assert_eq!(
        parsed
            .find("rt_total", &[("a", "x\"y"), ("b", "multi\nline")])
            .unwrap()
            .value,
        0.1
    );
    assert_eq!(
        parsed
            .find("rt_total", &[("a", "back\\slash"), ("b", "")])
            .unwrap()
            .value,
        1e-7
    );
    assert_eq!(parsed.find("rt_gauge", &[]).unwrap().value, f64::NEG_INFINITY);
    assert_eq!(
        parsed.find("rt_hist_bucket", &[("le", "1")]).unwrap().value,
        1.0
    );
    assert_eq!(parsed.find("rt_hist_sum", &[]).unwrap().value, 0.75);
}

#[derive(Debug)]
struct BrokenSink;

impl io::Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_failure_surfaces_as_io() {
    let (r, f) = setup();
    f.create_gauge("g", "help", &[]).unwrap().set(1.0);
    let err = write_text(&r, BrokenSink).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Io);
}

#[test]
fn external_collector_registers_directly() {
    struct Fixed;

    impl Collector for Fixed {
        fn name(&self) -> &str {
            "fixed_value"
        }

        fn shape(&self) -> promkit_client::CollectorShape {
            promkit_client::CollectorShape {
                metric_type: promkit_core::MetricType::Gauge,
                label_names: Vec::new(),
            }
        }

        fn collect(&self, writer: &mut dyn promkit_core::MetricsWriter) -> promkit_core::Result<()> {
            promkit_core::writer::write_header(
                writer,
                "fixed_value",
                "",
                promkit_core::MetricType::Gauge,
            )?;
            promkit_core::writer::write_sample(
                writer,
                "",
                &promkit_core::LabelSet::empty(),
                None,
                7.0,
                None,
            )?;
            writer.end_metric()
        }
    }

    let (r, f) = setup();
    r.register(Arc::new(Fixed)).unwrap();
    assert_eq!(
        f.create_gauge("fixed_value", "", &[]).unwrap_err().code(),
        ErrorCode::Conflict
    );
    let body = encode_text(&r).unwrap();
    assert_eq!(&body[..], b"# TYPE fixed_value gauge\nfixed_value 7\n");
}

#[test]
fn default_factory_uses_default_registry() {
    init_tracing();
    let c = default_factory()
        .create_counter("promkit_registry_test_total", "", &[])
        .unwrap();
    c.inc();
    assert!(default_registry().get("promkit_registry_test_total").is_some());
    assert!(Arc::ptr_eq(default_factory().registry(), &default_registry()));
    assert!(TEXT_CONTENT_TYPE.starts_with("text/plain; version=0.0.4"));
}
