//! Text encoder: value formatting, escaping, and line layout.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;

use promkit_core::labels::{LabelSet, BUCKET_LABEL};
use promkit_core::writer::{
    escape_help, escape_label_value, format_value, write_header, write_sample, MetricType,
    MetricsWriter, TextWriter,
};
use promkit_core::PromError;

use vector_loader::{load, EscapeVector, FormatVector};

fn labels(names: &[&str], values: &[&str]) -> LabelSet {
    let names: std::sync::Arc<[String]> = names.iter().map(|s| s.to_string()).collect();
    LabelSet::new(names, values.iter().map(|s| s.to_string()).collect()).unwrap()
}

#[test]
fn format_vectors() {
    let v: FormatVector = load("format_values.json");
    for case in v.cases {
        assert_eq!(
            format_value(case.value),
            case.expect,
            "vector={} value={:?}",
            v.description,
            case.value
        );
    }
}

#[test]
fn format_special_values() {
    assert_eq!(format_value(f64::INFINITY), "+Inf");
    assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    assert_eq!(format_value(f64::NAN), "NaN");
}

#[test]
fn formatted_values_round_trip() {
    for v in [0.1, 1.0 / 3.0, 16.7, 1e-9, 6.02214076e23, -123.456, 1e15 + 1.0] {
        let s = format_value(v);
        assert_eq!(s.parse::<f64>().unwrap(), v, "formatted={s}");
    }
}

#[test]
fn escape_vectors() {
    let v: EscapeVector = load("escapes.json");
    for case in v.cases {
        assert_eq!(escape_help(&case.input), case.help, "vector={}", v.description);
        assert_eq!(
            escape_label_value(&case.input),
            case.label_value,
            "vector={}",
            v.description
        );
    }
}

#[test]
fn renders_header_and_samples() {
    let mut w = TextWriter::new(Vec::new());
    write_header(&mut w, "http_requests_total", "Total requests.\nPer path.", MetricType::Counter)
        .unwrap();
    write_sample(&mut w, "", &LabelSet::empty(), None, 3.0, None).unwrap();
    write_sample(
        &mut w,
        "",
        &labels(&["path", "code"], &["/a\"b", "200"]),
        None,
        1.5,
        Some(1_700_000_000_123),
    )
    .unwrap();
    w.end_metric().unwrap();

    let text = String::from_utf8(w.into_inner()).unwrap();
    assert_eq!(
        text,
        "# HELP http_requests_total Total requests.\\nPer path.\n\
         # TYPE http_requests_total counter\n\
         http_requests_total 3\n\
         http_requests_total{path=\"/a\\\"b\",code=\"200\"} 1.5 1700000000123\n"
    );
}

#[test]
fn reserved_label_follows_instance_labels() {
    let mut w = TextWriter::new(Vec::new());
    write_header(&mut w, "latency", "", MetricType::Histogram).unwrap();
    write_sample(
        &mut w,
        "_bucket",
        &labels(&["method"], &["get"]),
        Some((BUCKET_LABEL, "+Inf")),
        7.0,
        None,
    )
    .unwrap();
    write_sample(&mut w, "_bucket", &LabelSet::empty(), Some((BUCKET_LABEL, "0.5")), 2.0, None)
        .unwrap();
    w.end_metric().unwrap();

    let text = String::from_utf8(w.into_inner()).unwrap();
    assert_eq!(
        text,
        "# TYPE latency histogram\n\
         latency_bucket{method=\"get\",le=\"+Inf\"} 7\n\
         latency_bucket{le=\"0.5\"} 2\n"
    );
}

struct FailingSink;

impl io::Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "scraper went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_errors_surface_unchanged() {
    let mut w = TextWriter::new(FailingSink);
    let err = write_header(&mut w, "m", "help", MetricType::Gauge).expect_err("must fail");
    assert_eq!(err.code().as_str(), "IO");
    match err {
        PromError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("unexpected error: {other}"),
    }
}
