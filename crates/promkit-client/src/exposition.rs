//! Helpers for transports that serve a registry in the text format.

use std::io::Write;

use bytes::Bytes;

use promkit_core::error::Result;
use promkit_core::writer::TextWriter;

use crate::registry::CollectorRegistry;

pub use promkit_core::writer::TEXT_CONTENT_TYPE;

/// Render the whole registry into `out`; returns the sink.
pub fn write_text<W: Write>(registry: &CollectorRegistry, out: W) -> Result<W> {
    let mut writer = TextWriter::new(out);
    registry.collect_all(&mut writer)?;
    Ok(writer.into_inner())
}

/// Render the whole registry into an in-memory body.
pub fn encode_text(registry: &CollectorRegistry) -> Result<Bytes> {
    let buf = write_text(registry, Vec::with_capacity(4096))?;
    Ok(Bytes::from(buf))
}
