//! Feature-report serialization.
//!
//! A report is one `(metadata, metrics)` pair per analyzed file. Metadata
//! keys carry a leading `@` internally (`@time`, `@filename`, ...); both
//! backends strip the marker when writing and re-add it when reading back.
//! Backends are streaming: `write` may be called repeatedly to append
//! entries to one output, `finish` closes the top-level container.

mod json;
mod xml;

pub use json::JsonWriter;
pub use xml::XmlWriter;

use std::{
    collections::BTreeMap,
    io::Write,
    path::Path,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const META_PREFIX: char = '@';

/// Metadata keys (with `@` prefix) to string values.
pub type Meta = BTreeMap<String, String>;

/// Metric keys to plain values, ordered for deterministic output.
pub type Metrics = BTreeMap<String, MetricValue>;

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub meta: Meta,
    pub metrics: Metrics,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl MetricValue {
    /// Text form shared by both formats: numbers verbatim (floats keep a
    /// decimal point so they survive a round trip), booleans literal.
    pub fn render(&self) -> String {
        match *self {
            MetricValue::Int(v) => v.to_string(),
            MetricValue::Float(v) => format!("{v:?}"),
            MetricValue::Bool(v) => v.to_string(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        if let Ok(v) = text.parse::<i64>() {
            return Ok(MetricValue::Int(v));
        }
        if let Ok(v) = text.parse::<f64>() {
            return Ok(MetricValue::Float(v));
        }
        match text {
            "true" => Ok(MetricValue::Bool(true)),
            "false" => Ok(MetricValue::Bool(false)),
            _ => Err(Error::Report(format!("invalid metric value {text:?}"))),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Bool(v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            _ => Err(Error::Report(format!("unknown report format {s:?}"))),
        }
    }
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    /// Detect the format of report content by its first non-space byte.
    pub fn detect(content: &str) -> Format {
        if content.trim_start().starts_with('<') {
            Format::Xml
        } else {
            Format::Json
        }
    }

    pub fn detect_path(path: &Path) -> Option<Format> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".stats.xml") {
            Some(Format::Xml)
        } else if name.ends_with(".stats.json") {
            Some(Format::Json)
        } else {
            None
        }
    }
}

/// Streaming writer front over the two interchangeable backends.
pub enum Writer<W: Write> {
    Json(JsonWriter<W>),
    Xml(XmlWriter<W>),
}

impl<W: Write> Writer<W> {
    pub fn new(out: W, format: Format) -> Self {
        match format {
            Format::Json => Writer::Json(JsonWriter::new(out)),
            Format::Xml => Writer::Xml(XmlWriter::new(out)),
        }
    }

    /// Serialize one report entry immediately.
    pub fn write(&mut self, report: &Report) -> Result<()> {
        match self {
            Writer::Json(w) => w.write(report),
            Writer::Xml(w) => w.write(report),
        }
    }

    /// Close the top-level container. The output is well-formed afterwards.
    pub fn finish(&mut self) -> Result<()> {
        match self {
            Writer::Json(w) => w.finish(),
            Writer::Xml(w) => w.finish(),
        }
    }
}

/// Parse a previously written report back into `(meta, metrics)` pairs.
pub fn read_report(content: &str, format: Option<Format>) -> Result<Vec<Report>> {
    match format.unwrap_or_else(|| Format::detect(content)) {
        Format::Json => json::read(content),
        Format::Xml => xml::read(content),
    }
}

/// Capture-time metadata for one source. Digests are an external
/// collaborator's business; callers merge them into the returned map.
pub fn source_meta(filepath: Option<&Path>, full_path: bool) -> Meta {
    let mut meta = Meta::new();
    meta.insert("@time".into(), utc_now_iso8601());
    if let Some(path) = filepath {
        let name = if full_path {
            path.to_string_lossy().into_owned()
        } else {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned())
        };
        meta.insert("@filename".into(), name);
    }
    meta
}

/// Current UTC time in ISO 8601 combined date-time format.
pub fn utc_now_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_utc(secs)
}

fn format_utc(secs_since_epoch: u64) -> String {
    let days = (secs_since_epoch / 86_400) as i64;
    let rem = secs_since_epoch % 86_400;
    let (h, m, s) = (rem / 3600, rem % 3600 / 60, rem % 60);

    // civil-from-days, see Howard Hinnant's chrono algorithms
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!("{year:04}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}")
}
