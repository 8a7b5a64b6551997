//! Markup backend: a root `<metrics>` element, one `<file>` element per
//! report whose attributes carry the metadata, and one `<metric name="v"/>`
//! child per metric. Written incrementally, SAX style.

use std::io::Write;

use crate::error::{Error, Result};

use super::{Meta, MetricValue, Metrics, Report, META_PREFIX};

pub struct XmlWriter<W: Write> {
    out: W,
    started: bool,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
        }
    }

    fn start(&mut self) -> Result<()> {
        self.started = true;
        self.out
            .write_all(b"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<metrics>\n")?;
        Ok(())
    }

    pub fn write(&mut self, report: &Report) -> Result<()> {
        if !self.started {
            self.start()?;
        }

        write!(self.out, "  <file")?;
        for (key, value) in &report.meta {
            let key = key.strip_prefix(META_PREFIX).unwrap_or(key);
            write!(self.out, " {}=\"{}\"", key, escape(value))?;
        }
        writeln!(self.out, ">")?;

        for (key, value) in &report.metrics {
            writeln!(self.out, "    <metric {}=\"{}\"/>", key, escape(&value.render()))?;
        }

        writeln!(self.out, "  </file>")?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        if !self.started {
            self.start()?;
        }
        self.out.write_all(b"</metrics>\n")?;
        self.out.flush()?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let end = rest
            .find(';')
            .ok_or_else(|| Error::Report(format!("unterminated entity in {text:?}")))?;
        match &rest[..=end] {
            "&amp;" => out.push('&'),
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&quot;" => out.push('"'),
            "&apos;" => out.push('\''),
            other => return Err(Error::Report(format!("unknown entity {other:?}"))),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Parse the subset of XML emitted by [`XmlWriter`].
pub fn read(content: &str) -> Result<Vec<Report>> {
    let mut reports = vec![];
    let mut meta = Meta::new();
    let mut metrics = Metrics::new();
    let mut in_file = false;

    let mut rest = content;
    while let Some(start) = rest.find('<') {
        let len = rest[start..]
            .find('>')
            .ok_or_else(|| Error::Report("unterminated tag".into()))?;
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        if tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }
        if let Some(closing) = tag.strip_prefix('/') {
            if closing.trim() == "file" {
                if !in_file {
                    return Err(Error::Report("</file> without <file>".into()));
                }
                reports.push(Report {
                    meta: std::mem::take(&mut meta),
                    metrics: std::mem::take(&mut metrics),
                });
                in_file = false;
            }
            continue;
        }

        let tag = tag.strip_suffix('/').unwrap_or(tag).trim();
        let (name, attrs) = match tag.find(char::is_whitespace) {
            Some(i) => (&tag[..i], parse_attributes(&tag[i..])?),
            None => (tag, vec![]),
        };

        match name {
            "metrics" => {}
            "file" => {
                in_file = true;
                for (key, value) in attrs {
                    meta.insert(format!("{META_PREFIX}{key}"), value);
                }
            }
            "metric" => {
                if !in_file {
                    return Err(Error::Report("<metric> outside <file>".into()));
                }
                for (key, value) in attrs {
                    metrics.insert(key, MetricValue::parse(&value)?);
                }
            }
            other => {
                return Err(Error::Report(format!("unexpected element <{other}>")));
            }
        }
    }

    if in_file {
        return Err(Error::Report("unclosed <file> element".into()));
    }
    Ok(reports)
}

fn parse_attributes(mut input: &str) -> Result<Vec<(String, String)>> {
    let mut attrs = vec![];

    loop {
        input = input.trim_start();
        if input.is_empty() {
            return Ok(attrs);
        }

        let eq = input
            .find('=')
            .ok_or_else(|| Error::Report(format!("malformed attribute near {input:?}")))?;
        let key = input[..eq].trim();
        input = input[eq + 1..].trim_start();

        let quoted = input
            .strip_prefix('"')
            .ok_or_else(|| Error::Report(format!("unquoted attribute value for {key:?}")))?;
        let end = quoted
            .find('"')
            .ok_or_else(|| Error::Report(format!("unterminated attribute value for {key:?}")))?;

        attrs.push((key.to_string(), unescape(&quoted[..end])?));
        input = &quoted[end + 1..];
    }
}
