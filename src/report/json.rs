//! Nested-mapping backend: `{"metrics": [entry, ...]}` where each entry
//! holds the stripped metadata keys plus a `"metric"` object of metric
//! name/value pairs. Entries are streamed out one by one.

use std::{collections::BTreeMap, io::Write};

use serde_json::Value;

use crate::error::{Error, Result};

use super::{Meta, MetricValue, Metrics, Report, META_PREFIX};

pub struct JsonWriter<W: Write> {
    out: W,
    started: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
        }
    }

    pub fn write(&mut self, report: &Report) -> Result<()> {
        if self.started {
            self.out.write_all(b",\n    ")?;
        } else {
            self.out.write_all(b"{\n  \"metrics\": [\n    ")?;
            self.started = true;
        }

        let mut entry: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in &report.meta {
            let key = key.strip_prefix(META_PREFIX).unwrap_or(key);
            entry.insert(key.to_string(), Value::String(value.clone()));
        }

        let mut metric = serde_json::Map::new();
        for (key, value) in &report.metrics {
            metric.insert(key.clone(), to_json(value)?);
        }
        entry.insert("metric".into(), Value::Object(metric));

        let blob = serde_json::to_string_pretty(&entry)
            .map_err(|e| Error::Report(e.to_string()))?
            .replace('\n', "\n    ");
        self.out.write_all(blob.as_bytes())?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.started {
            self.out.write_all(b"\n  ]\n}\n")?;
        } else {
            self.out.write_all(b"{\n  \"metrics\": []\n}\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

fn to_json(value: &MetricValue) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Report(e.to_string()))
}

fn from_json(value: &Value) -> Result<MetricValue> {
    serde_json::from_value(value.clone())
        .map_err(|_| Error::Report(format!("invalid metric value {value}")))
}

pub fn read(content: &str) -> Result<Vec<Report>> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| Error::Report(e.to_string()))?;
    let entries = root
        .get("metrics")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Report("missing top-level \"metrics\" array".into()))?;

    let mut reports = vec![];
    for entry in entries {
        let object = entry
            .as_object()
            .ok_or_else(|| Error::Report("report entry is not an object".into()))?;

        let mut meta = Meta::new();
        let mut metrics = Metrics::new();
        for (key, value) in object {
            if key == "metric" {
                let pairs = value
                    .as_object()
                    .ok_or_else(|| Error::Report("\"metric\" is not an object".into()))?;
                for (name, value) in pairs {
                    metrics.insert(name.clone(), from_json(value)?);
                }
            } else {
                let text = value
                    .as_str()
                    .ok_or_else(|| Error::Report(format!("metadata {key:?} is not a string")))?;
                meta.insert(format!("{META_PREFIX}{key}"), text.to_string());
            }
        }
        reports.push(Report { meta, metrics });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::{read, JsonWriter};
    use crate::report::{Meta, MetricValue, Metrics, Report};

    #[test]
    fn framing() {
        let mut meta = Meta::new();
        meta.insert("@time".into(), "2016-01-02T03:04:05".into());
        let mut metrics = Metrics::new();
        metrics.insert("clauses_count".into(), MetricValue::Int(2));
        let report = Report { meta, metrics };

        let mut buf = Vec::new();
        let mut writer = JsonWriter::new(&mut buf);
        writer.write(&report).unwrap();
        writer.write(&report).unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["metrics"].as_array().unwrap().len(), 2);
        assert_eq!(value["metrics"][0]["time"], "2016-01-02T03:04:05");
        assert_eq!(value["metrics"][1]["metric"]["clauses_count"], 2);
    }

    #[test]
    fn empty_report_is_well_formed() {
        let mut buf = Vec::new();
        JsonWriter::new(&mut buf).finish().unwrap();
        let parsed = read(&String::from_utf8(buf).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn int_float_distinction_survives() {
        let mut metrics = Metrics::new();
        metrics.insert("a".into(), MetricValue::Int(3));
        metrics.insert("b".into(), MetricValue::Float(3.0));
        let report = Report {
            meta: Meta::new(),
            metrics,
        };

        let mut buf = Vec::new();
        let mut writer = JsonWriter::new(&mut buf);
        writer.write(&report).unwrap();
        writer.finish().unwrap();

        let parsed = read(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(parsed[0].metrics["a"], MetricValue::Int(3));
        assert_eq!(parsed[0].metrics["b"], MetricValue::Float(3.0));
    }

    #[test]
    fn reject_malformed() {
        assert!(read("{}").is_err());
        assert!(read("{\"metrics\": [42]}").is_err());
        assert!(read("not json").is_err());
    }
}
