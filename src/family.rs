use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Returned by [Labels::get] if a sample doesn't carry the requested label.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("label {0:?} is not present")]
pub struct MissingLabel(pub String);

/// The label set of a single sample. Label names are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Labels(BTreeMap::new())
    }

    /// Sets a label, replacing the previous value of a label with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Looks up a label value. A missing label is an error, not an empty value.
    pub fn get(&self, name: &str) -> Result<&str, MissingLabel> {
        self.0
            .get(name)
            .map(|v| v.as_str())
            .ok_or_else(|| MissingLabel(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The type of a metric family as reported by prom2json.
///
/// Types this crate doesn't know about are kept verbatim in [MetricType::Other].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricType {
    Counter,
    Gauge,
    Untyped,
    Histogram,
    Summary,
    Other(String),
}

impl MetricType {
    pub fn as_str(&self) -> &str {
        match self {
            MetricType::Counter => "COUNTER",
            MetricType::Gauge => "GAUGE",
            MetricType::Untyped => "UNTYPED",
            MetricType::Histogram => "HISTOGRAM",
            MetricType::Summary => "SUMMARY",
            MetricType::Other(s) => s.as_str(),
        }
    }

    /// Only scalar types can be compared against a single pair of thresholds.
    pub fn check(&self) -> Result<(), UnsupportedType> {
        match self {
            MetricType::Counter | MetricType::Gauge | MetricType::Untyped => Ok(()),
            MetricType::Histogram | MetricType::Summary | MetricType::Other(_) => {
                Err(UnsupportedType(self.clone()))
            }
        }
    }
}

impl From<&str> for MetricType {
    fn from(s: &str) -> Self {
        match s {
            "COUNTER" => MetricType::Counter,
            "GAUGE" => MetricType::Gauge,
            "UNTYPED" => MetricType::Untyped,
            "HISTOGRAM" => MetricType::Histogram,
            "SUMMARY" => MetricType::Summary,
            other => MetricType::Other(other.to_owned()),
        }
    }
}

impl From<String> for MetricType {
    fn from(s: String) -> Self {
        MetricType::from(s.as_str())
    }
}

impl From<MetricType> for String {
    fn from(t: MetricType) -> Self {
        match t {
            MetricType::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported Metric type: {0}")]
pub struct UnsupportedType(pub MetricType);

/// A single time series of a family.
///
/// The value is kept as the string prom2json emits. Histogram and summary samples have no
/// `value` at all, which is why it's optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl MetricSample {
    pub fn new(labels: Labels, value: impl Into<String>) -> Self {
        MetricSample {
            labels,
            value: Some(value.into()),
        }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// A named group of samples sharing one type, as emitted by prom2json.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    help: String,
    #[serde(rename = "type")]
    metric_type: MetricType,
    #[serde(rename = "metrics", default)]
    samples: Vec<MetricSample>,
}

impl MetricFamily {
    pub fn new(name: &str, metric_type: MetricType, samples: Vec<MetricSample>) -> Self {
        MetricFamily {
            name: name.to_owned(),
            help: String::new(),
            metric_type,
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric_type(&self) -> &MetricType {
        &self.metric_type
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }
}

/// Renders the family as compact JSON, which is what ends up in error messages.
impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{MetricFamily, MetricSample, MetricType, MissingLabel, UnsupportedType};

    #[test]
    fn test_labels_get() {
        let labels = labels!["job" => "node"];
        assert_eq!(labels.get("job"), Ok("node"));
        assert_eq!(labels.get("instance"), Err(MissingLabel("instance".to_owned())));
        assert_eq!(
            &labels.get("instance").unwrap_err().to_string(),
            "label \"instance\" is not present"
        );
    }

    #[test]
    fn test_metric_type_from_str() {
        let test_data = [
            ("COUNTER", MetricType::Counter),
            ("GAUGE", MetricType::Gauge),
            ("UNTYPED", MetricType::Untyped),
            ("HISTOGRAM", MetricType::Histogram),
            ("SUMMARY", MetricType::Summary),
            ("HISTOGRAMM", MetricType::Other("HISTOGRAMM".to_owned())),
            ("gauge", MetricType::Other("gauge".to_owned())),
        ];
        for (raw, expected) in test_data {
            let metric_type = MetricType::from(raw);
            assert_eq!(metric_type, expected);
            assert_eq!(metric_type.to_string(), raw);
        }
    }

    #[test]
    fn test_metric_type_check() {
        assert!(MetricType::Counter.check().is_ok());
        assert!(MetricType::Gauge.check().is_ok());
        assert!(MetricType::Untyped.check().is_ok());

        assert_eq!(
            MetricType::Summary.check(),
            Err(UnsupportedType(MetricType::Summary))
        );
        assert_eq!(
            &MetricType::Histogram.check().unwrap_err().to_string(),
            "Unsupported Metric type: HISTOGRAM"
        );
        assert_eq!(
            &MetricType::from("HISTOGRAMM").check().unwrap_err().to_string(),
            "Unsupported Metric type: HISTOGRAMM"
        );
    }

    #[test]
    fn test_decode_prom2json() -> anyhow::Result<()> {
        let json = r#"{
            "name": "http_requests_total",
            "help": "Total requests.",
            "type": "COUNTER",
            "metrics": [
                {"labels": {"code": "200", "method": "get"}, "value": "1027"},
                {"value": "3", "timestamp_ms": "1395066363000"}
            ]
        }"#;
        let family: MetricFamily = serde_json::from_str(json)?;

        assert_eq!(family.name(), "http_requests_total");
        assert!(family
            .to_string()
            .contains(r#""help":"Total requests.","type":"COUNTER""#));
        assert_eq!(family.metric_type(), &MetricType::Counter);
        assert_eq!(family.samples().len(), 2);
        assert_eq!(family.samples()[0].labels().get("method")?, "get");
        assert_eq!(family.samples()[0].value(), Some("1027"));
        assert!(family.samples()[1].labels().is_empty());
        assert_eq!(family.samples()[1].value(), Some("3"));
        Ok(())
    }

    #[test]
    fn test_decode_histogram_without_value() -> anyhow::Result<()> {
        let json = r#"{
            "name": "request_duration_seconds",
            "type": "HISTOGRAM",
            "metrics": [
                {"buckets": {"0.1": "5", "+Inf": "7"}, "count": "7", "sum": "0.9"}
            ]
        }"#;
        let family: MetricFamily = serde_json::from_str(json)?;

        assert_eq!(family.metric_type(), &MetricType::Histogram);
        assert_eq!(family.samples()[0].value(), None);
        Ok(())
    }

    #[test]
    fn test_family_display_is_compact_json() {
        let family = MetricFamily::new(
            "up",
            MetricType::Gauge,
            vec![MetricSample::new(labels!["job" => "node"], "1")],
        );
        assert_eq!(
            &family.to_string(),
            r#"{"name":"up","type":"GAUGE","metrics":[{"labels":{"job":"node"},"value":"1"}]}"#
        );

        let family = MetricFamily::new("empty", MetricType::Other("FOO".to_owned()), vec![]);
        assert_eq!(&family.to_string(), r#"{"name":"empty","type":"FOO","metrics":[]}"#);
    }
}
