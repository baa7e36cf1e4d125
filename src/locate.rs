use tracing::{debug, trace};

use crate::{MetricFamily, MetricSample, MissingLabel};

/// Picks one sample out of a multi-value family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelFilter {
    pub name: String,
    pub value: String,
}

/// Describes which sample a check looks at: the family name plus an optional label filter.
///
/// ```rust
/// # use check_metric_value::Selector;
/// let selector = Selector::from_parts("node_filesystem_avail_bytes", Some("mountpoint".into()), None);
/// // a filter needs both halves
/// assert!(selector.label().is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    name: String,
    label: Option<LabelFilter>,
}

/// The family and sample a [Selector] resolved to.
#[derive(Clone, Copy, Debug)]
pub struct Located<'a> {
    pub family: &'a MetricFamily,
    pub sample: &'a MetricSample,
}

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Metric with name = {0} not found")]
    NotFound(String),
    #[error("Metric contains no metrics -- {0}")]
    NoSamples(String),
    #[error("-n/--label-name and -v/--label-value are required for multi-value metrics -- {0}")]
    LabelFilterRequired(String),
    #[error("{source} -- {family}")]
    MissingLabel { source: MissingLabel, family: String },
    #[error("No metric found with label_name = {name}, label_value = {value} -- {family}")]
    NoMatch {
        name: String,
        value: String,
        family: String,
    },
}

impl Selector {
    pub fn new(name: &str) -> Self {
        Selector {
            name: name.to_owned(),
            label: None,
        }
    }

    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.label = Some(LabelFilter {
            name: name.to_owned(),
            value: value.to_owned(),
        });
        self
    }

    /// Builds a selector from optional command line values. The label filter is only set if
    /// both the label name and the label value are given.
    pub fn from_parts(name: &str, label_name: Option<String>, label_value: Option<String>) -> Self {
        let label = match (label_name, label_value) {
            (Some(name), Some(value)) => Some(LabelFilter { name, value }),
            _ => None,
        };

        Selector {
            name: name.to_owned(),
            label,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&LabelFilter> {
        self.label.as_ref()
    }

    /// Finds the sample this selector points at.
    ///
    /// Only the first family with a matching name is considered. A family with a single sample
    /// always resolves to that sample, the label filter is ignored in that case. With more
    /// samples the label filter is required and the first sample carrying the label value wins.
    /// A sample which doesn't carry the label at all aborts the search.
    pub fn locate<'a>(&self, families: &'a [MetricFamily]) -> Result<Located<'a>, LocateError> {
        debug!(count = families.len(), metric = %self.name, "searching metric");

        let family = families
            .iter()
            .find(|f| f.name() == self.name)
            .ok_or_else(|| LocateError::NotFound(self.name.clone()))?;

        debug!(raw = %family, "metric found");

        let sample = match family.samples() {
            [] => return Err(LocateError::NoSamples(family.to_string())),
            [sample] => sample,
            samples => {
                debug!(label = ?self.label, "metric contains multiple values");
                self.match_label(family, samples)?
            }
        };

        trace!(?sample, "sample resolved");
        Ok(Located { family, sample })
    }

    fn match_label<'a>(
        &self,
        family: &MetricFamily,
        samples: &'a [MetricSample],
    ) -> Result<&'a MetricSample, LocateError> {
        let filter = self
            .label
            .as_ref()
            .ok_or_else(|| LocateError::LabelFilterRequired(family.to_string()))?;

        for sample in samples {
            let value = sample
                .labels()
                .get(&filter.name)
                .map_err(|source| LocateError::MissingLabel {
                    source,
                    family: family.to_string(),
                })?;

            if value == filter.value {
                return Ok(sample);
            }
        }

        Err(LocateError::NoMatch {
            name: filter.name.clone(),
            value: filter.value.clone(),
            family: family.to_string(),
        })
    }
}
