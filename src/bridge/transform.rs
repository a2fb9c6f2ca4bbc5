//! Series to sample transformation.

use crate::core::{BridgeError, Query, ResultSeries, Result, TransformedSample, METRIC_NAME_LABEL};

/// Derive the pushed name, value and tags of one series.
///
/// A `__name__` label overrides the query's default name and is never
/// emitted as a tag. Every other label becomes one `key:value` tag.
pub fn transform(series: &ResultSeries, query: &Query) -> Result<TransformedSample> {
    let mut name = query.name();
    let mut tags = Vec::with_capacity(series.labels.len());

    for (key, value) in &series.labels {
        if key == METRIC_NAME_LABEL {
            name = value.as_str();
        } else {
            tags.push(format!("{}:{}", key, value));
        }
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(BridgeError::InvalidMetricName {
            query: query.query().to_string(),
        });
    }

    Ok(TransformedSample {
        name: name.to_string(),
        value: series.value,
        tags,
    })
}
