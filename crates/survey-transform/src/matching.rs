//! Column matching against encoder targets.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{AnyValue, Series};
use survey_model::{MatchMode, RawValue};

/// Distinct non-null values of a column.
pub fn observed_values(series: &Series) -> BTreeSet<RawValue> {
    (0..series.len())
        .filter_map(|idx| RawValue::from_any(series.get(idx).unwrap_or(AnyValue::Null)))
        .collect()
}

/// Tests an observed value set against an encoding's key set.
///
/// `Any` accepts when every observed value is a key. `Strict` additionally
/// requires every key to be observed. An empty observed set (an all-null
/// column) therefore passes `Any` and fails `Strict` for any non-empty target.
pub fn admits<V>(observed: &BTreeSet<RawValue>, target: &BTreeMap<RawValue, V>, mode: MatchMode) -> bool {
    let subset = observed.iter().all(|value| target.contains_key(value));
    match mode {
        MatchMode::Any => subset,
        MatchMode::Strict => subset && observed.len() == target.len(),
    }
}
