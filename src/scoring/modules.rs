/*!
 * Per-Module Scoring
 * Splits a batch by record module and scores each group
 */

use super::engine::{score_samples, Samples};
use super::report::ScoreReport;
use crate::config::ScoringConfig;
use crate::trace::TraceRecord;
use std::collections::BTreeMap;

/// One report per module, keyed by module name
///
/// System records carry no module; their lag samples count toward every
/// group. An input without unit records yields an empty map.
pub fn compute_by_module<R: AsRef<TraceRecord>>(
    records: &[R],
    config: &ScoringConfig,
) -> BTreeMap<String, ScoreReport> {
    let mut system = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&TraceRecord>> = BTreeMap::new();

    for record in records.iter().map(AsRef::as_ref) {
        if record.system_metric {
            system.push(record);
        } else {
            groups.entry(record.module.as_str()).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(module, units)| {
            let mut samples = Samples::with_capacity(units.len());
            for record in units.into_iter().chain(system.iter().copied()) {
                samples.push(record);
            }
            (module.to_string(), score_samples(&samples, config))
        })
        .collect()
}
