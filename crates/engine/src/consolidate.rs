//! Consolidation engine.
//!
//! Runs a tier pipeline over N sources and produces one entry per group of
//! records that every source agrees on, with back-references for fan-out
//! edits.
//!
//! For each tier in order, the first source's remaining records are walked
//! in list order. A candidate is accepted when every other source still has
//! a matching record; the first matching record of each source (the first
//! source included) is then consumed. Records consumed by a tier are gone for
//! every later, less specific tier.
//!
//! Entry order is discovery order: tier order, then the first source's
//! record order. It is **not** stable across passes if any source reorders
//! its records, so entry positions must not be used as identifiers.

use crate::model::{BackRef, ConsolidatedEntry, ConsolidationReport, SourceView};
use crate::pipeline::Pipeline;
use crate::record::Record;

/// Consolidate `sources` and return only the entries.
pub fn consolidate<T: Record>(
    sources: &[SourceView<'_, T>],
    pipeline: &Pipeline<T>,
) -> Vec<ConsolidatedEntry<T>> {
    consolidate_report(sources, pipeline).entries
}

/// Consolidate `sources`, also reporting the records that did not match.
pub fn consolidate_report<T: Record>(
    sources: &[SourceView<'_, T>],
    pipeline: &Pipeline<T>,
) -> ConsolidationReport<T> {
    // Remaining pool per source: original indices, in list order.
    let mut pools: Vec<Vec<usize>> = sources
        .iter()
        .map(|s| (0..s.items.len()).collect())
        .collect();
    let mut entries = Vec::new();

    if !sources.is_empty() {
        for tier in pipeline.tiers() {
            let before = entries.len();
            // Walk a snapshot of the first pool; skip candidates an earlier
            // acceptance in this tier already consumed.
            let candidates = pools[0].clone();

            for candidate_idx in candidates {
                if !pools[0].contains(&candidate_idx) {
                    continue;
                }
                let candidate = &sources[0].items[candidate_idx];

                // Position (within each pool) of the first matching record.
                let positions: Option<Vec<usize>> = sources
                    .iter()
                    .zip(&pools)
                    .map(|(source, pool)| {
                        pool.iter()
                            .position(|&i| (tier.matches)(candidate, &source.items[i]))
                    })
                    .collect();
                let Some(positions) = positions else {
                    continue;
                };

                let canonical = (tier.project)(candidate);
                let mut references = Vec::with_capacity(sources.len());
                for ((source, pool), pos) in sources.iter().zip(pools.iter_mut()).zip(positions) {
                    let index = pool.remove(pos);
                    references.push(BackRef {
                        source: source.id,
                        index,
                        revision: source.revision,
                    });
                }
                log::trace!(
                    "tier '{}': {} {:?} consolidated across {} sources",
                    tier.name,
                    T::SCHEMA,
                    canonical,
                    references.len()
                );
                entries.push(ConsolidatedEntry {
                    canonical,
                    tier: tier.name,
                    references,
                });
            }

            log::debug!(
                "tier '{}': {} {} entries",
                tier.name,
                entries.len() - before,
                T::SCHEMA
            );
        }
    }

    let unmatched: Vec<BackRef> = sources
        .iter()
        .zip(&pools)
        .flat_map(|(source, pool)| {
            pool.iter().map(move |&index| BackRef {
                source: source.id,
                index,
                revision: source.revision,
            })
        })
        .collect();

    if !unmatched.is_empty() {
        log::debug!(
            "{} {} records left unconsolidated across {} sources",
            unmatched.len(),
            T::SCHEMA,
            sources.len()
        );
    }

    ConsolidationReport {
        source_count: sources.len(),
        entries,
        unmatched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{self, Condition, ConditionMode, ConditionTier, ConditionView};
    use multiedit_core::SourceId;

    fn c(param: &str, mode: ConditionMode, threshold: f32) -> Condition {
        Condition::new(param, mode, threshold)
    }

    fn views(lists: &[Vec<Condition>]) -> Vec<SourceView<'_, Condition>> {
        lists
            .iter()
            .enumerate()
            .map(|(i, items)| SourceView::new(SourceId(i as u64 + 1), 0, items))
            .collect()
    }

    #[test]
    fn identical_conditions_consolidate_exactly() {
        let lists = vec![
            vec![c("Speed", ConditionMode::Greater, 0.5)],
            vec![c("Speed", ConditionMode::Greater, 0.5)],
            vec![c("Speed", ConditionMode::Greater, 0.5)],
        ];
        let entries = consolidate(&views(&lists), &condition::default_pipeline());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tier, "exact");
        assert_eq!(entries[0].reference_count(), 3);
        assert_eq!(entries[0].canonical.threshold, Some(0.5));
    }

    #[test]
    fn differing_thresholds_fall_to_parameter_mode() {
        let lists = vec![
            vec![c("Speed", ConditionMode::Greater, 0.5)],
            vec![c("Speed", ConditionMode::Greater, 0.9)],
        ];
        let entries = consolidate(&views(&lists), &condition::default_pipeline());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tier, "parameter_mode");
        assert_eq!(
            entries[0].canonical,
            ConditionView {
                parameter: "Speed".into(),
                mode: Some(ConditionMode::Greater),
                threshold: None,
            }
        );
        assert_eq!(entries[0].reference_count(), 2);
    }

    #[test]
    fn partial_participation_is_not_consolidated() {
        let a = c("Speed", ConditionMode::Greater, 0.5);
        let b = c("Grounded", ConditionMode::If, 0.0);
        let lists = vec![vec![a.clone(), b], vec![a]];
        let report = consolidate_report(&views(&lists), &condition::default_pipeline());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].canonical.parameter, "Speed");
        assert_eq!(
            report.unmatched,
            vec![BackRef { source: SourceId(1), index: 1, revision: 0 }]
        );
    }

    #[test]
    fn specific_tier_consumes_before_general_tier() {
        // Source 1 order puts the loose match first; exact must still win.
        let lists = vec![
            vec![
                c("Speed", ConditionMode::Greater, 0.1),
                c("Speed", ConditionMode::Greater, 0.5),
            ],
            vec![
                c("Speed", ConditionMode::Greater, 0.5),
                c("Speed", ConditionMode::Greater, 0.7),
            ],
        ];
        let entries = consolidate(&views(&lists), &condition::default_pipeline());
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].tier, "exact");
        assert_eq!(entries[0].references[0].index, 1);
        assert_eq!(entries[0].references[1].index, 0);

        assert_eq!(entries[1].tier, "parameter_mode");
        assert_eq!(entries[1].references[0].index, 0);
        assert_eq!(entries[1].references[1].index, 1);
    }

    #[test]
    fn first_match_in_each_pool_is_taken() {
        let speed = c("Speed", ConditionMode::Greater, 0.5);
        let lists = vec![
            vec![speed.clone(), speed.clone()],
            vec![c("Other", ConditionMode::Less, 1.0), speed.clone(), speed.clone(), speed],
        ];
        let report = consolidate_report(&views(&lists), &condition::default_pipeline());
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].references[1].index, 1);
        assert_eq!(report.entries[1].references[1].index, 2);
        let left: Vec<_> = report.unmatched.iter().map(|r| (r.source.0, r.index)).collect();
        assert_eq!(left, vec![(2, 0), (2, 3)]);
    }

    #[test]
    fn parameter_tier_merges_mixed_modes() {
        let lists = vec![
            vec![c("Speed", ConditionMode::Greater, 0.5)],
            vec![c("Speed", ConditionMode::Less, 0.5)],
        ];
        let entries = consolidate(&views(&lists), &condition::default_pipeline());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tier, "parameter");
        assert_eq!(entries[0].canonical.mode, None);

        let strict = condition::pipeline(&[ConditionTier::Exact, ConditionTier::ParameterMode]);
        assert!(consolidate(&views(&lists), &strict).is_empty());
    }

    #[test]
    fn single_source_consolidates_everything() {
        let lists = vec![vec![
            c("Speed", ConditionMode::Greater, 0.5),
            c("Grounded", ConditionMode::If, 0.0),
        ]];
        let report = consolidate_report(&views(&lists), &condition::default_pipeline());
        assert_eq!(report.entries.len(), 2);
        assert!(report.entries.iter().all(|e| e.tier == "exact" && e.reference_count() == 1));
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn empty_inputs_yield_empty_result() {
        let none: Vec<SourceView<'_, Condition>> = Vec::new();
        assert!(consolidate(&none, &condition::default_pipeline()).is_empty());

        let lists = vec![vec![c("Speed", ConditionMode::Greater, 0.5)]];
        let report = consolidate_report(&views(&lists), &Pipeline::empty());
        assert!(report.entries.is_empty());
        assert_eq!(report.unmatched.len(), 1);
    }

    #[test]
    fn back_refs_carry_observed_revision() {
        let items = vec![c("Speed", ConditionMode::Greater, 0.5)];
        let sources = vec![
            SourceView::new(SourceId(10), 4, &items[..]),
            SourceView::new(SourceId(11), 9, &items[..]),
        ];
        let entries = consolidate(&sources, &condition::default_pipeline());
        assert_eq!(entries[0].reference_for(SourceId(10)).unwrap().revision, 4);
        assert_eq!(entries[0].reference_for(SourceId(11)).unwrap().revision, 9);
    }

    #[test]
    fn tier_counts_in_discovery_order() {
        let lists = vec![
            vec![c("A", ConditionMode::If, 0.0), c("B", ConditionMode::Greater, 1.0), c("C", ConditionMode::If, 0.0)],
            vec![c("A", ConditionMode::If, 0.0), c("B", ConditionMode::Greater, 2.0), c("C", ConditionMode::If, 0.0)],
        ];
        let report = consolidate_report(&views(&lists), &condition::default_pipeline());
        assert_eq!(report.tier_counts(), vec![("exact", 2), ("parameter_mode", 1)]);
    }
}
