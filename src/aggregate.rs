//! Aggregation of yearly records into ranked per-region summaries.

use crate::types::{Breakdown, Category, CategoryCounts, OverallStats, RegionSummary, YearlyRecord};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Percentages are computed in tenths of a percent; 1000 tenths = 100%.
const FULL_TENTHS: i64 = 1000;

/// Groups records by region and produces ranked summaries.
///
/// Regions are grouped by exact name, so names must already be canonical.
/// The result is ordered by total descending; regions with equal totals keep
/// the order in which they were first seen, and `rank` is the 1-based
/// position in that order.
pub fn aggregate(records: &[YearlyRecord]) -> Vec<RegionSummary> {
    let mut groups: Vec<(String, CategoryCounts)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.region.as_str()).or_insert_with(|| {
            groups.push((record.region.clone(), CategoryCounts::default()));
            groups.len() - 1
        });
        groups[slot].1.accumulate(&record.counts);
    }

    let mut summaries: Vec<RegionSummary> = groups
        .into_iter()
        .map(|(region, category_totals)| {
            let total = category_totals.total();
            RegionSummary {
                region,
                category_totals,
                total,
                rank: 0,
                breakdown: breakdown(&category_totals, total),
            }
        })
        .collect();

    // sort_by is stable: ties keep first-seen order.
    summaries.sort_by(|a, b| b.total.cmp(&a.total));
    for (position, summary) in summaries.iter_mut().enumerate() {
        summary.rank = position + 1;
    }

    debug!("Aggregated {} records into {} regions", records.len(), summaries.len());
    summaries
}

/// Share of `total` per category, rounded to one decimal.
///
/// A zero total yields an all-zero breakdown. If rounding every share
/// independently leaves the sum more than a tenth away from 100, the
/// shares with the largest rounding error are nudged by a tenth each until
/// it is not.
fn breakdown(totals: &CategoryCounts, total: u64) -> Breakdown {
    if total == 0 {
        return Breakdown::default();
    }

    let exact: [f64; 7] =
        Category::ALL.map(|c| totals.get(c) as f64 * FULL_TENTHS as f64 / total as f64);
    let mut tenths: [i64; 7] = exact.map(|e| e.round() as i64);
    let mut drift: i64 = tenths.iter().sum::<i64>() - FULL_TENTHS;

    while drift.abs() > 1 {
        let step = drift.signum();
        // Pick the share rounded furthest in the direction of the drift.
        let mut pick = 0;
        let mut worst = f64::NEG_INFINITY;
        for (i, (&t, &e)) in tenths.iter().zip(exact.iter()).enumerate() {
            let error = (t as f64 - e) * step as f64;
            if error > worst {
                worst = error;
                pick = i;
            }
        }
        tenths[pick] -= step;
        drift -= step;
    }

    Breakdown::from_values(tenths.map(|t| t as f64 / 10.0))
}

/// Records for one region, ordered by year ascending.
pub fn by_region_and_year(records: &[YearlyRecord], region: &str) -> Vec<YearlyRecord> {
    let mut years: Vec<YearlyRecord> = records
        .iter()
        .filter(|r| r.region == region)
        .cloned()
        .collect();
    years.sort_by_key(|r| r.year);
    years
}

/// Case-insensitive lookup of a summary by canonical region name.
pub fn find_summary<'a>(summaries: &'a [RegionSummary], name: &str) -> Option<&'a RegionSummary> {
    let wanted = name.to_lowercase();
    summaries.iter().find(|s| s.region.to_lowercase() == wanted)
}

/// Largest region total, or 0 when there are no summaries.
pub fn domain_max(summaries: &[RegionSummary]) -> u64 {
    summaries.iter().map(|s| s.total).max().unwrap_or(0)
}

/// Dataset-wide totals and bounds; `None` when there are no records.
pub fn overall_stats(records: &[YearlyRecord]) -> Option<OverallStats> {
    let start_year = records.iter().map(|r| r.year).min()?;
    let end_year = records.iter().map(|r| r.year).max()?;

    let mut totals = CategoryCounts::default();
    for record in records {
        totals.accumulate(&record.counts);
    }
    let regions: HashSet<&str> = records.iter().map(|r| r.region.as_str()).collect();

    Some(OverallStats::new(&totals, regions.len(), start_year, end_year))
}
