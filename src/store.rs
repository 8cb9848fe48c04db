//! In-memory statistics store with last-request-wins loads.

use crate::aggregate::{aggregate, by_region_and_year, domain_max, find_summary, overall_stats};
use crate::error::{CrimeMapError, CrimeMapResult};
use crate::types::{OverallStats, RegionSummary, YearlyRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Monotonically increasing id of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct Snapshot {
    records: Vec<YearlyRecord>,
    summaries: Vec<RegionSummary>,
    domain_max: u64,
}

impl Snapshot {
    pub fn new(records: Vec<YearlyRecord>) -> Self {
        let summaries = aggregate(&records);
        let domain_max = domain_max(&summaries);
        Snapshot {
            records,
            summaries,
            domain_max,
        }
    }

    pub fn records(&self) -> &[YearlyRecord] {
        &self.records
    }

    pub fn summaries(&self) -> &[RegionSummary] {
        &self.summaries
    }

    /// Largest region total; the upper end of the color domain.
    pub fn domain_max(&self) -> u64 {
        self.domain_max
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self, region: &str) -> Option<&RegionSummary> {
        find_summary(&self.summaries, region)
    }

    /// One region's yearly rows, oldest first.
    pub fn region_years(&self, region: &str) -> CrimeMapResult<Vec<YearlyRecord>> {
        let years = by_region_and_year(&self.records, region);
        if years.is_empty() {
            return Err(CrimeMapError::RegionNotFound(region.to_string()));
        }
        Ok(years)
    }

    pub fn overall(&self) -> CrimeMapResult<OverallStats> {
        overall_stats(&self.records)
            .ok_or_else(|| CrimeMapError::DataUnavailable("no records loaded".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct Store {
    current: RwLock<Arc<Snapshot>>,
    issued: AtomicU64,
    installed: RwLock<Option<RequestToken>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<YearlyRecord>) -> Self {
        let store = Self::new();
        let token = store.begin_load();
        store.complete_load(token, records);
        store
    }

    /// The current snapshot. Readers keep it alive across a concurrent swap.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Issues the token for a new load; it supersedes all earlier ones.
    pub fn begin_load(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns `false` and discards `records` if a newer load has been issued.
    pub fn complete_load(&self, token: RequestToken, records: Vec<YearlyRecord>) -> bool {
        if token.0 < self.issued.load(Ordering::SeqCst) {
            debug!("Discarding superseded load {:?}", token);
            return false;
        }

        let snapshot = Arc::new(Snapshot::new(records));
        let mut installed = match self.installed.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Re-check under the lock so two completions cannot race past each other.
        if (*installed).is_some_and(|t| t > token) || token.0 < self.issued.load(Ordering::SeqCst) {
            debug!("Discarding superseded load {:?}", token);
            return false;
        }
        info!(
            "Installed dataset: {} records, {} regions",
            snapshot.records.len(),
            snapshot.summaries.len()
        );
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        *installed = Some(token);
        true
    }
}
