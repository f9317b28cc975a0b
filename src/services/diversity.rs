use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Holdings, Plan};

/// Eligible plans grouped by provider, built per call and never persisted
///
/// Ordered by provider name so a seeded generator yields repeatable picks.
pub type ProviderPlanIndex<'a> = BTreeMap<&'a str, Vec<&'a Plan>>;

/// Groups the catalog by provider, dropping plans or providers the user already holds
pub fn provider_index<'a>(holdings: &Holdings, catalog: &'a [Plan]) -> ProviderPlanIndex<'a> {
    let mut index: ProviderPlanIndex<'a> = BTreeMap::new();
    for plan in catalog.iter().filter(|p| !holdings.excludes(p)) {
        index
            .entry(plan.provider_name.as_str())
            .or_default()
            .push(plan);
    }
    index
}

/// Draws one plan per provider, uniformly within each provider
pub fn candidates<'a, R: Rng + ?Sized>(rng: &mut R, index: &ProviderPlanIndex<'a>) -> Vec<&'a Plan> {
    index
        .values()
        .filter_map(|plans| plans.choose(&mut *rng).copied())
        .collect()
}

/// Picks up to `count` plans the user holds nothing from, at most one per provider
///
/// An empty catalog, or one where every provider is excluded, yields an empty
/// result.
pub fn select<R: Rng + ?Sized>(
    rng: &mut R,
    holdings: &Holdings,
    catalog: &[Plan],
    count: NonZeroUsize,
) -> Vec<Plan> {
    let index = provider_index(holdings, catalog);
    let picked = candidates(&mut *rng, &index);
    let amount = count.get().min(picked.len());

    picked
        .choose_multiple(rng, amount)
        .map(|plan| (*plan).clone())
        .collect()
}

/// Shared, thread-safe diversity filter with a fixed recommendation count
pub struct DiversityFilter {
    count: NonZeroUsize,
    rng: Mutex<StdRng>,
}

impl DiversityFilter {
    /// Filter seeded from the operating system
    pub fn new(count: NonZeroUsize) -> Self {
        Self::with_rng(count, StdRng::from_os_rng())
    }

    /// Filter with a fixed seed, for reproducible runs
    pub fn with_seed(count: NonZeroUsize, seed: u64) -> Self {
        Self::with_rng(count, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(count: NonZeroUsize, rng: StdRng) -> Self {
        Self {
            count,
            rng: Mutex::new(rng),
        }
    }

    pub fn count(&self) -> NonZeroUsize {
        self.count
    }

    pub fn filter(&self, holdings: &Holdings, catalog: &[Plan]) -> Vec<Plan> {
        let mut rng = self.rng.lock();
        select(&mut *rng, holdings, catalog, self.count)
    }
}
