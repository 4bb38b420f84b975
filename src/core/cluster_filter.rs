use super::cluster::Cluster;
use crate::bio::sequence::{SequenceKey, Taxon};
use crate::storage::SequenceStore;
use crate::Result;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which key survives when several keys of one cluster share a taxon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The first key in cluster order
    #[default]
    KeepFirst,
    /// The longest sequence; ties go to the earlier key
    KeepLongest,
}

/// A retained cluster with at most one key per taxon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonCluster {
    members: Vec<(Taxon, SequenceKey)>,
}

impl TaxonCluster {
    pub fn members(&self) -> &[(Taxon, SequenceKey)] {
        &self.members
    }

    pub fn keys(&self) -> impl Iterator<Item = &SequenceKey> {
        self.members.iter().map(|(_, key)| key)
    }

    pub fn taxa(&self) -> impl Iterator<Item = &Taxon> {
        self.members.iter().map(|(taxon, _)| taxon)
    }

    pub fn taxon_of(&self, key: &SequenceKey) -> Option<&Taxon> {
        self.members
            .iter()
            .find(|(_, k)| k == key)
            .map(|(taxon, _)| taxon)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub retained: Vec<TaxonCluster>,
    pub discarded: Vec<Cluster>,
}

#[derive(Debug, Clone)]
pub struct ClusterFilter {
    min_taxa: usize,
    policy: DuplicatePolicy,
}

impl Default for ClusterFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterFilter {
    pub fn new() -> Self {
        Self {
            min_taxa: 4,
            policy: DuplicatePolicy::KeepFirst,
        }
    }

    pub fn with_min_taxa(mut self, min_taxa: usize) -> Self {
        self.min_taxa = min_taxa;
        self
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Drop clusters with too few distinct taxa and thin the rest to one key per taxon.
    pub fn filter(&self, clusters: Vec<Cluster>, store: &dyn SequenceStore) -> Result<FilterOutcome> {
        let mut outcome = FilterOutcome::default();
        for cluster in clusters {
            let chosen = self.pick_per_taxon(&cluster, store)?;
            if chosen.len() < self.min_taxa {
                debug!(
                    "Discarding cluster of {} keys with {} distinct taxa",
                    cluster.len(),
                    chosen.len()
                );
                outcome.discarded.push(cluster);
                continue;
            }

            // Restore cluster order among the surviving keys
            let mut members: Vec<(usize, Taxon, SequenceKey)> = chosen
                .into_iter()
                .map(|(taxon, (position, key, _))| (position, taxon, key))
                .collect();
            members.sort_by_key(|(position, _, _)| *position);
            outcome.retained.push(TaxonCluster {
                members: members
                    .into_iter()
                    .map(|(_, taxon, key)| (taxon, key))
                    .collect(),
            });
        }

        info!(
            "Kept {} clusters with at least {} taxa, discarded {}",
            outcome.retained.len(),
            self.min_taxa,
            outcome.discarded.len()
        );
        Ok(outcome)
    }

    fn pick_per_taxon(
        &self,
        cluster: &Cluster,
        store: &dyn SequenceStore,
    ) -> Result<IndexMap<Taxon, (usize, SequenceKey, usize)>> {
        let mut chosen: IndexMap<Taxon, (usize, SequenceKey, usize)> = IndexMap::new();
        for (position, key) in cluster.iter().enumerate() {
            let taxon = store.taxon(key)?;
            let length = match self.policy {
                DuplicatePolicy::KeepFirst => 0,
                DuplicatePolicy::KeepLongest => store.sequence_length(key)?,
            };
            match chosen.entry(taxon) {
                Entry::Vacant(slot) => {
                    slot.insert((position, key.clone(), length));
                }
                Entry::Occupied(mut slot) => {
                    if self.policy == DuplicatePolicy::KeepLongest && length > slot.get().2 {
                        slot.insert((position, key.clone(), length));
                    }
                }
            }
        }
        Ok(chosen)
    }
}
