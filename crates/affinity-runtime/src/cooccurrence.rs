//! Co-occurrence ranking.
//!
//! Values that appear together inside the same group are related; the
//! more groups two values share, the stronger the link.

use affinity_core::types::{Observation, RankedList, RecordId, ScoredTarget};
use std::collections::HashMap;

/// Group membership in first-encounter order, duplicates collapsed.
fn group_members(observations: &[Observation]) -> Vec<Vec<&str>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&str>> = Vec::new();

    for obs in observations {
        let slot = *index.entry(obs.group.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        let members = &mut groups[slot];
        if !members.contains(&obs.data.as_str()) {
            members.push(obs.data.as_str());
        }
    }

    groups
}

/// Pairwise counters for one source value, in first-encounter order.
#[derive(Default)]
struct Counter<'a> {
    order: Vec<(&'a str, u64)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Counter<'a> {
    fn bump(&mut self, target: &'a str) {
        match self.index.get(target) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(target, self.order.len());
                self.order.push((target, 1));
            }
        }
    }
}

/// Count co-occurrences and rank each value's peers.
///
/// Every ordered pair (A, B) of distinct members of a group adds one to
/// A's count for B; counts accumulate across groups. Each list is keyed by
/// its own source value, sorted by count descending (ties in the order the
/// peer was first seen) and cut to `limit`. Sources are returned in the
/// order they were first counted. Values with no peers get no list.
pub fn rank_cooccurrences(observations: &[Observation], limit: usize) -> Vec<RankedList> {
    let groups = group_members(observations);

    let mut sources: Vec<&str> = Vec::new();
    let mut counters: HashMap<&str, Counter> = HashMap::new();

    for members in &groups {
        for &a in members {
            for &b in members {
                if a == b {
                    continue;
                }
                let counter = counters.entry(a).or_insert_with(|| {
                    sources.push(a);
                    Counter::default()
                });
                counter.bump(b);
            }
        }
    }

    sources
        .into_iter()
        .filter_map(|source| {
            let counter = counters.remove(source)?;
            let targets = counter
                .order
                .into_iter()
                .map(|(target, count)| ScoredTarget::new(target, count as f64))
                .collect();
            Some(RankedList::from_scores(RecordId::from(source), targets, limit))
        })
        .collect()
}
