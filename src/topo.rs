//! Merges and orders the per-dependency "using" contributions collected
//! while walking a target's dependency closure.
//!
//! A dependency can be reached through more than one path in the graph (the
//! diamond case: two libraries both depending on a third). `topo_merge`
//! reconciles the contributions from each path into one entry per
//! `(target, env)` pair; `topo_sort` then orders those entries so the
//! emitter lists inputs in a stable, dependency-respecting sequence.

use crate::delta::Delta;
use crate::ident::Ident;
use std::collections::HashMap;

/// One surviving contribution for a `(target, env)` pair reached while
/// walking a dependency closure: the longest path length to it (`rank`),
/// the using-delta that must be applied to give a consumer its effects, and
/// a stable fingerprint of that delta's effect used only to break sort ties
/// deterministically (`Delta` itself carries an opaque closure and so has
/// no ordering of its own).
#[derive(Clone)]
pub struct DepEntry {
    pub rank: usize,
    pub using_delta: Vec<Delta>,
    pub using_key: String,
}

/// Keyed by the dependency's identifier and the digest of the environment
/// it was evaluated under — the same library reached under two different
/// environments is two distinct entries, each with its own products.
pub type DepMap = HashMap<(Ident, String), DepEntry>;

/// Folds `from` (a dependency's own merged closure, or its single
/// self-entry) into `into`, as seen from one level up: every incoming rank
/// is incremented *before* being combined with any existing rank for the
/// same key, so a target's rank reflects the longest path to it rather than
/// the shortest.
pub fn topo_merge(into: &mut DepMap, from: &DepMap) {
    for (key, entry) in from {
        let incoming_rank = entry.rank + 1;
        into.entry(key.clone())
            .and_modify(|existing| {
                if incoming_rank > existing.rank {
                    existing.rank = incoming_rank;
                }
            })
            .or_insert_with(|| DepEntry {
                rank: incoming_rank,
                using_delta: entry.using_delta.clone(),
                using_key: entry.using_key.clone(),
            });
    }
}

/// Inserts a target's own self-entry at rank 0, the base case `topo_merge`
/// never produces on its own (it only ever increments).
pub fn insert_self(map: &mut DepMap, key: (Ident, String), using_delta: Vec<Delta>, using_key: String) {
    map.entry(key)
        .and_modify(|existing| {
            existing.using_delta = using_delta.clone();
            existing.using_key = using_key.clone();
        })
        .or_insert(DepEntry { rank: 0, using_delta, using_key });
}

/// Orders entries by `(rank, identifier, env_digest, using_key)`, the order
/// invariant 7 of the core requires so that two evaluations of the same
/// graph emit their ninja inputs in the same sequence.
pub fn topo_sort(map: &DepMap) -> Vec<(&Ident, &str, &DepEntry)> {
    let mut items: Vec<(&Ident, &str, &DepEntry)> =
        map.iter().map(|((ident, env_digest), entry)| (ident, env_digest.as_str(), entry)).collect();
    items.sort_by(|(ia, ea, ra), (ib, eb, rb)| {
        ra.rank.cmp(&rb.rank).then(ia.cmp(ib)).then(ea.cmp(eb)).then(ra.using_key.cmp(&rb.using_key))
    });
    items
}
