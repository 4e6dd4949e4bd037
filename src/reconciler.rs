// Edge FTU: congestion-reactive forwarding table updates for edge routers
// Copyright (C) 2023 The edge-ftu developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Diff-based reconciliation of the forwarding state of all pairs.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use itertools::Itertools;

use crate::{
    registry::PathRegistry,
    types::{Action, Link, Pair, PairState},
};

/// Keeps track of the state of every pair, as last requested from the edge routers.
///
/// The state is tracked optimistically: it is updated as soon as the actions are emitted, no
/// matter whether the routers acknowledge them or not.
#[derive(Debug, Clone)]
pub struct ForwardingReconciler {
    /// Shared path registry
    registry: Arc<PathRegistry>,
    /// Current state of every pair
    current: BTreeMap<Pair, PairState>,
}

impl ForwardingReconciler {
    /// Create a new reconciler, where all pairs are enabled.
    pub fn new(registry: Arc<PathRegistry>) -> Self {
        let current = registry
            .pairs()
            .map(|p| (*p, PairState::Enabled))
            .collect();
        Self { registry, current }
    }

    /// Compute the desired state from the set of congested links, and return the actions that
    /// transform the current state into the desired one. All `disable` actions come before all
    /// `enable` actions, each group sorted by pair. Afterwards, the desired state becomes the
    /// current state.
    pub fn reconcile(&mut self, congested: &BTreeSet<Link>) -> Vec<Action> {
        let disabled: BTreeSet<Pair> = congested
            .iter()
            .flat_map(|link| self.registry.pairs_for_link(link).iter().copied())
            .collect();
        let desired = self
            .registry
            .pairs()
            .map(|p| {
                let state = if disabled.contains(p) {
                    PairState::Disabled
                } else {
                    PairState::Enabled
                };
                (*p, state)
            })
            .collect();
        self.apply(desired)
    }

    /// Enable all pairs again, and return the actions to get there.
    pub fn reset(&mut self) -> Vec<Action> {
        let desired = self
            .registry
            .pairs()
            .map(|p| (*p, PairState::Enabled))
            .collect();
        self.apply(desired)
    }

    /// Diff `desired` against the current state, and replace the current state.
    fn apply(&mut self, desired: BTreeMap<Pair, PairState>) -> Vec<Action> {
        let actions: Vec<Action> = desired
            .iter()
            .filter_map(|(pair, new)| {
                let old = self.current.get(pair).copied().unwrap_or_default();
                match (old, new) {
                    (PairState::Enabled, PairState::Disabled) => Some(Action::disable(*pair)),
                    (PairState::Disabled, PairState::Enabled) => Some(Action::enable(*pair)),
                    _ => None,
                }
            })
            .sorted()
            .collect();
        self.current = desired;
        actions
    }

    /// Get the current state of a pair, or `None` if the pair is unknown.
    pub fn state(&self, pair: &Pair) -> Option<PairState> {
        self.current.get(pair).copied()
    }

    /// Iterate over all pairs that are currently disabled.
    pub fn disabled_pairs(&self) -> impl Iterator<Item = &Pair> {
        self.current
            .iter()
            .filter(|(_, s)| **s == PairState::Disabled)
            .map(|(p, _)| p)
    }

    /// Iterate over all pairs and their current state.
    pub fn pairs(&self) -> impl Iterator<Item = (&Pair, &PairState)> {
        self.current.iter()
    }

    /// Get the path registry.
    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }
}
