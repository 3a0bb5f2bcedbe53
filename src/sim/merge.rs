//! Merge resolution over one step's contacts
//!
//! Resolution runs in two phases. The decide phase walks every contact
//! against an untouched registry and queues destroys and creates; only when
//! the whole list has been seen does the apply phase mutate the registry.
//! A piece claimed by one merge is skipped by every later contact in the
//! same pass, so each piece takes part in at most one merge per step.

use std::collections::HashSet;

use glam::Vec2;

use super::piece::{PieceContact, PieceId, PieceRegistry};

/// Rules the resolver needs beyond the registry itself
#[derive(Debug, Clone, Copy)]
pub struct MergeRules {
    pub max_rank: u8,
    /// Pairs with a piece centered above this line are skipped when `Some`
    pub blocked_above_y: Option<f32>,
}

/// One accepted merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeOutcome {
    pub consumed: [PieceId; 2],
    pub position: Vec2,
    pub rank: u8,
    /// Filled in by the apply phase
    pub created: Option<PieceId>,
}

/// Per-step merge bookkeeping
#[derive(Debug, Clone, Default)]
pub struct MergeResolver {
    claimed: HashSet<PieceId>,
    pending_destroy: Vec<PieceId>,
    pending_create: Vec<(Vec2, u8)>,
    outcomes: Vec<MergeOutcome>,
}

impl MergeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide and apply every merge for one step's contacts
    pub fn resolve(
        &mut self,
        registry: &mut PieceRegistry,
        contacts: &[PieceContact],
        rules: &MergeRules,
    ) -> Vec<MergeOutcome> {
        self.decide(registry, contacts, rules);
        self.apply(registry)
    }

    /// Queue merges without touching the registry
    fn decide(&mut self, registry: &PieceRegistry, contacts: &[PieceContact], rules: &MergeRules) {
        debug_assert!(self.claimed.is_empty() && self.pending_destroy.is_empty());

        for contact in contacts {
            let (a, b) = (contact.a, contact.b);
            if a == b || self.claimed.contains(&a) || self.claimed.contains(&b) {
                continue;
            }
            let ranks = (registry.rank(a), registry.rank(b));
            debug_assert!(
                ranks.0.is_some() && ranks.1.is_some(),
                "contact references unknown piece {a:?}/{b:?}"
            );
            let (Some(rank_a), Some(rank_b)) = ranks else {
                log::warn!("contact references unknown piece {a:?}/{b:?}");
                continue;
            };
            if rank_a != rank_b || rank_a >= rules.max_rank {
                continue;
            }
            let (Some(pos_a), Some(pos_b)) = (registry.position(a), registry.position(b)) else {
                continue;
            };
            if let Some(line) = rules.blocked_above_y
                && (pos_a.y < line || pos_b.y < line)
            {
                continue;
            }

            let position = (pos_a + pos_b) * 0.5;
            let rank = rank_a + 1;
            self.claimed.insert(a);
            self.claimed.insert(b);
            self.pending_destroy.extend([a, b]);
            self.pending_create.push((position, rank));
            self.outcomes.push(MergeOutcome {
                consumed: [a, b],
                position,
                rank,
                created: None,
            });
            log::debug!("merge {a:?} + {b:?} -> rank {rank} at ({:.1}, {:.1})", position.x, position.y);
        }
    }

    /// Destroys first, then creates, then clear the pass state
    fn apply(&mut self, registry: &mut PieceRegistry) -> Vec<MergeOutcome> {
        let mut destroyed = 0;
        for id in self.pending_destroy.drain(..) {
            if registry.destroy(id) {
                destroyed += 1;
            }
        }
        debug_assert_eq!(destroyed, self.claimed.len(), "a claimed piece was destroyed twice");

        for ((position, rank), outcome) in self.pending_create.drain(..).zip(self.outcomes.iter_mut()) {
            outcome.created = Some(registry.create(position, rank));
        }

        self.claimed.clear();
        std::mem::take(&mut self.outcomes)
    }
}
