//! Pieces and the registry that owns them
//!
//! The registry is the only code allowed to add or remove bodies in the
//! physics world. It owns the world outright, so every live piece has exactly
//! one body and a destroyed piece can never leave a body behind.

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{BodyHandle, BodyState, PhysicsWorld};
use crate::tuning::{RankTuning, Tuning};

/// Stable identity of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl RankTuning {
    /// Collision radius for a rank: `base + (rank + 1) * step`
    #[inline]
    pub fn radius(&self, rank: u8) -> f32 {
        self.radius_base + (rank as f32 + 1.0) * self.radius_step
    }

    /// Whether `rank` lies in `[1, max_rank]`
    #[inline]
    pub fn is_valid(&self, rank: u8) -> bool {
        (1..=self.max_rank).contains(&rank)
    }
}

/// A live piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub rank: u8,
    pub body: BodyHandle,
}

/// Two pieces reported touching by the physics step (a < b)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceContact {
    pub a: PieceId,
    pub b: PieceId,
}

impl PieceContact {
    pub fn new(a: PieceId, b: PieceId) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }
}

/// Authoritative set of live pieces
#[derive(Debug)]
pub struct PieceRegistry {
    world: PhysicsWorld,
    ranks: RankTuning,
    pieces: BTreeMap<PieceId, Piece>,
    by_body: HashMap<BodyHandle, PieceId>,
    next_id: u32,
}

impl PieceRegistry {
    /// Build the world and its well: a floor and two side walls
    pub fn new(tuning: &Tuning) -> Self {
        let mut world = PhysicsWorld::new(&tuning.physics);
        let (w, h) = (tuning.well.width, tuning.well.height);
        world.add_static_segment(Vec2::new(0.0, h), Vec2::new(w, h));
        // Walls reach above the top so large pieces spawned near y=0 stay inside
        world.add_static_segment(Vec2::new(0.0, -h), Vec2::new(0.0, h));
        world.add_static_segment(Vec2::new(w, -h), Vec2::new(w, h));

        Self {
            world,
            ranks: tuning.ranks,
            pieces: BTreeMap::new(),
            by_body: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn ranks(&self) -> &RankTuning {
        &self.ranks
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Create a piece at rest at `pos`
    ///
    /// # Panics
    /// If `rank` is outside `[1, max_rank]`; callers never produce such ranks.
    pub fn create(&mut self, pos: Vec2, rank: u8) -> PieceId {
        assert!(
            self.ranks.is_valid(rank),
            "piece rank {rank} outside 1..={}",
            self.ranks.max_rank
        );
        let id = PieceId(self.next_id);
        self.next_id += 1;

        let body = self.world.add_body(pos, self.ranks.radius(rank));
        self.by_body.insert(body, id);
        self.pieces.insert(id, Piece { id, rank, body });
        id
    }

    /// Destroy a piece and its body. Unknown or already-destroyed ids are a no-op.
    pub fn destroy(&mut self, id: PieceId) -> bool {
        let Some(piece) = self.pieces.remove(&id) else {
            return false;
        };
        self.by_body.remove(&piece.body);
        let removed = self.world.remove_body(piece.body);
        debug_assert!(removed, "piece {id:?} had no body");
        true
    }

    /// Destroy every live piece
    pub fn clear(&mut self) {
        let ids: Vec<PieceId> = self.pieces.keys().copied().collect();
        for id in ids {
            self.destroy(id);
        }
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.pieces.contains_key(&id)
    }

    pub fn rank(&self, id: PieceId) -> Option<u8> {
        self.pieces.get(&id).map(|p| p.rank)
    }

    pub fn body(&self, id: PieceId) -> Option<BodyState> {
        self.pieces.get(&id).and_then(|p| self.world.body(p.body))
    }

    pub fn position(&self, id: PieceId) -> Option<Vec2> {
        self.body(id).map(|b| b.pos)
    }

    pub fn is_settled(&self, id: PieceId) -> bool {
        self.pieces
            .get(&id)
            .is_some_and(|p| self.world.is_settled(p.body))
    }

    /// Live pieces in id order
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.values()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Step the world and translate body contacts into piece contacts
    pub fn step(&mut self, dt: f32) -> Vec<PieceContact> {
        let contacts = self.world.step(dt);
        contacts
            .iter()
            .filter_map(|c| {
                let a = self.by_body.get(&c.a);
                let b = self.by_body.get(&c.b);
                debug_assert!(a.is_some() && b.is_some(), "contact on unregistered body");
                Some(PieceContact::new(*a?, *b?))
            })
            .collect()
    }
}
