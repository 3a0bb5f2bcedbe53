//! Fixed-step rigid-body world for circular bodies, backed by rapier2d
//!
//! Bodies are keyed by our own monotonically increasing `BodyHandle`, so
//! contact lists and settle bookkeeping always run in handle order no matter
//! how rapier's arenas recycle slots. `step` never calls back into game code:
//! rapier finishes the whole solve and only then are the body/body contacts
//! pulled from the narrow phase, leaving the caller free to add or remove
//! bodies afterwards.

use std::collections::{BTreeMap, HashMap};
use std::f32::consts::PI;
use std::fmt;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::tuning::PhysicsTuning;

/// Contact points farther apart than this are not reported as touching
pub const CONTACT_MARGIN: f32 = 0.5;
/// Pixels per rapier length unit; scales rapier's internal tolerances
const PIXELS_PER_UNIT: f32 = 100.0;
/// Spin decay so rolling pieces can come to rest
const ANGULAR_DAMPING: f32 = 1.5;

/// Opaque handle to a dynamic body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle(u32);

/// Read-only view of a dynamic body after the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Orientation (radians)
    pub angle: f32,
    pub radius: f32,
    pub mass: f32,
}

/// Two bodies touching after a step (a < b)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl Contact {
    fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }
}

/// Our side of a rapier body: its handles plus the settle counter
#[derive(Debug, Clone, Copy)]
struct Body {
    rigid: RigidBodyHandle,
    collider: ColliderHandle,
    radius: f32,
    /// Consecutive steps spent below the settle thresholds
    resting_steps: u32,
}

/// The physics world: gravity, static walls, and dynamic circles
pub struct PhysicsWorld {
    params: PhysicsTuning,
    gravity: Vector<Real>,
    integration: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    bodies: BTreeMap<BodyHandle, Body>,
    by_collider: HashMap<ColliderHandle, BodyHandle>,
    next_handle: u32,
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.params.gravity)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    pub fn new(params: &PhysicsTuning) -> Self {
        let mut integration = IntegrationParameters::default();
        integration.length_unit = PIXELS_PER_UNIT;
        Self {
            params: params.clone(),
            gravity: vector![0.0, params.gravity],
            integration,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            bodies: BTreeMap::new(),
            by_collider: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Register a dynamic circle at rest; mass is `radius²`
    pub fn add_body(&mut self, pos: Vec2, radius: f32) -> BodyHandle {
        debug_assert!(radius > 0.0, "body radius must be positive");
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        let rigid = self.rigid_bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(vector![pos.x, pos.y])
                .angular_damping(ANGULAR_DAMPING)
                .build(),
        );
        // Area is pi * r², so this density gives mass r²
        let collider = ColliderBuilder::ball(radius)
            .density(1.0 / PI)
            .restitution(self.params.restitution)
            .friction(self.params.friction)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, rigid, &mut self.rigid_bodies);

        self.by_collider.insert(collider, handle);
        self.bodies.insert(
            handle,
            Body {
                rigid,
                collider,
                radius,
                resting_steps: 0,
            },
        );
        handle
    }

    /// Remove a body and its collider. Returns false if it was not present.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(body) = self.bodies.remove(&handle) else {
            return false;
        };
        self.by_collider.remove(&body.collider);
        self.rigid_bodies.remove(
            body.rigid,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        true
    }

    /// Register an immovable wall
    pub fn add_static_segment(&mut self, a: Vec2, b: Vec2) {
        let wall = ColliderBuilder::segment(point![a.x, a.y], point![b.x, b.y])
            .restitution(self.params.restitution)
            .friction(self.params.friction)
            .build();
        self.colliders.insert(wall);
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        let body = self.bodies.get(&handle)?;
        let rb = self.rigid_bodies.get(body.rigid)?;
        let (pos, vel) = (rb.translation(), rb.linvel());
        Some(BodyState {
            pos: Vec2::new(pos.x, pos.y),
            vel: Vec2::new(vel.x, vel.y),
            angle: rb.rotation().angle(),
            radius: body.radius,
            mass: rb.mass(),
        })
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// A body is settled once it has stayed slow for `settle_steps` steps
    pub fn is_settled(&self, handle: BodyHandle) -> bool {
        self.bodies
            .get(&handle)
            .is_some_and(|b| b.resting_steps >= self.params.settle_steps)
    }

    /// Advance every dynamic body by exactly `dt` and return body/body contacts
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        self.integration.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        self.update_resting();
        self.contacts()
    }

    fn update_resting(&mut self) {
        let (settle_speed, settle_spin) = (self.params.settle_speed, self.params.settle_spin);
        for body in self.bodies.values_mut() {
            let Some(rb) = self.rigid_bodies.get(body.rigid) else {
                continue;
            };
            if rb.linvel().norm() < settle_speed && rb.angvel().abs() < settle_spin {
                body.resting_steps = body.resting_steps.saturating_add(1);
            } else {
                body.resting_steps = 0;
            }
        }
    }

    /// Body pairs with at least one contact point within the margin
    ///
    /// Wall colliders have no entry in `by_collider`, so wall contacts drop out.
    fn contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .narrow_phase
            .contact_pairs()
            .filter_map(|pair| {
                let a = *self.by_collider.get(&pair.collider1)?;
                let b = *self.by_collider.get(&pair.collider2)?;
                let touching = pair
                    .manifolds
                    .iter()
                    .flat_map(|m| m.points.iter())
                    .any(|p| p.dist <= CONTACT_MARGIN);
                touching.then(|| Contact::new(a, b))
            })
            .collect();
        contacts.sort_unstable();
        contacts.dedup();
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        world.add_static_segment(Vec2::new(0.0, 500.0), Vec2::new(400.0, 500.0));
        world
    }

    #[test]
    fn test_mass_is_radius_squared() {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        let h = world.add_body(Vec2::ZERO, 10.0);
        world.step(SIM_DT);
        let body = world.body(h).unwrap();
        assert!((body.mass - 100.0).abs() < 0.01, "mass = {}", body.mass);
        assert_eq!(body.radius, 10.0);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        let h = world.add_body(Vec2::new(100.0, 100.0), 10.0);
        world.step(SIM_DT);
        let body = world.body(h).unwrap();
        assert!(body.pos.y > 100.0);
        assert!((body.vel.y - 900.0 * SIM_DT).abs() < 0.01);
    }

    #[test]
    fn test_body_comes_to_rest_on_floor() {
        let mut world = world_with_floor();
        let h = world.add_body(Vec2::new(200.0, 300.0), 20.0);
        for _ in 0..600 {
            world.step(SIM_DT);
        }
        let body = world.body(h).unwrap();
        assert!((body.pos.y - 480.0).abs() < 2.0, "resting y = {}", body.pos.y);
        assert!(world.is_settled(h));
    }

    #[test]
    fn test_falling_body_is_not_settled() {
        let mut world = world_with_floor();
        let h = world.add_body(Vec2::new(200.0, 0.0), 20.0);
        for _ in 0..10 {
            world.step(SIM_DT);
        }
        assert!(!world.is_settled(h));
    }

    #[test]
    fn test_bounce_loses_energy() {
        let mut world = world_with_floor();
        let h = world.add_body(Vec2::new(200.0, 380.0), 20.0);
        let mut impact = 0.0f32;
        let mut rebound = None;
        for _ in 0..60 {
            world.step(SIM_DT);
            let vy = world.body(h).unwrap().vel.y;
            if vy < 0.0 {
                rebound = Some(-vy);
                break;
            }
            impact = impact.max(vy);
        }
        let rebound = rebound.expect("body should bounce off the floor");
        assert!(impact > 300.0, "impact speed = {impact}");
        assert!(rebound < impact * 0.6, "rebound {rebound} vs impact {impact}");
    }

    #[test]
    fn test_overlapping_bodies_report_one_sorted_contact() {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        let a = world.add_body(Vec2::new(100.0, 100.0), 20.0);
        let b = world.add_body(Vec2::new(130.0, 100.0), 20.0);
        let contacts = world.step(SIM_DT);
        assert_eq!(contacts, vec![Contact { a, b }]);
    }

    #[test]
    fn test_distant_bodies_report_nothing() {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        world.add_body(Vec2::new(0.0, 0.0), 10.0);
        world.add_body(Vec2::new(200.0, 0.0), 10.0);
        assert!(world.step(SIM_DT).is_empty());
    }

    #[test]
    fn test_wall_contacts_are_not_reported() {
        let mut world = world_with_floor();
        world.add_body(Vec2::new(200.0, 485.0), 20.0);
        assert!(world.step(SIM_DT).is_empty());
    }

    #[test]
    fn test_remove_body_is_idempotent() {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        let a = world.add_body(Vec2::ZERO, 10.0);
        let b = world.add_body(Vec2::new(50.0, 0.0), 10.0);
        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert!(world.body(a).is_none());
        assert!(world.body(b).is_some());
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_removed_body_drops_out_of_contacts() {
        let mut world = PhysicsWorld::new(&PhysicsTuning::default());
        let a = world.add_body(Vec2::new(100.0, 100.0), 20.0);
        world.add_body(Vec2::new(130.0, 100.0), 20.0);
        assert_eq!(world.step(SIM_DT).len(), 1);
        world.remove_body(a);
        assert!(world.step(SIM_DT).is_empty());
    }

    #[test]
    fn test_stacked_pair_settles_in_contact() {
        let mut world = world_with_floor();
        let low = world.add_body(Vec2::new(200.0, 470.0), 30.0);
        let high = world.add_body(Vec2::new(200.0, 400.0), 30.0);
        let mut last = Vec::new();
        for _ in 0..900 {
            last = world.step(SIM_DT);
        }
        assert!(last.contains(&Contact { a: low, b: high }));
        assert!(world.is_settled(low));
    }

    #[test]
    fn test_equal_masses_separate_symmetrically() {
        let mut world = PhysicsWorld::new(&PhysicsTuning {
            gravity: 0.0,
            ..PhysicsTuning::default()
        });
        let a = world.add_body(Vec2::new(100.0, 100.0), 20.0);
        let b = world.add_body(Vec2::new(120.0, 100.0), 20.0);
        world.step(SIM_DT);
        let (pa, pb) = (world.body(a).unwrap().pos, world.body(b).unwrap().pos);
        assert!(pb.x - pa.x > 20.0, "bodies should be pushed apart");
        assert!(((pa + pb) * 0.5 - Vec2::new(110.0, 100.0)).length() < 0.01);
    }
}
