//! Planar Dynamics – a 2D rigid-body physics world core for Rust.
//!
//! This crate centers on the world stepping loop: broad- and narrow-phase
//! collision, island construction over the body/contact/joint graph,
//! sequential-impulse constraint solving, and a continuous-collision pass
//! that keeps fast bodies from tunneling through thin geometry.

pub mod callbacks;
pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use callbacks::{ContactFilter, ContactListener, DefaultContactFilter, DestructionListener};
pub use collision::{
    broadphase::BroadPhase,
    narrowphase::{Manifold, ManifoldPoint, WorldManifold},
    shapes::{Aabb, CircleShape, MassData, PolygonShape, RayCastInput, RayHit, Shape},
    toi::{calculate_time_of_impact, ToiInput, ToiOutput},
};
pub use crate::core::{
    body::{Body, BodyDef, BodyKind},
    fixture::{Filter, Fixture, FixtureDef},
    joint::{Joint, JointDef, JointKind},
    math::{Rot, Sweep, Transform},
};
pub use dynamics::contact::Contact;
pub use utils::handles::{Arena, EntityId};
pub use utils::logging::StepProfiler;
pub use world::World;
