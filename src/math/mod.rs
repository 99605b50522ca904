//! Math primitives shared by the simulation and render layers.

mod aabb;
mod frustum;

pub use aabb::{transform_aabb, Aabb};
pub use frustum::{Frustum, Intersection, Plane};
