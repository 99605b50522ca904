//! First-person camera navigation
//!
//! WASD movement with pointer look, driving the active camera's transform.

use glam::{EulerRot, Quat, Vec3};
use hecs::Entity;
use tracing::trace;

use crate::ecs::component::ComponentTag;
use crate::ecs::components::{CameraComponent, TransformComponent};
use crate::ecs::system::{priority, FrameContext, System};
use crate::ecs::World;
use crate::input::{InputEvent, Key};

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Moves the first active camera from keyboard and pointer events.
///
/// Pointer look only applies while the pointer is locked. Yaw and pitch are
/// recovered from the camera rotation each frame, so rotations set from
/// elsewhere are respected.
#[derive(Debug, Clone)]
pub struct FirstPersonNavigationSystem {
    /// Movement speed (units per second).
    pub move_speed: f32,
    /// Radians per pixel of pointer motion.
    pub pointer_sensitivity: f32,
    /// Speed multiplier while Shift is held.
    pub sprint_multiplier: f32,

    move_forward: bool,
    move_backward: bool,
    move_left: bool,
    move_right: bool,
    move_up: bool,
    move_down: bool,
    sprint: bool,
    pointer_locked: bool,
}

impl FirstPersonNavigationSystem {
    pub fn new(move_speed: f32, pointer_sensitivity: f32) -> Self {
        Self {
            move_speed,
            pointer_sensitivity,
            sprint_multiplier: 2.0,
            move_forward: false,
            move_backward: false,
            move_left: false,
            move_right: false,
            move_up: false,
            move_down: false,
            sprint: false,
            pointer_locked: false,
        }
    }

    pub fn is_pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    fn set_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::W | Key::Up => self.move_forward = pressed,
            Key::S | Key::Down => self.move_backward = pressed,
            Key::A | Key::Left => self.move_left = pressed,
            Key::D | Key::Right => self.move_right = pressed,
            Key::Space => self.move_up = pressed,
            Key::Control => self.move_down = pressed,
            Key::Shift => self.sprint = pressed,
            _ => {}
        }
    }

    /// Apply the frame's events and return the accumulated look delta.
    fn handle_input(&mut self, events: &[InputEvent]) -> (f32, f32) {
        let (mut yaw, mut pitch) = (0.0, 0.0);
        for event in events {
            match *event {
                InputEvent::KeyDown(key) => self.set_key(key, true),
                InputEvent::KeyUp(key) => self.set_key(key, false),
                InputEvent::PointerLockChange { locked } => {
                    self.pointer_locked = locked;
                    if !locked {
                        // Keys released while unlocked never arrive.
                        self.release_all();
                    }
                }
                InputEvent::PointerMove { dx, dy } if self.pointer_locked => {
                    yaw -= dx * self.pointer_sensitivity;
                    pitch -= dy * self.pointer_sensitivity;
                }
                InputEvent::PointerMove { .. } => {}
            }
        }
        (yaw, pitch)
    }

    fn release_all(&mut self) {
        self.move_forward = false;
        self.move_backward = false;
        self.move_left = false;
        self.move_right = false;
        self.move_up = false;
        self.move_down = false;
        self.sprint = false;
    }

    fn velocity(&self, forward: Vec3) -> Vec3 {
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let mut velocity = Vec3::ZERO;
        if self.move_forward {
            velocity += forward;
        }
        if self.move_backward {
            velocity -= forward;
        }
        if self.move_right {
            velocity += right;
        }
        if self.move_left {
            velocity -= right;
        }
        if self.move_up {
            velocity += Vec3::Y;
        }
        if self.move_down {
            velocity -= Vec3::Y;
        }

        let speed = if self.sprint {
            self.move_speed * self.sprint_multiplier
        } else {
            self.move_speed
        };
        velocity.normalize_or_zero() * speed
    }
}

impl Default for FirstPersonNavigationSystem {
    fn default() -> Self {
        Self::new(5.0, 0.002)
    }
}

/// Yaw and pitch of a camera rotation looking down -Z.
pub fn yaw_pitch(rotation: Quat) -> (f32, f32) {
    let forward = rotation * Vec3::NEG_Z;
    let pitch = forward.y.clamp(-1.0, 1.0).asin();
    let yaw = (-forward.x).atan2(-forward.z);
    (yaw, pitch)
}

/// Camera rotation for a yaw (about +Y) and pitch (about local +X).
pub fn look_rotation(yaw: f32, pitch: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0)
}

impl System for FirstPersonNavigationSystem {
    fn name(&self) -> &'static str {
        "first-person-navigation"
    }

    fn priority(&self) -> i32 {
        priority::NAVIGATION
    }

    fn required_components(&self) -> &'static [ComponentTag] {
        &[ComponentTag::Camera, ComponentTag::Transform]
    }

    fn update(&mut self, world: &mut World, entities: &[Entity], dt: f32, ctx: &mut FrameContext<'_>) {
        let (yaw_delta, pitch_delta) = self.handle_input(ctx.input);

        let Some(camera_entity) = entities
            .iter()
            .copied()
            .find(|e| world.get::<CameraComponent>(*e).is_some_and(|c| c.active))
        else {
            return;
        };
        let Some((position, rotation)) = world
            .get::<TransformComponent>(camera_entity)
            .map(|t| (t.position(), t.rotation()))
        else {
            return;
        };

        let (yaw, pitch) = yaw_pitch(rotation);
        let rotation = look_rotation(
            yaw + yaw_delta,
            (pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT),
        );
        let position = position + self.velocity(rotation * Vec3::NEG_Z) * dt;

        let moved = yaw_delta != 0.0 || pitch_delta != 0.0 || self.velocity(Vec3::NEG_Z) != Vec3::ZERO;
        if moved {
            trace!("camera {camera_entity:?} at {position}");
            let _ = world.update_transform(camera_entity, |t| {
                t.set_position(position);
                t.set_rotation(rotation);
            });
        }

        if let Some(camera) = world.get::<CameraComponent>(camera_entity) {
            ctx.camera_position = Some(position);
            ctx.view_projection = Some(camera.view_projection(position, rotation));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderSettings;
    use crate::ecs::components::Projection;

    fn camera_world() -> (World, Entity) {
        let mut world = World::default();
        let camera = world.spawn("camera");
        world
            .add_component(camera, TransformComponent::from_position(Vec3::new(0.0, 1.0, 5.0)))
            .unwrap();
        world
            .add_component(
                camera,
                CameraComponent::new(Projection::perspective(60.0, 1.0, 0.1, 100.0)),
            )
            .unwrap();
        (world, camera)
    }

    fn run(
        system: &mut FirstPersonNavigationSystem,
        world: &mut World,
        input: &[InputEvent],
        dt: f32,
    ) -> Option<Vec3> {
        let settings = RenderSettings::default();
        let mut ctx = FrameContext::new(&settings).input(input);
        let entities = world.query(system.required_components());
        system.update(world, &entities, dt, &mut ctx);
        ctx.camera_position
    }

    #[test]
    fn test_yaw_pitch_roundtrip() {
        let (yaw, pitch) = yaw_pitch(look_rotation(0.7, -0.3));
        assert!((yaw - 0.7).abs() < 1e-4);
        assert!((pitch + 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_forward_movement() {
        let (mut world, camera) = camera_world();
        let mut system = FirstPersonNavigationSystem::new(2.0, 0.01);

        let position = run(&mut system, &mut world, &[InputEvent::KeyDown(Key::W)], 0.5).unwrap();
        assert!((position - Vec3::new(0.0, 1.0, 4.0)).length() < 1e-4);

        let transform = world.get::<TransformComponent>(camera).unwrap();
        assert!((transform.position() - position).length() < 1e-6);
        assert!(transform.is_dirty());
    }

    #[test]
    fn test_look_requires_pointer_lock() {
        let (mut world, camera) = camera_world();
        let mut system = FirstPersonNavigationSystem::default();

        run(&mut system, &mut world, &[InputEvent::PointerMove { dx: 100.0, dy: 0.0 }], 0.016);
        let rotation = world.get::<TransformComponent>(camera).unwrap().rotation();
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));

        run(
            &mut system,
            &mut world,
            &[
                InputEvent::PointerLockChange { locked: true },
                InputEvent::PointerMove { dx: 100.0, dy: 0.0 },
            ],
            0.016,
        );
        let (yaw, _) = yaw_pitch(world.get::<TransformComponent>(camera).unwrap().rotation());
        assert!((yaw + 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_clamped() {
        let (mut world, camera) = camera_world();
        let mut system = FirstPersonNavigationSystem::new(1.0, 1.0);
        run(
            &mut system,
            &mut world,
            &[
                InputEvent::PointerLockChange { locked: true },
                InputEvent::PointerMove { dx: 0.0, dy: -10.0 },
            ],
            0.016,
        );
        let (_, pitch) = yaw_pitch(world.get::<TransformComponent>(camera).unwrap().rotation());
        assert!(pitch <= PITCH_LIMIT + 1e-4);
        assert!(pitch > 1.5);
    }

    #[test]
    fn test_unlock_releases_keys() {
        let (mut world, _) = camera_world();
        let mut system = FirstPersonNavigationSystem::default();
        run(&mut system, &mut world, &[InputEvent::KeyDown(Key::W)], 0.0);
        run(&mut system, &mut world, &[InputEvent::PointerLockChange { locked: false }], 0.0);
        assert_eq!(system.velocity(Vec3::NEG_Z), Vec3::ZERO);
    }
}
