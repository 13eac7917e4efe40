use std::cell::RefCell;
use std::rc::Rc;

use glam::{EulerRot, Quat, Vec3};

use crate::wrap_degrees;

/// Orientation is kept as euler angles in degrees, normalized into `[0, 360)`
/// the same way an engine reports euler angles read back from a rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform3D {
    euler: Vec3,
}

impl Transform3D {
    pub fn from_euler_degrees(euler: Vec3) -> Self {
        let mut transform = Self::default();
        transform.set_euler_degrees(euler);
        transform
    }

    pub fn euler_degrees(&self) -> Vec3 {
        self.euler
    }

    pub fn set_euler_degrees(&mut self, euler: Vec3) {
        self.euler = Vec3::new(wrap_degrees(euler.x), wrap_degrees(euler.y), wrap_degrees(euler.z));
    }

    /// Yaw, then pitch, then roll.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.euler.y.to_radians(),
            self.euler.x.to_radians(),
            self.euler.z.to_radians(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform3D,
}

pub type SharedObject = Rc<RefCell<SceneObject>>;

impl SceneObject {
    pub fn new(name: impl Into<String>, transform: Transform3D) -> Self {
        Self { name: name.into(), transform }
    }

    pub fn shared(name: impl Into<String>, transform: Transform3D) -> SharedObject {
        Rc::new(RefCell::new(Self::new(name, transform)))
    }
}
