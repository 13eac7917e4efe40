//! Native functions published into the script's global namespace.
//!
//! Every function works on the host's configured dynamic object. When that
//! object is missing (never configured, or dropped by its owner) the call
//! reports one diagnostic and degrades to a zero read or a no-op write.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;
use rhai::{Dynamic, Engine, EvalAltResult, FLOAT};

use crate::bridge::TypeBridge;
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::transform::{SceneObject, SharedObject};

pub const GET_ROTATION_X: &str = "GetRotationX";
pub const GET_ROTATION_Y: &str = "GetRotationY";
pub const GET_ROTATION_Z: &str = "GetRotationZ";
pub const SET_ROTATION: &str = "SetRotation";
pub const GET_ROTATION_UNITY: &str = "GetRotationUnity";
pub const SET_ROTATION_UNITY: &str = "SetRotationUnity";

pub const PUBLISHED_FUNCTIONS: [&str; 6] =
    [GET_ROTATION_X, GET_ROTATION_Y, GET_ROTATION_Z, SET_ROTATION, GET_ROTATION_UNITY, SET_ROTATION_UNITY];

/// Weak handle to the object the script drives.
#[derive(Debug, Clone, Default)]
pub struct TargetSlot {
    inner: Rc<RefCell<Option<Weak<RefCell<SceneObject>>>>>,
}

impl TargetSlot {
    pub fn set(&self, target: Option<&SharedObject>) {
        *self.inner.borrow_mut() = target.map(Rc::downgrade);
    }

    /// Returns the object only while its owner keeps it alive.
    pub fn get(&self) -> Option<SharedObject> {
        self.inner.borrow().as_ref().and_then(Weak::upgrade)
    }
}

#[derive(Clone)]
pub struct RotationApi {
    target: TargetSlot,
    diagnostics: DiagnosticLog,
    bridge: &'static TypeBridge,
}

impl RotationApi {
    pub fn new(target: TargetSlot, diagnostics: DiagnosticLog, bridge: &'static TypeBridge) -> Self {
        Self { target, diagnostics, bridge }
    }

    fn target_for(&self, function: &'static str) -> Option<SharedObject> {
        let target = self.target.get();
        if target.is_none() {
            self.diagnostics.report(Diagnostic::MissingTarget { function });
        }
        target
    }

    fn euler(&self, function: &'static str) -> Vec3 {
        self.target_for(function).map(|object| object.borrow().transform.euler_degrees()).unwrap_or(Vec3::ZERO)
    }

    fn set_euler(&self, function: &'static str, euler: Vec3) {
        if let Some(object) = self.target_for(function) {
            object.borrow_mut().transform.set_euler_degrees(euler);
        }
    }

    fn angle(&self, value: &Dynamic, name: &'static str) -> Result<f32, Box<EvalAltResult>> {
        Ok(self.bridge.number(value, name)? as f32)
    }

    pub fn register(self, engine: &mut Engine) {
        let api = self.clone();
        engine.register_fn(GET_ROTATION_X, move || -> FLOAT { api.euler(GET_ROTATION_X).x as FLOAT });
        let api = self.clone();
        engine.register_fn(GET_ROTATION_Y, move || -> FLOAT { api.euler(GET_ROTATION_Y).y as FLOAT });
        let api = self.clone();
        engine.register_fn(GET_ROTATION_Z, move || -> FLOAT { api.euler(GET_ROTATION_Z).z as FLOAT });

        let api = self.clone();
        engine.register_fn(
            SET_ROTATION,
            move |x: Dynamic, y: Dynamic, z: Dynamic| -> Result<(), Box<EvalAltResult>> {
                let euler = Vec3::new(api.angle(&x, "x")?, api.angle(&y, "y")?, api.angle(&z, "z")?);
                api.set_euler(SET_ROTATION, euler);
                Ok(())
            },
        );

        let api = self.clone();
        engine.register_fn(GET_ROTATION_UNITY, move || -> Dynamic {
            let euler = api.euler(GET_ROTATION_UNITY);
            api.bridge.to_script(euler)
        });

        let api = self;
        engine.register_fn(SET_ROTATION_UNITY, move |value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let euler: Vec3 = api.bridge.from_script(value)?;
            api.set_euler(SET_ROTATION_UNITY, euler);
            Ok(())
        });
    }
}
