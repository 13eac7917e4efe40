//! Marshalling between native vectors and Rhai maps.
//!
//! Rhai has no fixed-layout vector type, so vectors cross the boundary as maps
//! keyed by `"x"`, `"y"` and `"z"`. Components are widened from `f32` to
//! [`rhai::FLOAT`] on the way out and narrowed back on the way in. Nothing is
//! validated beyond the map shape: NaN and out-of-range values pass through.

use std::sync::OnceLock;

use glam::{Vec2, Vec3};
use rhai::{Dynamic, Engine, EvalAltResult, Map, Position, FLOAT};
use thiserror::Error;

static BRIDGE: OnceLock<TypeBridge> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("expected a {expected} table, found {found}")]
    NotATable { expected: &'static str, found: String },
    #[error("{expected} table is missing field '{field}'")]
    MissingField { expected: &'static str, field: &'static str },
    #[error("field '{field}' must be a number, found {found}")]
    NotNumeric { field: &'static str, found: String },
}

impl From<ConversionError> for Box<EvalAltResult> {
    fn from(err: ConversionError) -> Self {
        Box::new(EvalAltResult::ErrorRuntime(err.to_string().into(), Position::NONE))
    }
}

/// A native vector that travels through scripts as a field-named table.
pub trait ScriptVector: Sized + Copy {
    const TYPE_NAME: &'static str;
    const FIELDS: &'static [&'static str];

    fn components(self) -> Vec<f32>;
    fn from_components(components: &[f32]) -> Self;
}

impl ScriptVector for Vec2 {
    const TYPE_NAME: &'static str = "Vector2";
    const FIELDS: &'static [&'static str] = &["x", "y"];

    fn components(self) -> Vec<f32> {
        self.to_array().to_vec()
    }

    fn from_components(components: &[f32]) -> Self {
        Vec2::new(components[0], components[1])
    }
}

impl ScriptVector for Vec3 {
    const TYPE_NAME: &'static str = "Vector3";
    const FIELDS: &'static [&'static str] = &["x", "y", "z"];

    fn components(self) -> Vec<f32> {
        self.to_array().to_vec()
    }

    fn from_components(components: &[f32]) -> Self {
        Vec3::new(components[0], components[1], components[2])
    }
}

/// Process-wide converter set. Obtain it through [`register`].
#[derive(Debug)]
pub struct TypeBridge {
    _private: (),
}

/// Registers the vector converters for the whole process and returns them.
/// Repeated calls hand back the same instance.
pub fn register() -> &'static TypeBridge {
    BRIDGE.get_or_init(|| {
        tracing::debug!("registering vector converters");
        TypeBridge { _private: () }
    })
}

pub fn is_registered() -> bool {
    BRIDGE.get().is_some()
}

impl TypeBridge {
    pub fn to_script<V: ScriptVector>(&self, value: V) -> Dynamic {
        let mut map = Map::new();
        for (field, component) in V::FIELDS.iter().zip(value.components()) {
            map.insert((*field).into(), Dynamic::from_float(component as FLOAT));
        }
        Dynamic::from_map(map)
    }

    pub fn from_script<V: ScriptVector>(&self, value: Dynamic) -> Result<V, ConversionError> {
        let type_name = value.type_name();
        let map = value
            .try_cast::<Map>()
            .ok_or_else(|| ConversionError::NotATable { expected: V::TYPE_NAME, found: type_name.to_string() })?;
        let mut components = Vec::with_capacity(V::FIELDS.len());
        for &field in V::FIELDS {
            let raw = map
                .get(field)
                .ok_or(ConversionError::MissingField { expected: V::TYPE_NAME, field })?;
            components.push(numeric_field(raw, field)? as f32);
        }
        Ok(V::from_components(&components))
    }

    /// Coerces a numeric script argument to `f64`, accepting both integers and floats.
    pub fn number(&self, value: &Dynamic, name: &'static str) -> Result<f64, ConversionError> {
        numeric_field(value, name)
    }

    /// Adds the `vec2` and `vec3` table constructors to an engine.
    pub fn install(&'static self, engine: &mut Engine) {
        engine.register_fn("vec2", move |x: Dynamic, y: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
            let v = Vec2::new(self.number(&x, "x")? as f32, self.number(&y, "y")? as f32);
            Ok(self.to_script(v))
        });
        engine.register_fn(
            "vec3",
            move |x: Dynamic, y: Dynamic, z: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
                let v = Vec3::new(
                    self.number(&x, "x")? as f32,
                    self.number(&y, "y")? as f32,
                    self.number(&z, "z")? as f32,
                );
                Ok(self.to_script(v))
            },
        );
    }
}

fn numeric_field(value: &Dynamic, field: &'static str) -> Result<f64, ConversionError> {
    if let Ok(float) = value.as_float() {
        return Ok(float);
    }
    if let Ok(int) = value.as_int() {
        return Ok(int as f64);
    }
    Err(ConversionError::NotNumeric { field, found: value.type_name().to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::INT;

    fn table(fields: &[(&str, Dynamic)]) -> Dynamic {
        let mut map = Map::new();
        for (key, value) in fields {
            map.insert((*key).into(), value.clone());
        }
        Dynamic::from_map(map)
    }

    #[test]
    fn register_is_idempotent() {
        let first = register();
        let second = register();
        assert!(std::ptr::eq(first, second));
        assert!(is_registered());
    }

    #[test]
    fn vec2_table_roundtrips_through_native() {
        let bridge = register();
        let original = table(&[("x", Dynamic::from_float(1.25)), ("y", Dynamic::from_float(-7.5))]);
        let native: Vec2 = bridge.from_script(original).expect("vec2 conversion");
        assert_eq!(native, Vec2::new(1.25, -7.5));

        let back = bridge.to_script(native).cast::<Map>();
        assert_eq!(back.len(), 2);
        assert_eq!(back["x"].as_float().unwrap(), 1.25);
        assert_eq!(back["y"].as_float().unwrap(), -7.5);
    }

    #[test]
    fn vec3_roundtrip_is_exact_up_to_float_precision() {
        let bridge = register();
        let original = table(&[
            ("x", Dynamic::from_float(0.1)),
            ("y", Dynamic::from_float(123.456)),
            ("z", Dynamic::from_float(-9999.125)),
        ]);
        let native: Vec3 = bridge.from_script(original).expect("vec3 conversion");
        let back = bridge.to_script(native).cast::<Map>();
        for (field, expected) in [("x", 0.1), ("y", 123.456), ("z", -9999.125)] {
            let got = back[field].as_float().unwrap();
            assert!((got - expected).abs() <= (expected as f32 as f64 - expected).abs() + f64::EPSILON);
        }
    }

    #[test]
    fn integers_count_as_numbers() {
        let bridge = register();
        let value = table(&[("x", Dynamic::from_int(3 as INT)), ("y", Dynamic::from_int(-4 as INT))]);
        let native: Vec2 = bridge.from_script(value).expect("ints should convert");
        assert_eq!(native, Vec2::new(3.0, -4.0));
    }

    #[test]
    fn missing_field_is_rejected() {
        let bridge = register();
        let value = table(&[("x", Dynamic::from_float(1.0)), ("y", Dynamic::from_float(2.0))]);
        let err = bridge.from_script::<Vec3>(value).unwrap_err();
        assert_eq!(err, ConversionError::MissingField { expected: "Vector3", field: "z" });

        let value = table(&[("y", Dynamic::from_float(2.0))]);
        let err = bridge.from_script::<Vec2>(value).unwrap_err();
        assert_eq!(err, ConversionError::MissingField { expected: "Vector2", field: "x" });
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let bridge = register();
        let value = table(&[("x", Dynamic::from("left")), ("y", Dynamic::from_float(2.0))]);
        let err = bridge.from_script::<Vec2>(value).unwrap_err();
        assert!(matches!(err, ConversionError::NotNumeric { field: "x", .. }));
    }

    #[test]
    fn non_table_is_rejected() {
        let bridge = register();
        let err = bridge.from_script::<Vec3>(Dynamic::from_float(4.0)).unwrap_err();
        assert!(matches!(err, ConversionError::NotATable { expected: "Vector3", .. }));
        let err = bridge.from_script::<Vec2>(Dynamic::UNIT).unwrap_err();
        assert!(matches!(err, ConversionError::NotATable { .. }));
    }

    #[test]
    fn nan_passes_through_unchanged() {
        let bridge = register();
        let value = table(&[("x", Dynamic::from_float(f64::NAN)), ("y", Dynamic::from_float(1e300))]);
        let native: Vec2 = bridge.from_script(value).expect("no range validation");
        assert!(native.x.is_nan());
        assert!(native.y.is_infinite());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let bridge = register();
        let value = table(&[
            ("x", Dynamic::from_float(1.0)),
            ("y", Dynamic::from_float(2.0)),
            ("w", Dynamic::from("ignored")),
        ]);
        let native: Vec2 = bridge.from_script(value).expect("extra keys are fine");
        assert_eq!(native, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn conversion_error_becomes_runtime_error() {
        let err: Box<EvalAltResult> = ConversionError::MissingField { expected: "Vector2", field: "y" }.into();
        assert!(matches!(*err, EvalAltResult::ErrorRuntime(..)));
        assert!(err.to_string().contains("missing field 'y'"));
    }

    #[test]
    fn installed_constructors_build_tables() {
        let bridge = register();
        let mut engine = Engine::new();
        bridge.install(&mut engine);
        let map = engine.eval::<Map>("vec3(1, 2.5, -3)").expect("vec3 constructor");
        let v: Vec3 = bridge.from_script(Dynamic::from_map(map)).unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.5, -3.0));

        let sum = engine.eval::<rhai::FLOAT>("let v = vec2(4.0, 6.0); v.x + v.y").expect("field access");
        assert_eq!(sum, 10.0);
        assert!(engine.eval::<Map>(r#"vec2("a", 1)"#).is_err());
    }
}
