//! Built-in concept kinds and their attribute schemas.

use crate::entity::EntityStore;
use crate::error::Result;
use crate::types::{AttrType, KindSchema};

/// Names of the built-in kinds, in registration order.
pub const BUILTIN_KINDS: [&str; 10] = [
    "existence",
    "nothingness",
    "time",
    "space",
    "consciousness",
    "substance",
    "universal",
    "divine",
    "good",
    "dao",
];

/// Schema of a built-in kind, or `None` for any other name.
pub fn builtin_schema(kind: &str) -> Option<KindSchema> {
    use AttrType::*;

    let schema = KindSchema::new();
    let schema = match kind {
        "existence" => schema
            .required("abstraction_level", Integer)
            .required("temporal_aspect", Boolean)
            .required("spatial_aspect", Boolean),
        "nothingness" => schema
            .required("type", Text)
            .required("relation_to_existence", Text)
            .required("paradox_level", Integer),
        "time" => schema
            .required("linearity", Boolean)
            .required("objectivity", Text)
            .required("measurement_unit", Text)
            .required("arrow_direction", Text),
        "space" => schema
            .required("dimensionality", Integer)
            .required("curvature", Text)
            .required("absoluteness", Text)
            .required("boundaries", Boolean),
        "consciousness" => schema
            .required("embodiment", Text)
            .required("unity", Boolean)
            .required("privacy_level", Integer)
            .required("computational", Boolean),
        "substance" => schema
            .required("independence_level", Integer)
            .required("materiality", Text)
            .required("divisibility", Boolean)
            .required("permanence_level", Integer),
        "universal" => schema
            .required("realism_level", Integer)
            .required("instantiation_type", Text)
            .required("scope", Text),
        "divine" => schema
            .required("transcendence_level", Integer)
            .required("immanence_level", Integer)
            .required("personality", Boolean)
            .required("causality_role", Text),
        "good" => schema
            .required("objectivity", Text)
            .required("relation_to_being", Text)
            .required("measurement_scale", Text)
            .required("source", Text),
        "dao" => schema
            .required("expressability", Boolean)
            .required("action_principle", Text)
            .required("universality_scope", Text)
            .required("knowability", Text),
        _ => return None,
    };
    Some(schema)
}

/// Register every built-in kind.
pub fn register_builtin_kinds(store: &mut EntityStore) -> Result<()> {
    for kind in BUILTIN_KINDS {
        if let Some(schema) = builtin_schema(kind) {
            store.register_kind(kind, schema)?;
        }
    }
    Ok(())
}
