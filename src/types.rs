//! Core data types for the concept graph.

use crate::error::{GraphError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind-specific attributes of an entity, keyed by attribute name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Address of an entity: its kind plus the id assigned within that kind.
///
/// Relations point at entities only through this pair. Resolving it to an
/// [`Entity`] is always an explicit lookup on the entity store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub id: u64,
}

impl EntityRef {
    pub fn new(kind: impl Into<String>, id: u64) -> Self {
        Self { kind: kind.into(), id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Value types an attribute may be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    Integer,
    Real,
    Text,
    Boolean,
}

impl AttrType {
    /// Check whether a value is acceptable for this type.
    ///
    /// Real attributes also take integers, matching SQLite's REAL affinity.
    pub fn accepts(&self, value: &AttrValue) -> bool {
        matches!(
            (self, value),
            (AttrType::Integer, AttrValue::Integer(_))
                | (AttrType::Real, AttrValue::Real(_))
                | (AttrType::Real, AttrValue::Integer(_))
                | (AttrType::Text, AttrValue::Text(_))
                | (AttrType::Boolean, AttrValue::Boolean(_))
        )
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::Integer => "integer",
            AttrType::Real => "real",
            AttrType::Text => "text",
            AttrType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl AttrValue {
    /// The integer payload, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert an untyped JSON value. Arrays, objects and null have no
    /// attribute representation.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(AttrValue::Boolean(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(AttrValue::Integer)
                .or_else(|| n.as_f64().map(AttrValue::Real)),
            serde_json::Value::String(s) => Some(AttrValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Boolean(b) => write!(f, "{}", b),
            AttrValue::Integer(n) => write!(f, "{}", n),
            AttrValue::Real(x) => write!(f, "{}", x),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Integer(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Integer(n as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Real(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Boolean(b)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

/// One declared attribute of a kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttrType,
    pub required: bool,
}

/// Attribute schema of a kind: the declared fields, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSchema {
    pub fields: Vec<FieldSpec>,
}

impl KindSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute that every entity must carry.
    pub fn required(mut self, name: impl Into<String>, ty: AttrType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: true,
        });
        self
    }

    /// Declare an attribute that may be omitted.
    pub fn optional(mut self, name: impl Into<String>, ty: AttrType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: false,
        });
        self
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate an attribute map against this schema.
    pub fn validate(&self, kind: &str, attributes: &Attributes) -> Result<()> {
        for field in &self.fields {
            match attributes.get(&field.name) {
                None if field.required => {
                    return Err(GraphError::attribute(
                        kind,
                        format!("missing required attribute '{}'", field.name),
                    ));
                }
                Some(value) if !field.ty.accepts(value) => {
                    return Err(GraphError::attribute(
                        kind,
                        format!("attribute '{}' must be {}, got '{}'", field.name, field.ty, value),
                    ));
                }
                _ => {}
            }
        }

        if let Some(unknown) = attributes.keys().find(|k| self.field(k).is_none()) {
            return Err(GraphError::attribute(
                kind,
                format!("undeclared attribute '{}'", unknown),
            ));
        }

        Ok(())
    }
}

/// A conceptual entity of some registered kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub id: u64,
    pub name: String,
    pub cultural_context: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl Entity {
    /// The reference addressing this entity.
    pub fn reference(&self) -> EntityRef {
        EntityRef::new(self.kind.clone(), self.id)
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }
}

/// Whether a relation holds by necessity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalNecessity {
    Necessary,
    Contingent,
    #[default]
    Unknown,
}

impl LogicalNecessity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalNecessity::Necessary => "necessary",
            LogicalNecessity::Contingent => "contingent",
            LogicalNecessity::Unknown => "unknown",
        }
    }
}

impl FromStr for LogicalNecessity {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "necessary" => Ok(LogicalNecessity::Necessary),
            "contingent" => Ok(LogicalNecessity::Contingent),
            "unknown" => Ok(LogicalNecessity::Unknown),
            other => Err(GraphError::InvalidEnum {
                field: "logical_necessity",
                value: other.to_string(),
                allowed: "necessary, contingent, unknown",
            }),
        }
    }
}

impl fmt::Display for LogicalNecessity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How stable a relation is over time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalStability {
    Eternal,
    Historical,
    #[default]
    Contextual,
    Unknown,
}

impl TemporalStability {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalStability::Eternal => "eternal",
            TemporalStability::Historical => "historical",
            TemporalStability::Contextual => "contextual",
            TemporalStability::Unknown => "unknown",
        }
    }
}

impl FromStr for TemporalStability {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eternal" => Ok(TemporalStability::Eternal),
            "historical" => Ok(TemporalStability::Historical),
            "contextual" => Ok(TemporalStability::Contextual),
            "unknown" => Ok(TemporalStability::Unknown),
            other => Err(GraphError::InvalidEnum {
                field: "temporal_stability",
                value: other.to_string(),
                allowed: "eternal, historical, contextual, unknown",
            }),
        }
    }
}

impl fmt::Display for TemporalStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed, weighted edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Assigned by the graph, 1-based, in insertion order
    pub id: u64,

    pub source: EntityRef,

    pub target: EntityRef,

    /// Free-form relation label, e.g. "generates"
    pub relation_type: String,

    /// Weight within [0.0, 1.0]
    pub strength: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cultural_specificity: Option<String>,

    pub logical_necessity: LogicalNecessity,

    pub temporal_stability: TemporalStability,

    pub created_at: DateTime<Utc>,
}

impl Relation {
    /// The endpoint opposite to `end`, if `end` is one of them.
    pub fn other_end(&self, end: &EntityRef) -> Option<&EntityRef> {
        if &self.source == end {
            Some(&self.target)
        } else if &self.target == end {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Default strength for relations that don't specify one.
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// A relation waiting to be added to the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelation {
    pub source: EntityRef,
    pub target: EntityRef,
    pub relation_type: String,
    pub strength: f64,
    pub cultural_specificity: Option<String>,
    pub logical_necessity: LogicalNecessity,
    pub temporal_stability: TemporalStability,
}

impl NewRelation {
    pub fn new(source: EntityRef, target: EntityRef, relation_type: impl Into<String>) -> Self {
        Self {
            source,
            target,
            relation_type: relation_type.into(),
            strength: DEFAULT_STRENGTH,
            cultural_specificity: None,
            logical_necessity: LogicalNecessity::default(),
            temporal_stability: TemporalStability::default(),
        }
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn cultural_specificity(mut self, culture: impl Into<String>) -> Self {
        self.cultural_specificity = Some(culture.into());
        self
    }

    pub fn necessity(mut self, necessity: LogicalNecessity) -> Self {
        self.logical_necessity = necessity;
        self
    }

    pub fn stability(mut self, stability: TemporalStability) -> Self {
        self.temporal_stability = stability;
        self
    }
}

/// Check that a weight lies within [0.0, 1.0]. NaN is rejected.
pub fn check_unit_range(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GraphError::ValueRange { field, value })
    }
}

/// Untyped relation record as it appears in seed files and on the CLI.
///
/// Enum fields stay textual until conversion, which is where bad values
/// surface as [`GraphError::InvalidEnum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub source_kind: String,
    pub source_id: u64,
    pub target_kind: String,
    pub target_id: u64,
    pub relation_type: String,
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default)]
    pub cultural_specificity: Option<String>,
    #[serde(default)]
    pub logical_necessity: Option<String>,
    #[serde(default)]
    pub temporal_stability: Option<String>,
}

fn default_strength() -> f64 {
    DEFAULT_STRENGTH
}

impl TryFrom<RelationRecord> for NewRelation {
    type Error = GraphError;

    fn try_from(record: RelationRecord) -> Result<Self> {
        let logical_necessity: LogicalNecessity = match record.logical_necessity.as_deref() {
            Some(s) => s.parse()?,
            None => LogicalNecessity::default(),
        };
        let temporal_stability: TemporalStability = match record.temporal_stability.as_deref() {
            Some(s) => s.parse()?,
            None => TemporalStability::default(),
        };

        Ok(NewRelation {
            source: EntityRef::new(record.source_kind, record.source_id),
            target: EntityRef::new(record.target_kind, record.target_id),
            relation_type: record.relation_type,
            strength: record.strength,
            cultural_specificity: record.cultural_specificity,
            logical_necessity,
            temporal_stability,
        })
    }
}
