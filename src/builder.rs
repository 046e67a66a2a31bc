//! Builder pattern API for creating concepts.

use crate::store::KnowledgeBase;
use crate::types::{AttrValue, Attributes, EntityRef};
use eyre::{Context, Result};

/// Builder for creating entities with a fluent API.
///
/// # Example
///
/// ```ignore
/// let wu = kb.build("nothingness", "無")
///     .culture("daoist")
///     .definition("the source from which being arises")
///     .attr("type", "daoist_wu")
///     .attr("relation_to_existence", "generates being")
///     .attr("paradox_level", 8)
///     .create()?;
/// ```
pub struct ConceptBuilder<'a> {
    kb: &'a mut KnowledgeBase,
    kind: String,
    name: String,
    cultural_context: String,
    definition: String,
    attributes: Attributes,
}

impl<'a> ConceptBuilder<'a> {
    pub fn new(kb: &'a mut KnowledgeBase, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kb,
            kind: kind.into(),
            name: name.into(),
            cultural_context: String::new(),
            definition: String::new(),
            attributes: Attributes::new(),
        }
    }

    /// Set the cultural tradition the concept comes from.
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.cultural_context = culture.into();
        self
    }

    pub fn definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    /// Set a kind-specific attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Create the entity.
    pub fn create(self) -> Result<EntityRef> {
        let kind = self.kind;
        self.kb
            .create(&kind, &self.name, &self.cultural_context, &self.definition, self.attributes)
            .with_context(|| format!("Failed to create {} concept", kind))
    }
}

/// Extension trait to add builder method to KnowledgeBase.
pub trait StoreBuilderExt {
    /// Start building a new concept of `kind`.
    fn build(&mut self, kind: impl Into<String>, name: impl Into<String>) -> ConceptBuilder<'_>;
}

impl StoreBuilderExt for KnowledgeBase {
    fn build(&mut self, kind: impl Into<String>, name: impl Into<String>) -> ConceptBuilder<'_> {
        ConceptBuilder::new(self, kind, name)
    }
}
