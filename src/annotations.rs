//! Contradictions and cultural interpretations attached to entities.

use crate::entity::EntityStore;
use crate::error::{GraphError, Result};
use crate::types::EntityRef;
use serde::{Deserialize, Serialize};

/// A recorded tension between two concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub id: u64,
    pub first: EntityRef,
    pub second: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contradiction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_attempts: Option<String>,
    pub unresolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub philosopher_comments: Option<String>,
}

/// Input for a new contradiction. Unresolved unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewContradiction {
    pub first: EntityRef,
    pub second: EntityRef,
    #[serde(default)]
    pub contradiction_type: Option<String>,
    #[serde(default)]
    pub resolution_attempts: Option<String>,
    #[serde(default = "default_unresolved")]
    pub unresolved: bool,
    #[serde(default)]
    pub philosopher_comments: Option<String>,
}

fn default_unresolved() -> bool {
    true
}

impl NewContradiction {
    pub fn new(first: EntityRef, second: EntityRef) -> Self {
        Self {
            first,
            second,
            contradiction_type: None,
            resolution_attempts: None,
            unresolved: true,
            philosopher_comments: None,
        }
    }

    pub fn contradiction_type(mut self, ty: impl Into<String>) -> Self {
        self.contradiction_type = Some(ty.into());
        self
    }

    pub fn comments(mut self, comments: impl Into<String>) -> Self {
        self.philosopher_comments = Some(comments.into());
        self
    }

    pub fn resolved(mut self, attempts: impl Into<String>) -> Self {
        self.resolution_attempts = Some(attempts.into());
        self.unresolved = false;
        self
    }
}

/// How one culture reads a base concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalInterpretation {
    pub id: u64,
    pub base: EntityRef,
    pub culture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis_points: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_aspects: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_evolution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewInterpretation {
    pub base: EntityRef,
    pub culture: String,
    #[serde(default)]
    pub interpretation: Option<String>,
    #[serde(default)]
    pub emphasis_points: Option<String>,
    #[serde(default)]
    pub unique_aspects: Option<String>,
    #[serde(default)]
    pub historical_evolution: Option<String>,
}

impl NewInterpretation {
    pub fn new(base: EntityRef, culture: impl Into<String>) -> Self {
        Self {
            base,
            culture: culture.into(),
            interpretation: None,
            emphasis_points: None,
            unique_aspects: None,
            historical_evolution: None,
        }
    }

    pub fn interpretation(mut self, text: impl Into<String>) -> Self {
        self.interpretation = Some(text.into());
        self
    }

    pub fn emphasis(mut self, text: impl Into<String>) -> Self {
        self.emphasis_points = Some(text.into());
        self
    }
}

/// All annotations, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    contradictions: Vec<Contradiction>,
    interpretations: Vec<CulturalInterpretation>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stage_contradiction(&self, store: &EntityStore, new: NewContradiction) -> Result<Contradiction> {
        check_exists(store, &new.first)?;
        check_exists(store, &new.second)?;

        Ok(Contradiction {
            id: next_id(self.contradictions.last().map(|c| c.id)),
            first: new.first,
            second: new.second,
            contradiction_type: new.contradiction_type,
            resolution_attempts: new.resolution_attempts,
            unresolved: new.unresolved,
            philosopher_comments: new.philosopher_comments,
        })
    }

    pub(crate) fn commit_contradiction(&mut self, contradiction: Contradiction) {
        self.contradictions.push(contradiction);
    }

    pub(crate) fn stage_interpretation(
        &self,
        store: &EntityStore,
        new: NewInterpretation,
    ) -> Result<CulturalInterpretation> {
        check_exists(store, &new.base)?;

        Ok(CulturalInterpretation {
            id: next_id(self.interpretations.last().map(|i| i.id)),
            base: new.base,
            culture: new.culture,
            interpretation: new.interpretation,
            emphasis_points: new.emphasis_points,
            unique_aspects: new.unique_aspects,
            historical_evolution: new.historical_evolution,
        })
    }

    pub(crate) fn commit_interpretation(&mut self, interpretation: CulturalInterpretation) {
        self.interpretations.push(interpretation);
    }

    pub fn contradictions(&self) -> &[Contradiction] {
        &self.contradictions
    }

    /// Contradictions that still await a resolution.
    pub fn unresolved(&self) -> impl Iterator<Item = &Contradiction> {
        self.contradictions.iter().filter(|c| c.unresolved)
    }

    /// Contradictions in which `reference` takes part.
    pub fn contradictions_involving<'a>(&'a self, reference: &'a EntityRef) -> impl Iterator<Item = &'a Contradiction> {
        self.contradictions
            .iter()
            .filter(move |c| &c.first == reference || &c.second == reference)
    }

    pub fn interpretations(&self) -> &[CulturalInterpretation] {
        &self.interpretations
    }

    pub fn interpretations_of<'a>(
        &'a self,
        reference: &'a EntityRef,
    ) -> impl Iterator<Item = &'a CulturalInterpretation> {
        self.interpretations.iter().filter(move |i| &i.base == reference)
    }
}

fn next_id(last: Option<u64>) -> u64 {
    last.map_or(1, |id| id + 1)
}

fn check_exists(store: &EntityStore, reference: &EntityRef) -> Result<()> {
    if store.exists(reference) {
        Ok(())
    } else {
        Err(GraphError::ReferentialIntegrity(reference.to_string()))
    }
}
