//! Entity types.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Discriminant for the two entity shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Business,
}

impl EntityKind {
    /// Database column representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Business => "business",
        }
    }

    /// Parse the database column representation.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "person" => Ok(EntityKind::Person),
            "business" => Ok(EntityKind::Business),
            other => Err(StoreError::InvalidKind(other.to_string())),
        }
    }
}

/// Map position for UI rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

/// A person or business record in the entity store.
///
/// Person records carry `role`/`company`; business records carry
/// `industry`/`location`. The orchestrator only reads entities, never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub kind: EntityKind,
    pub name: String,
    pub role: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub status: Option<String>,
    pub group: Option<String>,
    pub source: Option<String>,
    pub coords: Option<Coords>,
}

impl Entity {
    /// Create a person record.
    pub fn person(
        id: i64,
        name: impl Into<String>,
        role: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: EntityKind::Person,
            name: name.into(),
            role: Some(role.into()),
            company: Some(company.into()),
            industry: None,
            location: None,
            avatar: None,
            status: None,
            group: None,
            source: None,
            coords: None,
        }
    }

    /// Create a business record.
    pub fn business(
        id: i64,
        name: impl Into<String>,
        industry: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: EntityKind::Business,
            name: name.into(),
            role: None,
            company: None,
            industry: Some(industry.into()),
            location: Some(location.into()),
            avatar: None,
            status: None,
            group: None,
            source: None,
            coords: None,
        }
    }

    /// Set the avatar URL.
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Set the pipeline status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set the grouping label.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the provenance source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the map coordinates.
    pub fn with_coords(mut self, x: f64, y: f64) -> Self {
        self.coords = Some(Coords { x, y });
        self
    }
}

/// Reduced entity projection returned by the lookup tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl From<&Entity> for EntitySummary {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            role: entity.role.clone(),
            company: entity.company.clone(),
            location: entity.location.clone(),
        }
    }
}
