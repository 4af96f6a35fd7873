/// References between records
///
/// A reference to another record reaches callers in one of two shapes: a bare
/// identifier (what the stores return) or a resolved summary (what the board
/// and project views return). Identity comparisons must never depend on which
/// shape arrived, so every consumer goes through [`Ref::id`].
///
/// # Example
///
/// ```
/// use taskboard_shared::models::reference::Ref;
/// use taskboard_shared::models::user::UserSummary;
/// use uuid::Uuid;
///
/// let id = Uuid::new_v4();
/// let bare: Ref<UserSummary> = Ref::Id(id);
/// let resolved = Ref::Resolved(UserSummary {
///     id,
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
/// });
///
/// assert_eq!(bare.id(), resolved.id());
/// assert!(bare.refers_to(id));
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Records that carry a stable identifier
pub trait Identified {
    /// Stable identifier of the record
    fn id(&self) -> Uuid;
}

/// A reference that is either a bare identifier or the resolved record
///
/// Serialized untagged: a bare reference is a UUID string, a resolved one is
/// the record's object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    /// Bare identifier
    Id(Uuid),

    /// Fully resolved record
    Resolved(T),
}

impl<T: Identified> Ref<T> {
    /// Normalizes either shape to the referenced identifier
    pub fn id(&self) -> Uuid {
        match self {
            Ref::Id(id) => *id,
            Ref::Resolved(record) => record.id(),
        }
    }

    /// Checks whether this reference points at `id`
    pub fn refers_to(&self, id: Uuid) -> bool {
        self.id() == id
    }

    /// Returns the resolved record, if any
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Ref::Id(_) => None,
            Ref::Resolved(record) => Some(record),
        }
    }

    /// Drops any resolved data, keeping only the identifier
    pub fn to_bare(&self) -> Ref<T> {
        Ref::Id(self.id())
    }
}

impl<T: Identified + Clone> Ref<T> {
    /// Resolves a bare reference from a lookup table
    ///
    /// References whose target is missing from `lookup` (for instance a user
    /// that has since been deleted) stay bare.
    pub fn resolve(self, lookup: &HashMap<Uuid, T>) -> Ref<T> {
        match self {
            Ref::Id(id) => match lookup.get(&id) {
                Some(record) => Ref::Resolved(record.clone()),
                None => Ref::Id(id),
            },
            resolved => resolved,
        }
    }
}

impl<T> From<Uuid> for Ref<T> {
    fn from(id: Uuid) -> Self {
        Ref::Id(id)
    }
}
