//! Projection address to fragment mapping.

use indexmap::IndexMap;

use crate::shaping::ProjectionMember;
use crate::sql::SqlExpression;

/// Maps projection addresses to store fragments.
///
/// Entries keep insertion order so that flattening the mapping into a
/// projection list is deterministic. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionMapping {
    entries: IndexMap<ProjectionMember, SqlExpression>,
}

impl ProjectionMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        ProjectionMapping {
            entries: IndexMap::new(),
        }
    }

    /// Records `fragment` at `member`, returning the fragment it replaced.
    pub fn insert(&mut self, member: ProjectionMember, fragment: SqlExpression) -> Option<SqlExpression> {
        self.entries.insert(member, fragment)
    }

    /// Looks up the fragment at `member`.
    #[must_use]
    pub fn get(&self, member: &ProjectionMember) -> Option<&SqlExpression> {
        self.entries.get(member)
    }

    /// Returns true if `member` has a fragment.
    #[must_use]
    pub fn contains(&self, member: &ProjectionMember) -> bool {
        self.entries.contains_key(member)
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no address is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectionMember, &SqlExpression)> {
        self.entries.iter()
    }

    /// Addresses in insertion order.
    pub fn members(&self) -> impl Iterator<Item = &ProjectionMember> {
        self.entries.keys()
    }
}

impl FromIterator<(ProjectionMember, SqlExpression)> for ProjectionMapping {
    fn from_iter<I: IntoIterator<Item = (ProjectionMember, SqlExpression)>>(iter: I) -> Self {
        ProjectionMapping {
            entries: iter.into_iter().collect(),
        }
    }
}
