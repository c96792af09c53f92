//! Relational query representation owning the projection list.

use indexmap::IndexMap;

use crate::error::{Result, ShapeError};
use crate::shaping::{ProjectionBindingExpr, ProjectionMember, ProjectionTarget};
use crate::sql::{EntityProjection, SqlExpression};
use crate::types::{DataType, QueryId};

use super::mapping::ProjectionMapping;

/// Owner of a query's projection, as seen by the binder.
pub trait ProjectionListOwner {
    /// Identity of the query; bound references carry it.
    fn query_id(&self) -> QueryId;

    /// Appends `fragment` to the projection list, or finds a structurally
    /// equal entry already there, and returns its slot.
    fn add_to_projection(&mut self, fragment: SqlExpression, data_type: &DataType) -> usize;

    /// Adds the fragment a value buffer points at and returns its slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the value buffer points at nothing.
    fn add_value_buffer_to_projection(&mut self, value_buffer: &ProjectionBindingExpr) -> Result<usize>;

    /// Fragment currently mapped at `member`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::MissingProjection`] if the address is unmapped.
    fn projection_expression(&self, member: &ProjectionMember) -> Result<&SqlExpression>;

    /// Replaces the whole member mapping.
    fn replace_projection(&mut self, mapping: ProjectionMapping);
}

/// One slot of the projection list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionExpression {
    pub expression: SqlExpression,
    /// Type the shaper expects to read from the slot.
    pub data_type: DataType,
}

/// A SELECT: member mapping plus the ordered projection list.
#[derive(Debug, Clone)]
pub struct SelectExpression {
    id: QueryId,
    projection_mapping: ProjectionMapping,
    projection: Vec<ProjectionExpression>,
    /// Slot of each mapped member, filled by [`SelectExpression::apply_projection`].
    member_slots: IndexMap<ProjectionMember, usize>,
}

impl Default for SelectExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectExpression {
    /// Creates a select with an empty projection.
    #[must_use]
    pub fn new() -> Self {
        SelectExpression {
            id: QueryId::new(),
            projection_mapping: ProjectionMapping::new(),
            projection: Vec::new(),
            member_slots: IndexMap::new(),
        }
    }

    /// Creates a select whose root address materializes `entity`.
    #[must_use]
    pub fn for_entity(entity: EntityProjection) -> Self {
        let mut select = Self::new();
        select.add_member_projection(ProjectionMember::root(), SqlExpression::Entity(entity));
        select
    }

    /// Query id.
    #[must_use]
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Maps `member` to `fragment`, e.g. for an entity brought in by a join.
    pub fn add_member_projection(&mut self, member: ProjectionMember, fragment: SqlExpression) {
        self.projection_mapping.insert(member, fragment);
    }

    /// Value-buffer reference to the fragment at `member`, for entity shapers.
    #[must_use]
    pub fn value_buffer(&self, member: ProjectionMember) -> ProjectionBindingExpr {
        ProjectionBindingExpr::member(self.id, member, DataType::ValueBuffer)
    }

    /// Current member mapping.
    #[must_use]
    pub fn projection_mapping(&self) -> &ProjectionMapping {
        &self.projection_mapping
    }

    /// Ordered projection list.
    #[must_use]
    pub fn projection(&self) -> &[ProjectionExpression] {
        &self.projection
    }

    /// Flattens the member mapping into the projection list.
    ///
    /// Every mapped fragment gets a slot (deduplicated like any other
    /// addition) and the member to slot table is kept for [`Self::slot_of`].
    pub fn apply_projection(&mut self) {
        let entries: Vec<_> = self
            .projection_mapping
            .iter()
            .map(|(member, fragment)| (member.clone(), fragment.clone()))
            .collect();

        self.member_slots.clear();
        for (member, fragment) in entries {
            let data_type = fragment.data_type();
            let slot = self.add_to_projection(fragment, &data_type);
            self.member_slots.insert(member, slot);
        }

        tracing::debug!(
            query = %self.id,
            members = self.member_slots.len(),
            slots = self.projection.len(),
            "applied projection mapping"
        );
    }

    /// Row slot a bound reference reads from.
    ///
    /// Address-based references resolve only after [`Self::apply_projection`].
    /// References bound against another query resolve to `None`.
    #[must_use]
    pub fn slot_of(&self, binding: &ProjectionBindingExpr) -> Option<usize> {
        if binding.query != self.id {
            return None;
        }
        match &binding.target {
            ProjectionTarget::Index(index) => (*index < self.projection.len()).then_some(*index),
            ProjectionTarget::Member(member) => self.member_slots.get(member).copied(),
        }
    }
}

impl ProjectionListOwner for SelectExpression {
    fn query_id(&self) -> QueryId {
        self.id
    }

    fn add_to_projection(&mut self, fragment: SqlExpression, data_type: &DataType) -> usize {
        if let Some(existing) = self
            .projection
            .iter()
            .position(|slot| slot.expression == fragment)
        {
            return existing;
        }

        self.projection.push(ProjectionExpression {
            expression: fragment,
            data_type: data_type.clone(),
        });
        self.projection.len() - 1
    }

    fn add_value_buffer_to_projection(&mut self, value_buffer: &ProjectionBindingExpr) -> Result<usize> {
        match &value_buffer.target {
            ProjectionTarget::Member(member) => {
                let fragment = self.projection_expression(member)?.clone();
                Ok(self.add_to_projection(fragment, &DataType::ValueBuffer))
            }
            // The binder only passes member-addressed buffers; slots come from other callers.
            ProjectionTarget::Index(index) if *index < self.projection.len() => Ok(*index),
            ProjectionTarget::Index(index) => Err(ShapeError::InvalidValueBuffer(format!(
                "slot {index} is out of range for a projection of {} entries",
                self.projection.len()
            ))),
        }
    }

    fn projection_expression(&self, member: &ProjectionMember) -> Result<&SqlExpression> {
        self.projection_mapping
            .get(member)
            .ok_or_else(|| ShapeError::MissingProjection(member.clone()))
    }

    fn replace_projection(&mut self, mapping: ProjectionMapping) {
        self.projection_mapping = mapping;
        self.member_slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::MemberInfo;

    fn customer() -> EntityProjection {
        EntityProjection::new(
            "Customer",
            "c",
            vec![("Id".into(), DataType::Int64), ("Name".into(), DataType::String)],
        )
    }

    #[test]
    fn test_add_to_projection_dedupes() {
        let mut select = SelectExpression::new();
        let name = SqlExpression::column("c", "Name", DataType::String);

        let first = select.add_to_projection(name.clone(), &DataType::String);
        let second = select.add_to_projection(name, &DataType::String);
        let other = select.add_to_projection(SqlExpression::column("c", "Id", DataType::Int64), &DataType::Int64);

        assert_eq!(first, second);
        assert_eq!(other, 1);
        assert_eq!(select.projection().len(), 2);
    }

    #[test]
    fn test_value_buffer_projection() {
        let mut select = SelectExpression::for_entity(customer());
        let buffer = select.value_buffer(ProjectionMember::root());

        let slot = select.add_value_buffer_to_projection(&buffer).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(select.projection()[0].data_type, DataType::ValueBuffer);

        let by_index = ProjectionBindingExpr::index(select.id(), slot, DataType::ValueBuffer);
        assert_eq!(select.add_value_buffer_to_projection(&by_index).unwrap(), 0);

        let out_of_range = ProjectionBindingExpr::index(select.id(), 7, DataType::ValueBuffer);
        assert!(matches!(
            select.add_value_buffer_to_projection(&out_of_range),
            Err(ShapeError::InvalidValueBuffer(_))
        ));
    }

    #[test]
    fn test_missing_projection_is_an_error() {
        let select = SelectExpression::new();
        let member = ProjectionMember::root().append(MemberInfo::new("Anon", "Id"));
        assert!(matches!(
            select.projection_expression(&member),
            Err(ShapeError::MissingProjection(m)) if m == member
        ));
    }

    #[test]
    fn test_apply_projection_resolves_member_slots() {
        let mut select = SelectExpression::new();
        let id = ProjectionMember::root().append(MemberInfo::new("Anon", "Id"));
        let key = ProjectionMember::root().append(MemberInfo::new("Anon", "Key"));
        let column = SqlExpression::column("c", "Id", DataType::Int64);

        let mapping: ProjectionMapping = [(id.clone(), column.clone()), (key.clone(), column)]
            .into_iter()
            .collect();
        select.replace_projection(mapping);

        let id_ref = ProjectionBindingExpr::member(select.id(), id, DataType::Int64);
        assert_eq!(select.slot_of(&id_ref), None);

        select.apply_projection();
        let key_ref = ProjectionBindingExpr::member(select.id(), key, DataType::Int64);
        assert_eq!(select.projection().len(), 1);
        assert_eq!(select.slot_of(&id_ref), Some(0));
        assert_eq!(select.slot_of(&key_ref), Some(0));

        let foreign = ProjectionBindingExpr::index(QueryId::new(), 0, DataType::Int64);
        assert_eq!(select.slot_of(&foreign), None);
    }
}
