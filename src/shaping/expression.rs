//! Shaping tree definitions.

use serde::{Deserialize, Serialize};

use crate::types::{DataType, QueryId, Value};

use super::member::{MemberInfo, ProjectionMember};

/// Node of a shaping tree.
///
/// The first group of variants is what upstream stages hand to the binder.
/// `ProjectionBinding` and `ParameterValue` are produced by binding only.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeExpr {
    /// Object construction.
    New(NewExpr),

    /// Construction followed by member assignments.
    MemberInit(MemberInitExpr),

    /// Materializes one entity from a value buffer.
    EntityShaper(EntityShaperExpr),

    /// Attaches a related entity's shaper to a parent shaper.
    Include(IncludeExpr),

    /// Runtime query parameter.
    Parameter(ParameterExpr),

    /// Group parameter of a correlated join, fed to a later step.
    GroupPlaceholder(ParameterExpr),

    /// Literal value.
    Constant { value: Value, data_type: DataType },

    /// Column of a table in the query.
    Column {
        table: String,
        name: String,
        data_type: DataType,
    },

    /// Binary operation.
    Binary {
        left: Box<ShapeExpr>,
        op: BinaryOp,
        right: Box<ShapeExpr>,
        data_type: DataType,
    },

    /// Function or method call.
    Call {
        function: String,
        arguments: Vec<ShapeExpr>,
        data_type: DataType,
    },

    /// Bound reference into a query's projection.
    ProjectionBinding(ProjectionBindingExpr),

    /// Parameter resolved from the parameter store at materialization time.
    ParameterValue(ParameterExpr),
}

impl ShapeExpr {
    /// Creates an object construction whose arguments initialize named members.
    #[must_use]
    pub fn new_object(
        type_name: impl Into<String>,
        members: impl IntoIterator<Item = (MemberInfo, ShapeExpr)>,
    ) -> Self {
        ShapeExpr::New(NewExpr::with_members(type_name, members))
    }

    /// Creates an object construction with positional arguments only.
    #[must_use]
    pub fn positional(type_name: impl Into<String>, arguments: Vec<ShapeExpr>) -> Self {
        ShapeExpr::New(NewExpr::positional(type_name, arguments))
    }

    /// Creates a member initialization over a parameterless construction.
    #[must_use]
    pub fn member_init(
        type_name: impl Into<String>,
        bindings: impl IntoIterator<Item = (MemberInfo, ShapeExpr)>,
    ) -> Self {
        ShapeExpr::MemberInit(MemberInitExpr {
            new_expression: NewExpr::empty(type_name),
            bindings: bindings
                .into_iter()
                .map(|(member, expression)| MemberAssignment { member, expression })
                .collect(),
        })
    }

    /// Creates an entity shaper reading from `value_buffer`.
    #[must_use]
    pub fn entity_shaper(entity_type: impl Into<String>, value_buffer: ProjectionBindingExpr) -> Self {
        ShapeExpr::EntityShaper(EntityShaperExpr {
            entity_type: entity_type.into(),
            value_buffer,
        })
    }

    /// Creates an include of `navigation` on `entity`.
    #[must_use]
    pub fn include(entity: ShapeExpr, navigation: impl Into<String>, navigation_expression: ShapeExpr) -> Self {
        ShapeExpr::Include(IncludeExpr {
            entity: Box::new(entity),
            navigation: navigation.into(),
            navigation_expression: Box::new(navigation_expression),
        })
    }

    /// Creates a parameter reference.
    ///
    /// Parameters of enumerable type are correlated group placeholders.
    #[must_use]
    pub fn parameter(name: impl Into<String>, data_type: DataType) -> Self {
        let parameter = ParameterExpr {
            name: name.into(),
            data_type,
        };
        if parameter.data_type.is_enumerable() {
            ShapeExpr::GroupPlaceholder(parameter)
        } else {
            ShapeExpr::Parameter(parameter)
        }
    }

    /// Creates a literal; null literals default to STRING.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        let data_type = value.data_type().unwrap_or(DataType::String);
        ShapeExpr::Constant { value, data_type }
    }

    /// Creates a column reference.
    #[must_use]
    pub fn column(table: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        ShapeExpr::Column {
            table: table.into(),
            name: name.into(),
            data_type,
        }
    }

    /// Creates a binary operation.
    #[must_use]
    pub fn binary(left: ShapeExpr, op: BinaryOp, right: ShapeExpr, data_type: DataType) -> Self {
        ShapeExpr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            data_type,
        }
    }

    /// Creates a call of `function`.
    #[must_use]
    pub fn call(function: impl Into<String>, arguments: Vec<ShapeExpr>, data_type: DataType) -> Self {
        ShapeExpr::Call {
            function: function.into(),
            arguments,
            data_type,
        }
    }

    /// Returns the type this node evaluates to.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            ShapeExpr::New(new) => DataType::Object(new.type_name.clone()),
            ShapeExpr::MemberInit(init) => DataType::Object(init.new_expression.type_name.clone()),
            ShapeExpr::EntityShaper(shaper) => DataType::Entity(shaper.entity_type.clone()),
            ShapeExpr::Include(include) => include.entity.data_type(),
            ShapeExpr::Parameter(parameter)
            | ShapeExpr::GroupPlaceholder(parameter)
            | ShapeExpr::ParameterValue(parameter) => parameter.data_type.clone(),
            ShapeExpr::ProjectionBinding(binding) => binding.data_type.clone(),
            ShapeExpr::Constant { data_type, .. }
            | ShapeExpr::Column { data_type, .. }
            | ShapeExpr::Binary { data_type, .. }
            | ShapeExpr::Call { data_type, .. } => data_type.clone(),
        }
    }

    /// Short name of the node category, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ShapeExpr::New(_) => "New",
            ShapeExpr::MemberInit(_) => "MemberInit",
            ShapeExpr::EntityShaper(_) => "EntityShaper",
            ShapeExpr::Include(_) => "Include",
            ShapeExpr::Parameter(_) => "Parameter",
            ShapeExpr::GroupPlaceholder(_) => "GroupPlaceholder",
            ShapeExpr::Constant { .. } => "Constant",
            ShapeExpr::Column { .. } => "Column",
            ShapeExpr::Binary { .. } => "Binary",
            ShapeExpr::Call { .. } => "Call",
            ShapeExpr::ProjectionBinding(_) => "ProjectionBinding",
            ShapeExpr::ParameterValue(_) => "ParameterValue",
        }
    }

    /// Direct sub-trees of this node.
    ///
    /// Entity value buffers are not sub-trees; see [`ShapeExpr::projection_bindings`].
    #[must_use]
    pub fn children(&self) -> Vec<&ShapeExpr> {
        match self {
            ShapeExpr::New(new) => new.arguments.iter().collect(),
            ShapeExpr::MemberInit(init) => init
                .new_expression
                .arguments
                .iter()
                .chain(init.bindings.iter().map(|b| &b.expression))
                .collect(),
            ShapeExpr::Include(include) => {
                vec![include.entity.as_ref(), include.navigation_expression.as_ref()]
            }
            ShapeExpr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ShapeExpr::Call { arguments, .. } => arguments.iter().collect(),
            ShapeExpr::EntityShaper(_)
            | ShapeExpr::Parameter(_)
            | ShapeExpr::GroupPlaceholder(_)
            | ShapeExpr::Constant { .. }
            | ShapeExpr::Column { .. }
            | ShapeExpr::ProjectionBinding(_)
            | ShapeExpr::ParameterValue(_) => Vec::new(),
        }
    }

    /// Collects every bound reference in the tree, entity value buffers included.
    #[must_use]
    pub fn projection_bindings(&self) -> Vec<&ProjectionBindingExpr> {
        let mut bindings = Vec::new();
        collect_bindings(self, &mut bindings);
        bindings
    }
}

fn collect_bindings<'a>(expr: &'a ShapeExpr, bindings: &mut Vec<&'a ProjectionBindingExpr>) {
    match expr {
        ShapeExpr::ProjectionBinding(binding) => bindings.push(binding),
        ShapeExpr::EntityShaper(shaper) => bindings.push(&shaper.value_buffer),
        _ => {
            for child in expr.children() {
                collect_bindings(child, bindings);
            }
        }
    }
}

/// Object construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    type_name: String,
    arguments: Vec<ShapeExpr>,
    /// Member initialized by each argument; `None` for positional constructors.
    members: Option<Vec<MemberInfo>>,
}

impl NewExpr {
    /// Parameterless construction of `type_name`.
    #[must_use]
    pub fn empty(type_name: impl Into<String>) -> Self {
        NewExpr {
            type_name: type_name.into(),
            arguments: Vec::new(),
            members: None,
        }
    }

    /// Construction whose arguments initialize the paired members.
    #[must_use]
    pub fn with_members(
        type_name: impl Into<String>,
        members: impl IntoIterator<Item = (MemberInfo, ShapeExpr)>,
    ) -> Self {
        let (members, arguments): (Vec<_>, Vec<_>) = members.into_iter().unzip();
        NewExpr {
            type_name: type_name.into(),
            arguments,
            members: Some(members),
        }
    }

    /// Construction with positional arguments only.
    #[must_use]
    pub fn positional(type_name: impl Into<String>, arguments: Vec<ShapeExpr>) -> Self {
        NewExpr {
            type_name: type_name.into(),
            arguments,
            members: None,
        }
    }

    /// Constructed type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Constructor arguments.
    #[must_use]
    pub fn arguments(&self) -> &[ShapeExpr] {
        &self.arguments
    }

    /// Members paired with arguments, when the constructor names them.
    #[must_use]
    pub fn members(&self) -> Option<&[MemberInfo]> {
        self.members.as_deref()
    }

    /// Returns a copy with `arguments` replacing the current ones.
    ///
    /// The argument count must be unchanged.
    #[must_use]
    pub fn update(&self, arguments: Vec<ShapeExpr>) -> Self {
        debug_assert_eq!(arguments.len(), self.arguments.len());
        NewExpr {
            type_name: self.type_name.clone(),
            arguments,
            members: self.members.clone(),
        }
    }
}

/// Construction followed by member assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInitExpr {
    pub new_expression: NewExpr,
    pub bindings: Vec<MemberAssignment>,
}

/// `member = expression` inside a member initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAssignment {
    pub member: MemberInfo,
    pub expression: ShapeExpr,
}

impl MemberAssignment {
    /// Returns a copy assigning `expression` instead.
    #[must_use]
    pub fn update(&self, expression: ShapeExpr) -> Self {
        MemberAssignment {
            member: self.member.clone(),
            expression,
        }
    }
}

/// Materializes one entity instance from a value buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityShaperExpr {
    pub entity_type: String,
    pub value_buffer: ProjectionBindingExpr,
}

impl EntityShaperExpr {
    /// Returns a copy reading from `value_buffer`.
    #[must_use]
    pub fn with_value_buffer(&self, value_buffer: ProjectionBindingExpr) -> Self {
        EntityShaperExpr {
            entity_type: self.entity_type.clone(),
            value_buffer,
        }
    }
}

/// Eager attachment of a related entity.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeExpr {
    pub entity: Box<ShapeExpr>,
    pub navigation: String,
    pub navigation_expression: Box<ShapeExpr>,
}

impl IncludeExpr {
    /// Returns a copy with rewritten sub-trees.
    #[must_use]
    pub fn update(&self, entity: ShapeExpr, navigation_expression: ShapeExpr) -> Self {
        IncludeExpr {
            entity: Box::new(entity),
            navigation: self.navigation.clone(),
            navigation_expression: Box::new(navigation_expression),
        }
    }
}

/// Named, typed query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterExpr {
    pub name: String,
    pub data_type: DataType,
}

/// Where a bound reference points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectionTarget {
    /// Address in the query's member mapping (server mode).
    Member(ProjectionMember),
    /// Slot in the query's projection list (client-eval mode).
    Index(usize),
}

/// Reference to a value in a query's projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionBindingExpr {
    pub query: QueryId,
    pub target: ProjectionTarget,
    pub data_type: DataType,
}

impl ProjectionBindingExpr {
    /// Reference by projection address.
    #[must_use]
    pub fn member(query: QueryId, member: ProjectionMember, data_type: DataType) -> Self {
        ProjectionBindingExpr {
            query,
            target: ProjectionTarget::Member(member),
            data_type,
        }
    }

    /// Reference by projection slot.
    #[must_use]
    pub fn index(query: QueryId, index: usize, data_type: DataType) -> Self {
        ProjectionBindingExpr {
            query,
            target: ProjectionTarget::Index(index),
            data_type,
        }
    }

    /// Address, for server-mode references.
    #[must_use]
    pub fn projection_member(&self) -> Option<&ProjectionMember> {
        match &self.target {
            ProjectionTarget::Member(member) => Some(member),
            ProjectionTarget::Index(_) => None,
        }
    }

    /// Slot, for client-mode references.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        match self.target {
            ProjectionTarget::Index(index) => Some(index),
            ProjectionTarget::Member(_) => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
}

impl BinaryOp {
    /// Returns the string representation of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerable_parameter_is_group_placeholder() {
        let group = ShapeExpr::parameter(
            "g",
            DataType::Enumerable(Box::new(DataType::Entity("Order".into()))),
        );
        assert!(matches!(group, ShapeExpr::GroupPlaceholder(_)));

        let city = ShapeExpr::parameter("__city_0", DataType::String);
        assert!(matches!(city, ShapeExpr::Parameter(_)));
    }

    #[test]
    fn test_new_object_pairs_members_with_arguments() {
        let anon = ShapeExpr::new_object(
            "Anon",
            [
                (MemberInfo::new("Anon", "Id"), ShapeExpr::column("c", "Id", DataType::Int64)),
                (MemberInfo::new("Anon", "Name"), ShapeExpr::column("c", "Name", DataType::String)),
            ],
        );
        let ShapeExpr::New(new) = &anon else {
            panic!("expected New");
        };
        assert_eq!(new.arguments().len(), 2);
        assert_eq!(new.members().map(<[MemberInfo]>::len), Some(2));
        assert_eq!(anon.data_type(), DataType::Object("Anon".into()));
    }

    #[test]
    fn test_projection_bindings_include_value_buffers() {
        let query = QueryId::new();
        let shaper = ShapeExpr::entity_shaper(
            "Customer",
            ProjectionBindingExpr::member(query, ProjectionMember::root(), DataType::ValueBuffer),
        );
        let tree = ShapeExpr::positional(
            "Tuple",
            vec![
                shaper,
                ShapeExpr::ProjectionBinding(ProjectionBindingExpr::index(query, 3, DataType::Int64)),
            ],
        );
        let bindings = tree.projection_bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].slot(), Some(3));
        assert!(bindings[0].projection_member().is_some_and(ProjectionMember::is_root));
    }

    #[test]
    fn test_binary_op_rendering() {
        assert_eq!(BinaryOp::Neq.as_str(), "<>");
        assert_eq!(BinaryOp::And.as_str(), "AND");
    }
}
