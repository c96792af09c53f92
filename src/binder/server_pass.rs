//! Server-mode binding.

use crate::error::{Result, ShapeError};
use crate::query::{ProjectionListOwner, ProjectionMapping};
use crate::shaping::{
    EntityShaperExpr, MemberInitExpr, NewExpr, ProjectionBindingExpr, ProjectionMember, ShapeExpr,
};
use crate::sql::{ScalarTranslator, SqlExpression};
use crate::types::DataType;

use super::config::BinderConfig;
use super::validate::value_buffer_source;

/// Node the store could not evaluate, and where it sits in the tree.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Untranslatable {
    pub(super) node: &'static str,
    pub(super) member: ProjectionMember,
}

/// Binds every leaf to a projection address.
///
/// `visit` returns `Ok(None)` as soon as any node cannot be evaluated by the
/// store; the caller then drops the mapping and keeps the failure for
/// diagnostics. The owner is only read.
pub(super) struct ServerPass<'a, O: ?Sized, T: ?Sized> {
    owner: &'a O,
    translator: &'a T,
    config: &'a BinderConfig,
    mapping: ProjectionMapping,
    failure: Option<Untranslatable>,
}

impl<'a, O, T> ServerPass<'a, O, T>
where
    O: ProjectionListOwner + ?Sized,
    T: ScalarTranslator + ?Sized,
{
    pub(super) fn new(owner: &'a O, translator: &'a T, config: &'a BinderConfig) -> Self {
        ServerPass {
            owner,
            translator,
            config,
            mapping: ProjectionMapping::new(),
            failure: None,
        }
    }

    pub(super) fn finish(self) -> (ProjectionMapping, Option<Untranslatable>) {
        (self.mapping, self.failure)
    }

    pub(super) fn visit(&mut self, expr: &ShapeExpr, member: &ProjectionMember) -> Result<Option<ShapeExpr>> {
        match expr {
            ShapeExpr::New(new) => Ok(self.visit_new(new, member)?.map(ShapeExpr::New)),
            ShapeExpr::MemberInit(init) => Ok(self.visit_member_init(init, member)?.map(ShapeExpr::MemberInit)),
            ShapeExpr::EntityShaper(shaper) => self.visit_entity_shaper(shaper, member).map(Some),
            ShapeExpr::Include(_) => Ok(self.untranslatable(expr.kind(), member)),
            ShapeExpr::GroupPlaceholder(_) => Ok(Some(expr.clone())),
            ShapeExpr::Parameter(parameter) if parameter.data_type.is_enumerable() => Ok(Some(expr.clone())),
            ShapeExpr::ProjectionBinding(_) | ShapeExpr::ParameterValue(_) => {
                Err(ShapeError::UnexpectedNode(expr.kind()))
            }
            ShapeExpr::Parameter(_)
            | ShapeExpr::Constant { .. }
            | ShapeExpr::Column { .. }
            | ShapeExpr::Binary { .. }
            | ShapeExpr::Call { .. } => Ok(self.visit_leaf(expr, member)),
        }
    }

    fn visit_new(&mut self, new: &NewExpr, member: &ProjectionMember) -> Result<Option<NewExpr>> {
        if new.arguments().is_empty() {
            return Ok(Some(new.clone()));
        }

        // Positional arguments have no address.
        let Some(members) = new.members() else {
            return Ok(self.untranslatable("New", member));
        };

        let mut arguments = Vec::with_capacity(new.arguments().len());
        for (argument, argument_member) in new.arguments().iter().zip(members) {
            let address = member.append(argument_member.clone());
            let Some(bound) = self.visit(argument, &address)? else {
                return Ok(None);
            };
            arguments.push(bound);
        }

        Ok(Some(new.update(arguments)))
    }

    fn visit_member_init(
        &mut self,
        init: &MemberInitExpr,
        member: &ProjectionMember,
    ) -> Result<Option<MemberInitExpr>> {
        let Some(new_expression) = self.visit_new(&init.new_expression, member)? else {
            return Ok(None);
        };

        let mut bindings = Vec::with_capacity(init.bindings.len());
        for assignment in &init.bindings {
            let address = member.append(assignment.member.clone());
            let Some(bound) = self.visit(&assignment.expression, &address)? else {
                return Ok(None);
            };
            bindings.push(assignment.update(bound));
        }

        Ok(Some(MemberInitExpr {
            new_expression,
            bindings,
        }))
    }

    fn visit_entity_shaper(&mut self, shaper: &EntityShaperExpr, member: &ProjectionMember) -> Result<ShapeExpr> {
        let query = self.owner.query_id();
        let source = value_buffer_source(shaper)?;

        // The shaper may sit under a different path than the one its buffer
        // was registered at, so the fragment is re-recorded here.
        let fragment = self.owner.projection_expression(source)?.clone();
        self.record(member, fragment);

        Ok(ShapeExpr::EntityShaper(shaper.with_value_buffer(
            ProjectionBindingExpr::member(query, member.clone(), DataType::ValueBuffer),
        )))
    }

    fn visit_leaf(&mut self, expr: &ShapeExpr, member: &ProjectionMember) -> Option<ShapeExpr> {
        let Some(fragment) = self.translator.translate(expr) else {
            return self.untranslatable(expr.kind(), member);
        };
        self.record(member, fragment);

        Some(ShapeExpr::ProjectionBinding(ProjectionBindingExpr::member(
            self.owner.query_id(),
            member.clone(),
            expr.data_type(),
        )))
    }

    fn record(&mut self, member: &ProjectionMember, fragment: SqlExpression) {
        if self.config.sensitive_data_logging {
            tracing::trace!(
                member = %member,
                depth = member.depth(),
                fragment = %fragment,
                "bound projection member"
            );
        } else {
            tracing::trace!(member = %member, depth = member.depth(), "bound projection member");
        }
        self.mapping.insert(member.clone(), fragment);
    }

    fn untranslatable<R>(&mut self, node: &'static str, member: &ProjectionMember) -> Option<R> {
        tracing::debug!(node, member = %member, "expression cannot be evaluated on the server");
        self.failure = Some(Untranslatable {
            node,
            member: member.clone(),
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SelectExpression;
    use crate::shaping::MemberInfo;
    use crate::sql::SqlTranslator;

    #[test]
    fn test_fail_fast_skips_later_arguments() {
        let select = SelectExpression::new();
        let config = BinderConfig::default();
        let seen = std::cell::RefCell::new(Vec::new());
        let translator = |expr: &ShapeExpr| {
            seen.borrow_mut().push(expr.kind());
            SqlTranslator::new().translate(expr)
        };

        let tree = ShapeExpr::new_object(
            "Anon",
            [
                (MemberInfo::new("Anon", "A"), ShapeExpr::column("c", "Id", DataType::Int64)),
                (
                    MemberInfo::new("Anon", "B"),
                    ShapeExpr::positional("Tuple", vec![ShapeExpr::column("c", "Id", DataType::Int64)]),
                ),
                (MemberInfo::new("Anon", "C"), ShapeExpr::column("c", "Name", DataType::String)),
            ],
        );

        let mut pass = ServerPass::new(&select, &translator, &config);
        let bound = pass.visit(&tree, &ProjectionMember::root()).unwrap();

        assert!(bound.is_none());
        // Only A reached the translator; B failed structurally and C was never visited.
        assert_eq!(*seen.borrow(), vec!["Column"]);
        let failure = pass.finish().1.unwrap();
        assert_eq!(failure.node, "New");
        assert_eq!(failure.member.to_string(), "B");
    }

    #[test]
    fn test_empty_constructor_passes_through() {
        let select = SelectExpression::new();
        let config = BinderConfig::default();
        let translator = SqlTranslator::new();
        let tree = ShapeExpr::positional("Marker", Vec::new());

        let mut pass = ServerPass::new(&select, &translator, &config);
        let bound = pass.visit(&tree, &ProjectionMember::root()).unwrap();

        assert_eq!(bound, Some(tree));
        let (mapping, failure) = pass.finish();
        assert!(mapping.is_empty());
        assert!(failure.is_none());
    }

    #[test]
    fn test_include_fails_without_descending() {
        let mut select = SelectExpression::for_entity(crate::sql::EntityProjection::new(
            "Customer",
            "c",
            vec![("Id".to_string(), DataType::Int64)],
        ));
        let orders = ProjectionMember::root().append(MemberInfo::new("Customer", "Orders"));
        select.add_member_projection(orders.clone(), SqlExpression::column("o", "Id", DataType::Int64));
        let config = BinderConfig::default();
        let seen = std::cell::Cell::new(0);
        let translator = |expr: &ShapeExpr| {
            seen.set(seen.get() + 1);
            SqlTranslator::new().translate(expr)
        };

        let tree = ShapeExpr::include(
            ShapeExpr::entity_shaper("Customer", select.value_buffer(ProjectionMember::root())),
            "Orders",
            ShapeExpr::new_object(
                "OrderView",
                [(MemberInfo::new("OrderView", "Id"), ShapeExpr::column("o", "Id", DataType::Int64))],
            ),
        );

        let mut pass = ServerPass::new(&select, &translator, &config);
        let bound = pass.visit(&tree, &ProjectionMember::root()).unwrap();

        assert!(bound.is_none());
        assert_eq!(seen.get(), 0);
        let (mapping, failure) = pass.finish();
        assert!(mapping.is_empty(), "nothing below the include was recorded");
        assert_eq!(
            failure,
            Some(Untranslatable {
                node: "Include",
                member: ProjectionMember::root(),
            })
        );
    }

    #[test]
    fn test_enumerable_parameter_variant_passes_through() {
        let select = SelectExpression::new();
        let config = BinderConfig::default();
        let translator = SqlTranslator::new();
        let group = ShapeExpr::Parameter(crate::shaping::ParameterExpr {
            name: "g".into(),
            data_type: DataType::Enumerable(Box::new(DataType::Entity("Order".into()))),
        });

        let mut pass = ServerPass::new(&select, &translator, &config);
        let bound = pass.visit(&group, &ProjectionMember::root()).unwrap();

        assert_eq!(bound, Some(group));
        assert!(pass.finish().0.is_empty());
    }
}
