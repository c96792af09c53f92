//! Client-eval binding.

use crate::error::{Result, ShapeError};
use crate::query::ProjectionListOwner;
use crate::shaping::{
    EntityShaperExpr, MemberInitExpr, NewExpr, ParameterExpr, ProjectionBindingExpr, ShapeExpr,
};
use crate::sql::ScalarTranslator;
use crate::types::DataType;

use super::config::BinderConfig;

/// Binds translatable leaves to projection slots and keeps the rest for
/// evaluation after the rows come back. Never fails on untranslatable input.
pub(super) struct ClientPass<'a, O: ?Sized, T: ?Sized> {
    owner: &'a mut O,
    translator: &'a T,
    config: &'a BinderConfig,
}

impl<'a, O, T> ClientPass<'a, O, T>
where
    O: ProjectionListOwner + ?Sized,
    T: ScalarTranslator + ?Sized,
{
    pub(super) fn new(owner: &'a mut O, translator: &'a T, config: &'a BinderConfig) -> Self {
        ClientPass {
            owner,
            translator,
            config,
        }
    }

    pub(super) fn visit(&mut self, expr: &ShapeExpr) -> Result<ShapeExpr> {
        match expr {
            ShapeExpr::New(new) => Ok(ShapeExpr::New(self.visit_new(new)?)),
            ShapeExpr::MemberInit(init) => Ok(ShapeExpr::MemberInit(self.visit_member_init(init)?)),
            ShapeExpr::EntityShaper(shaper) => self.visit_entity_shaper(shaper),
            ShapeExpr::Include(include) => {
                let entity = self.visit(&include.entity)?;
                let navigation = self.visit(&include.navigation_expression)?;
                Ok(ShapeExpr::Include(include.update(entity, navigation)))
            }
            ShapeExpr::GroupPlaceholder(_) => Ok(expr.clone()),
            ShapeExpr::Parameter(parameter) if parameter.data_type.is_enumerable() => Ok(expr.clone()),
            ShapeExpr::ProjectionBinding(_) | ShapeExpr::ParameterValue(_) => {
                Err(ShapeError::UnexpectedNode(expr.kind()))
            }
            ShapeExpr::Parameter(parameter) => Ok(self
                .try_project(expr)
                .unwrap_or_else(|| self.parameter_lookup(parameter.clone()))),
            ShapeExpr::Constant { .. } | ShapeExpr::Column { .. } => {
                Ok(self.try_project(expr).unwrap_or_else(|| expr.clone()))
            }
            ShapeExpr::Binary {
                left,
                op,
                right,
                data_type,
            } => match self.try_project(expr) {
                Some(bound) => Ok(bound),
                None => Ok(ShapeExpr::Binary {
                    left: Box::new(self.visit(left)?),
                    op: *op,
                    right: Box::new(self.visit(right)?),
                    data_type: data_type.clone(),
                }),
            },
            ShapeExpr::Call {
                function,
                arguments,
                data_type,
            } => match self.try_project(expr) {
                Some(bound) => Ok(bound),
                None => Ok(ShapeExpr::Call {
                    function: function.clone(),
                    arguments: arguments
                        .iter()
                        .map(|argument| self.visit(argument))
                        .collect::<Result<Vec<_>>>()?,
                    data_type: data_type.clone(),
                }),
            },
        }
    }

    fn visit_new(&mut self, new: &NewExpr) -> Result<NewExpr> {
        if new.arguments().is_empty() {
            return Ok(new.clone());
        }
        let arguments = new
            .arguments()
            .iter()
            .map(|argument| self.visit(argument))
            .collect::<Result<Vec<_>>>()?;
        Ok(new.update(arguments))
    }

    fn visit_member_init(&mut self, init: &MemberInitExpr) -> Result<MemberInitExpr> {
        let new_expression = self.visit_new(&init.new_expression)?;
        let mut bindings = Vec::with_capacity(init.bindings.len());
        for assignment in &init.bindings {
            bindings.push(assignment.update(self.visit(&assignment.expression)?));
        }
        Ok(MemberInitExpr {
            new_expression,
            bindings,
        })
    }

    fn visit_entity_shaper(&mut self, shaper: &EntityShaperExpr) -> Result<ShapeExpr> {
        let query = self.owner.query_id();
        let slot = self.owner.add_value_buffer_to_projection(&shaper.value_buffer)?;
        tracing::trace!(entity = %shaper.entity_type, slot, "projected value buffer");

        Ok(ShapeExpr::EntityShaper(shaper.with_value_buffer(
            ProjectionBindingExpr::index(query, slot, DataType::ValueBuffer),
        )))
    }

    /// Adds `expr` to the projection if the store can evaluate it.
    fn try_project(&mut self, expr: &ShapeExpr) -> Option<ShapeExpr> {
        let fragment = self.translator.translate(expr)?;
        let data_type = expr.data_type();
        if self.config.sensitive_data_logging {
            tracing::trace!(fragment = %fragment, "projecting fragment");
        }
        let slot = self.owner.add_to_projection(fragment, &data_type);
        tracing::trace!(node = expr.kind(), slot, "bound projection slot");

        Some(ShapeExpr::ProjectionBinding(ProjectionBindingExpr::index(
            self.owner.query_id(),
            slot,
            data_type,
        )))
    }

    fn parameter_lookup(&self, parameter: ParameterExpr) -> ShapeExpr {
        if self.config.sensitive_data_logging {
            tracing::trace!(parameter = %parameter.name, "parameter resolved at materialization");
        }
        ShapeExpr::ParameterValue(parameter)
    }
}
