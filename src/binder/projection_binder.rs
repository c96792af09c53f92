//! Projection binding entry point.

use crate::error::{Result, ShapeError};
use crate::query::{ProjectionListOwner, ProjectionMapping};
use crate::shaping::{ProjectionMember, ShapeExpr};
use crate::sql::ScalarTranslator;

use super::client_pass::ClientPass;
use super::config::{BinderConfig, ClientEvalPolicy};
use super::server_pass::{ServerPass, Untranslatable};
use super::validate::verify_shaper;

/// Where the bound shaper's values are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Every leaf reads a projection address evaluated by the store.
    Server,
    /// Leaves read projection slots; the rest runs after rows come back.
    ClientEval,
}

/// Result of binding a shaper.
#[derive(Debug, Clone)]
pub struct BoundShaper {
    /// Rewritten shaping tree.
    pub shaper: ShapeExpr,
    /// Mode that produced it.
    pub mode: BindMode,
}

impl BoundShaper {
    /// Returns true if the store evaluates every leaf.
    #[must_use]
    pub fn is_server_bound(&self) -> bool {
        self.mode == BindMode::Server
    }
}

/// Rewrites shaping trees against a query's projection.
///
/// Binding first tries to address every leaf by member path so the store
/// computes the whole result. If any node cannot be translated, the partial
/// mapping is dropped and the original tree is bound again in client-eval
/// mode, where translatable leaves become projection slots and the rest is
/// evaluated after the rows are read.
///
/// The binder keeps no per-call state; one instance may bind any number of
/// trees, from several threads, as long as each call has its own owner.
pub struct ProjectionBinder<'a, T: ?Sized> {
    translator: &'a T,
    config: BinderConfig,
}

impl<'a, T> ProjectionBinder<'a, T>
where
    T: ScalarTranslator + ?Sized,
{
    /// Creates a binder with the default configuration.
    #[must_use]
    pub fn new(translator: &'a T) -> Self {
        Self::with_config(translator, BinderConfig::default())
    }

    /// Creates a binder with `config`.
    #[must_use]
    pub fn with_config(translator: &'a T, config: BinderConfig) -> Self {
        ProjectionBinder { translator, config }
    }

    /// Binds `shaper` against `owner` and installs the resulting mapping.
    ///
    /// The owner's mapping is replaced exactly once, after binding succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is inconsistent with the owner (an
    /// entity shaper bound against another query, an already-bound node,
    /// a value buffer with nothing behind it) or if client evaluation is
    /// needed and [`ClientEvalPolicy::Forbid`] is configured. In both cases
    /// the owner is left untouched.
    pub fn bind<O>(&self, owner: &mut O, shaper: &ShapeExpr) -> Result<BoundShaper>
    where
        O: ProjectionListOwner + ?Sized,
    {
        let query = owner.query_id();
        verify_shaper(shaper, &*owner)?;
        tracing::debug!(%query, root = shaper.kind(), "binding shaper");

        let mut server = ServerPass::new(&*owner, self.translator, &self.config);
        let bound = server.visit(shaper, &ProjectionMember::root())?;
        let (mapping, failure) = server.finish();
        if let Some(bound) = bound {
            tracing::debug!(%query, members = mapping.len(), "shaper bound on the server");
            owner.replace_projection(mapping);
            return Ok(BoundShaper {
                shaper: bound,
                mode: BindMode::Server,
            });
        }

        let failure = failure.unwrap_or_else(|| Untranslatable {
            node: shaper.kind(),
            member: ProjectionMember::root(),
        });
        self.check_client_eval(failure)?;

        let bound = ClientPass::new(owner, self.translator, &self.config).visit(shaper)?;
        owner.replace_projection(ProjectionMapping::new());
        tracing::debug!(%query, "shaper bound for client evaluation");

        Ok(BoundShaper {
            shaper: bound,
            mode: BindMode::ClientEval,
        })
    }

    fn check_client_eval(&self, failure: Untranslatable) -> Result<()> {
        let Untranslatable { node, member } = failure;
        match self.config.client_eval {
            ClientEvalPolicy::Allow => {
                tracing::debug!(node, member = %member, "falling back to client evaluation");
                Ok(())
            }
            ClientEvalPolicy::Warn => {
                tracing::warn!(
                    node,
                    member = %member,
                    "shaper cannot be evaluated by the store and will be evaluated on the client"
                );
                Ok(())
            }
            ClientEvalPolicy::Forbid => Err(ShapeError::ClientEvaluationForbidden { node, member }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SelectExpression;
    use crate::shaping::MemberInfo;
    use crate::sql::SqlTranslator;
    use crate::types::DataType;

    #[test]
    fn test_forbid_leaves_owner_untouched() {
        let mut select = SelectExpression::new();
        let translator = SqlTranslator::new();
        let config = BinderConfig::new().with_client_eval(ClientEvalPolicy::Forbid);
        let binder = ProjectionBinder::with_config(&translator, config);

        let tree = ShapeExpr::new_object(
            "Anon",
            [
                (MemberInfo::new("Anon", "Id"), ShapeExpr::column("c", "Id", DataType::Int64)),
                (
                    MemberInfo::new("Anon", "Label"),
                    ShapeExpr::call("FormatLabel", vec![], DataType::String),
                ),
            ],
        );
        let err = binder.bind(&mut select, &tree).unwrap_err();

        match err {
            ShapeError::ClientEvaluationForbidden { node, member } => {
                assert_eq!(node, "Call");
                assert_eq!(member, ProjectionMember::root().append(MemberInfo::new("Anon", "Label")));
            }
            other => panic!("expected ClientEvaluationForbidden, got {other:?}"),
        }
        assert!(select.projection().is_empty());
        assert!(select.projection_mapping().is_empty());
    }

    #[test]
    fn test_forbid_does_not_affect_server_binding() {
        let mut select = SelectExpression::new();
        let translator = SqlTranslator::new();
        let config = BinderConfig::new().with_client_eval(ClientEvalPolicy::Forbid);
        let binder = ProjectionBinder::with_config(&translator, config);

        let tree = ShapeExpr::new_object(
            "Anon",
            [(MemberInfo::new("Anon", "Id"), ShapeExpr::column("c", "Id", DataType::Int64))],
        );
        let bound = binder.bind(&mut select, &tree).unwrap();

        assert!(bound.is_server_bound());
        assert_eq!(select.projection_mapping().len(), 1);
    }

    #[test]
    fn test_unmapped_value_buffer_fails_before_client_pass() {
        let mut select = SelectExpression::new();
        let translator = SqlTranslator::new();
        let binder = ProjectionBinder::new(&translator);

        let orders = ProjectionMember::root().append(MemberInfo::new("Customer", "Orders"));
        let tree = ShapeExpr::positional(
            "Tuple",
            vec![
                ShapeExpr::column("c", "Id", DataType::Int64),
                ShapeExpr::entity_shaper("Order", select.value_buffer(orders)),
            ],
        );
        let err = binder.bind(&mut select, &tree).unwrap_err();

        assert!(matches!(err, ShapeError::MissingProjection(_)));
        assert!(select.projection().is_empty());
    }

    #[test]
    fn test_root_leaf_binds_at_root_address() {
        let mut select = SelectExpression::new();
        let translator = SqlTranslator::new();
        let binder = ProjectionBinder::new(&translator);

        let bound = binder
            .bind(&mut select, &ShapeExpr::column("c", "Id", DataType::Int64))
            .unwrap();

        let ShapeExpr::ProjectionBinding(binding) = &bound.shaper else {
            panic!("expected a bound reference, got {:?}", bound.shaper);
        };
        assert!(binding.projection_member().is_some_and(ProjectionMember::is_root));
        assert!(select.projection_mapping().contains(&ProjectionMember::root()));
    }
}
