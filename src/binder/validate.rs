//! Integrity checks on shaping trees.

use crate::error::{Result, ShapeError};
use crate::query::ProjectionListOwner;
use crate::shaping::{EntityShaperExpr, ProjectionBindingExpr, ProjectionMember, ShapeExpr};
use crate::types::QueryId;

/// Checks the whole tree before either pass runs, so a defective tree is
/// rejected before the owner's projection list is touched.
pub(super) fn verify_shaper<O>(expr: &ShapeExpr, owner: &O) -> Result<()>
where
    O: ProjectionListOwner + ?Sized,
{
    match expr {
        ShapeExpr::EntityShaper(shaper) => {
            verify_value_buffer(&shaper.value_buffer, owner.query_id())?;
            owner.projection_expression(value_buffer_source(shaper)?).map(|_| ())
        }
        ShapeExpr::ProjectionBinding(_) | ShapeExpr::ParameterValue(_) => {
            Err(ShapeError::UnexpectedNode(expr.kind()))
        }
        _ => expr
            .children()
            .into_iter()
            .try_for_each(|child| verify_shaper(child, owner)),
    }
}

/// Projection member an input entity shaper reads from.
///
/// Slot-addressed buffers are binder output and are rejected.
pub(super) fn value_buffer_source(shaper: &EntityShaperExpr) -> Result<&ProjectionMember> {
    shaper.value_buffer.projection_member().ok_or_else(|| {
        ShapeError::InvalidValueBuffer(format!(
            "{} shaper reads a projection slot, expected a projection member",
            shaper.entity_type
        ))
    })
}

/// A value buffer must address a projection of the query being bound.
fn verify_value_buffer(value_buffer: &ProjectionBindingExpr, query: QueryId) -> Result<()> {
    if value_buffer.query != query {
        return Err(ShapeError::ValueBufferMismatch {
            expected: query,
            actual: value_buffer.query,
        });
    }
    Ok(())
}
