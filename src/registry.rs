//! Operator registry.
//!
//! A fixed table of the operators this crate ships, keyed by their name
//! tokens. Lookup is linear; the table is small and built once.

use crate::engine::{PipelineError, UnaryOp};
use crate::image::Image;
use crate::operator::OperatorDescriptor;

/// Every registered operator.
pub static OPERATORS: &[&OperatorDescriptor] = &[&crate::abs::ABS];

/// Find a registered operator by name token.
pub fn lookup(name: &str) -> Option<&'static OperatorDescriptor> {
    OPERATORS.iter().copied().find(|d| d.name == name)
}

/// Evaluate a registered operator on `input` with default options.
///
/// # Errors
///
/// [`PipelineError::UnknownOperator`] if no operator has that name;
/// otherwise whatever [`UnaryOp::execute`] returns.
pub fn apply(name: &str, input: &Image) -> Result<Image, PipelineError> {
    let desc = lookup(name).ok_or_else(|| PipelineError::UnknownOperator(name.into()))?;
    UnaryOp::new(desc, input).execute()
}
