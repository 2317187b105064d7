use thiserror::Error;

use crate::pipeline::variables::ValueKind;

/// Reasons a variable is left out of an evaluation report. None of these
/// stop the evaluation of other variables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Variable '{variable}' has type {kind}, which has no metric family")]
    UnsupportedType { variable: String, kind: ValueKind },

    #[error("Variable '{variable}' has {ground_truth} ground-truth values but {predicted} predictions")]
    LengthMismatch {
        variable: String,
        ground_truth: usize,
        predicted: usize,
    },

    #[error("Variable '{0}' has no variability on at least one side")]
    NoVariability(String),
}
