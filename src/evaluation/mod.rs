//! Evaluation engine: scores predictions against ground truth per variable.
//!
//! The declared value type of each variable selects one of seven metric
//! families (binary, multiclass, date, numeric, multi-label, record set,
//! date list). The same normalisation feeds Cohen's kappa and percentage
//! agreement. A variable that cannot be scored is skipped with a reason;
//! it never stops the evaluation of the others.

pub mod agreement;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod normalize;
pub mod types;

pub use agreement::{agreement_all, cohen_kappa, kappa, kappa_all, percentage_agreement};
pub use error::EvaluationError;
pub use evaluator::{evaluate, evaluate_all};
pub use types::*;

pub use crate::config::EvaluationConfig;
