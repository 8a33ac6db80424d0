// Errors raised while building a model or reading results back out of it

use super::value_objects::SolutionStatus;

/// Error types for model construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Variable '{0}' is already declared")]
    DuplicateDeclaration(String),

    #[error("Invalid coefficient {value} in {context}")]
    InvalidCoefficient { context: String, value: f64 },

    #[error("Invalid bounds for variable '{name}': [{lower}, {upper}]")]
    InvalidBound { name: String, lower: f64, upper: f64 },

    #[error("Variable handle #{0} does not belong to this model")]
    UnknownVariable(usize),
}

/// Error types for the result extractor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("Model has not been solved yet")]
    NotSolved,

    #[error("Solve finished with status '{0}' and no feasible assignment")]
    NoFeasibleSolution(SolutionStatus),

    #[error("Variable '{variable}' has non-integral value {value}")]
    NonIntegral { variable: String, value: f64 },
}
