use super::graph::Tier;
use crate::domain::ModelError;

/// Malformed supply-chain data, detected before any solve
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("Node '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("Product '{0}' is declared more than once")]
    DuplicateProduct(String),

    #[error("Route {from} -> {to} references unknown node '{node}'")]
    UnknownNode {
        from: String,
        to: String,
        node: String,
    },

    #[error("Route {from} -> {to} must connect a {expected_from} to a {expected_to}")]
    TierMismatch {
        from: String,
        to: String,
        expected_from: Tier,
        expected_to: Tier,
    },

    #[error("Route {from} -> {to} is declared more than once")]
    DuplicateRoute { from: String, to: String },

    #[error("Invalid {what}: {value} (must be finite and non-negative)")]
    InvalidScalar { what: String, value: f64 },

    #[error("'{node}' references unknown product '{product}'")]
    UnknownProduct { node: String, product: String },

    #[error("Roastery '{roastery}' ships to cafes but has no roasting cost for '{product}'")]
    MissingRoastingCost { roastery: String, product: String },

    #[error("Cafe '{cafe}' has no demand entry for '{product}'")]
    MissingDemand { cafe: String, product: String },

    #[error("Variable '{variable}' appears in {found} {family} constraints, expected {expected}")]
    CoverageMismatch {
        family: &'static str,
        variable: String,
        expected: u32,
        found: u32,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}
