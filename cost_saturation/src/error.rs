//! Error taxonomy for the cost-partitioning layer.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CostSaturationError {
    #[error("abstraction collection index exceeds 32-bit range")]
    Overflow,
    #[error("cost partitioning LP is infeasible")]
    Infeasible,
}
