pub mod operators;
pub mod policy;
pub mod genetic;

pub use operators::{GeneOperators, NumericOperators, rng_for, tournament_selection};
pub use policy::{FetchOutcome, PolicyContext, SelectionPolicy};
pub use genetic::GeneticPolicy;
