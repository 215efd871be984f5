pub mod traits;
pub mod run;
pub mod evolution;
pub mod model;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use run::RunConfig;
pub use evolution::{EvolutionConfig, Initializer, Mutation, Crossover};
pub use model::ModelConfig;
