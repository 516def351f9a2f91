pub mod executor;
pub mod ollama;
pub mod suites;
pub mod sweep;
pub mod task;

pub use executor::{run_batch, run_batch_bounded, run_scenario};
pub use ollama::OllamaClient;
pub use sweep::{SweepController, SweepEvent};
pub use task::run_task;
