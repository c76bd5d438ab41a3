pub mod error;
pub mod http;
pub mod mock;
pub mod scenario;
pub mod settings;
pub mod synth;

pub use error::PerfdashError;
pub use http::{ApiClient, ApiClientBuilder};
pub use mock::MockGateway;
pub use scenario::{classify, Scenario};
pub use settings::{ClientSettings, SimulationSettings};
