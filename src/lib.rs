pub mod agent;
pub mod error;
pub mod protocol;
pub mod simulation;
pub mod transport;
pub mod updater;

pub use agent::Agent;
pub use error::{Error, Result};
pub use simulation::{SimConfig, Simulation};
pub use transport::{HttpTransport, UpdateTransport};

pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::error::{Error, Result};
    pub use crate::protocol::request::Request;
    pub use crate::protocol::response::Response;
    pub use crate::simulation::{SimConfig, Simulation};
    pub use crate::transport::{HttpTransport, UpdateTransport};
    pub use crate::updater::{ArtifactFetcher, UpdateApplier};
}
