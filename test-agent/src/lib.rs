//! End-to-end agent that submits a payment through a node's GraphQL API and
//! checks its effects through the Rosetta Data API.

pub mod clients;
pub mod config;
pub mod error;
pub mod expectation;
pub mod retry;
pub mod scenario;

pub use clients::{DynError, QueryClient, TransactionClient};
pub use config::{AgentConfig, ConfigError, PaymentSettings, ScenarioSettings};
pub use error::{AgentError, Step};
pub use expectation::{ExpectedAccount, ExpectedOperation, MismatchReason};
pub use retry::{retry, Attempt, Probe, RetryError, RetryPolicy, RetryTimeout};
pub use scenario::ScenarioRunner;
