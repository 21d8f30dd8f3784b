pub mod lesson;
pub mod progress;
pub mod protocol;
pub mod rest;
pub mod scenarios;
pub mod state;

// Re-export the router builder to make it easily accessible
// to the binaries and the integration tests.
pub use rest::{build_router, ApiDoc};
pub use state::AppState;
