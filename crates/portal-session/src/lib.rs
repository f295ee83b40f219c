pub mod auth;
pub mod routing;

pub use auth::{AuthProvider, Credentials, FrappeAuthProvider, SessionContext, SessionStatus};
pub use routing::{Route, RouteDecision, RouteGate};
