//! FideliCard portal authentication core
//!
//! - [`SessionStore`]: single-writer session state fed by provider events
//! - [`AuthGateway`]: sign-in, sign-out and password flows
//! - [`ProfileLoader`]: identity to role and company resolution
//! - [`guard::evaluate`]: pure route decision over a session snapshot
//! - [`navigation`]: route table, menus and permissions built on the guard

pub mod error;
pub mod gateway;
pub mod guard;
pub mod navigation;
pub mod profile_loader;
pub mod provider;
pub mod session;
pub mod store;

pub use error::{AuthErrorKind, LoadError, ProviderError, SessionError};
pub use gateway::AuthGateway;
pub use guard::{evaluate, role_home_path, BlockReason, Decision, Redirect, RouteRequest};
pub use navigation::{navigate, post_login_target, Permissions};
pub use profile_loader::{LoadedProfile, ProfileLoader};
pub use provider::{AuthEventKind, IdentityProvider, ProviderEvent};
pub use session::{SessionState, SessionStore};
pub use store::ProfileStore;
