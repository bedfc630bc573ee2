//! Storegate - session, token, and permission core for the store admin client
//!
//! The client-side authority for who is signed in and what they may see:
//! - `token` decodes the payload of a bearer token without verifying it;
//!   the remote service stays the authority for every state-changing call.
//! - `session` owns the authenticated-session lifecycle (init/login/register/
//!   logout) and persists the issued token.
//! - `authz` caches the permissions granted to the current role and answers
//!   module/action queries, failing closed on any ambiguity.
//! - `guards` turn session and permission state into navigation decisions.
//!
//! Wiring order matters: initialize the session first, then refresh the
//! authorizer from the settled state, then let guards evaluate routes.
//!
//! ```no_run
//! use std::sync::Arc;
//! use storegate::{AuthApi, Authorizer, PermissionApi, PrefStore, Session, Settings};
//!
//! # async fn run() -> storegate::AuthResult<()> {
//! let settings = Settings::load()?;
//! let prefs = Arc::new(PrefStore::new(settings.store.path.clone()));
//! let auth = Arc::new(AuthApi::new(&settings.api, prefs.clone())?);
//! let perms = Arc::new(PermissionApi::new(&settings.api, prefs.clone())?);
//!
//! let session = Session::new(auth, prefs);
//! let authorizer = Authorizer::new(perms);
//!
//! session.init().await;
//! authorizer.refresh(&session.current().await).await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod authz;
pub mod config;
pub mod error;
pub mod guards;
pub mod models;
pub mod session;
pub mod storage;
pub mod token;

pub use api::{AuthApi, AuthBackend, PermissionApi, PermissionBackend};
pub use authz::{normalize_role, Authorizer, PermissionSet, SUPER_ROLE};
pub use config::Settings;
pub use error::{AuthError, AuthResult};
pub use guards::{GuardDecision, ModuleGuard, RoleGuard};
pub use models::{Permission, Role, RolePermission, User};
pub use session::{Session, SessionState};
pub use storage::{PrefStore, Theme};
pub use token::{decode, is_expired, Claims};
