//! Session tracking for AssetGate
//!
//! This module keeps the UI's view of "who is signed in, with which role"
//! consistent with an external auth service:
//! - Trait-based auth service (hosted backend, in-memory for tests)
//! - Auth store that owns the snapshot and resolves roles off the
//!   notification path
//! - Idle monitor that signs out after inactivity
//!
//! # Example
//!
//! ```no_run
//! use assetgate_core::session::{AuthStore, Identity, MemoryAuthService, MemoryRoleDirectory};
//! use assetgate_core::shell::{RecordingShell, Shell};
//! use assetgate_core::rbac::Role;
//! use std::sync::Arc;
//!
//! # async fn example() -> assetgate_core::error::AuthResult<()> {
//! let auth = MemoryAuthService::new();
//! let directory = MemoryRoleDirectory::new();
//! directory.assign("user-1", Role::Employee);
//!
//! let store = AuthStore::new(
//!     Arc::new(auth.clone()),
//!     Arc::new(directory),
//!     Shell::from_shared(Arc::new(RecordingShell::new("/auth/login"))),
//! );
//! store.init().await?;
//!
//! auth.sign_in(Identity::new("user-1"));
//! store.wait_idle().await?;
//! assert!(store.snapshot().role.is_some());
//! # Ok(())
//! # }
//! ```

mod events;
mod idle;
mod manager;
mod memory;
mod store;

pub use events::{AuthEvent, AuthEventKind};
pub use idle::IdleMonitor;
pub use manager::AuthStore;
pub use memory::{MemoryAuthService, MemoryRoleDirectory};
pub use store::{AuthEventHandler, AuthService, Identity, Session, Subscription};
