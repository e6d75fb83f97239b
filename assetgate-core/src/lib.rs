//! AssetGate - Core
//!
//! Role-based access control and session state for an asset-management
//! dashboard whose identities live in an external auth service.
//!
//! # Overview
//!
//! AssetGate keeps one authoritative answer to "who is signed in, and with which
//! role" and gates views on it. Two roles exist, `employee` and `admin`; admin
//! includes everything an employee can do.
//!
//! ```rust,ignore
//! use assetgate_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AssetGateConfig::load()?;
//!     config.validate()?;
//!     init_logging(&config.logging.to_logging_config()?)?;
//!
//!     let store = AuthStore::new(auth_service, role_directory, shell.clone())
//!         .with_config(config.auth.clone());
//!     store.init().await?;
//!
//!     let mut users_page = AccessGuard::new(vec![Role::Admin], UsersPage)?
//!         .with_redirect("/");
//!     let view = users_page.render(&store.snapshot(), &shell);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`rbac`] - Roles, the rank hierarchy and the permission evaluator
//! - [`session`] - Auth service seam, the auth store and the idle monitor
//! - [`guard`] - Declarative access guards
//! - [`shell`] - Navigation and notification seams
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - Backend for the `log` facade

pub mod config; // Configuration system with TOML support
pub mod error;
pub mod guard; // Declarative view gates
pub mod logging; // Logging backend for the standard log crate
pub mod rbac; // Role-Based Access Control
pub mod session; // Auth store and collaborators
pub mod shell; // Navigation and notifications

// Re-export the derive macro so users only need one crate
pub use assetgate_macros::RoleRank;

// Prelude module for convenient imports
pub mod prelude;

// Re-exports of main types and traits
pub use error::{AuthError, AuthResult};
pub use guard::{AccessDecision, AccessGuard, DenialNotice, View};
pub use rbac::{has_permission, AuthSnapshot, PermissionChecker, Role, RoleHierarchy};
pub use session::AuthStore;
