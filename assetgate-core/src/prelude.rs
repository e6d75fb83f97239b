//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use assetgate_core::prelude::*;
//! ```

// === Configuration ===
pub use crate::config::{AssetGateConfig, AuthConfig, IdleConfig, RbacConfig};
pub use crate::logging::{init_logging, LoggingConfig};

// === Roles and evaluation ===
pub use crate::rbac::{has_permission, AuthSnapshot, PermissionChecker, Role, RoleDirectory, RoleHierarchy};

// === Session ===
pub use crate::session::{
    AuthEvent, AuthEventKind, AuthService, AuthStore, IdleMonitor, Identity, Session, Subscription,
};

// === Guards and shell ===
pub use crate::guard::{AccessDecision, AccessGuard, DenialNotice, View};
pub use crate::shell::{Navigator, Notifier, Severity, Shell};

// === Errors ===
pub use crate::error::{AuthError, AuthResult};
