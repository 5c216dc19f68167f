//! Multi-tenant factory scoping for the inventory platform.
//!
//! Every tenant-scoped read or write in the system filters by exactly one
//! factory id, and this module is the single authority on which id that
//! is. It tracks the session's *active* factory (the one the user is
//! logged into for writes) and an optional *viewing* factory (observer
//! mode: a temporary read-oriented look at another plant), and fails
//! closed until the login-time load completes so no query can run against
//! an undefined tenant.
//!
//! | Module     | Responsibility                                        |
//! |------------|-------------------------------------------------------|
//! | `models`   | `Factory`, `UserRole`, session identity, snapshots    |
//! | `resolver` | the scope state machine (load / switch / observe)     |
//! | `handle`   | shared async handle + change notification             |
//! | `source`   | factory-list backends (REST, in-memory)               |
//! | `persist`  | selection persistence across restarts                 |

pub mod handle;
pub mod models;
pub mod persist;
pub mod resolver;
pub mod source;

pub use handle::ScopeHandle;
pub use models::{Factory, ScopeSnapshot, SessionIdentity, UserRole};
pub use persist::ScopeSelection;
pub use resolver::FactoryScope;
pub use source::{FactorySource, RestFactorySource, StaticFactorySource};
