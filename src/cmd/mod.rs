//! CLI command implementations.
//!
//! | Module    | Commands handled                      |
//! |-----------|---------------------------------------|
//! | `session` | `Login`, `Reset`                      |
//! | `scope`   | `Status`, `Factories`, `Use`, `Observe` |

pub mod scope;
pub mod session;

pub use scope::{cmd_factories, cmd_observe, cmd_status, cmd_use};
pub use session::{cmd_login, cmd_reset};
