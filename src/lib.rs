pub mod config;
pub mod errors;
pub mod scope;

pub use errors::{ScopeError, SourceError};
pub use scope::handle::ScopeHandle;
pub use scope::models::{Factory, ScopeSnapshot, SessionIdentity, UserRole};
pub use scope::persist::ScopeSelection;
pub use scope::source::{FactorySource, RestFactorySource, StaticFactorySource};
