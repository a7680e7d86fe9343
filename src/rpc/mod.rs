//! Procedure registry, access tiers and dispatch.

pub mod dispatch;
pub mod registry;
pub mod tier;
pub mod validate;

pub use dispatch::Dispatcher;
pub use registry::{Namespace, Procedure, ProcedureKind, Registry, RegistryBuilder, RegistryError};
pub use tier::AccessTier;
pub use validate::{FieldErrors, NoInput, Validate};
