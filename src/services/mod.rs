//! Services module
//!
//! Lógica de negocio independiente de HTTP: composición de consultas,
//! vencimientos, permisos, auditoría y archivos.

pub mod audit;
pub mod auth;
pub mod expiry;
pub mod export;
pub mod hierarchy;
pub mod media;
pub mod query;
pub mod rbac;
pub mod records;

pub use expiry::{ExpiryFilter, ExpiryStatus};
pub use media::{LocalMediaStorage, MediaStorage};
pub use query::{ListQuery, ListSpec, Page, Pagination};
pub use rbac::AccessContext;
