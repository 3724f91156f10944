//! Utilidades compartidas
//!
//! Errores, validación, JWT y traducciones.

pub mod errors;
pub mod jwt;
pub mod translations;
pub mod validation;

pub use errors::{AppError, AppResult};
