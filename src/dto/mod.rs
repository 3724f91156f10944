//! Data Transfer Objects
//!
//! Requests y responses de la API JSON.

pub mod admin_dto;
pub mod asset_dto;
pub mod auth_dto;
pub mod car_dto;
pub mod common_dto;
pub mod equipment_dto;
pub mod lookup_dto;

pub use common_dto::ApiResponse;
