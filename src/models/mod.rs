//! Modelos de datos
//!
//! Structs que mapean las tablas PostgreSQL y los ENUM del esquema.

pub mod asset;
pub mod attachment;
pub mod audit;
pub mod car;
pub mod equipment;
pub mod lookup;
pub mod maintenance;
pub mod permission;
pub mod user;

pub use asset::{AssetRef, AssetStatus, DateRangeRecord, FireExtinguisherRecord, OwnershipType};
pub use attachment::{Attachment, AttachmentKind};
pub use car::{Car, CarListItem};
pub use equipment::{Equipment, EquipmentListItem};
pub use lookup::{LookupItem, LookupRef, LookupTable};
pub use maintenance::{MaintenanceRecord, MaintenanceTarget};
pub use permission::{ModuleName, PermissionGrant, PermissionType};
pub use user::{User, UserProfile, UserType, UserWithProfile};
