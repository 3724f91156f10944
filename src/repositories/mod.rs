//! Acceso a datos (PostgreSQL)

pub mod attachment_repository;
pub mod audit_repository;
pub mod car_repository;
pub mod equipment_repository;
pub mod lookup_repository;
pub mod maintenance_repository;
pub mod permission_repository;
pub mod record_repository;
pub mod user_repository;

pub use attachment_repository::AttachmentRepository;
pub use audit_repository::AuditRepository;
pub use car_repository::CarRepository;
pub use equipment_repository::EquipmentRepository;
pub use lookup_repository::LookupRepository;
pub use maintenance_repository::MaintenanceRepository;
pub use permission_repository::PermissionRepository;
pub use record_repository::RecordRepository;
pub use user_repository::UserRepository;
