//! Registros de mantenimiento
//!
//! Cada registro pertenece a exactamente un vehículo o un equipo.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::asset::AssetRef;

/// Destino de un registro de mantenimiento
pub type MaintenanceTarget = AssetRef;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub car_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub maintenance_date: Option<NaiveDate>,
    pub restoration_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    pub fn target(&self) -> Option<MaintenanceTarget> {
        AssetRef::from_columns(self.car_id, self.equipment_id)
    }
}

/// Campos editables de un registro de mantenimiento
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceFields {
    pub maintenance_date: Option<NaiveDate>,
    pub restoration_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub description: Option<String>,
}

impl MaintenanceFields {
    /// Un formulario sin ningún dato no genera registro
    pub fn is_empty(&self) -> bool {
        self.maintenance_date.is_none()
            && self.restoration_date.is_none()
            && self.cost.is_none()
            && self.description.as_deref().map_or(true, |d| d.trim().is_empty())
    }
}
