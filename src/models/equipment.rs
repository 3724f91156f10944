//! Modelo de Equipment

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::asset::AssetStatus;
use crate::models::lookup::LookupTable;

pub const MIN_MANUFACTURE_YEAR: i32 = 2000;
pub const MAX_MANUFACTURE_YEAR: i32 = 2030;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Equipment {
    pub id: Uuid,
    pub door_no: String,
    pub plate_no: String,
    pub manufacture_year: Option<i32>,
    pub manufacturer_id: Option<Uuid>,
    pub equipment_model_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub status: AssetStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    pub fn lookup_refs(&self) -> Vec<(&'static str, LookupTable, Option<Uuid>)> {
        vec![
            ("manufacturer", LookupTable::Manufacturers, self.manufacturer_id),
            ("equipment_model", LookupTable::EquipmentModels, self.equipment_model_id),
            ("location", LookupTable::Locations, self.location_id),
            ("sector", LookupTable::Sectors, self.sector_id),
            ("department", LookupTable::Departments, self.department_id),
            ("division", LookupTable::Divisions, self.division_id),
        ]
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EquipmentListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub equipment: Equipment,
    pub manufacturer_name_en: Option<String>,
    pub manufacturer_name_ar: Option<String>,
    pub latest_maintenance_date: Option<NaiveDate>,
    pub latest_maintenance_cost: Option<Decimal>,
    pub inspection_end_date: Option<NaiveDate>,
    pub license_end_date: Option<NaiveDate>,
    pub fire_extinguisher_expiry_date: Option<NaiveDate>,
}
