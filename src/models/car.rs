//! Modelo de Car
//!
//! Mapea la tabla cars. Las licencias, inspecciones, regiones visitadas e
//! imágenes viven en tablas propias.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::asset::{AssetStatus, OwnershipType};
use crate::models::lookup::LookupTable;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub fleet_no: String,
    pub plate_no_en: String,
    pub plate_no_ar: String,
    pub administrative_unit_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub car_class_id: Option<Uuid>,
    pub manufacturer_id: Option<Uuid>,
    pub car_model_id: Option<Uuid>,
    pub functional_location_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub notification_recipient_id: Option<Uuid>,
    pub contract_type_id: Option<Uuid>,
    pub activity_id: Option<Uuid>,
    pub ownership_type: OwnershipType,
    pub status: AssetStatus,
    pub location_description: String,
    pub address_details: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Car {
    /// Referencias a tablas de consulta: (campo, tabla, id)
    pub fn lookup_refs(&self) -> Vec<(&'static str, LookupTable, Option<Uuid>)> {
        vec![
            ("administrative_unit", LookupTable::AdministrativeUnits, self.administrative_unit_id),
            ("sector", LookupTable::Sectors, self.sector_id),
            ("department", LookupTable::Departments, self.department_id),
            ("division", LookupTable::Divisions, self.division_id),
            ("driver", LookupTable::Drivers, self.driver_id),
            ("car_class", LookupTable::CarClasses, self.car_class_id),
            ("manufacturer", LookupTable::Manufacturers, self.manufacturer_id),
            ("car_model", LookupTable::CarModels, self.car_model_id),
            ("functional_location", LookupTable::FunctionalLocations, self.functional_location_id),
            ("room", LookupTable::Rooms, self.room_id),
            ("notification_recipient", LookupTable::NotificationRecipients, self.notification_recipient_id),
            ("contract_type", LookupTable::ContractTypes, self.contract_type_id),
            ("activity", LookupTable::Activities, self.activity_id),
        ]
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fila de listado: vehículo + fabricante + último mantenimiento + vencimientos vigentes
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CarListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub car: Car,
    pub manufacturer_name_en: Option<String>,
    pub manufacturer_name_ar: Option<String>,
    pub latest_maintenance_date: Option<NaiveDate>,
    pub latest_maintenance_cost: Option<Decimal>,
    pub inspection_end_date: Option<NaiveDate>,
    pub license_end_date: Option<NaiveDate>,
}
