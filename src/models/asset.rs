//! Tipos compartidos por vehículos y equipos
//!
//! Estados, tipo de propiedad, referencias polimórficas y registros de fechas.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::permission::ModuleName;
use crate::utils::translations::{self, ModelName};

/// Estado del activo - mapea al ENUM asset_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "asset_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Operational,
    #[default]
    New,
    Defective,
    UnderMaintenance,
}

impl AssetStatus {
    pub fn label_ar(&self) -> &'static str {
        match self {
            AssetStatus::Operational => "عاملة",
            AssetStatus::New => "جديدة",
            AssetStatus::Defective => "معطلة",
            AssetStatus::UnderMaintenance => "تحت الصيانة",
        }
    }
}

/// Tipo de propiedad del vehículo - mapea al ENUM ownership_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "ownership_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OwnershipType {
    #[default]
    Owned,
    LeasedRegular,
    LeasedNonRegular,
    #[sqlx(rename = "leased_emp_24hrs")]
    #[serde(rename = "leased_emp_24hrs")]
    LeasedEmp24Hrs,
}

impl OwnershipType {
    pub fn label_en(&self) -> &'static str {
        match self {
            OwnershipType::Owned => "Owned",
            OwnershipType::LeasedRegular => "Leased - Regular",
            OwnershipType::LeasedNonRegular => "Leased - Non Regular",
            OwnershipType::LeasedEmp24Hrs => "Leased - Emp 24hrs",
        }
    }
}

/// Referencia a exactamente un vehículo o un equipo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AssetRef {
    Car(Uuid),
    Equipment(Uuid),
}

impl AssetRef {
    /// Reconstruye la referencia desde las columnas car_id / equipment_id
    pub fn from_columns(car_id: Option<Uuid>, equipment_id: Option<Uuid>) -> Option<Self> {
        match (car_id, equipment_id) {
            (Some(id), None) => Some(AssetRef::Car(id)),
            (None, Some(id)) => Some(AssetRef::Equipment(id)),
            _ => None,
        }
    }

    /// Valores para las columnas (car_id, equipment_id)
    pub fn columns(&self) -> (Option<Uuid>, Option<Uuid>) {
        match *self {
            AssetRef::Car(id) => (Some(id), None),
            AssetRef::Equipment(id) => (None, Some(id)),
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            AssetRef::Car(id) | AssetRef::Equipment(id) => id,
        }
    }

    pub fn module(&self) -> ModuleName {
        match self {
            AssetRef::Car(_) => ModuleName::Cars,
            AssetRef::Equipment(_) => ModuleName::Equipment,
        }
    }

    pub fn model_name(&self) -> ModelName {
        match self {
            AssetRef::Car(_) => translations::CAR,
            AssetRef::Equipment(_) => translations::EQUIPMENT,
        }
    }
}

/// Registro de licencia o inspección (rango de fechas)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DateRangeRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Registro de inspección de extintor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FireExtinguisherRecord {
    pub id: Uuid,
    pub inspection_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Tablas de registros con rango de fechas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTable {
    License,
    Inspection,
}

impl RecordTable {
    pub fn table(&self) -> &'static str {
        match self {
            RecordTable::License => "license_records",
            RecordTable::Inspection => "inspection_records",
        }
    }
}

/// El registro vigente es el de fecha de inicio más reciente
pub fn current_record(records: &[DateRangeRecord]) -> Option<&DateRangeRecord> {
    records
        .iter()
        .max_by(|a, b| a.start_date.cmp(&b.start_date).then(a.created_at.cmp(&b.created_at)))
}

pub fn current_fire_extinguisher(records: &[FireExtinguisherRecord]) -> Option<&FireExtinguisherRecord> {
    records
        .iter()
        .max_by(|a, b| a.inspection_date.cmp(&b.inspection_date).then(a.created_at.cmp(&b.created_at)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRangeRecord {
        DateRangeRecord {
            id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_asset_ref_columns_are_exclusive() {
        let id = Uuid::new_v4();
        assert_eq!(AssetRef::Car(id).columns(), (Some(id), None));
        assert_eq!(AssetRef::Equipment(id).columns(), (None, Some(id)));
        assert_eq!(AssetRef::from_columns(Some(id), None), Some(AssetRef::Car(id)));
        assert_eq!(AssetRef::from_columns(None, None), None);
        assert_eq!(AssetRef::from_columns(Some(id), Some(id)), None);
    }

    #[test]
    fn test_current_record_is_latest_start() {
        let records = vec![
            record((2023, 1, 1), (2023, 12, 31)),
            record((2024, 1, 1), (2024, 12, 31)),
            record((2022, 1, 1), (2025, 12, 31)),
        ];
        let current = current_record(&records).unwrap();
        assert_eq!(current.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(current_record(&[]).is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&AssetStatus::UnderMaintenance).unwrap(), "\"under_maintenance\"");
        assert_eq!(
            serde_json::from_str::<OwnershipType>("\"leased_emp_24hrs\"").unwrap(),
            OwnershipType::LeasedEmp24Hrs
        );
        assert_eq!(AssetStatus::default(), AssetStatus::New);
    }
}
