use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::asset_dto::{
    AttachmentResponse, CompactMaintenance, DateRangeInput, FireExtinguisherInput, MaintenanceInput,
};
use crate::models::asset::{AssetStatus, DateRangeRecord, FireExtinguisherRecord};
use crate::models::equipment::Equipment;
use crate::models::lookup::LookupRef;
use crate::models::maintenance::{MaintenanceFields, MaintenanceRecord};
use crate::services::expiry::ExpirySummary;
use crate::services::records;
use crate::utils::errors::{AppResult, FieldErrors};
use crate::utils::validation::validate_not_blank;

// Request para crear o actualizar un equipo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EquipmentRequest {
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub door_no: String,
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub plate_no: String,
    #[validate(range(min = 2000, max = 2030))]
    pub manufacture_year: Option<i32>,
    pub manufacturer_id: Option<Uuid>,
    pub equipment_model_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub sector_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    #[serde(default)]
    pub status: AssetStatus,
    #[serde(default)]
    pub license_records: Vec<DateRangeInput>,
    #[serde(default)]
    pub inspection_records: Vec<DateRangeInput>,
    #[serde(default)]
    pub fire_extinguisher_records: Vec<FireExtinguisherInput>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceInput>,
    #[serde(default)]
    pub delete_maintenance_ids: Vec<Uuid>,
}

impl EquipmentRequest {
    pub fn check(&self) -> AppResult<Vec<MaintenanceFields>> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from_validation(&e),
        };
        records::check_license_records(&self.license_records, &mut errors);
        records::check_inspection_records(&self.inspection_records, &mut errors);
        records::check_fire_extinguisher_records(&self.fire_extinguisher_records, &mut errors);

        let maintenance: Vec<MaintenanceFields> = self
            .maintenance
            .iter()
            .enumerate()
            .map(|(i, m)| records::check_maintenance(&format!("maintenance[{}]", i), m, &mut errors))
            .filter(|m| !m.is_empty())
            .collect();

        errors.into_result()?;
        Ok(maintenance)
    }
}

// Detalle completo de un equipo
#[derive(Debug, Serialize)]
pub struct EquipmentDetailResponse {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub status_ar: &'static str,
    pub references: BTreeMap<&'static str, LookupRef>,
    pub license_records: Vec<DateRangeRecord>,
    pub inspection_records: Vec<DateRangeRecord>,
    pub fire_extinguisher_records: Vec<FireExtinguisherRecord>,
    pub current_license: Option<DateRangeRecord>,
    pub current_inspection: Option<DateRangeRecord>,
    pub current_fire_extinguisher: Option<FireExtinguisherRecord>,
    pub expiry: ExpirySummary,
    pub maintenance_records: Vec<MaintenanceRecord>,
    pub images: Vec<AttachmentResponse>,
    pub calibration_certificates: Vec<AttachmentResponse>,
    pub fire_extinguisher_images: Vec<AttachmentResponse>,
}

// Detalle compacto para ventanas emergentes
#[derive(Debug, Serialize)]
pub struct EquipmentCompactResponse {
    pub id: Uuid,
    pub door_no: String,
    pub plate_no: String,
    pub manufacture_year: Option<i32>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub sector: Option<String>,
    pub status: AssetStatus,
    pub status_display: &'static str,
    pub license_start_date: Option<String>,
    pub license_end_date: Option<String>,
    pub inspection_start_date: Option<String>,
    pub inspection_end_date: Option<String>,
    pub image_urls: Vec<String>,
    pub calibration_certificates: Vec<String>,
    pub maintenance_records: Vec<CompactMaintenance>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;

    fn request(year: i32) -> EquipmentRequest {
        serde_json::from_value(serde_json::json!({
            "door_no": "D-7",
            "plate_no": "EQ 7",
            "manufacture_year": year,
            "license_records": [{"start_date": "2024-01-01", "end_date": "2024-12-31"}],
            "inspection_records": [{"start_date": "2024-01-01", "end_date": "2024-12-31"}],
            "fire_extinguisher_records": [{"inspection_date": "2024-03-01", "expiry_date": "2024-02-01"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_year_range_and_fire_extinguisher_dates() {
        match request(1999).check() {
            Err(AppError::Fields(fields)) => {
                assert!(fields.contains("manufacture_year"));
                assert!(fields.contains("fire_extinguisher_records[0].expiry_date"));
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_valid_equipment() {
        let mut req = request(2020);
        req.fire_extinguisher_records.clear();
        assert!(req.check().unwrap().is_empty());
    }
}
