use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::asset_dto::{AttachmentResponse, DateRangeInput, MaintenanceInput};
use crate::models::asset::{AssetStatus, DateRangeRecord, OwnershipType};
use crate::models::car::Car;
use crate::models::lookup::LookupRef;
use crate::models::maintenance::{MaintenanceFields, MaintenanceRecord};
use crate::services::expiry::ExpirySummary;
use crate::services::records;
use crate::utils::errors::{AppResult, FieldErrors};
use crate::utils::validation::{non_empty, validate_not_blank};

// Request para crear o actualizar un vehículo (formulario completo)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CarRequest {
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub fleet_no: String,
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
    pub plate_no_en: String,
    #[validate(length(min = 1, max = 50), custom = "validate_not_blank")]
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
    #[serde(default)]
    pub ownership_type: OwnershipType,
    #[serde(default)]
    pub status: AssetStatus,
    #[validate(length(min = 1, max = 500), custom = "validate_not_blank")]
    pub location_description: String,
    #[validate(length(max = 1000))]
    pub address_details: Option<String>,
    /// Nombres de regiones visitadas; las nuevas se crean
    #[serde(default)]
    pub visited_regions: Vec<String>,
    #[serde(default)]
    pub license_records: Vec<DateRangeInput>,
    #[serde(default)]
    pub inspection_records: Vec<DateRangeInput>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceInput>,
    /// Solo en actualización: registros de mantenimiento a eliminar
    #[serde(default)]
    pub delete_maintenance_ids: Vec<Uuid>,
}

impl CarRequest {
    /// Valida el formulario completo y devuelve los mantenimientos no vacíos
    pub fn check(&self) -> AppResult<Vec<MaintenanceFields>> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from_validation(&e),
        };
        records::check_license_records(&self.license_records, &mut errors);
        records::check_inspection_records(&self.inspection_records, &mut errors);

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

    /// Nombres de región normalizados y sin duplicados, en orden de aparición
    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.visited_regions.iter().filter_map(|n| non_empty(Some(n.clone()))) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

// Detalle completo de un vehículo
#[derive(Debug, Serialize)]
pub struct CarDetailResponse {
    #[serde(flatten)]
    pub car: Car,
    pub status_ar: &'static str,
    pub ownership_type_en: &'static str,
    pub references: BTreeMap<&'static str, LookupRef>,
    pub visited_regions: Vec<LookupRef>,
    pub license_records: Vec<DateRangeRecord>,
    pub inspection_records: Vec<DateRangeRecord>,
    pub current_license: Option<DateRangeRecord>,
    pub current_inspection: Option<DateRangeRecord>,
    pub expiry: ExpirySummary,
    pub maintenance_records: Vec<MaintenanceRecord>,
    pub images: Vec<AttachmentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CarRequest {
        serde_json::from_value(serde_json::json!({
            "fleet_no": "F-100",
            "plate_no_en": "ABC 123",
            "plate_no_ar": "أ ب ج ١٢٣",
            "location_description": "Main garage",
            "visited_regions": ["North", " North ", "", "South"],
            "license_records": [{"start_date": "2024-01-01", "end_date": "2024-12-31"}],
            "inspection_records": [{"start_date": "2024-01-01", "end_date": "2024-12-31"}],
            "maintenance": [{}, {"maintenance_date": "2024-02-01", "cost": "120.00"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_and_valid_request() {
        let req = request();
        assert_eq!(req.status, AssetStatus::New);
        assert_eq!(req.ownership_type, OwnershipType::Owned);
        // el mantenimiento vacío se descarta
        assert_eq!(req.check().unwrap().len(), 1);
        assert_eq!(req.region_names(), vec!["North".to_string(), "South".to_string()]);
    }

    #[test]
    fn test_missing_records_and_blank_fields() {
        let mut req = request();
        req.fleet_no = "   ".to_string();
        req.inspection_records.clear();
        match req.check() {
            Err(crate::utils::errors::AppError::Fields(fields)) => {
                assert!(fields.contains("fleet_no"));
                assert!(fields.contains("inspection_records"));
                assert!(!fields.contains("license_records"));
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.len())),
        }
    }
}
