use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::asset::AssetStatus;
use crate::models::attachment::{Attachment, AttachmentKind};
use crate::models::lookup::LookupRef;
use crate::models::maintenance::MaintenanceRecord;
use crate::services::expiry::ExpiryStatus;
use crate::services::query::ListQuery;
use crate::utils::validation::parse_bool_param;

// Registro de licencia o inspección en un formulario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DateRangeInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

// Registro de extintor en un formulario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FireExtinguisherInput {
    pub inspection_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

// Registro de mantenimiento (alta desde el formulario del activo o por separado)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceInput {
    pub maintenance_date: Option<NaiveDate>,
    pub restoration_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    pub description: Option<String>,
}

// Listado de vehículos/equipos: búsqueda + ?deleted=true para ver la papelera
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetListQuery {
    #[serde(flatten)]
    pub list: ListQuery,
    pub deleted: Option<String>,
}

impl AssetListQuery {
    pub fn deleted_only(&self) -> bool {
        parse_bool_param(self.deleted.as_deref()).unwrap_or(false)
    }
}

// Parámetros del panel de vencimientos
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub expiry_status: Option<String>,
    pub expiry_days: Option<String>,
}

// Datos para la pantalla de confirmación de borrado
#[derive(Debug, Serialize)]
pub struct DeletePreview {
    pub id: Uuid,
    pub label: String,
    pub is_deleted: bool,
    pub license_records: i64,
    pub inspection_records: i64,
    pub maintenance_records: i64,
    pub attachments: i64,
}

// Archivo adjunto con su URL segura
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    pub id: Uuid,
    pub kind: AttachmentKind,
    pub url: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub is_pdf: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            url: attachment.url(),
            is_pdf: attachment.is_pdf(),
            id: attachment.id,
            kind: attachment.kind,
            original_name: attachment.original_name,
            content_type: attachment.content_type,
            size_bytes: attachment.size_bytes,
            uploaded_at: attachment.uploaded_at,
        }
    }
}

// Fila del panel de vencimientos
#[derive(Debug, Serialize)]
pub struct ExpiringAsset {
    pub id: Uuid,
    pub identifier: String,
    pub plate_no: String,
    pub status: AssetStatus,
    pub status_ar: &'static str,
    pub inspection_end_date: Option<NaiveDate>,
    pub license_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_extinguisher_expiry_date: Option<NaiveDate>,
    pub days_until_inspection_expiry: Option<i64>,
}

// Panel principal
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub expiry_status: ExpiryStatus,
    pub expiry_days: i64,
    pub today: NaiveDate,
    pub cars_expiring: Vec<ExpiringAsset>,
    pub equipment_expiring: Vec<ExpiringAsset>,
}

// Mantenimiento en el detalle compacto de un equipo
#[derive(Debug, Serialize)]
pub struct CompactMaintenance {
    pub maintenance_date: Option<String>,
    pub restoration_date: Option<String>,
    pub cost: Option<String>,
    pub description: Option<String>,
}

impl From<&MaintenanceRecord> for CompactMaintenance {
    fn from(record: &MaintenanceRecord) -> Self {
        Self {
            maintenance_date: record.maintenance_date.map(|d| d.format("%Y-%m-%d").to_string()),
            restoration_date: record.restoration_date.map(|d| d.format("%Y-%m-%d").to_string()),
            cost: record.cost.map(|c| c.to_string()),
            description: record.description.clone(),
        }
    }
}

/// Nombre para mostrar de una referencia opcional (árabe)
pub fn ref_name(reference: Option<&LookupRef>) -> Option<String> {
    reference.map(|r| r.name_ar.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_input_accepts_numeric_and_string_cost() {
        let a: MaintenanceInput = serde_json::from_str(r#"{"cost": 150.5}"#).unwrap();
        let b: MaintenanceInput = serde_json::from_str(r#"{"cost": "150.50"}"#).unwrap();
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.maintenance_date, None);
    }

    #[test]
    fn test_deleted_flag() {
        let mut q = AssetListQuery::default();
        assert!(!q.deleted_only());
        q.deleted = Some("true".to_string());
        assert!(q.deleted_only());
    }
}
