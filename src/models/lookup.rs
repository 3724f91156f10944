//! Tablas de consulta (listas desplegables)
//!
//! Todas comparten las mismas columnas; las diferencias (tabla padre y
//! atributos extra permitidos) se describen en `LookupTable`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::translations::ModelName;

/// Nombre de la fila "sin especificar" de la jerarquía
pub const DUMMY_NAME_AR: &str = "غير محدد";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    AdministrativeUnits,
    Sectors,
    Departments,
    Divisions,
    Drivers,
    CarClasses,
    Manufacturers,
    CarModels,
    EquipmentModels,
    FunctionalLocations,
    Rooms,
    Locations,
    NotificationRecipients,
    ContractTypes,
    Activities,
    Regions,
}

impl LookupTable {
    pub const ALL: [LookupTable; 16] = [
        LookupTable::AdministrativeUnits,
        LookupTable::Sectors,
        LookupTable::Departments,
        LookupTable::Divisions,
        LookupTable::Drivers,
        LookupTable::CarClasses,
        LookupTable::Manufacturers,
        LookupTable::CarModels,
        LookupTable::EquipmentModels,
        LookupTable::FunctionalLocations,
        LookupTable::Rooms,
        LookupTable::Locations,
        LookupTable::NotificationRecipients,
        LookupTable::ContractTypes,
        LookupTable::Activities,
        LookupTable::Regions,
    ];

    /// Segmento de URL
    pub fn key(&self) -> &'static str {
        match self {
            LookupTable::AdministrativeUnits => "administrative-units",
            LookupTable::Sectors => "sectors",
            LookupTable::Departments => "departments",
            LookupTable::Divisions => "divisions",
            LookupTable::Drivers => "drivers",
            LookupTable::CarClasses => "car-classes",
            LookupTable::Manufacturers => "manufacturers",
            LookupTable::CarModels => "car-models",
            LookupTable::EquipmentModels => "equipment-models",
            LookupTable::FunctionalLocations => "functional-locations",
            LookupTable::Rooms => "rooms",
            LookupTable::Locations => "locations",
            LookupTable::NotificationRecipients => "notification-recipients",
            LookupTable::ContractTypes => "contract-types",
            LookupTable::Activities => "activities",
            LookupTable::Regions => "regions",
        }
    }

    /// Nombre de la tabla SQL (solo valores estáticos, seguros para interpolar)
    pub fn table(&self) -> &'static str {
        match self {
            LookupTable::AdministrativeUnits => "administrative_units",
            LookupTable::Sectors => "sectors",
            LookupTable::Departments => "departments",
            LookupTable::Divisions => "divisions",
            LookupTable::Drivers => "drivers",
            LookupTable::CarClasses => "car_classes",
            LookupTable::Manufacturers => "manufacturers",
            LookupTable::CarModels => "car_models",
            LookupTable::EquipmentModels => "equipment_models",
            LookupTable::FunctionalLocations => "functional_locations",
            LookupTable::Rooms => "rooms",
            LookupTable::Locations => "locations",
            LookupTable::NotificationRecipients => "notification_recipients",
            LookupTable::ContractTypes => "contract_types",
            LookupTable::Activities => "activities",
            LookupTable::Regions => "regions",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    pub fn parent(&self) -> Option<LookupTable> {
        match self {
            LookupTable::Departments => Some(LookupTable::Sectors),
            LookupTable::Divisions => Some(LookupTable::Departments),
            LookupTable::CarModels | LookupTable::EquipmentModels => Some(LookupTable::Manufacturers),
            _ => None,
        }
    }

    pub fn parent_required(&self) -> bool {
        matches!(self, LookupTable::CarModels | LookupTable::EquipmentModels)
    }

    /// Atributos extra aceptados en la columna JSONB
    pub fn attribute_keys(&self) -> &'static [&'static str] {
        match self {
            LookupTable::Drivers => &["license_number", "phone"],
            LookupTable::CarModels => &["year"],
            LookupTable::Rooms => &["building", "floor"],
            LookupTable::NotificationRecipients => &["email", "phone"],
            _ => &[],
        }
    }

    pub fn model_name(&self) -> ModelName {
        match self {
            LookupTable::AdministrativeUnits => {
                ModelName::new("Administrative unit", "إدارة", "Administrative units", "الإدارات")
            }
            LookupTable::Sectors => ModelName::new("Sector", "قطاع", "Sectors", "القطاعات"),
            LookupTable::Departments => ModelName::new("Department", "قسم", "Departments", "الأقسام"),
            LookupTable::Divisions => ModelName::new("Division", "دائرة", "Divisions", "الدوائر"),
            LookupTable::Drivers => ModelName::new("Driver", "سائق", "Drivers", "السائقين"),
            LookupTable::CarClasses => ModelName::new("Car class", "فئة السيارة", "Car classes", "فئات السيارات"),
            LookupTable::Manufacturers => {
                ModelName::new("Manufacturer", "شركة مصنعة", "Manufacturers", "الشركات المصنعة")
            }
            LookupTable::CarModels => ModelName::new("Car model", "موديل سيارة", "Car models", "موديلات السيارات"),
            LookupTable::EquipmentModels => {
                ModelName::new("Equipment model", "موديل معدة", "Equipment models", "موديلات المعدات")
            }
            LookupTable::FunctionalLocations => ModelName::new(
                "Functional location",
                "موقع وظيفي",
                "Functional locations",
                "المواقع الوظيفية",
            ),
            LookupTable::Rooms => ModelName::new("Room", "غرفة", "Rooms", "الغرف"),
            LookupTable::Locations => ModelName::new("Location", "موقع", "Locations", "المواقع"),
            LookupTable::NotificationRecipients => ModelName::new(
                "Notification recipient",
                "مستلم إشعار",
                "Notification recipients",
                "مستلمي الإشعارات",
            ),
            LookupTable::ContractTypes => ModelName::new("Contract type", "نوع عقد", "Contract types", "أنواع العقود"),
            LookupTable::Activities => ModelName::new("Activity", "نشاط", "Activities", "الأنشطة"),
            LookupTable::Regions => ModelName::new("Region", "منطقة", "Regions", "المناطق"),
        }
    }

    /// Niveles de la jerarquía organizativa (sector → departamento → división)
    pub fn is_hierarchy_level(&self) -> bool {
        matches!(self, LookupTable::Sectors | LookupTable::Departments | LookupTable::Divisions)
    }
}

/// Fila de cualquier tabla de consulta
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct LookupItem {
    pub id: Uuid,
    pub name_en: String,
    pub name_ar: String,
    pub is_dummy: bool,
    pub parent_id: Option<Uuid>,
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Referencia compacta (id + nombres) para incrustar en otras respuestas
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LookupRef {
    pub id: Uuid,
    pub name_en: String,
    pub name_ar: String,
}

impl LookupRef {
    /// Construye la referencia si las tres columnas del LEFT JOIN existen
    pub fn from_parts(id: Option<Uuid>, name_en: Option<String>, name_ar: Option<String>) -> Option<Self> {
        match (id, name_en, name_ar) {
            (Some(id), Some(name_en), Some(name_ar)) => Some(Self { id, name_en, name_ar }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for table in LookupTable::ALL {
            assert_eq!(LookupTable::from_key(table.key()), Some(table));
        }
        assert_eq!(LookupTable::from_key("users"), None);
    }

    #[test]
    fn test_hierarchy_parents() {
        assert_eq!(LookupTable::Divisions.parent(), Some(LookupTable::Departments));
        assert_eq!(LookupTable::Departments.parent(), Some(LookupTable::Sectors));
        assert_eq!(LookupTable::Sectors.parent(), None);
        assert!(LookupTable::CarModels.parent_required());
        assert!(!LookupTable::Departments.parent_required());
    }

    #[test]
    fn test_attribute_whitelist() {
        assert_eq!(LookupTable::Drivers.attribute_keys(), &["license_number", "phone"]);
        assert!(LookupTable::Regions.attribute_keys().is_empty());
    }
}
