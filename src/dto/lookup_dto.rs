use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::models::lookup::LookupTable;
use crate::services::query::ListQuery;
use crate::utils::errors::{AppResult, FieldErrors};
use crate::utils::translations::Localized;
use crate::utils::validation::validate_not_blank;

// Request para crear o actualizar una fila de una tabla de consulta
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LookupRequest {
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name_en: String,
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub name_ar: String,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl LookupRequest {
    /// Valida padre y atributos según la tabla destino
    pub fn check(&self, table: LookupTable) -> AppResult<()> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from_validation(&e),
        };

        match (table.parent(), self.parent_id) {
            (Some(_), None) if table.parent_required() => {
                errors.add("parent_id", crate::utils::translations::field_required());
            }
            (None, Some(_)) => errors.add(
                "parent_id",
                Localized::new("This table has no parent.", "هذا الجدول لا يحتوي على عنصر أب."),
            ),
            _ => {}
        }

        let allowed = table.attribute_keys();
        for (key, value) in &self.attributes {
            if !allowed.contains(&key.as_str()) {
                errors.add(
                    format!("attributes.{}", key),
                    Localized::new(
                        format!("Unknown attribute '{}'.", key),
                        format!("الخاصية '{}' غير معروفة.", key),
                    ),
                );
            } else if !matches!(value, Value::String(_) | Value::Number(_) | Value::Null) {
                errors.add(
                    format!("attributes.{}", key),
                    Localized::new("Must be text or a number.", "يجب أن تكون نصاً أو رقماً."),
                );
            }
        }

        errors.into_result()
    }

    /// Atributos sin valores nulos, listos para la columna JSONB
    pub fn attributes_json(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

// Entrada del catálogo de tablas
#[derive(Debug, Serialize)]
pub struct LookupTableInfo {
    pub key: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
    pub plural_en: &'static str,
    pub plural_ar: &'static str,
    pub parent: Option<&'static str>,
    pub parent_required: bool,
    pub attributes: &'static [&'static str],
}

impl From<LookupTable> for LookupTableInfo {
    fn from(table: LookupTable) -> Self {
        let name = table.model_name();
        Self {
            key: table.key(),
            name_en: name.en,
            name_ar: name.ar,
            plural_en: name.plural_en,
            plural_ar: name.plural_ar,
            parent: table.parent().map(|p| p.key()),
            parent_required: table.parent_required(),
            attributes: table.attribute_keys(),
        }
    }
}

// Listado de una tabla de consulta, opcionalmente filtrado por su padre
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupListQuery {
    #[serde(flatten)]
    pub list: ListQuery,
    pub parent_id: Option<String>,
}

impl LookupListQuery {
    pub fn parent_id(&self) -> Option<Uuid> {
        self.parent_id.as_deref().and_then(|v| Uuid::parse_str(v.trim()).ok())
    }
}

// Filtros de los desplegables en cascada
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HierarchyQuery {
    pub sector_id: Option<String>,
    pub department_id: Option<String>,
}

impl HierarchyQuery {
    fn parse(raw: &Option<String>) -> Option<Uuid> {
        raw.as_deref().and_then(|v| Uuid::parse_str(v.trim()).ok())
    }

    pub fn sector_id(&self) -> Option<Uuid> {
        Self::parse(&self.sector_id)
    }

    pub fn department_id(&self) -> Option<Uuid> {
        Self::parse(&self.department_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> LookupRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_attribute_whitelist() {
        let req = request(json!({
            "name_en": "Ali", "name_ar": "علي",
            "attributes": {"phone": "0500000000", "salary": 10}
        }));
        assert!(req.check(LookupTable::Drivers).is_err());

        let req = request(json!({
            "name_en": "Ali", "name_ar": "علي",
            "attributes": {"phone": "0500000000", "license_number": null}
        }));
        assert!(req.check(LookupTable::Drivers).is_ok());
        assert_eq!(req.attributes_json(), json!({"phone": "0500000000"}));
    }

    #[test]
    fn test_parent_rules() {
        let no_parent = request(json!({"name_en": "Corolla", "name_ar": "كورولا"}));
        assert!(no_parent.check(LookupTable::CarModels).is_err());
        // el departamento puede quedar sin sector
        assert!(no_parent.check(LookupTable::Departments).is_ok());

        let with_parent = request(json!({
            "name_en": "North", "name_ar": "الشمال", "parent_id": Uuid::new_v4()
        }));
        assert!(with_parent.check(LookupTable::Regions).is_err());
        assert!(with_parent.check(LookupTable::CarModels).is_ok());
    }

    #[test]
    fn test_hierarchy_query_ignores_invalid_ids() {
        let q = HierarchyQuery {
            sector_id: Some("not-a-uuid".to_string()),
            department_id: None,
        };
        assert_eq!(q.sector_id(), None);
    }
}
