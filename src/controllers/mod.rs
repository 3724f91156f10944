//! Controladores: reglas de negocio entre las rutas y los repositorios
//!
//! Cada operación comprueba permisos, llama a los repositorios y deja
//! constancia en el registro de acciones.

pub mod admin_controller;
pub mod attachment_controller;
pub mod audit_controller;
pub mod auth_controller;
pub mod car_controller;
pub mod dashboard_controller;
pub mod equipment_controller;
pub mod lookup_controller;
pub mod maintenance_controller;

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::audit::{ActionType, NewAction};
use crate::models::lookup::LookupTable;
use crate::repositories::{AuditRepository, LookupRepository};
use crate::utils::errors::{AppResult, FieldErrors};
use crate::utils::translations::Localized;

/// Descripción del registro de acciones: "árabe (inglés)"
pub fn describe(message: &Localized) -> String {
    format!("{} ({})", message.ar, message.en)
}

/// Escribe en action_logs; un fallo de auditoría no aborta la operación
pub struct ActionRecorder {
    repository: AuditRepository,
}

impl ActionRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AuditRepository::new(pool),
        }
    }

    pub async fn record(
        &self,
        actor: &AuthenticatedUser,
        client: &ClientInfo,
        action_type: ActionType,
        module_name: &str,
        object_id: Option<Uuid>,
        description: &Localized,
    ) {
        let action = NewAction {
            user_id: Some(actor.user.id),
            action_type,
            module_name: module_name.to_string(),
            object_id: object_id.map(|id| id.to_string()),
            description: describe(description),
            ip_address: client.ip.clone(),
        };
        if let Err(e) = self.repository.log_action(action).await {
            error!("❌ Error registrando acción {:?} en {}: {}", action_type, module_name, e);
        }
    }
}

/// Comprobación padre/hijo de un formulario: (campo, tabla hija, id hijo, id padre)
pub type HierarchyCheck = (&'static str, LookupTable, Option<Uuid>, Option<Uuid>);

/// Verifica que cada hijo pertenezca al padre elegido. Las filas "sin especificar"
/// valen bajo cualquier padre.
pub async fn check_hierarchy(lookups: &LookupRepository, checks: &[HierarchyCheck]) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    for (field, table, child, parent) in checks {
        if let (Some(child), Some(parent)) = (child, parent) {
            if lookups.belongs_to(*table, *child, *parent).await? || lookups.is_dummy(*table, *child).await? {
                continue;
            }
            let parent_label = table
                .parent()
                .map(|p| p.model_name())
                .unwrap_or_else(|| table.model_name());
            errors.add(
                *field,
                Localized::new(
                    format!(
                        "The selected {} does not belong to the selected {}.",
                        table.model_name().en.to_lowercase(),
                        parent_label.en.to_lowercase()
                    ),
                    format!("{} المحدد لا يتبع {} المحدد.", table.model_name().ar, parent_label.ar),
                ),
            );
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_carries_both_languages() {
        let message = Localized::new("Car created successfully!", "تم إنشاء سيارة بنجاح!");
        assert_eq!(describe(&message), "تم إنشاء سيارة بنجاح! (Car created successfully!)");
    }
}
