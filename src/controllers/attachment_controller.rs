use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::controllers::ActionRecorder;
use crate::dto::asset_dto::AttachmentResponse;
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::models::asset::AssetRef;
use crate::models::attachment::{Attachment, AttachmentKind, AttachmentOwner};
use crate::models::audit::ActionType;
use crate::models::permission::PermissionType;
use crate::repositories::{AttachmentRepository, CarRepository, EquipmentRepository};
use crate::services::media::{content_type_for, prepare_upload, validate_upload, MediaStorage, StoredFile};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, field_error, not_found_error, AppError, AppResult};
use crate::utils::translations::{self, Localized, Operation};

/// Archivo recibido en un formulario multipart
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Archivo listo para servir
#[derive(Debug)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct AttachmentController {
    pool: PgPool,
    repository: AttachmentRepository,
    storage: Arc<dyn MediaStorage>,
    max_upload_bytes: usize,
}

impl AttachmentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            repository: AttachmentRepository::new(state.pool.clone()),
            storage: state.storage.clone(),
            max_upload_bytes: state.config.max_upload_bytes,
        }
    }

    /// El dueño debe existir y no estar en la papelera
    async fn ensure_owner(&self, owner: AttachmentOwner) -> AppResult<()> {
        let active = match owner {
            AssetRef::Car(id) => CarRepository::new(self.pool.clone())
                .find_by_id(id)
                .await?
                .map_or(false, |car| !car.is_deleted()),
            AssetRef::Equipment(id) => EquipmentRepository::new(self.pool.clone())
                .find_by_id(id)
                .await?
                .map_or(false, |equipment| !equipment.is_deleted()),
        };
        if active {
            Ok(())
        } else {
            Err(not_found_error(owner.model_name()))
        }
    }

    /// Sube uno o varios archivos. Se validan todos antes de guardar ninguno.
    pub async fn upload(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        owner: AttachmentOwner,
        kind: AttachmentKind,
        files: Vec<UploadedFile>,
    ) -> Result<ApiResponse<Vec<AttachmentResponse>>, AppError> {
        user.access.require(owner.module(), PermissionType::Update)?;
        if !kind.accepts(&owner) {
            return Err(bad_request_error(translations::bad_request()));
        }
        self.ensure_owner(owner).await?;

        if files.is_empty() {
            return Err(field_error("files", translations::field_required()));
        }
        let mut checked = Vec::with_capacity(files.len());
        for file in files {
            let extension = validate_upload(kind, &file.file_name, file.bytes.len(), self.max_upload_bytes)?;
            checked.push((file, extension));
        }

        // Decodificar y recomprimir fuera del runtime
        let mut prepared = Vec::with_capacity(checked.len());
        for (UploadedFile { file_name, bytes }, extension) in checked {
            let upload = tokio::task::spawn_blocking(move || {
                prepare_upload(&file_name, &extension, &bytes).map(|upload| (file_name, upload))
            })
            .await
            .map_err(|e| AppError::Internal(format!("image processing task failed: {}", e)))??;
            prepared.push(upload);
        }

        let mut saved = Vec::with_capacity(prepared.len());
        for (file_name, upload) in &prepared {
            let stored = self.storage.save(kind, &upload.extension, &upload.bytes).await?;
            match self.repository.create(owner, kind, &stored, file_name).await {
                Ok(attachment) => saved.push(AttachmentResponse::from(attachment)),
                Err(e) => {
                    self.discard(&stored).await;
                    return Err(e);
                }
            }
        }

        info!("📎 {} archivo(s) {:?} subidos para {:?}", saved.len(), kind, owner);
        let message = translations::success(Operation::Upload, kind.model_name());
        ActionRecorder::new(self.pool.clone())
            .record(user, client, ActionType::Update, owner.module().as_str(), Some(owner.id()), &message)
            .await;

        Ok(ApiResponse::success_with_message(saved, message))
    }

    async fn discard(&self, stored: &StoredFile) {
        if let Err(e) = self.storage.delete(&stored.relative_path).await {
            warn!("⚠️ No se pudo borrar el archivo huérfano {}: {}", stored.relative_path, e);
        }
    }

    pub async fn list(&self, owner: AttachmentOwner, kind: AttachmentKind) -> AppResult<Vec<AttachmentResponse>> {
        Ok(self
            .repository
            .list_for(owner)
            .await?
            .into_iter()
            .filter(|a| a.kind == kind)
            .map(AttachmentResponse::from)
            .collect())
    }

    pub async fn delete(
        &self,
        user: &AuthenticatedUser,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<ApiResponse<()>, AppError> {
        let attachment = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(translations::ATTACHMENT))?;
        let owner = attachment
            .owner()
            .ok_or_else(|| not_found_error(translations::ATTACHMENT))?;
        user.access.require(owner.module(), PermissionType::Update)?;

        if let Some(deleted) = self.repository.delete(id).await? {
            self.remove_files(std::slice::from_ref(&deleted)).await;
        }

        let message = translations::success(Operation::Delete, attachment.kind.model_name());
        ActionRecorder::new(self.pool.clone())
            .record(user, client, ActionType::Delete, owner.module().as_str(), Some(owner.id()), &message)
            .await;

        Ok(ApiResponse::message(message))
    }

    /// Borra del almacenamiento los archivos de filas ya eliminadas
    pub async fn remove_files(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(e) = self.storage.delete(&attachment.file_path).await {
                warn!("⚠️ No se pudo borrar {}: {}", attachment.file_path, e);
            }
        }
    }

    /// Servicio seguro de archivos: solo rutas dentro de MEDIA_ROOT
    pub async fn serve(&self, relative_path: &str) -> AppResult<MediaFile> {
        let path = relative_path.trim_start_matches('/');
        if path.is_empty() {
            return Err(not_found_error(translations::MEDIA_FILE));
        }
        let bytes = self.storage.read(path).await?;
        Ok(MediaFile {
            bytes,
            content_type: content_type_for(path),
        })
    }
}

/// Nombre de archivo seguro para la cabecera Content-Disposition
pub fn inline_disposition(relative_path: &str) -> String {
    let name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    format!("inline; filename=\"{}\"", name.replace('"', ""))
}

/// Mensaje cuando el formulario no trae el campo `files`
pub fn missing_files() -> Localized {
    Localized::new("No files were submitted.", "لم يتم إرسال أي ملفات.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_disposition_uses_file_name() {
        assert_eq!(
            inline_disposition("cars/2f1c.jpg"),
            "inline; filename=\"2f1c.jpg\""
        );
        assert_eq!(inline_disposition("a\"b.pdf"), "inline; filename=\"ab.pdf\"");
    }
}
