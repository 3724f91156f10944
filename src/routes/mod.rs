pub mod admin_routes;
pub mod auth_routes;
pub mod car_routes;
pub mod dashboard_routes;
pub mod equipment_routes;
pub mod lookup_routes;
pub mod maintenance_routes;
pub mod media_routes;

use axum::extract::Multipart;
use tracing::debug;

use crate::controllers::attachment_controller::{missing_files, UploadedFile};
use crate::utils::errors::{field_error, AppError};

/// Lee los archivos del campo `files` (uno o varios) de un formulario multipart
pub async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(multipart_error(&e.to_string())))?
    {
        if !matches!(field.name(), Some("files") | Some("files[]") | Some("file")) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(multipart_error(&e.to_string())))?;
        debug!("📥 Archivo recibido: {} ({} bytes)", file_name, bytes.len());
        files.push(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(field_error("files", missing_files()));
    }
    Ok(files)
}

fn multipart_error(detail: &str) -> crate::utils::translations::Localized {
    crate::utils::translations::Localized::new(
        format!("Invalid upload: {}", detail),
        "تعذر قراءة الملفات المرفوعة",
    )
}
