//! Archivos adjuntos (imágenes y certificados)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::models::asset::AssetRef;
use crate::utils::translations::{self, ModelName};

/// Dueño de un archivo adjunto
pub type AttachmentOwner = AssetRef;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
pub const CERTIFICATE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "pdf"];

/// Tipo de adjunto - mapea al ENUM attachment_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "attachment_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    CarImage,
    EquipmentImage,
    CalibrationCertificate,
    FireExtinguisherImage,
}

impl AttachmentKind {
    /// Subdirectorio dentro de MEDIA_ROOT
    pub fn directory(&self) -> &'static str {
        match self {
            AttachmentKind::CarImage => "cars",
            AttachmentKind::EquipmentImage => "equipment",
            AttachmentKind::CalibrationCertificate => "calibration_certificates",
            AttachmentKind::FireExtinguisherImage => "fire_extinguishers",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            AttachmentKind::CalibrationCertificate => CERTIFICATE_EXTENSIONS,
            _ => IMAGE_EXTENSIONS,
        }
    }

    /// Solo las imágenes de vehículo pertenecen a un vehículo
    pub fn accepts(&self, owner: &AttachmentOwner) -> bool {
        matches!(
            (self, owner),
            (AttachmentKind::CarImage, AssetRef::Car(_))
                | (AttachmentKind::EquipmentImage, AssetRef::Equipment(_))
                | (AttachmentKind::CalibrationCertificate, AssetRef::Equipment(_))
                | (AttachmentKind::FireExtinguisherImage, AssetRef::Equipment(_))
        )
    }

    pub fn model_name(&self) -> ModelName {
        match self {
            AttachmentKind::CalibrationCertificate => translations::CALIBRATION_CERTIFICATE,
            _ => translations::ATTACHMENT,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub car_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub kind: AttachmentKind,
    pub file_path: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    pub fn owner(&self) -> Option<AttachmentOwner> {
        AssetRef::from_columns(self.car_id, self.equipment_id)
    }

    pub fn is_pdf(&self) -> bool {
        self.file_path.to_ascii_lowercase().ends_with(".pdf")
    }

    /// URL del servicio seguro de archivos
    pub fn url(&self) -> String {
        format!("/api/media/{}", self.file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_owner_pairs() {
        let car = AssetRef::Car(Uuid::new_v4());
        let equipment = AssetRef::Equipment(Uuid::new_v4());

        assert!(AttachmentKind::CarImage.accepts(&car));
        assert!(!AttachmentKind::CarImage.accepts(&equipment));
        assert!(AttachmentKind::CalibrationCertificate.accepts(&equipment));
        assert!(!AttachmentKind::FireExtinguisherImage.accepts(&car));
    }

    #[test]
    fn test_only_certificates_accept_pdf() {
        assert!(AttachmentKind::CalibrationCertificate.allowed_extensions().contains(&"pdf"));
        assert!(!AttachmentKind::EquipmentImage.allowed_extensions().contains(&"pdf"));
    }
}
