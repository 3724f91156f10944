//! Almacenamiento de archivos subidos
//!
//! Valida extensión y tamaño, recomprime las imágenes, guarda en
//! MEDIA_ROOT/<directorio>/<uuid>.<ext> y resuelve rutas para el servicio
//! seguro de archivos sin salir de la raíz.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::attachment::AttachmentKind;
use crate::utils::errors::{field_error, AppError};
use crate::utils::translations::{self, Localized};

/// Errores de almacenamiento
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid media path: {0}")]
    InvalidPath(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPath(_) | StorageError::NotFound(_) => {
                AppError::NotFound(translations::not_found(translations::MEDIA_FILE))
            }
            StorageError::Io(e) => AppError::Storage(e.to_string()),
        }
    }
}

/// Archivo ya guardado
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Ruta relativa a MEDIA_ROOT con separadores '/'
    pub relative_path: String,
    pub size_bytes: i64,
    pub content_type: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn save(&self, kind: AttachmentKind, extension: &str, bytes: &[u8]) -> Result<StoredFile, StorageError>;
    async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError>;
    async fn delete(&self, relative_path: &str) -> Result<(), StorageError>;
}

/// Almacenamiento en el sistema de archivos local
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Une la ruta relativa a la raíz rechazando componentes `..`, absolutos o vacíos
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(relative_path);
        if relative_path.is_empty() || relative_path.contains('\0') {
            return Err(StorageError::InvalidPath(relative_path.to_string()));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidPath(relative_path.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(&self, kind: AttachmentKind, extension: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let relative_path = format!("{}/{}", kind.directory(), file_name);
        let target = self.resolve(&relative_path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;
        info!("💾 Archivo guardado: {} ({} bytes)", relative_path, bytes.len());

        Ok(StoredFile {
            content_type: content_type_for(&relative_path),
            relative_path,
            size_bytes: bytes.len() as i64,
        })
    }

    async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative_path)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("🗑️ Archivo eliminado: {}", relative_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Content-Type a partir de la extensión
pub fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string()
}

/// Extensión en minúsculas, sin el punto
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty())
}

/// Valida un archivo subido y devuelve su extensión normalizada
pub fn validate_upload(
    kind: AttachmentKind,
    file_name: &str,
    size: usize,
    max_bytes: usize,
) -> Result<String, AppError> {
    if size == 0 {
        return Err(field_error(
            "files",
            Localized::new("The submitted file is empty.", "الملف المرفوع فارغ."),
        ));
    }
    if size > max_bytes {
        return Err(AppError::PayloadTooLarge(Localized::new(
            format!("File '{}' exceeds the maximum size of {} bytes", file_name, max_bytes),
            format!("الملف '{}' يتجاوز الحجم المسموح ({} بايت)", file_name, max_bytes),
        )));
    }

    let allowed = kind.allowed_extensions();
    match file_extension(file_name) {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(ext),
        _ => Err(field_error(
            "files",
            Localized::new(
                format!("Unsupported file type. Allowed: {}", allowed.join(", ")),
                format!("نوع الملف غير مدعوم. الأنواع المسموحة: {}", allowed.join(", ")),
            ),
        )),
    }
}

pub const JPEG_QUALITY: u8 = 80;

/// Contenido que se guarda realmente: puede cambiar de extensión al recomprimir
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    pub extension: String,
    pub bytes: Vec<u8>,
}

fn invalid_file(file_name: &str) -> AppError {
    field_error(
        "files",
        Localized::new(
            format!("File '{}' is not a valid image or document.", file_name),
            format!("الملف '{}' ليس صورة أو مستنداً صالحاً.", file_name),
        ),
    )
}

/// Compone la transparencia sobre fondo blanco
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Decodifica y recomprime una imagen; un PDF solo se comprueba por su cabecera.
/// Los PNG con transparencia siguen siendo PNG, el resto pasa a JPEG.
pub fn prepare_upload(file_name: &str, extension: &str, bytes: &[u8]) -> Result<PreparedUpload, AppError> {
    if extension == "pdf" {
        if !bytes.starts_with(b"%PDF-") {
            return Err(invalid_file(file_name));
        }
        return Ok(PreparedUpload {
            extension: extension.to_string(),
            bytes: bytes.to_vec(),
        });
    }

    let img = image::load_from_memory(bytes).map_err(|e| {
        warn!("⚠️ Imagen no decodificable '{}': {}", file_name, e);
        invalid_file(file_name)
    })?;

    let mut buffer = Vec::new();
    if extension == "png" && img.color().has_alpha() {
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::Internal(format!("failed to encode png: {}", e)))?;
        return Ok(PreparedUpload {
            extension: "png".to_string(),
            bytes: buffer,
        });
    }

    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    DynamicImage::ImageRgb8(flatten_on_white(&img))
        .write_with_encoder(encoder)
        .map_err(|e| AppError::Internal(format!("failed to encode jpeg: {}", e)))?;
    debug!("🗜️ '{}' recomprimida: {} → {} bytes", file_name, bytes.len(), buffer.len());

    Ok(PreparedUpload {
        extension: "jpg".to_string(),
        bytes: buffer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_traversal() {
        let storage = LocalMediaStorage::new("/srv/media");
        assert!(storage.resolve("cars/a.jpg").is_ok());
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("cars/../../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
    }

    #[test]
    fn test_validate_upload() {
        let max = 1024;
        assert_eq!(
            validate_upload(AttachmentKind::CarImage, "Front.JPG", 10, max).unwrap(),
            "jpg"
        );
        assert!(validate_upload(AttachmentKind::CarImage, "doc.pdf", 10, max).is_err());
        assert_eq!(
            validate_upload(AttachmentKind::CalibrationCertificate, "cert.pdf", 10, max).unwrap(),
            "pdf"
        );
        assert!(validate_upload(AttachmentKind::CarImage, "noext", 10, max).is_err());
        assert!(matches!(
            validate_upload(AttachmentKind::CarImage, "big.png", 2048, max),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(validate_upload(AttachmentKind::CarImage, "empty.png", 0, max).is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("cars/x.png"), "image/png");
        assert_eq!(content_type_for("calibration_certificates/x.pdf"), "application/pdf");
        assert_eq!(content_type_for("x.unknownext"), "application/octet-stream");
    }

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_renamed_text_file_is_rejected() {
        let result = prepare_upload("notes.png", "png", b"just some text, not pixels");
        match result {
            Err(AppError::Fields(fields)) => assert!(fields.contains("files")),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(prepare_upload("cert.pdf", "pdf", b"plain text").is_err());
    }

    #[test]
    fn test_opaque_image_becomes_jpeg() {
        let png = encode(DynamicImage::ImageRgb8(RgbImage::new(8, 6)), ImageFormat::Png);
        let prepared = prepare_upload("front.png", "png", &png).unwrap();

        assert_eq!(prepared.extension, "jpg");
        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert_eq!(image::guess_format(&prepared.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_transparent_png_stays_png() {
        let png = encode(DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4)), ImageFormat::Png);
        let prepared = prepare_upload("logo.png", "png", &png).unwrap();

        assert_eq!(prepared.extension, "png");
        assert_eq!(image::guess_format(&prepared.bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_transparency_flattens_to_white() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0])));
        assert_eq!(flatten_on_white(&img).get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_pdf_passes_through() {
        let pdf = b"%PDF-1.4\n%fake but well-formed header";
        let prepared = prepare_upload("cert.pdf", "pdf", pdf).unwrap();
        assert_eq!(prepared.extension, "pdf");
        assert_eq!(prepared.bytes, pdf.to_vec());
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path());

        let stored = storage
            .save(AttachmentKind::EquipmentImage, "png", b"not-really-a-png")
            .await
            .unwrap();
        assert!(stored.relative_path.starts_with("equipment/"));
        assert_eq!(stored.size_bytes, 16);
        assert_eq!(stored.content_type, "image/png");

        let bytes = storage.read(&stored.relative_path).await.unwrap();
        assert_eq!(bytes, b"not-really-a-png");

        storage.delete(&stored.relative_path).await.unwrap();
        assert!(matches!(
            storage.read(&stored.relative_path).await,
            Err(StorageError::NotFound(_))
        ));
        // borrar dos veces no es un error
        storage.delete(&stored.relative_path).await.unwrap();
    }
}
