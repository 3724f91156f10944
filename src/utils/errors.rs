//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP bilingües.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::translations::{self, Localized, ModelName};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid fields: {0:?}")]
    Fields(FieldErrors),

    #[error("Unauthorized: {}", .0.en)]
    Unauthorized(Localized),

    #[error("Forbidden: {}", .0.en)]
    Forbidden(Localized),

    #[error("Not found: {}", .0.en)]
    NotFound(Localized),

    #[error("Conflict: {}", .0.en)]
    Conflict(Localized),

    #[error("Bad request: {}", .0.en)]
    BadRequest(Localized),

    #[error("Payload too large: {}", .0.en)]
    PayloadTooLarge(Localized),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errores de validación por campo, con mensajes bilingües
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<Localized>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: Localized) {
        self.0.entry(field.into()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Ok si no se registró ningún error
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Fields(self))
        }
    }

    /// Convierte los errores del crate `validator` a mensajes bilingües
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                out.add(field.to_string(), localize_validation_error(err));
            }
        }
        out
    }
}

fn localize_validation_error(err: &validator::ValidationError) -> Localized {
    let param = |name: &str| {
        err.params
            .get(name)
            .map(|v| v.to_string().trim_matches('"').to_string())
            .unwrap_or_default()
    };

    match err.code.as_ref() {
        "required" | "not_empty" => translations::field_required(),
        "email" => Localized::new("Enter a valid email address.", "أدخل بريداً إلكترونياً صالحاً."),
        "length" => Localized::new(
            format!(
                "Ensure this value has between {} and {} characters.",
                param("min"),
                param("max")
            ),
            format!(
                "تأكد من أن طول هذا الحقل بين {} و {} حرفاً.",
                param("min"),
                param("max")
            ),
        ),
        "range" => Localized::new(
            format!("Ensure this value is between {} and {}.", param("min"), param("max")),
            format!("تأكد من أن هذه القيمة بين {} و {}.", param("min"), param("max")),
        ),
        _ => match &err.message {
            Some(message) => Localized::new(message.to_string(), message.to_string()),
            None => Localized::new(
                format!("Invalid value ({})", err.code),
                format!("قيمة غير صالحة ({})", err.code),
            ),
        },
    }
}

/// Respuesta de error para la API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
    message: String,
    message_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, code: &str, message: Localized) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
            message: message.en,
            message_ar: message.ar,
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Tablas conocidas, para deducir el campo a partir del nombre de la restricción
const KNOWN_TABLES: &[&str] = &[
    "administrative_units",
    "sectors",
    "departments",
    "divisions",
    "drivers",
    "car_classes",
    "manufacturers",
    "car_models",
    "equipment_models",
    "functional_locations",
    "rooms",
    "locations",
    "notification_recipients",
    "contract_types",
    "activities",
    "regions",
    "users",
    "module_permissions",
    "user_permissions",
    "cars",
    "equipment",
];

/// "cars_fleet_no_key" -> "fleet_no"
pub fn field_from_constraint(constraint: &str) -> &str {
    let base = constraint.strip_suffix("_key").unwrap_or(constraint);
    KNOWN_TABLES
        .iter()
        .filter_map(|table| base.strip_prefix(table).and_then(|rest| rest.strip_prefix('_')))
        .min_by_key(|rest| rest.len())
        .unwrap_or(base)
}

fn database_error_response(e: &sqlx::Error) -> (StatusCode, ErrorResponse) {
    if let sqlx::Error::RowNotFound = e {
        return (
            StatusCode::NOT_FOUND,
            ErrorResponse::new("Not Found", "NOT_FOUND", Localized::new("Record not found", "لم يتم العثور على السجل")),
        );
    }

    if let Some(db) = e.as_database_error() {
        let constraint = db.constraint().unwrap_or_default().to_string();
        match db.code().as_deref() {
            Some("23505") => {
                let field = field_from_constraint(&constraint).to_string();
                warn!("⚠️ Violación de unicidad en {}", constraint);
                let mut fields = FieldErrors::new();
                fields.add(field.clone(), translations::already_exists(&field));
                return (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("Conflict", "UNIQUE_VIOLATION", translations::already_exists(&field))
                        .with_details(json!({ "fields": fields })),
                );
            }
            Some("23503") => {
                // DELETE/UPDATE sobre una fila referenciada vs. referencia a una fila inexistente
                if db.message().starts_with("update or delete") {
                    warn!("⚠️ Eliminación protegida por {}", constraint);
                    return (
                        StatusCode::CONFLICT,
                        ErrorResponse::new("Conflict", "PROTECTED", translations::protected_delete()),
                    );
                }
                return (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(
                        "Bad Request",
                        "INVALID_REFERENCE",
                        Localized::new(
                            "A referenced item does not exist",
                            "أحد العناصر المرتبطة غير موجود",
                        ),
                    )
                    .with_details(json!({ "constraint": constraint })),
                );
            }
            Some("22003") => {
                warn!("⚠️ Valor numérico fuera de rango");
                return (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(
                        "Bad Request",
                        "OUT_OF_RANGE",
                        Localized::new("A numeric value is out of range", "إحدى القيم الرقمية خارج النطاق المسموح"),
                    ),
                );
            }
            Some("23514") => {
                return (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Bad Request", "CHECK_VIOLATION", translations::integrity_conflict())
                        .with_details(json!({ "constraint": constraint })),
                );
            }
            _ => {}
        }
    }

    error!("❌ Error de base de datos: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new("Database Error", "DB_ERROR", translations::database_error()),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => database_error_response(&e),

            AppError::Validation(e) => {
                let fields = FieldErrors::from_validation(&e);
                warn!("⚠️ Error de validación: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Validation Error", "VALIDATION_ERROR", translations::validation_failed())
                        .with_details(json!({ "fields": fields })),
                )
            }

            AppError::Fields(fields) => {
                warn!("⚠️ Error de validación: {:?}", fields);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Validation Error", "VALIDATION_ERROR", translations::validation_failed())
                        .with_details(json!({ "fields": fields })),
                )
            }

            AppError::Unauthorized(msg) => {
                warn!("🔒 Acceso no autorizado: {}", msg.en);
                (StatusCode::UNAUTHORIZED, ErrorResponse::new("Unauthorized", "UNAUTHORIZED", msg))
            }

            AppError::Forbidden(msg) => {
                warn!("🚫 Acceso prohibido: {}", msg.en);
                (StatusCode::FORBIDDEN, ErrorResponse::new("Forbidden", "FORBIDDEN", msg))
            }

            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("Not Found", "NOT_FOUND", msg))
            }

            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorResponse::new("Conflict", "CONFLICT", msg))
            }

            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("Bad Request", "BAD_REQUEST", msg))
            }

            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse::new("Payload Too Large", "PAYLOAD_TOO_LARGE", msg),
            ),

            AppError::Internal(msg) => {
                error!("❌ Error interno: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal Server Error", "INTERNAL_ERROR", translations::server_error()),
                )
            }

            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new("Rate Limit Exceeded", "RATE_LIMIT_EXCEEDED", translations::too_many_attempts()),
            ),

            AppError::Jwt(msg) => {
                warn!("🔒 Error JWT: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("JWT Error", "JWT_ERROR", translations::invalid_token()),
                )
            }

            AppError::Hash(msg) => {
                error!("❌ Error de hash: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Hash Error", "HASH_ERROR", translations::server_error()),
                )
            }

            AppError::Storage(msg) => {
                error!("❌ Error de almacenamiento: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Storage Error", "STORAGE_ERROR", translations::server_error()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Error de validación de un solo campo
pub fn field_error(field: &str, message: Localized) -> AppError {
    let mut fields = FieldErrors::new();
    fields.add(field, message);
    AppError::Fields(fields)
}

pub fn not_found_error(model: ModelName) -> AppError {
    AppError::NotFound(translations::not_found(model))
}

pub fn forbidden_error() -> AppError {
    AppError::Forbidden(translations::permission_denied())
}

pub fn bad_request_error(message: Localized) -> AppError {
    AppError::BadRequest(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 5))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_field_from_constraint() {
        assert_eq!(field_from_constraint("cars_fleet_no_key"), "fleet_no");
        assert_eq!(field_from_constraint("cars_plate_no_en_key"), "plate_no_en");
        assert_eq!(field_from_constraint("equipment_door_no_key"), "door_no");
        assert_eq!(field_from_constraint("equipment_models_name_en_key"), "name_en");
        assert_eq!(field_from_constraint("users_email_key"), "email");
    }

    #[test]
    fn test_validator_errors_are_localized() {
        let sample = Sample {
            name: "too long name".to_string(),
            email: "nope".to_string(),
        };
        let errors = sample.validate().unwrap_err();
        let fields = FieldErrors::from_validation(&errors);

        assert!(fields.contains("name"));
        assert!(fields.contains("email"));
        assert!(!fields.contains("other"));
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (AppError::NotFound(translations::not_found(translations::CAR)), StatusCode::NOT_FOUND),
            (forbidden_error(), StatusCode::FORBIDDEN),
            (AppError::Unauthorized(translations::login_required()), StatusCode::UNAUTHORIZED),
            (field_error("fleet_no", translations::field_required()), StatusCode::BAD_REQUEST),
            (bad_request_error(translations::bad_request()), StatusCode::BAD_REQUEST),
            (AppError::RateLimitExceeded, StatusCode::TOO_MANY_REQUESTS),
            (AppError::Database(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut fields = FieldErrors::new();
        fields.add("cost", translations::field_required());
        assert!(matches!(fields.into_result(), Err(AppError::Fields(_))));
    }
}
