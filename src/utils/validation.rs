//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de parámetros de consulta.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Letras, dígitos y @/./+/-/_
    static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+\-]+$").expect("static regex");
}

/// Validar que un string no esté vacío (solo espacios cuenta como vacío)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_empty"));
    }
    Ok(())
}

/// Validar formato de nombre de usuario
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if !USERNAME_RE.is_match(value) {
        let mut error = ValidationError::new("username");
        error.message = Some("Enter a valid username (letters, digits and @/./+/-/_ only).".into());
        return Err(error);
    }
    Ok(())
}

/// Validar que la fecha de fin no sea anterior a la de inicio
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        let mut error = ValidationError::new("date_range");
        error.add_param("start".into(), &start.to_string());
        error.add_param("end".into(), &end.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor no sea negativo
pub fn validate_non_negative<T: PartialOrd + num_traits::Zero>(value: &T) -> Result<(), ValidationError> {
    if *value < T::zero() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

/// Parsear una fecha YYYY-MM-DD de un filtro; los valores inválidos se ignoran
pub fn parse_date_param(value: Option<&str>) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// Parsear un booleano de filtro ("true"/"false"); cualquier otro valor no filtra
pub fn parse_bool_param(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

/// Normalizar un texto opcional: cadena vacía equivale a ausente
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("ABC-123").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ahmed.ali").is_ok());
        assert!(validate_username("user@site+1").is_ok());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(start, start).is_ok());
        assert!(validate_date_range(end, start).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(&Decimal::new(1050, 2)).is_ok());
        assert!(validate_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative(&Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_parse_params() {
        assert_eq!(
            parse_date_param(Some("2024-03-05")),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(parse_date_param(Some("05/03/2024")), None);
        assert_eq!(parse_date_param(Some("")), None);
        assert_eq!(parse_bool_param(Some("true")), Some(true));
        assert_eq!(parse_bool_param(Some("False")), Some(false));
        assert_eq!(parse_bool_param(Some("maybe")), None);
        assert_eq!(non_empty(Some("  ".into())), None);
    }
}
