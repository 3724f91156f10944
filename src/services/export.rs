//! Exportación CSV de los registros de auditoría
//!
//! Los archivos empiezan con BOM UTF-8 para que las hojas de cálculo
//! reconozcan el texto árabe.

use csv::WriterBuilder;

use crate::models::audit::{ActionLogEntry, LoginLogEntry};
use crate::utils::errors::AppError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MAX_TEXT: usize = 250;

pub const LOGIN_LOGS_FILENAME: &str = "سجل_تسجيل_الدخول.csv";
pub const ACTION_LOGS_FILENAME: &str = "سجل_العمليات.csv";

const LOGIN_HEADERS: [&str; 8] = [
    "المستخدم",
    "اسم المستخدم",
    "عنوان IP",
    "المتصفح",
    "نجاح",
    "وقت الدخول",
    "وقت الخروج",
    "الدور",
];

const ACTION_HEADERS: [&str; 8] = [
    "المستخدم",
    "اسم المستخدم",
    "نوع العملية",
    "الوحدة",
    "الوصف",
    "عنوان IP",
    "الوقت",
    "الدور",
];

fn truncate(text: &str) -> String {
    text.chars().take(MAX_TEXT).collect()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Error generando CSV: {}", e)))
}

pub fn login_logs_csv(entries: &[LoginLogEntry]) -> Result<Vec<u8>, AppError> {
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    let csv_err = |e: csv::Error| AppError::Internal(format!("Error generando CSV: {}", e));

    writer.write_record(LOGIN_HEADERS).map_err(csv_err)?;
    for entry in entries {
        writer
            .write_record([
                entry.full_name.clone().unwrap_or_default(),
                entry.username.clone(),
                entry.ip_address.clone().unwrap_or_default(),
                truncate(entry.user_agent.as_deref().unwrap_or_default()),
                if entry.success { "نجح" } else { "فشل" }.to_string(),
                entry.login_time.format(TIME_FORMAT).to_string(),
                entry
                    .logout_time
                    .map(|t| t.format(TIME_FORMAT).to_string())
                    .unwrap_or_default(),
                entry.user_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
            ])
            .map_err(csv_err)?;
    }
    finish(writer)
}

pub fn action_logs_csv(entries: &[ActionLogEntry]) -> Result<Vec<u8>, AppError> {
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    let csv_err = |e: csv::Error| AppError::Internal(format!("Error generando CSV: {}", e));

    writer.write_record(ACTION_HEADERS).map_err(csv_err)?;
    for entry in entries {
        writer
            .write_record([
                entry.full_name.clone().unwrap_or_default(),
                entry.username.clone().unwrap_or_default(),
                entry.action_type.label_ar().to_string(),
                entry.module_name.clone(),
                truncate(&entry.description),
                entry.ip_address.clone().unwrap_or_default(),
                entry.timestamp.format(TIME_FORMAT).to_string(),
                entry.user_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
            ])
            .map_err(csv_err)?;
    }
    finish(writer)
}

/// Cabecera Content-Disposition con nombre de archivo UTF-8 (RFC 5987)
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename*=UTF-8''{}", urlencoding::encode(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::ActionType;
    use crate::models::user::UserType;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn login_entry(success: bool) -> LoginLogEntry {
        LoginLogEntry {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            username: "ahmed".to_string(),
            full_name: Some("Ahmed Ali".to_string()),
            user_type: Some(UserType::Normal),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: Some("x".repeat(400)),
            success,
            login_time: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            logout_time: None,
        }
    }

    #[test]
    fn test_login_csv_has_bom_and_arabic_headers() {
        let bytes = login_logs_csv(&[login_entry(true), login_entry(false)]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("المستخدم,اسم المستخدم"));
        assert!(lines[1].contains("نجح"));
        assert!(lines[1].contains("2024-05-01 08:30:00"));
        assert!(lines[2].contains("فشل"));
        // el user agent se recorta a 250 caracteres
        assert!(!lines[1].contains(&"x".repeat(251)));
    }

    #[test]
    fn test_action_csv_rows() {
        let entry = ActionLogEntry {
            id: Uuid::new_v4(),
            user_id: None,
            username: None,
            full_name: None,
            user_type: None,
            action_type: ActionType::Delete,
            module_name: "cars".to_string(),
            object_id: Some("1".to_string()),
            description: "حذف سيارة, رقم الأسطول F-1".to_string(),
            ip_address: None,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
        };
        let bytes = action_logs_csv(&[entry]).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.contains("حذف,cars"));
        // los campos con comas van entre comillas
        assert!(text.contains("\"حذف سيارة, رقم الأسطول F-1\""));
    }

    #[test]
    fn test_content_disposition_is_percent_encoded() {
        let header = content_disposition(LOGIN_LOGS_FILENAME);
        assert!(header.starts_with("attachment; filename*=UTF-8''%D8%B3"));
        assert!(header.is_ascii());
    }
}
