use serde::{Deserialize, Serialize};

use crate::utils::translations::Localized;

// Response genérica con mensaje bilingüe
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub message_ar: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            message_ar: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: Localized) -> Self {
        Self {
            success: true,
            message: Some(message.en),
            message_ar: Some(message.ar),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: Localized) -> Self {
        Self {
            success: true,
            message: Some(message.en),
            message_ar: Some(message.ar),
            data: None,
        }
    }
}

// Confirmación explícita de borrado definitivo (?confirm=true)
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    pub confirm: Option<String>,
}

impl ConfirmQuery {
    pub fn confirmed(&self) -> bool {
        matches!(self.confirm.as_deref().map(str::trim), Some("true") | Some("1") | Some("yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::success_with_message(1, Localized::new("Done", "تم"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Done");
        assert_eq!(json["message_ar"], "تم");
        assert_eq!(json["data"], 1);
    }

    #[test]
    fn test_confirm_query() {
        assert!(!ConfirmQuery::default().confirmed());
        assert!(ConfirmQuery { confirm: Some("true".to_string()) }.confirmed());
        assert!(!ConfirmQuery { confirm: Some("false".to_string()) }.confirmed());
    }
}
