//! Jerarquía organizativa: sector → departamento → división
//!
//! Los listados en cascada muestran primero la fila principal "غير محدد"
//! y después las filas filtradas, ordenadas por nombre.

use uuid::Uuid;

use crate::models::lookup::{LookupItem, DUMMY_NAME_AR};

/// Fila "sin especificar" principal: la primera creada con is_dummy
pub fn main_dummy(items: &[LookupItem]) -> Option<&LookupItem> {
    items
        .iter()
        .filter(|i| i.is_dummy || i.name_ar == DUMMY_NAME_AR)
        .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

/// Ordena las opciones de un nivel: dummy principal primero, luego el resto por nombre
///
/// `dummies` son todas las filas dummy del nivel; `rows` las filas ya filtradas
/// por el padre (pueden incluir dummies, que se descartan).
pub fn order_options(dummies: &[LookupItem], rows: Vec<LookupItem>) -> Vec<LookupItem> {
    let main = main_dummy(dummies).cloned();
    let main_id: Option<Uuid> = main.as_ref().map(|d| d.id);

    let mut rest: Vec<LookupItem> = rows
        .into_iter()
        .filter(|r| Some(r.id) != main_id && !r.is_dummy)
        .collect();
    rest.sort_by(|a, b| a.name_ar.cmp(&b.name_ar).then(a.name_en.cmp(&b.name_en)));

    main.into_iter().chain(rest).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn item(name_ar: &str, is_dummy: bool, age_secs: i64) -> LookupItem {
        let created_at = Utc::now() - Duration::seconds(age_secs);
        LookupItem {
            id: Uuid::new_v4(),
            name_en: name_ar.to_string(),
            name_ar: name_ar.to_string(),
            is_dummy,
            parent_id: None,
            attributes: serde_json::json!({}),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_main_dummy_first_then_sorted() {
        let oldest_dummy = item(DUMMY_NAME_AR, true, 100);
        let newer_dummy = item(DUMMY_NAME_AR, true, 10);
        let dummies = vec![newer_dummy.clone(), oldest_dummy.clone()];
        let rows = vec![item("ب", false, 1), newer_dummy, item("أ", false, 1)];

        let ordered = order_options(&dummies, rows);
        let names: Vec<&str> = ordered.iter().map(|i| i.name_ar.as_str()).collect();
        assert_eq!(ordered[0].id, oldest_dummy.id);
        assert_eq!(names, vec![DUMMY_NAME_AR, "أ", "ب"]);
    }

    #[test]
    fn test_without_dummy() {
        let ordered = order_options(&[], vec![item("ج", false, 1), item("أ", false, 1)]);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].name_ar, "أ");
    }
}
