//! Validación de conjuntos de registros de un activo
//!
//! Un vehículo o equipo necesita al menos un registro de licencia y uno de
//! inspección; cada rango debe terminar en o después de su inicio.

use rust_decimal::Decimal;

use crate::dto::asset_dto::{DateRangeInput, FireExtinguisherInput, MaintenanceInput};
use crate::models::maintenance::MaintenanceFields;
use crate::utils::errors::FieldErrors;
use crate::utils::translations::Localized;
use crate::utils::validation::{non_empty, validate_date_range, validate_non_negative};

/// Mayor coste que cabe en NUMERIC(10,2)
pub fn max_cost() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn check_cost(field: String, cost: &Decimal, errors: &mut FieldErrors) {
    if validate_non_negative(cost).is_err() {
        errors.add(field, Localized::new("Cost cannot be negative.", "لا يمكن أن تكون التكلفة سالبة."));
    } else if *cost > max_cost() {
        errors.add(
            field,
            Localized::new(
                "Cost cannot exceed 99,999,999.99.",
                "لا يمكن أن تتجاوز التكلفة 99,999,999.99.",
            ),
        );
    } else if cost.normalize().scale() > 2 {
        errors.add(
            field,
            Localized::new(
                "Cost cannot have more than 2 decimal places.",
                "لا يمكن أن تحتوي التكلفة على أكثر من منزلتين عشريتين.",
            ),
        );
    }
}

fn end_before_start() -> Localized {
    Localized::new(
        "End date must be on or after the start date.",
        "يجب أن يكون تاريخ الانتهاء في أو بعد تاريخ البدء.",
    )
}

/// Valida un conjunto obligatorio de rangos (licencias o inspecciones)
pub fn check_date_ranges(field: &str, label: Localized, records: &[DateRangeInput], errors: &mut FieldErrors) {
    if records.is_empty() {
        errors.add(
            field,
            Localized::new(
                format!("At least one {} record is required.", label.en),
                format!("يجب إضافة سجل {} واحد على الأقل.", label.ar),
            ),
        );
    }
    for (index, record) in records.iter().enumerate() {
        if validate_date_range(record.start_date, record.end_date).is_err() {
            errors.add(format!("{}[{}].end_date", field, index), end_before_start());
        }
    }
}

pub fn check_license_records(records: &[DateRangeInput], errors: &mut FieldErrors) {
    check_date_ranges("license_records", Localized::new("license", "ترخيص"), records, errors);
}

pub fn check_inspection_records(records: &[DateRangeInput], errors: &mut FieldErrors) {
    check_date_ranges("inspection_records", Localized::new("inspection", "فحص"), records, errors);
}

/// Registros de extintor: opcionales, pero cada uno con fechas coherentes
pub fn check_fire_extinguisher_records(records: &[FireExtinguisherInput], errors: &mut FieldErrors) {
    for (index, record) in records.iter().enumerate() {
        if validate_date_range(record.inspection_date, record.expiry_date).is_err() {
            errors.add(
                format!("fire_extinguisher_records[{}].expiry_date", index),
                Localized::new(
                    "Expiry date must be on or after the inspection date.",
                    "يجب أن يكون تاريخ الانتهاء في أو بعد تاريخ الفحص.",
                ),
            );
        }
    }
}

/// Fechas de mantenimiento y coste; devuelve los campos normalizados
pub fn check_maintenance(field: &str, input: &MaintenanceInput, errors: &mut FieldErrors) -> MaintenanceFields {
    if let (Some(start), Some(end)) = (input.maintenance_date, input.restoration_date) {
        if validate_date_range(start, end).is_err() {
            errors.add(
                format!("{}.restoration_date", field),
                Localized::new(
                    "Restoration date cannot be before the maintenance date.",
                    "لا يمكن أن يكون تاريخ الاستعادة قبل تاريخ الصيانة.",
                ),
            );
        }
    }
    if let Some(cost) = &input.cost {
        check_cost(format!("{}.cost", field), cost, errors);
    }

    MaintenanceFields {
        maintenance_date: input.maintenance_date,
        restoration_date: input.restoration_date,
        cost: input.cost,
        description: non_empty(input.description.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRangeInput {
        DateRangeInput {
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn test_record_sets_are_required() {
        let mut errors = FieldErrors::new();
        check_license_records(&[], &mut errors);
        check_inspection_records(&[range((2024, 1, 1), (2024, 12, 31))], &mut errors);
        assert!(errors.contains("license_records"));
        assert!(!errors.contains("inspection_records"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut errors = FieldErrors::new();
        check_license_records(
            &[range((2024, 1, 1), (2024, 12, 31)), range((2024, 6, 1), (2024, 5, 1))],
            &mut errors,
        );
        assert!(errors.contains("license_records[1].end_date"));
        assert!(!errors.contains("license_records"));
    }

    #[test]
    fn test_same_day_range_is_valid() {
        let mut errors = FieldErrors::new();
        check_inspection_records(&[range((2024, 1, 1), (2024, 1, 1))], &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_maintenance_checks() {
        let mut errors = FieldErrors::new();
        let input = MaintenanceInput {
            maintenance_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            restoration_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            cost: Some(Decimal::new(-500, 2)),
            description: Some("  ".to_string()),
        };
        let fields = check_maintenance("maintenance", &input, &mut errors);
        assert!(errors.contains("maintenance.restoration_date"));
        assert!(errors.contains("maintenance.cost"));
        assert_eq!(fields.description, None);
    }

    fn maintenance_with_cost(cost: Decimal) -> MaintenanceInput {
        MaintenanceInput {
            maintenance_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            restoration_date: None,
            cost: Some(cost),
            description: None,
        }
    }

    #[test]
    fn test_maintenance_cost_bounds() {
        let mut errors = FieldErrors::new();
        check_maintenance("maintenance", &maintenance_with_cost(max_cost()), &mut errors);
        check_maintenance("maintenance", &maintenance_with_cost(Decimal::ZERO), &mut errors);
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        check_maintenance("maintenance", &maintenance_with_cost(Decimal::new(10_000_000_000, 2)), &mut errors);
        assert!(errors.contains("maintenance.cost"));

        let mut errors = FieldErrors::new();
        check_maintenance("maintenance", &maintenance_with_cost(Decimal::new(1_000_000_000_000, 0)), &mut errors);
        assert!(errors.contains("maintenance.cost"));
    }

    #[test]
    fn test_maintenance_cost_precision() {
        let mut errors = FieldErrors::new();
        check_maintenance("maintenance", &maintenance_with_cost(Decimal::new(12_500, 3)), &mut errors);
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        check_maintenance("maintenance", &maintenance_with_cost(Decimal::new(12_345, 3)), &mut errors);
        assert!(errors.contains("maintenance.cost"));
    }
}
