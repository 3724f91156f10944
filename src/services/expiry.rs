//! Filtros de vencimiento de inspección, licencia y extintor
//!
//! La clasificación existe en dos formas equivalentes: una función pura
//! sobre las fechas vigentes (`classify`) y su traducción a SQL
//! (`ExpiryFilter::push_condition`) sobre los alias `ins`, `lic` y `fe`.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

pub const DEFAULT_EXPIRY_DAYS: i64 = 30;
pub const MAX_EXPIRY_DAYS: i64 = 3650;
pub const DASHBOARD_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    #[default]
    AboutToExpire,
}

impl ExpiryStatus {
    /// Valor desconocido o ausente → about_to_expire
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("expired") => ExpiryStatus::Expired,
            _ => ExpiryStatus::AboutToExpire,
        }
    }
}

/// Ventana en días; no numérico → 30, acotado a 1..=3650
pub fn parse_days(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|d| d.clamp(1, MAX_EXPIRY_DAYS))
        .unwrap_or(DEFAULT_EXPIRY_DAYS)
}

/// Fechas de fin de los registros vigentes de un activo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentExpiryDates {
    pub inspection_end: Option<NaiveDate>,
    pub license_end: Option<NaiveDate>,
    /// Solo equipos; None si no hay registro de extintor
    pub fire_extinguisher_expiry: Option<NaiveDate>,
}

impl CurrentExpiryDates {
    /// Sin inspección vigente cuenta como vencida
    pub fn inspection_expired(&self, today: NaiveDate) -> bool {
        self.inspection_end.map_or(true, |d| d < today)
    }

    pub fn license_expired(&self, today: NaiveDate) -> bool {
        self.license_end.map_or(true, |d| d < today)
    }

    /// El extintor es opcional: sin registro no vence
    pub fn fire_extinguisher_expired(&self, today: NaiveDate) -> bool {
        self.fire_extinguisher_expiry.map_or(false, |d| d < today)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.inspection_expired(today) || self.license_expired(today) || self.fire_extinguisher_expired(today)
    }

    /// Fecha de vencimiento más próxima entre los registros existentes
    pub fn earliest(&self) -> Option<NaiveDate> {
        [self.inspection_end, self.license_end, self.fire_extinguisher_expiry]
            .into_iter()
            .flatten()
            .min()
    }
}

/// Clasifica un activo; None si no está vencido ni por vencer
pub fn classify(dates: &CurrentExpiryDates, today: NaiveDate, days: i64) -> Option<ExpiryStatus> {
    if dates.is_expired(today) {
        return Some(ExpiryStatus::Expired);
    }
    let limit = today + Duration::days(days);
    match dates.earliest() {
        Some(earliest) if earliest <= limit => Some(ExpiryStatus::AboutToExpire),
        _ => None,
    }
}

/// Días hasta la fecha (negativo si ya pasó)
pub fn days_until(date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    date.map(|d| (d - today).num_days())
}

/// Resumen de vencimientos para el detalle de un activo
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExpirySummary {
    pub is_inspection_expired: bool,
    pub days_until_inspection_expiry: Option<i64>,
    pub is_license_expired: bool,
    pub days_until_license_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_fire_extinguisher_expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_fire_extinguisher_expiry: Option<i64>,
    pub status: Option<ExpiryStatus>,
}

impl ExpirySummary {
    /// `with_fire_extinguisher` solo para equipos
    pub fn build(dates: &CurrentExpiryDates, today: NaiveDate, with_fire_extinguisher: bool) -> Self {
        Self {
            is_inspection_expired: dates.inspection_expired(today),
            days_until_inspection_expiry: days_until(dates.inspection_end, today),
            is_license_expired: dates.license_expired(today),
            days_until_license_expiry: days_until(dates.license_end, today),
            is_fire_extinguisher_expired: with_fire_extinguisher.then(|| dates.fire_extinguisher_expired(today)),
            days_until_fire_extinguisher_expiry: if with_fire_extinguisher {
                days_until(dates.fire_extinguisher_expiry, today)
            } else {
                None
            },
            status: classify(dates, today, DEFAULT_EXPIRY_DAYS),
        }
    }
}

/// Filtro de vencimiento aplicado a una consulta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryFilter {
    pub status: ExpiryStatus,
    pub today: NaiveDate,
    pub days: i64,
}

impl ExpiryFilter {
    pub fn new(status: ExpiryStatus, today: NaiveDate, days: i64) -> Self {
        Self { status, today, days }
    }

    fn push_expired(&self, builder: &mut QueryBuilder<'_, Postgres>, with_fire_extinguisher: bool) {
        builder.push("(ins.end_date IS NULL OR ins.end_date < ");
        builder.push_bind(self.today);
        builder.push(" OR lic.end_date IS NULL OR lic.end_date < ");
        builder.push_bind(self.today);
        if with_fire_extinguisher {
            builder.push(" OR (fe.expiry_date IS NOT NULL AND fe.expiry_date < ");
            builder.push_bind(self.today);
            builder.push(")");
        }
        builder.push(")");
    }

    /// Añade `AND <condición>` usando los alias ins / lic / fe
    pub fn push_condition(&self, builder: &mut QueryBuilder<'_, Postgres>, with_fire_extinguisher: bool) {
        builder.push(" AND ");
        match self.status {
            ExpiryStatus::Expired => self.push_expired(builder, with_fire_extinguisher),
            ExpiryStatus::AboutToExpire => {
                builder.push("NOT ");
                self.push_expired(builder, with_fire_extinguisher);
                if with_fire_extinguisher {
                    builder.push(" AND LEAST(ins.end_date, lic.end_date, fe.expiry_date) <= ");
                } else {
                    builder.push(" AND LEAST(ins.end_date, lic.end_date) <= ");
                }
                builder.push_bind(self.today + Duration::days(self.days));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_status_and_days() {
        assert_eq!(ExpiryStatus::parse(Some("expired")), ExpiryStatus::Expired);
        assert_eq!(ExpiryStatus::parse(Some("bogus")), ExpiryStatus::AboutToExpire);
        assert_eq!(ExpiryStatus::parse(None), ExpiryStatus::AboutToExpire);
        assert_eq!(parse_days(None), 30);
        assert_eq!(parse_days(Some("x")), 30);
        assert_eq!(parse_days(Some("0")), 1);
        assert_eq!(parse_days(Some("90")), 90);
        assert_eq!(parse_days(Some("99999")), 3650);
    }

    #[test]
    fn test_missing_records_are_expired() {
        let today = d(2024, 6, 1);
        let dates = CurrentExpiryDates {
            inspection_end: None,
            license_end: Some(d(2025, 1, 1)),
            fire_extinguisher_expiry: None,
        };
        assert_eq!(classify(&dates, today, 30), Some(ExpiryStatus::Expired));
    }

    #[test]
    fn test_past_end_is_expired_and_today_is_not() {
        let today = d(2024, 6, 1);
        let past = CurrentExpiryDates {
            inspection_end: Some(d(2024, 5, 31)),
            license_end: Some(d(2025, 1, 1)),
            fire_extinguisher_expiry: None,
        };
        assert_eq!(classify(&past, today, 30), Some(ExpiryStatus::Expired));

        let ends_today = CurrentExpiryDates {
            inspection_end: Some(today),
            license_end: Some(d(2025, 1, 1)),
            fire_extinguisher_expiry: None,
        };
        assert_eq!(classify(&ends_today, today, 30), Some(ExpiryStatus::AboutToExpire));
    }

    #[test]
    fn test_about_to_expire_window() {
        let today = d(2024, 6, 1);
        let dates = CurrentExpiryDates {
            inspection_end: Some(d(2024, 7, 1)),
            license_end: Some(d(2025, 6, 1)),
            fire_extinguisher_expiry: None,
        };
        assert_eq!(classify(&dates, today, 30), Some(ExpiryStatus::AboutToExpire));
        assert_eq!(classify(&dates, today, 29), None);
    }

    #[test]
    fn test_license_and_fire_extinguisher_count() {
        let today = d(2024, 6, 1);
        let license_soon = CurrentExpiryDates {
            inspection_end: Some(d(2025, 6, 1)),
            license_end: Some(d(2024, 6, 10)),
            fire_extinguisher_expiry: None,
        };
        assert_eq!(classify(&license_soon, today, 30), Some(ExpiryStatus::AboutToExpire));

        let fire_past = CurrentExpiryDates {
            inspection_end: Some(d(2025, 6, 1)),
            license_end: Some(d(2025, 6, 1)),
            fire_extinguisher_expiry: Some(d(2024, 1, 1)),
        };
        assert_eq!(classify(&fire_past, today, 30), Some(ExpiryStatus::Expired));
    }

    #[test]
    fn test_summary_for_equipment() {
        let today = d(2024, 6, 1);
        let dates = CurrentExpiryDates {
            inspection_end: Some(d(2024, 6, 11)),
            license_end: Some(d(2024, 5, 1)),
            fire_extinguisher_expiry: None,
        };
        let summary = ExpirySummary::build(&dates, today, true);
        assert!(!summary.is_inspection_expired);
        assert_eq!(summary.days_until_inspection_expiry, Some(10));
        assert!(summary.is_license_expired);
        assert_eq!(summary.days_until_license_expiry, Some(-31));
        assert_eq!(summary.is_fire_extinguisher_expired, Some(false));
        assert_eq!(summary.status, Some(ExpiryStatus::Expired));

        let car_summary = ExpirySummary::build(&dates, today, false);
        assert_eq!(car_summary.is_fire_extinguisher_expired, None);
    }

    #[test]
    fn test_summary_flags_agree_with_status() {
        let today = d(2024, 6, 1);
        let without_extinguisher = CurrentExpiryDates {
            inspection_end: Some(d(2025, 6, 1)),
            license_end: Some(d(2025, 6, 1)),
            fire_extinguisher_expiry: None,
        };
        let summary = ExpirySummary::build(&without_extinguisher, today, true);
        assert_eq!(summary.is_fire_extinguisher_expired, Some(false));
        assert_eq!(summary.status, None);

        let extinguisher_past = CurrentExpiryDates {
            fire_extinguisher_expiry: Some(d(2024, 5, 1)),
            ..without_extinguisher
        };
        let summary = ExpirySummary::build(&extinguisher_past, today, true);
        assert_eq!(summary.is_fire_extinguisher_expired, Some(true));
        assert_eq!(summary.days_until_fire_extinguisher_expiry, Some(-31));
        assert_eq!(summary.status, Some(ExpiryStatus::Expired));
    }

    #[test]
    fn test_sql_condition() {
        let filter = ExpiryFilter::new(ExpiryStatus::Expired, d(2024, 6, 1), 30);
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE TRUE");
        filter.push_condition(&mut builder, false);
        assert_eq!(
            builder.sql(),
            "SELECT 1 WHERE TRUE AND (ins.end_date IS NULL OR ins.end_date < $1 \
             OR lic.end_date IS NULL OR lic.end_date < $2)"
        );

        let filter = ExpiryFilter::new(ExpiryStatus::AboutToExpire, d(2024, 6, 1), 30);
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE TRUE");
        filter.push_condition(&mut builder, true);
        let sql = builder.sql();
        assert!(sql.contains("NOT (ins.end_date IS NULL"));
        assert!(sql.contains("fe.expiry_date IS NOT NULL AND fe.expiry_date < $3"));
        assert!(sql.ends_with("LEAST(ins.end_date, lic.end_date, fe.expiry_date) <= $4"));
    }
}
