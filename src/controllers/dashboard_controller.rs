use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::dto::asset_dto::{DashboardQuery, DashboardResponse, ExpiringAsset};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::car::CarListItem;
use crate::models::equipment::EquipmentListItem;
use crate::models::permission::{ModuleName, PermissionType};
use crate::repositories::{CarRepository, EquipmentRepository};
use crate::services::expiry::{days_until, parse_days, ExpiryFilter, ExpiryStatus};
use crate::utils::errors::AppError;

fn car_row(item: CarListItem, today: NaiveDate) -> ExpiringAsset {
    ExpiringAsset {
        id: item.car.id,
        identifier: item.car.fleet_no,
        plate_no: item.car.plate_no_ar,
        status: item.car.status,
        status_ar: item.car.status.label_ar(),
        inspection_end_date: item.inspection_end_date,
        license_end_date: item.license_end_date,
        fire_extinguisher_expiry_date: None,
        days_until_inspection_expiry: days_until(item.inspection_end_date, today),
    }
}

fn equipment_row(item: EquipmentListItem, today: NaiveDate) -> ExpiringAsset {
    ExpiringAsset {
        id: item.equipment.id,
        identifier: item.equipment.door_no,
        plate_no: item.equipment.plate_no,
        status: item.equipment.status,
        status_ar: item.equipment.status.label_ar(),
        inspection_end_date: item.inspection_end_date,
        license_end_date: item.license_end_date,
        fire_extinguisher_expiry_date: item.fire_extinguisher_expiry_date,
        days_until_inspection_expiry: days_until(item.inspection_end_date, today),
    }
}

pub struct DashboardController {
    cars: CarRepository,
    equipment: EquipmentRepository,
}

impl DashboardController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            cars: CarRepository::new(pool.clone()),
            equipment: EquipmentRepository::new(pool),
        }
    }

    /// Activos vencidos o por vencer; cada lista solo si el usuario puede verla
    pub async fn overview(
        &self,
        user: &AuthenticatedUser,
        query: DashboardQuery,
    ) -> Result<ApiResponse<DashboardResponse>, AppError> {
        let today = Utc::now().date_naive();
        let status = ExpiryStatus::parse(query.expiry_status.as_deref());
        let days = parse_days(query.expiry_days.as_deref());
        let filter = ExpiryFilter::new(status, today, days);
        debug!("📊 Panel: {:?} en {} días", status, days);

        let cars_expiring = if user.access.has_permission(ModuleName::Cars, PermissionType::Read) {
            self.cars
                .expiring(&filter)
                .await?
                .into_iter()
                .map(|item| car_row(item, today))
                .collect()
        } else {
            Vec::new()
        };

        let equipment_expiring = if user.access.has_permission(ModuleName::Equipment, PermissionType::Read) {
            self.equipment
                .expiring(&filter)
                .await?
                .into_iter()
                .map(|item| equipment_row(item, today))
                .collect()
        } else {
            Vec::new()
        };

        Ok(ApiResponse::success(DashboardResponse {
            expiry_status: status,
            expiry_days: days,
            today,
            cars_expiring,
            equipment_expiring,
        }))
    }
}
