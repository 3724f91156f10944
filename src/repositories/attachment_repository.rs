use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::attachment::{Attachment, AttachmentKind, AttachmentOwner};
use crate::services::media::StoredFile;
use crate::utils::errors::AppResult;

pub struct AttachmentRepository {
    pool: PgPool,
}

impl AttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for(&self, owner: AttachmentOwner) -> AppResult<Vec<Attachment>> {
        let (car_id, equipment_id) = owner.columns();
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT * FROM attachments
            WHERE car_id IS NOT DISTINCT FROM $1 AND equipment_id IS NOT DISTINCT FROM $2
            ORDER BY uploaded_at, id
            "#,
        )
        .bind(car_id)
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Attachment>> {
        let attachment = sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attachment)
    }

    pub async fn create(
        &self,
        owner: AttachmentOwner,
        kind: AttachmentKind,
        file: &StoredFile,
        original_name: &str,
    ) -> AppResult<Attachment> {
        let (car_id, equipment_id) = owner.columns();
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments
                (id, car_id, equipment_id, kind, file_path, original_name, content_type, size_bytes, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(car_id)
        .bind(equipment_id)
        .bind(kind)
        .bind(&file.relative_path)
        .bind(original_name)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(attachment)
    }

    /// Borra la fila y la devuelve para poder eliminar el archivo
    pub async fn delete(&self, id: Uuid) -> AppResult<Option<Attachment>> {
        let attachment = sqlx::query_as::<_, Attachment>("DELETE FROM attachments WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attachment)
    }
}
