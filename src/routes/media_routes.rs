use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::attachment_controller::{inline_disposition, AttachmentController};
use crate::dto::ApiResponse;
use crate::middleware::{AuthenticatedUser, ClientInfo};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Servicio de archivos subidos (requiere sesión)
pub fn create_media_router() -> Router<AppState> {
    Router::new().route("/*path", get(serve_media))
}

pub fn create_attachment_router() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_attachment))
}

async fn serve_media(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response, AppError> {
    let controller = AttachmentController::new(&state);
    let file = controller.serve(&path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, inline_disposition(&path)),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        file.bytes,
    )
        .into_response())
}

async fn delete_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = AttachmentController::new(&state);
    Ok(Json(controller.delete(&user, &client, id).await?))
}
