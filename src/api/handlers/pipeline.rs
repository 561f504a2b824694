use crate::api::error::AppError;
use crate::models::UploadedFile;
use crate::services::convert::OutputFormat;
use crate::services::storage::StorageArea;
use crate::utils::validation::{file_extension, sanitize_filename};
use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    /// Locator of the preview bundle under /previews
    pub url: String,
    pub pages: usize,
}

#[derive(Serialize, ToSchema)]
pub struct ConvertResponse {
    /// Locator of the converted artifact under /downloads
    pub url: String,
    /// Locator of the preview bundle under /previews
    pub preview: String,
    pub pages: usize,
}

#[derive(Serialize, ToSchema)]
pub struct MergeResponse {
    /// Locator of the merged artifact under /downloads
    pub url: String,
    /// Locator of the preview bundle under /previews
    pub preview: String,
    pub pages: usize,
}

#[utoipa::path(
    post,
    path = "/api/preview",
    request_body(content = Multipart, description = "One file to preview"),
    responses(
        (status = 200, description = "Preview bundle generated", body = PreviewResponse),
        (status = 400, description = "Missing or invalid file"),
        (status = 500, description = "Preview generation failed")
    ),
    tag = "pipeline"
)]
pub async fn preview_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<PreviewResponse>, AppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("file") {
            upload = Some(stage_upload(&state, field).await?);
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;

    let bundle = state
        .preview
        .generate(&upload.path, &upload.original_name)
        .await?;

    Ok(Json(PreviewResponse {
        url: format!("/previews/{}", bundle.key),
        pages: bundle.page_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/convert",
    request_body(content = Multipart, description = "One file plus an outputFormat field"),
    responses(
        (status = 200, description = "File converted", body = ConvertResponse),
        (status = 400, description = "Missing file or unsupported output format"),
        (status = 500, description = "Conversion failed")
    ),
    tag = "pipeline"
)]
pub async fn convert_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    let mut upload: Option<UploadedFile> = None;
    let mut output_format: Option<String> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("file") => upload = Some(stage_upload(&state, field).await?),
            Some("outputFormat") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                output_format = Some(value);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    let format: OutputFormat = output_format
        .ok_or_else(|| AppError::BadRequest("Missing outputFormat field".to_string()))?
        .parse()?;

    let artifact = state.convert.convert(&upload, format).await?;
    let bundle = state
        .preview
        .generate(&artifact.path, &upload.original_name)
        .await?;

    Ok(Json(ConvertResponse {
        url: format!("/downloads/{}", artifact.file_name),
        preview: format!("/previews/{}", bundle.key),
        pages: bundle.page_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/merge",
    request_body(content = Multipart, description = "Ordered list of files fields"),
    responses(
        (status = 200, description = "Files merged", body = MergeResponse),
        (status = 400, description = "No input files supplied"),
        (status = 500, description = "Merge failed")
    ),
    tag = "pipeline"
)]
pub async fn merge_files(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<MergeResponse>, AppError> {
    let mut uploads: Vec<UploadedFile> = Vec::new();

    // Field order is the merge order and must be preserved verbatim
    while let Some(field) = next_field(&mut multipart).await? {
        if matches!(field.name(), Some("files") | Some("file")) {
            uploads.push(stage_upload(&state, field).await?);
        }
    }

    let artifact = state.merge.merge(&uploads).await?;
    let bundle = state.preview.generate(&artifact.path, "merged").await?;

    Ok(Json(MergeResponse {
        url: format!("/downloads/{}", artifact.file_name),
        preview: format!("/previews/{}", bundle.key),
        pages: bundle.page_count,
    }))
}

async fn next_field<'a>(
    multipart: &'a mut Multipart,
) -> Result<Option<Field<'a>>, AppError> {
    multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            AppError::PayloadTooLarge(
                "Request body exceeds the maximum allowed limit".to_string(),
            )
        } else {
            AppError::BadRequest(err_msg)
        }
    })
}

/// Stream one multipart field into the incoming area under a server-assigned
/// unique name. The original filename survives only as metadata.
async fn stage_upload(
    state: &crate::AppState,
    field: Field<'_>,
) -> Result<UploadedFile, AppError> {
    let original_name = sanitize_filename(field.file_name().unwrap_or("unnamed"))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.storage.ensure(StorageArea::Incoming).await?;

    let stored_name = match file_extension(&original_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };
    let path = state.storage.resolve(StorageArea::Incoming, &stored_name);

    let mut reader = StreamReader::new(field.map_err(std::io::Error::other));
    let mut file = tokio::fs::File::create(&path).await?;
    let size = tokio::io::copy(&mut reader, &mut file).await?;

    Ok(UploadedFile {
        original_name,
        path,
        size,
    })
}
