use axum::extract::{Multipart, State};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use amora_shared::errors::{AppError, AppResult, ErrorCode};
use amora_shared::types::ApiResponse;

use crate::models::NewUser;
use crate::schema::users;
use crate::AppState;

const MAX_PHOTOS: usize = 4;
const STARTING_TOKENS: i32 = 10;

#[derive(Debug, Default, Validate)]
struct RegisterForm {
    telegram_id: Option<i64>,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    name: String,
    #[validate(range(min = 18, max = 100, message = "age must be between 18 and 100"))]
    age: i32,
    gender: String,
    orientation: String,
    interested_in: Vec<String>,
    relationship_type: Vec<String>,
    selected_spokies: Vec<i32>,
    bio: String,
    /// (bytes, content type) pairs in upload order.
    photos: Vec<(Vec<u8>, String)>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub telegram_id: i64,
}

fn photo_extension(content_type: &str) -> AppResult<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        "image/gif" => Ok("gif"),
        _ => Err(AppError::new(
            ErrorCode::PhotoUploadFailed,
            "unsupported image format, accepted: jpeg, png, webp, gif",
        )),
    }
}

fn parse_json_list<T: serde::de::DeserializeOwned>(field: &str, value: &str) -> AppResult<Vec<T>> {
    serde_json::from_str(value).map_err(|_| {
        AppError::new(
            ErrorCode::ValidationError,
            format!("{field} must be a JSON array"),
        )
    })
}

async fn read_form(mut multipart: Multipart) -> AppResult<RegisterForm> {
    let mut form = RegisterForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "photos" => {
                if form.photos.len() >= MAX_PHOTOS {
                    return Err(AppError::new(
                        ErrorCode::TooManyPhotos,
                        format!("at most {MAX_PHOTOS} photos are allowed"),
                    ));
                }
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read photo: {e}"))
                })?;
                form.photos.push((data.to_vec(), content_type));
            }
            other => {
                let value = field.text().await.map_err(|e| {
                    AppError::new(ErrorCode::ValidationError, format!("failed to read field: {e}"))
                })?;
                match other {
                    "telegram_id" => {
                        form.telegram_id = Some(value.trim().parse().map_err(|_| {
                            AppError::new(ErrorCode::ValidationError, "telegram_id must be an integer")
                        })?);
                    }
                    "name" => form.name = value,
                    "age" => {
                        form.age = value.trim().parse().map_err(|_| {
                            AppError::new(ErrorCode::ValidationError, "age must be an integer")
                        })?;
                    }
                    "gender" => form.gender = value,
                    "orientation" => form.orientation = value,
                    "interested_in" => form.interested_in = parse_json_list("interested_in", &value)?,
                    "relationship_type" => {
                        form.relationship_type = parse_json_list("relationship_type", &value)?;
                    }
                    "selected_spokies" => {
                        form.selected_spokies = parse_json_list("selected_spokies", &value)?;
                    }
                    "bio" => form.bio = value,
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// POST /auth/register - create a user from a multipart form with 0-4 photos
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<RegisteredResponse>>> {
    let form = read_form(multipart).await?;

    let telegram_id = form
        .telegram_id
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "telegram_id is required"))?;

    form.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: bool = users::table
        .filter(users::telegram_id.eq(telegram_id))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if exists {
        return Err(AppError::new(ErrorCode::UserAlreadyExists, "user already registered"));
    }

    // Write photos to the uploads directory and keep their retrieval
    // paths in upload order. There is no rollback of written files if
    // the insert below fails.
    let mut photo_urls = Vec::with_capacity(form.photos.len());
    for (data, content_type) in &form.photos {
        let ext = photo_extension(content_type)?;
        let filename = format!("{}.{}", Uuid::now_v7(), ext);
        let path = std::path::Path::new(&state.config.uploads_dir).join(&filename);
        tokio::fs::write(&path, data).await.map_err(|e| {
            AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to store photo: {e}"))
        })?;
        photo_urls.push(format!("/uploads/{filename}"));
    }

    let new_user = NewUser {
        telegram_id,
        name: form.name.clone(),
        age: form.age,
        gender: form.gender,
        orientation: form.orientation,
        interested_in: form.interested_in,
        relationship_type: form.relationship_type,
        selected_spokies: form.selected_spokies,
        profile_photos: photo_urls,
        bio: form.bio,
        tokens: STARTING_TOKENS,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)?;

    tracing::info!(
        user = telegram_id,
        name = %form.name,
        photos = form.photos.len(),
        "user registered"
    );

    Ok(Json(ApiResponse::ok(RegisteredResponse { telegram_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(photo_extension("image/jpeg").unwrap(), "jpg");
        assert_eq!(photo_extension("image/png").unwrap(), "png");
        assert!(photo_extension("application/pdf").is_err());
    }

    #[test]
    fn json_list_parsing() {
        let tags: Vec<i32> = parse_json_list("selected_spokies", "[1,2,5]").unwrap();
        assert_eq!(tags, vec![1, 2, 5]);

        let genders: Vec<String> = parse_json_list("interested_in", r#"["female"]"#).unwrap();
        assert_eq!(genders, vec!["female".to_string()]);

        assert!(parse_json_list::<i32>("selected_spokies", "not json").is_err());
    }

    #[test]
    fn age_bounds_are_validated() {
        let form = RegisterForm {
            telegram_id: Some(111),
            name: "Alice".to_string(),
            age: 17,
            ..Default::default()
        };
        assert!(form.validate().is_err());
    }
}
