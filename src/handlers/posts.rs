/// Post endpoints - feed, full post, creation, deletion, like/unlike
use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::models::PostType;
use crate::error::{AppError, Result};
use crate::middleware::ActorContext;
use crate::services::{FeedCursor, FeedService, MediaUpload};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub before: Option<DateTime<Utc>>,
    pub before_id: Option<Uuid>,
    pub author: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub body: Option<String>,
    pub flair: Option<Uuid>,
    #[serde(default)]
    pub media: Vec<InlineMedia>,
}

/// One image carried inline in the creation request
#[derive(Debug, Deserialize)]
pub struct InlineMedia {
    /// Base64-encoded image bytes
    pub data: String,
    pub content_type: String,
}

impl InlineMedia {
    fn decode(&self) -> Result<MediaUpload> {
        let bytes = general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|_| AppError::Validation("invalid base64 media payload".to_string()))?;
        Ok(MediaUpload {
            bytes,
            mime_type: self.content_type.clone(),
        })
    }
}

pub async fn get_feed(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let club_id = path.into_inner();
    let cursor = FeedCursor {
        before: query.before,
        before_id: query.before_id,
    };

    let page = service
        .fetch_feed(&actor.0, club_id, query.post_type, cursor, query.author)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_post(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let media = req
        .media
        .iter()
        .map(InlineMedia::decode)
        .collect::<Result<Vec<_>>>()?;

    let created = service
        .create_post(
            &actor.0,
            path.into_inner(),
            req.post_type,
            &req.title,
            req.body.as_deref(),
            req.flair,
            media,
        )
        .await?;

    Ok(HttpResponse::Created().json(created))
}

pub async fn get_post(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let view = service.fetch_full_post(&actor.0, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn get_post_for_moderation(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let view = service
        .fetch_post_for_moderation(&actor.0, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn delete_post(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    service.delete_post(&actor.0, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "msg": "Deleted post" })))
}

pub async fn like_post(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let like_count = service.like_post(&actor.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "like_count": like_count })))
}

pub async fn unlike_post(
    service: web::Data<FeedService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let like_count = service.unlike_post(&actor.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "like_count": like_count })))
}
