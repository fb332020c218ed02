/// Comment endpoints - creation, tree retrieval, like/unlike, deletion
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::middleware::ActorContext;
use crate::services::{CommentService, FeedCursor};

#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CommentTreeQuery {
    pub parent: Option<Uuid>,
    pub before: Option<DateTime<Utc>>,
    pub before_id: Option<Uuid>,
}

pub async fn add_comment(
    service: web::Data<CommentService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    req: web::Json<AddCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let view = service
        .add_comment(&actor.0, path.into_inner(), &req.body, req.reply_to)
        .await?;

    Ok(HttpResponse::Created().json(view))
}

pub async fn get_comment_tree(
    service: web::Data<CommentService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
    query: web::Query<CommentTreeQuery>,
) -> Result<HttpResponse> {
    let cursor = FeedCursor {
        before: query.before,
        before_id: query.before_id,
    };

    let tree = service
        .fetch_comment_tree(&actor.0, path.into_inner(), query.parent, cursor)
        .await?;

    Ok(HttpResponse::Ok().json(tree))
}

pub async fn like_comment(
    service: web::Data<CommentService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let like_count = service.like_comment(&actor.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "like_count": like_count })))
}

pub async fn unlike_comment(
    service: web::Data<CommentService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let like_count = service.unlike_comment(&actor.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "like_count": like_count })))
}

pub async fn delete_comment(
    service: web::Data<CommentService>,
    actor: ActorContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service.delete_comment(&actor.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "msg": "Deleted comment" })))
}
