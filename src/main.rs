use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use community_board_service::config::Config;
use community_board_service::handlers;
use community_board_service::media::{LocalMediaStore, MediaStore};
use community_board_service::repository::{
    ClubRepository, CommentLikeRepository, CommentRepository, MemberRepository,
    PostLikeRepository, PostRepository,
};
use community_board_service::services::{CommentService, FeedService};

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(&config.media.root));

    let posts = Arc::new(PostRepository::new(pool.clone()));
    let comments = Arc::new(CommentRepository::new(pool.clone()));
    let post_likes = Arc::new(PostLikeRepository::new(pool.clone()));
    let comment_likes = Arc::new(CommentLikeRepository::new(pool.clone()));
    let members = Arc::new(MemberRepository::new(pool.clone()));
    let clubs = Arc::new(ClubRepository::new(pool.clone()));

    let feed_service = FeedService::new(
        posts.clone(),
        comments.clone(),
        post_likes,
        members.clone(),
        clubs.clone(),
        media,
        config.media.base_url.clone(),
    );

    let comment_service = CommentService::new(comments, posts, members, clubs, comment_likes);

    let bind_addr = (config.app.host.clone(), config.app.http_port);
    info!(
        host = %config.app.host,
        port = config.app.http_port,
        env = %config.app.env,
        "starting community board service"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(web::Data::new(feed_service.clone()))
            .app_data(web::Data::new(comment_service.clone()))
            .route("/health", web::get().to(health))
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
    .context("HTTP server failed")
}
