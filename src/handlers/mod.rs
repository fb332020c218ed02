/// HTTP endpoints for the community board. Handlers translate requests
/// into service calls and service results into JSON; all policy lives in
/// the services.
pub mod comments;
pub mod posts;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/clubs/{club_id}/feed", web::get().to(posts::get_feed))
            .route("/clubs/{club_id}/posts", web::post().to(posts::create_post))
            .route("/posts/{slug}", web::get().to(posts::get_post))
            .route("/posts/{slug}", web::delete().to(posts::delete_post))
            .route(
                "/moderation/posts/{slug}",
                web::get().to(posts::get_post_for_moderation),
            )
            .route("/posts/{post_id}/likes", web::post().to(posts::like_post))
            .route(
                "/posts/{post_id}/likes",
                web::delete().to(posts::unlike_post),
            )
            .route(
                "/posts/{post_id}/comments",
                web::post().to(comments::add_comment),
            )
            .route(
                "/posts/{post_id}/comments",
                web::get().to(comments::get_comment_tree),
            )
            .route(
                "/comments/{comment_id}/likes",
                web::post().to(comments::like_comment),
            )
            .route(
                "/comments/{comment_id}/likes",
                web::delete().to(comments::unlike_comment),
            )
            .route(
                "/comments/{comment_id}",
                web::delete().to(comments::delete_comment),
            ),
    );
}
