/// Identity context extraction.
///
/// Session issuance and token validation are external: the upstream
/// gateway authenticates the request and forwards the resolved identity in
/// trusted headers. This module only lifts those headers into a typed
/// [`Actor`]; it never parses credentials.
use std::future::{ready, Ready};
use std::str::FromStr;

use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::models::{Actor, Role};
use crate::error::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_MEMBER_HEADER: &str = "x-actor-member";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_CLUB_HEADER: &str = "x-actor-club";

/// Pre-validated actor context, one per request
#[derive(Debug, Clone)]
pub struct ActorContext(pub Actor);

fn header<'r>(req: &'r HttpRequest, name: &str) -> Option<&'r str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn parse_actor(req: &HttpRequest) -> Result<Actor, AppError> {
    let user_id = header(req, ACTOR_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing actor context".to_string()))
        .and_then(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| AppError::Unauthorized("Invalid actor id".to_string()))
        })?;

    let role = match header(req, ACTOR_ROLE_HEADER) {
        Some(raw) => Role::from_str(raw)?,
        None => Role::Student,
    };

    let member_id = header(req, ACTOR_MEMBER_HEADER)
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| AppError::Unauthorized("Invalid member id".to_string()))?;

    let club_id = header(req, ACTOR_CLUB_HEADER)
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| AppError::Unauthorized("Invalid club id".to_string()))?;

    Ok(Actor {
        user_id,
        member_id,
        role,
        club_id,
    })
}

impl FromRequest for ActorContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(parse_actor(req).map(ActorContext))
    }
}
