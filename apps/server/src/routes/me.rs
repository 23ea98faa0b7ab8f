use actix_session::Session;
use actix_web::{HttpResponse, get, web};
use dormstore::Store;
use dormstore::models::User;
use serde::Serialize;

use crate::auth::USER_ID_KEY;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct Profile {
    user: User,
    virtue: i64,
}

/// Profile of the signed-in user with their current virtue balance
#[get("/me")]
pub async fn me_route(
    session: Session,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let Some(uid) = session.get::<i64>(USER_ID_KEY)? else {
        return Ok(HttpResponse::Unauthorized().finish());
    };

    let Some(user) = store.get_user_by_id(uid).await? else {
        return Ok(HttpResponse::NotFound().finish());
    };
    let virtue = store.get_virtue_balance(uid).await?.unwrap_or(0);

    Ok(HttpResponse::Ok().json(Profile { user, virtue }))
}
