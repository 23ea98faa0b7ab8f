use actix_session::Session;
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, Responder, get, post, web};
use dormstore::Store;
use serde::Deserialize;
use tracing::info;

use crate::auth::USER_ID_KEY;
use crate::error::ApiError;

const LOGIN_PAGE: &str = include_str!("../../templates/login.html");

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
}

#[get("/login")]
pub async fn login_page() -> impl Responder {
    HttpResponse::Ok().content_type(ContentType::html()).body(LOGIN_PAGE)
}

/// The schema stores no credentials; logging in is identification by email.
#[post("/login")]
pub async fn login_submit(
    form: web::Form<LoginForm>,
    store: web::Data<dyn Store>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    match store.get_user_by_email(&form.email).await? {
        Some(user) => {
            session.insert(USER_ID_KEY, user.uid)?;
            info!("user <{}> logged in", user.uid);
            Ok(HttpResponse::Found().insert_header((header::LOCATION, "/")).finish())
        }
        None => {
            Ok(HttpResponse::Unauthorized().content_type(ContentType::html()).body(LOGIN_PAGE))
        }
    }
}

#[post("/logout")]
pub async fn logout_route(session: Session) -> impl Responder {
    session.purge();
    HttpResponse::Found().insert_header((header::LOCATION, "/login")).finish()
}
