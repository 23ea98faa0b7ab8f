use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Responder, get};

/// Landing page. Static markup, no session required.
#[get("/")]
pub async fn home_route() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(include_str!("../../templates/index.html"))
}
