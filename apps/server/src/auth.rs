use actix_session::Session;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse};

/// Session key holding the authenticated user's id
pub const USER_ID_KEY: &str = "user_id";

/// Login gate: requests without an authenticated session are redirected to
/// the login page, everything else reaches the wrapped handler unchanged.
pub async fn require_login(
    session: Session,
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if session.get::<i64>(USER_ID_KEY)?.is_none() {
        let redirect =
            HttpResponse::Found().insert_header((header::LOCATION, "/login")).finish();
        return Ok(req.into_response(redirect).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

#[cfg(test)]
mod tests {
    use actix_session::SessionMiddleware;
    use actix_session::storage::CookieSessionStore;
    use actix_web::cookie::Key;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::{App, test, web};

    use super::*;

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    async fn seed_session(session: Session) -> HttpResponse {
        session.insert(USER_ID_KEY, 1_i64).unwrap();
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn unauthenticated_requests_redirect_to_login() {
        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
                .service(
                    web::scope("")
                        .wrap(from_fn(require_login))
                        .route("/me", web::get().to(ok_handler)),
                ),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[actix_web::test]
    async fn authenticated_requests_pass_through() {
        let app = test::init_service(
            App::new()
                .wrap(SessionMiddleware::new(CookieSessionStore::default(), Key::generate()))
                .route("/seed", web::get().to(seed_session))
                .service(
                    web::scope("")
                        .wrap(from_fn(require_login))
                        .route("/me", web::get().to(ok_handler)),
                ),
        )
        .await;

        let seeded =
            test::call_service(&app, test::TestRequest::get().uri("/seed").to_request()).await;
        let cookie = seeded.response().cookies().next().expect("session cookie").into_owned();

        let req = test::TestRequest::get().uri("/me").cookie(cookie).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
