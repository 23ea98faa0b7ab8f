use actix_web::middleware::from_fn;
use actix_web::web;

use crate::auth::require_login;

mod home;
mod login;
mod me;

/// Register all routes. Everything inside the trailing scope sits behind the
/// login gate.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home::home_route)
        .service(login::login_page)
        .service(login::login_submit)
        .service(login::logout_route)
        .service(web::scope("").wrap(from_fn(require_login)).service(me::me_route));
}
