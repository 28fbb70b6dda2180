pub mod account;
pub mod calls;
pub mod error;
pub mod index;
pub mod login;
pub mod logout;
pub mod notifications;
pub mod notifications_ws;
pub mod products;
pub mod queries;
pub mod route_access;
pub mod verification;

/// Registers every route module on the app.
///
/// Routes match first-registered-first, so the API modules all come
/// before the client bundle's catch-all.
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    account::configure(conf);
    calls::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    notifications::configure(conf);
    notifications_ws::configure(conf);
    products::configure(conf);
    queries::configure(conf);
    route_access::configure(conf);
    verification::configure(conf);

    conf.service(crate::create_user::register_post);

    index::configure(conf);
}
