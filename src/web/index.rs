//! Client bundle delivery.
//!
//! Serves the built single-page client and hands index.html to any path
//! that matched nothing else, letting the client router take over.
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    let dist = crate::app_config::server().client_dist;
    let index = format!("{}/index.html", dist.trim_end_matches('/'));

    conf.service(
        Files::new("/", dist)
            .index_file("index.html")
            .default_handler(fn_service(move |req: ServiceRequest| {
                let index = index.clone();
                async move {
                    let (req, _) = req.into_parts();
                    let file = NamedFile::open_async(&index).await?;
                    let res = file.into_response(&req);
                    Ok(ServiceResponse::new(req, res))
                }
            })),
    );
}
