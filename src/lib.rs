//! Business health dashboard: Local Visibility Score and review sentiment
//! trends for multi-location businesses, served with Rocket.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod samples;
pub mod sentiment;
pub mod visibility;

use rocket::fairing::AdHoc;
use rocket::fs::{relative, FileServer};
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

/// Rocket instance configured from the default figment
pub fn build() -> Rocket<Build> {
    mount(rocket::build())
}

/// Attach fairings and mount every route on an existing instance
pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(AdHoc::config::<config::AppConfig>())
        .attach(Template::fairing())
        .mount("/", routes::index_routes())
        .mount("/api", routes::api_routes())
        .mount("/static", FileServer::from(relative!("static")))
}
