use actix_web::HttpResponse;
use actix_web::http::{StatusCode, header::ContentType};
use lazy_static::lazy_static;
use log::error;
use tera::{Context, Tera};

use crate::dto::ListingPageDto;
use crate::services::{ServiceError, ServiceResult};

pub mod main;

pub const LISTING_TEMPLATE: &str = "main/listing.html";

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        if let Err(e) = tera.add_raw_template(
            LISTING_TEMPLATE,
            include_str!("../../templates/main/listing.html"),
        ) {
            error!("Parsing error(s): {}", e);
            ::std::process::exit(1);
        }
        tera
    };
}

/// Render a listing page; entry names are HTML-escaped by the template engine.
pub fn render_listing(page: &ListingPageDto) -> ServiceResult<String> {
    let context = Context::from_serialize(page).map_err(ServiceError::Render)?;
    TEMPLATES
        .render(LISTING_TEMPLATE, &context)
        .map_err(ServiceError::Render)
}

/// Minimal HTML body for 404 and 500 responses.
pub fn error_page(status: StatusCode) -> HttpResponse {
    let reason = status.canonical_reason().unwrap_or("Error");
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(format!("<h1>{} {}</h1>", status.as_u16(), reason))
}
