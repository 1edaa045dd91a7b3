use std::path::Path;
use std::time::{Duration, SystemTime};

use actix_web::body::SizedStream;
use actix_web::http::StatusCode;
use actix_web::http::header::{CacheControl, CacheDirective, ContentType, Expires, HttpDate};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use log::{debug, error};
use serde::Deserialize;

use crate::domain::{RequestContext, ResolvedTarget, SortSpec};
use crate::dto::ListingPageDto;
use crate::middleware::{LogDisposition, RequestClass, access_log_disposition};
use crate::models::config::ServerConfig;
use crate::routes::{error_page, render_listing};
use crate::services::{ServiceError, ServiceResult};
use crate::services::assets::lookup_asset;
use crate::services::files::OpenedFile;
use crate::services::listing::{scan_directory, sort_entries};
use crate::services::resolver::{decode_request_path, resolve};

const ASSET_MAX_AGE: Duration = Duration::from_secs(3600);

#[derive(Debug, Default, Deserialize)]
struct ListingQueryParams {
    sort: Option<String>,
    order: Option<String>,
}

impl RequestContext {
    fn from_request(req: &HttpRequest) -> Self {
        let query = req.query_string();
        Self {
            path: decode_request_path(req.path()),
            query: (!query.is_empty()).then(|| query.to_string()),
            client_address: req
                .peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    /// Sort parameters; a malformed query falls back to the default order.
    fn sort_spec(&self) -> SortSpec {
        let params = self
            .query
            .as_deref()
            .and_then(|query| web::Query::<ListingQueryParams>::from_query(query).ok())
            .map(web::Query::into_inner)
            .unwrap_or_default();
        SortSpec::from_params(params.sort.as_deref(), params.order.as_deref())
    }
}

/// Entry point for every request: assets, listings, downloads and errors.
pub async fn dispatch(req: HttpRequest, server_config: web::Data<ServerConfig>) -> HttpResponse {
    let context = RequestContext::from_request(&req);
    let class = RequestClass::of(&context.path);

    let outcome = match class {
        RequestClass::Asset => serve_asset(&server_config, &context),
        RequestClass::Content => serve_content(&server_config, &context),
    };

    outcome.unwrap_or_else(|err| failure_response(class, &context, err))
}

/// Any service failure is a bare 500; asset failures stay out of the logs.
fn failure_response(
    class: RequestClass,
    context: &RequestContext,
    err: ServiceError,
) -> HttpResponse {
    if access_log_disposition(class) == LogDisposition::Record {
        error!(
            "Failed to serve {} for {}: {err:?}",
            context.path, context.client_address
        );
    }
    error_page(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Bundled assets, cached by clients for an hour.
fn serve_asset(
    server_config: &ServerConfig,
    context: &RequestContext,
) -> ServiceResult<HttpResponse> {
    let Some(path) = lookup_asset(&server_config.assets_dir, &context.path)? else {
        return Ok(error_page(StatusCode::NOT_FOUND));
    };

    let mut builder = HttpResponse::Ok();
    builder
        .insert_header(CacheControl(vec![
            CacheDirective::Public,
            CacheDirective::MaxAge(ASSET_MAX_AGE.as_secs() as u32),
        ]))
        .insert_header(Expires(HttpDate::from(SystemTime::now() + ASSET_MAX_AGE)));
    stream_file(builder, &path)
}

fn serve_content(
    server_config: &ServerConfig,
    context: &RequestContext,
) -> ServiceResult<HttpResponse> {
    match resolve(&server_config.root_directory, &context.path)? {
        ResolvedTarget::Directory(dir) => list_directory(server_config, context, &dir),
        ResolvedTarget::File(file) => stream_file(HttpResponse::Ok(), &file),
        ResolvedTarget::NotFound => Ok(error_page(StatusCode::NOT_FOUND)),
        ResolvedTarget::Forbidden => {
            debug!(
                "Rejected path outside root from {}: {}",
                context.client_address, context.path
            );
            Ok(error_page(StatusCode::NOT_FOUND))
        }
    }
}

fn list_directory(
    server_config: &ServerConfig,
    context: &RequestContext,
    dir: &Path,
) -> ServiceResult<HttpResponse> {
    let root = &server_config.root_directory;
    let spec = context.sort_spec();

    let mut entries = scan_directory(dir)?;
    sort_entries(&mut entries, spec);

    let base_path = root.url_path_of(dir).unwrap_or_else(|| "/".to_string());
    let page = ListingPageDto::new(
        &server_config.site_name,
        server_config.background_image.as_deref(),
        &context.path,
        &base_path,
        dir == root.as_path(),
        entries,
        spec,
    );
    let html = render_listing(&page)?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(html))
}

/// Full-body download; no range support.
fn stream_file(mut builder: HttpResponseBuilder, path: &Path) -> ServiceResult<HttpResponse> {
    let file = OpenedFile::open(path)?;
    let content_type = file.content_type().clone();
    let len = file.len();

    Ok(builder
        .content_type(content_type)
        .body(SizedStream::new(len, file.into_stream())))
}
