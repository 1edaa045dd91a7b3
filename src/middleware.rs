use actix_web::{
    Error,
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::LocalBoxFuture;
use std::fmt;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::services::assets::is_asset_path;
use crate::services::resolver::decode_request_path;

/// Structural kind of a request path, used to decide what gets logged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestClass {
    /// Bundled page furniture under the asset prefix.
    Asset,
    /// Anything addressing the served directory tree.
    Content,
}

impl RequestClass {
    pub fn of(decoded_path: &str) -> Self {
        if is_asset_path(decoded_path) {
            RequestClass::Asset
        } else {
            RequestClass::Content
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogDisposition {
    Record,
    Suppress,
}

/// Asset requests never reach the access log, whatever their status.
pub fn access_log_disposition(class: RequestClass) -> LogDisposition {
    match class {
        RequestClass::Asset => LogDisposition::Suppress,
        RequestClass::Content => LogDisposition::Record,
    }
}

/// One completed request.
#[derive(Clone, Debug)]
pub struct AccessRecord {
    pub status: u16,
    pub client_ip: String,
    pub path: String,
    pub elapsed: Duration,
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:<15} | {} ({:.3}s)",
            self.status,
            self.client_ip,
            self.path,
            self.elapsed.as_secs_f64()
        )
    }
}

type AccessSink = Rc<dyn Fn(&AccessRecord)>;

/// Access log middleware emitting one line per request.
pub struct AccessLog {
    sink: AccessSink,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::with_sink(|record| log::info!("{record}"))
    }

    pub fn with_sink(sink: impl Fn(&AccessRecord) + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware {
            service,
            sink: Rc::clone(&self.sink),
        }))
    }
}

pub struct AccessLogMiddleware<S> {
    service: S,
    sink: AccessSink,
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let path = decode_request_path(req.path());
        let client_ip = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());
        let sink = Rc::clone(&self.sink);

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await;

            if access_log_disposition(RequestClass::of(&path)) == LogDisposition::Record {
                let status = match &res {
                    Ok(res) => res.status(),
                    Err(err) => err.as_response_error().status_code(),
                };
                sink(&AccessRecord {
                    status: status.as_u16(),
                    client_ip,
                    path,
                    elapsed: started.elapsed(),
                });
            }

            res
        })
    }
}
