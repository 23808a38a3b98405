//! Response cache in front of the lookup routes.
//!
//! A request is served from (and written to) the shared [`ResponseCache`]
//! only when it is a `GET`, carries a bearer token, and has not opted out via
//! `X-Cache-Control`. Cached entries are scoped to the caller, so two callers
//! asking for the same path never share a body. Only successful responses
//! are stored.

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use actix_web::{
    body::{to_bytes, BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorInternalServerError,
    http::{
        header::{self, ContentType},
        Method,
    },
    Error, HttpRequest, HttpResponse,
};
use cep_gateway_domain::{CacheKey, LookupKey, ResponseCache};
use futures_util::future::LocalBoxFuture;
use metrics::counter;
use tracing::debug;

pub const CACHE_CONTROL_HEADER: &str = "x-cache-control";
const NO_CACHE: &str = "no-cache";
const BEARER: &str = "bearer";

#[derive(Clone)]
pub struct CacheGate {
    cache: Arc<ResponseCache>,
    ttl: Duration,
}

impl CacheGate {
    pub fn new(cache: Arc<ResponseCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<S, B> Transform<S, ServiceRequest> for CacheGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = CacheGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CacheGateMiddleware {
            service: Rc::new(service),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }))
    }
}

pub struct CacheGateMiddleware<S> {
    service: Rc<S>,
    cache: Arc<ResponseCache>,
    ttl: Duration,
}

impl<S, B> Service<ServiceRequest> for CacheGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;

        Box::pin(async move {
            let Some(key) = cache_key_for(req.request()) else {
                counter!("api_cache_gate_total", "decision" => "bypass").increment(1);
                return service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_boxed_body);
            };

            if let Some(payload) = cache.get(key.as_str()) {
                counter!("api_cache_gate_total", "decision" => "hit").increment(1);
                debug!(path = req.path(), "serving cached response");
                let response = HttpResponse::Ok()
                    .content_type(ContentType::json())
                    .body(payload);
                return Ok(req.into_response(response));
            }
            counter!("api_cache_gate_total", "decision" => "miss").increment(1);

            let response = service.call(req).await?;
            if !response.status().is_success() {
                return Ok(response.map_into_boxed_body());
            }

            let (request, response) = response.into_parts();
            let (head, body) = response.into_parts();
            let payload = to_bytes(body).await.map_err(|err| {
                let err: Box<dyn std::error::Error> = err.into();
                ErrorInternalServerError(err.to_string())
            })?;

            cache.set(key.as_str(), payload.to_vec(), ttl);
            counter!("api_cache_gate_total", "decision" => "stored").increment(1);

            let response = head.set_body(payload).map_into_boxed_body();
            Ok(ServiceResponse::new(request, response))
        })
    }
}

/// Cache key for `req`, or `None` when the request must bypass the cache.
pub fn cache_key_for(req: &HttpRequest) -> Option<CacheKey> {
    if !is_cacheable(req) {
        return None;
    }
    let token = bearer_token(req)?;
    Some(CacheKey::derive(token, &canonical_target(req)))
}

/// Request path with every zip-code segment rewritten to its normalized
/// form, so `01001-000` and `01001000` address the same entry. The query
/// string is kept verbatim.
fn canonical_target(req: &HttpRequest) -> String {
    let mut target = req
        .path()
        .split('/')
        .map(|segment| match LookupKey::parse(segment) {
            Ok(key) => key.into_inner(),
            Err(_) => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");
    if let Some(query) = req.uri().query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// GET only. An absent or blank `X-Cache-Control`, or the literal
/// `no-cache`, keeps the request eligible; any other value opts out.
fn is_cacheable(req: &HttpRequest) -> bool {
    if req.method() != Method::GET {
        return false;
    }
    match req.headers().get(CACHE_CONTROL_HEADER) {
        None => true,
        Some(value) => value
            .to_str()
            .map(|value| {
                let value = value.trim();
                value.is_empty() || value.eq_ignore_ascii_case(NO_CACHE)
            })
            .unwrap_or(false),
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() {
        return None;
    }
    Some(token)
}
