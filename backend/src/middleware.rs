use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use log::{error, info, warn};
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id attached to each request's extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuses a well-formed id set by an upstream proxy, otherwise mints a UUID v4.
fn request_id_for(req: &ServiceRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Access log with one line per request, at a level chosen by status class.
pub struct Logger;

impl<S, B> Transform<S, ServiceRequest> for Logger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let start_time = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let peer_addr = req
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let request_id = request_id_for(&req);
        req.extensions_mut().insert(RequestId(request_id.clone()));

        Box::pin(async move {
            let mut res = svc.call(req).await?;
            let elapsed_ms = start_time.elapsed().as_millis();

            if let Ok(header_value) = HeaderValue::try_from(request_id.as_str()) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
            }

            let status_code = res.status().as_u16();
            match status_code {
                500.. => error!(
                    "request_id={} {} {} {} {}ms {}",
                    request_id, method, path, status_code, elapsed_ms, peer_addr
                ),
                400..=499 => warn!(
                    "request_id={} {} {} {} {}ms {}",
                    request_id, method, path, status_code, elapsed_ms, peer_addr
                ),
                _ => info!(
                    "request_id={} {} {} {} {}ms {}",
                    request_id, method, path, status_code, elapsed_ms, peer_addr
                ),
            }

            Ok(res)
        })
    }
}

/// The leaderboard page and its data are public; only simple GET/POST are allowed cross-origin.
pub fn cors_middleware() -> actix_cors::Cors {
    actix_cors::Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::ACCEPT,
            actix_web::http::header::CONTENT_TYPE,
        ])
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        http::{Method, StatusCode},
        test, web, App, HttpRequest, HttpResponse,
    };

    #[actix_web::test]
    async fn test_logger_sets_request_id_header() {
        let app = test::init_service(
            App::new()
                .wrap(Logger)
                .route("/test", web::get().to(|| async { "test" })),
        )
        .await;

        let req = test::TestRequest::get().uri("/test").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let id = resp.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[actix_web::test]
    async fn test_logger_reuses_incoming_request_id() {
        let app = test::init_service(
            App::new().wrap(Logger).route(
                "/echo",
                web::get().to(|req: HttpRequest| async move {
                    let id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.0.clone())
                        .unwrap_or_default();
                    HttpResponse::Ok().body(id)
                }),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/echo")
            .insert_header((REQUEST_ID_HEADER, "proxy-42"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "proxy-42");
        let body = test::read_body(resp).await;
        assert_eq!(body, "proxy-42");
    }

    #[actix_web::test]
    async fn test_logger_passes_error_statuses_through() {
        let app = test::init_service(
            App::new()
                .wrap(Logger)
                .route("/error", web::get().to(|| async { HttpResponse::InternalServerError().finish() }))
                .route("/missing", web::get().to(|| async { HttpResponse::NotFound().finish() })),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/error").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/missing").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_cors_preflight() {
        let app = test::init_service(
            App::new()
                .wrap(cors_middleware())
                .route("/api/players", web::get().to(|| async { "[]" })),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/players")
            .insert_header((actix_web::http::header::ORIGIN, "http://example.org"))
            .insert_header((actix_web::http::header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
