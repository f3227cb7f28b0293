//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Dispatcher que mapea paths HTTP a handlers mediante una lista ordenada de
//! expresiones regulares.
//!
//! ```text
//! Request → ¿drenando? ──sí──► 503 Service Unavailable
//!               │
//!               no
//!               ▼
//!          primer patrón que matchea → Handler(Context) → Response
//!               │
//!          ninguno → handler por defecto (404)
//! ```
//!
//! Los grupos de captura del patrón llegan al handler en `Context::params`.

use crate::http::{Request, Response, StatusCode};
use crate::service::HashService;
use regex::Regex;

/// Tipo de función handler
pub type Handler = fn(&Context<'_>) -> Response;

/// Lo que recibe cada handler
pub struct Context<'a> {
    pub request: &'a Request,

    /// Grupos de captura 1..n del patrón que matcheó
    pub params: Vec<String>,

    pub service: &'a HashService,
}

impl Context<'_> {
    /// Parámetro de path por posición
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|s| s.as_str())
    }
}

struct Route {
    pattern: Regex,
    handler: Handler,
}

/// Router que mapea patrones a handlers
pub struct Router {
    routes: Vec<Route>,
    default_handler: Handler,
}

impl Router {
    /// Crea un router vacío con el handler 404 por defecto
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default_handler: not_found_handler,
        }
    }

    /// Registra una ruta; el orden de registro define la prioridad
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::router::{Context, Router};
    /// use hash_server::http::{Response, StatusCode};
    ///
    /// fn hello_handler(_ctx: &Context<'_>) -> Response {
    ///     Response::text(StatusCode::Ok, "hello")
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(r"^/hello$", hello_handler).unwrap();
    /// ```
    pub fn register(&mut self, pattern: &str, handler: Handler) -> Result<(), regex::Error> {
        self.routes.push(Route {
            pattern: Regex::new(pattern)?,
            handler,
        });
        Ok(())
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// Mientras el servicio drena, todo request (incluido otro `/shutdown`)
    /// recibe 503 sin llegar a ningún handler.
    pub fn route(&self, request: &Request, service: &HashService) -> Response {
        let mut response = if service.is_draining() {
            Response::text(StatusCode::ServiceUnavailable, "Service Unavailable")
        } else {
            self.dispatch(request, service)
        };

        self.add_common_headers(&mut response);
        response
    }

    fn dispatch(&self, request: &Request, service: &HashService) -> Response {
        let path = request.path();

        for route in &self.routes {
            if let Some(captures) = route.pattern.captures(path) {
                let params = captures
                    .iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();

                let ctx = Context {
                    request,
                    params,
                    service,
                };
                return (route.handler)(&ctx);
            }
        }

        let ctx = Context {
            request,
            params: Vec::new(),
            service,
        };
        (self.default_handler)(&ctx)
    }

    /// Agrega headers comunes a todas las respuestas
    fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Server", "HashServer-HTTP/1.0");
        response.add_header("Connection", "close");
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found_handler(_ctx: &Context<'_>) -> Response {
    Response::text(StatusCode::NotFound, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn echo_handler(ctx: &Context<'_>) -> Response {
        Response::text(StatusCode::Ok, &ctx.params.join(","))
    }

    fn ok_handler(_ctx: &Context<'_>) -> Response {
        Response::text(StatusCode::Ok, "ok")
    }

    fn get(path: &str) -> Request {
        Request::parse(format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes()).unwrap()
    }

    fn service() -> HashService {
        HashService::with_delay(Duration::from_millis(10))
    }

    #[test]
    fn test_route_not_found() {
        let router = Router::new();
        let response = router.route(&get("/nonexistent"), &service());

        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body_text(), "Not found\n");
        assert_eq!(response.header("Connection"), Some("close"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut router = Router::new();
        assert!(router.register("(unclosed", ok_handler).is_err());
    }

    #[test]
    fn test_captures_become_params() {
        let mut router = Router::new();
        router.register(r"^/pair/([a-z]+)/([0-9]+)$", echo_handler).unwrap();

        let response = router.route(&get("/pair/abc/42"), &service());

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body_text(), "abc,42\n");
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router.register(r"^/a", ok_handler).unwrap();
        router.register(r"^/a/([0-9]+)$", echo_handler).unwrap();

        let response = router.route(&get("/a/7"), &service());
        assert_eq!(response.body_text(), "ok\n");
    }

    #[test]
    fn test_draining_short_circuits_every_route() {
        let mut router = Router::new();
        router.register(r"^/ok$", ok_handler).unwrap();

        let service = service();
        service.request_drain();

        let response = router.route(&get("/ok"), &service);
        assert_eq!(response.status(), StatusCode::ServiceUnavailable);

        let response = router.route(&get("/nonexistent"), &service);
        assert_eq!(response.status(), StatusCode::ServiceUnavailable);
        assert_eq!(response.header("Server"), Some("HashServer-HTTP/1.0"));
    }
}
