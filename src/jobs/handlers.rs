//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Implementa los endpoints del servicio:
//! - `POST /hash` (form `password`) → id del job
//! - `GET /hash/{id}` → digest, o 404 si no existe o aún no está listo
//! - `/stats` → `{"Total": N, "Average": M}`
//! - `/shutdown` → inicia el drenado

use crate::http::{Method, Response, StatusCode};
use crate::jobs::registry::{JobId, SubmitError};
use crate::router::{Context, Router};

/// Registra las rutas del servicio en el router
pub fn register_routes(router: &mut Router) -> Result<(), regex::Error> {
    router.register(r"^/hash$", submit_handler)?;
    router.register(r"^/hash/([0-9]+)$", result_handler)?;
    router.register(r"^/stats$", stats_handler)?;
    router.register(r"^/shutdown$", shutdown_handler)?;
    Ok(())
}

/// Handler para `POST /hash`
///
/// Encola el password y responde de inmediato con el id en texto plano.
pub fn submit_handler(ctx: &Context<'_>) -> Response {
    if ctx.request.method() != Method::POST {
        return Response::text(StatusCode::NotFound, "Invalid Method");
    }

    let password = ctx.request.form_value("password").unwrap_or_default();

    match ctx.service.submit(password) {
        Ok(id) => {
            log::info!("Job {} submitted", id);
            Response::text(StatusCode::Ok, &id.to_string())
        }
        Err(e) => submit_rejected(e),
    }
}

/// Respuesta para un submit que no obtuvo id
///
/// Ambos casos son transitorios para el cliente: 503.
fn submit_rejected(error: SubmitError) -> Response {
    match error {
        // El drenado empezó después de que el dispatcher revisara la bandera
        SubmitError::Draining => log::debug!("Submit rejected: {}", error),
        SubmitError::Spawn => log::warn!("Submit rejected: {}", error),
    }
    Response::text(StatusCode::ServiceUnavailable, "Service Unavailable")
}

/// Handler para `GET /hash/{id}`
///
/// Un id mal formado, desconocido o pendiente responden igual: 404.
pub fn result_handler(ctx: &Context<'_>) -> Response {
    if ctx.request.method() != Method::GET {
        return Response::text(StatusCode::NotFound, "Invalid Method");
    }

    let digest = ctx
        .param(0)
        .and_then(|raw| raw.parse::<JobId>().ok())
        .and_then(|id| ctx.service.fetch(id));

    match digest {
        Some(digest) => Response::text(StatusCode::Ok, &digest),
        None => Response::text(StatusCode::NotFound, "Not Found"),
    }
}

/// Handler para `/stats`
pub fn stats_handler(ctx: &Context<'_>) -> Response {
    Response::json(StatusCode::Ok, &ctx.service.stats())
}

/// Handler para `/shutdown`
pub fn shutdown_handler(ctx: &Context<'_>) -> Response {
    ctx.service.request_drain();
    Response::new(StatusCode::Ok)
        .with_header("Content-Type", "text/plain")
        .with_body(b"")
}
