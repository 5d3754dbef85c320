use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::http::{HttpRequest, HttpResponse, YAML};
use super::openapi::OPENAPI_YAML;
use crate::probe::Probes;
use crate::records::{RecordStore, SearchResult, StoreError};

pub const SERVICE: &str = "screenmem";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 200;

const ROUTES: [&str; 6] = [
    "/",
    "/health",
    "/status",
    "/search",
    "/screen-recording/probe",
    "/openapi.yaml",
];

/// Maps one parsed request to one response. Holds no per-request state.
#[derive(Clone)]
pub struct ApiResponder {
    store: Arc<RecordStore>,
    probes: Arc<dyn Probes>,
}

#[derive(Serialize)]
struct Discovery {
    service: &'static str,
    version: &'static str,
    openapi: &'static str,
    routes: [&'static str; 6],
}

#[derive(Serialize)]
struct Health {
    ok: bool,
    service: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    record_count: u64,
    last_capture_at: Option<DateTime<Utc>>,
    database_bytes: u64,
    accessibility_granted: bool,
    screen_recording_granted: bool,
}

#[derive(Serialize)]
struct SearchPayload<'a> {
    query: &'a str,
    count: usize,
    results: Vec<SearchResult>,
}

impl ApiResponder {
    pub fn new(store: Arc<RecordStore>, probes: Arc<dyn Probes>) -> Self {
        Self { store, probes }
    }

    pub fn respond(&self, request: &HttpRequest) -> HttpResponse {
        if request.method != "GET" {
            return HttpResponse::error(405, "method_not_allowed", "Only GET is supported.");
        }

        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(path = %request.path, error = %e, "request failed");
                HttpResponse::error(500, "internal_error", e.to_string())
            }
        }
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, StoreError> {
        let response = match request.path.as_str() {
            "/" | "/docs" | "/openapi" => HttpResponse::json(
                200,
                &Discovery {
                    service: SERVICE,
                    version: VERSION,
                    openapi: "/openapi.yaml",
                    routes: ROUTES,
                },
            ),
            "/openapi.yaml" => HttpResponse::text(200, YAML, OPENAPI_YAML),
            "/health" => HttpResponse::json(
                200,
                &Health {
                    ok: true,
                    service: SERVICE,
                    version: VERSION,
                },
            ),
            "/status" => {
                let status = self.store.status()?;
                let perms = self.probes.permissions();
                HttpResponse::json(
                    200,
                    &Status {
                        record_count: status.record_count,
                        last_capture_at: status.last_capture_at,
                        database_bytes: status.database_bytes,
                        accessibility_granted: perms.accessibility_granted,
                        screen_recording_granted: perms.screen_recording_granted,
                    },
                )
            }
            "/search" => {
                let Some(query) = request.param("q") else {
                    return Ok(HttpResponse::error(400, "missing_query", "Expected query parameter 'q'."));
                };
                let limit = clamp_limit(request.param("limit"));
                let results = self.store.search(query, limit, request.param("app"))?;
                HttpResponse::json(
                    200,
                    &SearchPayload {
                        query,
                        count: results.len(),
                        results,
                    },
                )
            }
            "/screen-recording/probe" => HttpResponse::json(200, &self.probes.capture()),
            _ => HttpResponse::error(404, "not_found", "Route not found."),
        };
        Ok(response)
    }
}

/// Requested `limit` parameter to an effective limit in `1..=200`.
/// Absent or unparsable values use the default of 20.
pub fn clamp_limit(raw: Option<&str>) -> usize {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as usize,
        None => DEFAULT_LIMIT,
    }
}
