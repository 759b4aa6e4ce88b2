//! Request routing for the dashboard JSON API.
//!
//! Transport lives in `bin/dashboard_server.rs`; this module maps a request
//! line onto a response so routing is testable without sockets.

use anyhow::Result;
use serde_json::json;

use crate::dashboard::Dashboard;
use crate::filter::{FilterParams, RecencyWindow};
use crate::generator::SalesData;
use crate::logging::log_request;
use crate::model::Region;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn json(status: u16, body: String) -> Self {
        Self { status, content_type: "application/json", body }
    }

    fn text(status: u16, body: &str) -> Self {
        Self { status, content_type: "text/plain", body: body.to_string() }
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "BAD REQUEST",
            404 => "NOT FOUND",
            405 => "METHOD NOT ALLOWED",
            _ => "INTERNAL SERVER ERROR",
        }
    }

    /// Full HTTP/1.1 response with CORS headers.
    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

/// Overlay query parameters on `base`. Unknown keys are ignored.
pub fn parse_filter_query(query: &str, base: FilterParams) -> Result<FilterParams> {
    let mut params = base;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "region" => params.region = value.parse()?,
            "owner" | "rep" => params.owner = value.parse()?,
            "days" | "window" => params.window = value.parse()?,
            _ => {}
        }
    }
    Ok(params)
}

/// Route one request line (`GET /path?query HTTP/1.1`).
pub fn handle(dashboard: &mut Dashboard, request_line: &str) -> Response {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let response = match (method, path) {
        ("OPTIONS", _) => Response::text(200, ""),
        ("GET", "/api/health") => Response::json(200, json!({"status": "ok"}).to_string()),
        ("GET", "/api/sales-data") => {
            let payload = SalesData::new(dashboard.base(), dashboard.generated_at().to_string());
            match serde_json::to_string(&payload) {
                Ok(body) => Response::json(200, body),
                Err(err) => Response::json(500, json!({"error": err.to_string()}).to_string()),
            }
        }
        ("GET", "/api/options") => {
            let regions: Vec<String> = std::iter::once("All".to_string())
                .chain(Region::ALL.iter().map(|r| r.to_string()))
                .collect();
            let owners: Vec<String> = dashboard.owner_options().iter().map(|o| o.to_string()).collect();
            let days: Vec<i64> = RecencyWindow::ALL.iter().map(|w| w.days()).collect();
            let body = json!({"regions": regions, "owners": owners, "days": days});
            Response::json(200, body.to_string())
        }
        ("GET", "/api/dashboard") => match parse_filter_query(query, dashboard.params()) {
            Ok(params) => {
                dashboard.set_params(params);
                let body = json!({
                    "filters": {
                        "region": params.region.to_string(),
                        "owner": params.owner.to_string(),
                        "days": params.window.days(),
                    },
                    "view": dashboard.view(),
                });
                Response::json(200, body.to_string())
            }
            Err(err) => Response::json(400, json!({"error": err.to_string()}).to_string()),
        },
        ("GET", _) => Response::text(404, "Not Found"),
        _ => Response::text(405, "Method Not Allowed"),
    };

    log_request(method, path, response.status);
    response
}

// =============================================================================
// Tests
// =============================================================================
