//! Dashboard JSON server
//!
//! Serves the session dataset and filtered dashboard views.
//! Run with: cargo run --bin dashboard_server

use anyhow::{Context, Result};
use chrono::Local;
use salesdash::config::Config;
use salesdash::dashboard::Dashboard;
use salesdash::logging::{log, obj, v_str, Domain, Level};
use salesdash::server::handle;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let listener = TcpListener::bind(format!("127.0.0.1:{}", cfg.server_port))
        .with_context(|| format!("binding port {}", cfg.server_port))?;

    let mut dashboard = Dashboard::new(&cfg, Local::now().date_naive());

    log(
        Level::Info,
        Domain::Server,
        "listening",
        obj(&[
            ("addr", v_str(&format!("http://localhost:{}", cfg.server_port))),
            ("opportunities", serde_json::json!(dashboard.base().len())),
        ]),
    );
    println!("Dashboard server running at http://localhost:{}", cfg.server_port);
    println!();
    println!("Endpoints:");
    println!("  GET /api/sales-data                         - Full generated dataset");
    println!("  GET /api/dashboard?region=&owner=&days=     - Filtered metrics + charts");
    println!("  GET /api/options                            - Selector choices");
    println!("  GET /api/health                             - Health check");
    println!();

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };

        let request_line = BufReader::new(&stream).lines().next();
        let request = match request_line {
            Some(Ok(line)) => line,
            _ => continue,
        };

        // recency filters follow the wall clock; the dataset itself stays fixed
        dashboard.set_today(Local::now().date_naive());
        let response = handle(&mut dashboard, &request);
        let _ = stream.write_all(response.to_http().as_bytes());
    }
    Ok(())
}
