use anyhow::{anyhow, Result};
use chrono::Local;
use std::path::PathBuf;

use salesdash::config::Config;
use salesdash::dashboard::Dashboard;
use salesdash::export::export_dataset;
use salesdash::logging::{log, obj, v_str, Domain, Level};
use salesdash::report::{render, ReportOptions};

const USAGE: &str = "usage: salesdash [--region NAME|All] [--owner NAME|All] [--days 30|60|90|180] [--json] [--export [DIR]]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    region: Option<String>,
    owner: Option<String>,
    days: Option<String>,
    json: bool,
    export: Option<PathBuf>,
    help: bool,
}

/// Parse flags (program name already skipped). `--export` takes an optional
/// directory; a following `--flag` is never consumed as that directory.
fn parse_args(argv: impl Iterator<Item = String>, default_export_dir: &str) -> Result<Args> {
    let mut args = Args::default();
    let mut it = argv.peekable();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--region" => args.region = Some(flag_value(&arg, it.next())?),
            "--owner" | "--rep" => args.owner = Some(flag_value(&arg, it.next())?),
            "--days" => args.days = Some(flag_value(&arg, it.next())?),
            "--json" => args.json = true,
            "--export" => {
                let dir = it
                    .next_if(|next| !next.starts_with("--"))
                    .unwrap_or_else(|| default_export_dir.to_string());
                args.export = Some(PathBuf::from(dir));
            }
            "-h" | "--help" => args.help = true,
            other => return Err(anyhow!("unknown argument {:?}\n{}", other, USAGE)),
        }
    }
    Ok(args)
}

fn flag_value(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| anyhow!("{} needs a value\n{}", flag, USAGE))
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let args = parse_args(std::env::args().skip(1), &cfg.export_dir)?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut dashboard = Dashboard::new(&cfg, Local::now().date_naive());
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("today", v_str(&dashboard.today().to_string())),
            ("generated_at", v_str(dashboard.generated_at())),
            ("msg", v_str("salesdash")),
        ]),
    );

    if let Some(region) = &args.region {
        dashboard.set_region(region.parse()?);
    }
    if let Some(owner) = &args.owner {
        dashboard.set_owner(owner.parse()?);
    }
    if let Some(days) = &args.days {
        dashboard.set_window(days.parse()?);
    }

    if let Some(dir) = &args.export {
        let manifest = export_dataset(dir, dashboard.base(), dashboard.generated_at())?;
        eprintln!("wrote {} ({} rows)", manifest.path, manifest.row_count);
    }

    let params = dashboard.params();
    let filtered = dashboard.filtered();
    let view = dashboard.view().clone();

    if args.json {
        println!("{}", view.to_json());
    } else {
        let opts = ReportOptions {
            forecast_days: cfg.forecast_days,
            stale_days: cfg.stale_days,
            ..ReportOptions::default()
        };
        print!("{}", render(&params, &view, &filtered, dashboard.today(), &opts));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
