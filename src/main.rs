//! Command-line entry point: one invocation, one capture-to-print run.

use snapprint::{Config, Pipeline};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    log::info!("snapprint v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    if let Ok(json) = serde_json::to_string(&config) {
        log::debug!("[MAIN] Effective config: {}", json);
    }

    let mut pipeline = match Pipeline::from_host(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            log::error!("[MAIN] Setup failed: {}", e);
            std::process::exit(1);
        }
    };

    match pipeline.run_once().await {
        Ok(report) => {
            if !report.job_completed {
                log::warn!("[MAIN] Job handed to the spooler but not confirmed done");
            }
            // The stored capture's path, for scripting.
            println!("{}", report.image.path().display());
        }
        Err(_) => {
            // Already logged and surfaced as a notice by the pipeline.
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("snapprint — capture the screen, desaturate, save a PNG, print it");
    eprintln!();
    eprintln!("Usage: snapprint [--help]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SNAPPRINT_OUTPUT_DIR      where captures land (default: the pictures dir)");
    eprintln!("  SNAPPRINT_FILE_PREFIX     capture file prefix (default: SCREENSHOT)");
    eprintln!("  SNAPPRINT_JOB_NAME        print job name (default: Screenshot Print)");
    eprintln!("  SNAPPRINT_PRINTER         printer/queue name passed to the spooler");
    eprintln!("  SNAPPRINT_SPOOL_DIR       write PDFs here instead of using lp/lpr");
    eprintln!("  SNAPPRINT_FRAME_GRACE_MS  wait for the first frame (default: 500)");
    eprintln!("  SNAPPRINT_JOB_GRACE_MS    hold after submission (default: 10000)");
    eprintln!("  RUST_LOG                  log filter (default: info)");
}
