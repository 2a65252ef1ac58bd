use std::sync::Arc;
use std::{env, process};

use sinklog::config::{Config, LogConfig};
use sinklog::log::{
    deferred_log_sink::DeferredLogSink, log_color::LogColor, log_level::LogLevel, registry,
};
use sinklog::{log_color, log_error, log_info, log_warn};

fn main() {
    // --- Parse CLI args ----------------------------------------------------
    //
    // Supported:
    //   sinklog               -> stdout only, info level
    //   sinklog app.ini       -> sinks from the [Logging] section of app.ini
    let args: Vec<String> = env::args().collect();

    let config = match args.len() {
        1 => Config::empty(),
        2 => match Config::load(&args[1]) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage:");
            eprintln!("  {}              # log to stdout", args[0]);
            eprintln!("  {} [CONFIG]     # e.g. app.ini with a [Logging] section", args[0]);
            process::exit(1);
        }
    };

    // --- Install a deferred root so nothing logged during setup is lost ----
    let deferred = Arc::new(DeferredLogSink::new());
    registry::set_global_logger(Box::new(deferred.clone()));
    log_info!("sinklog", "starting, pid {}", process::id());

    let log_config = match LogConfig::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    log_info!("sinklog", "level {}, stdout {}", log_config.level, log_config.stdout);

    // --- Attach the real sinks; buffered lines are replayed now ------------
    match log_config.build() {
        Ok(built) => {
            deferred.set(Box::new(built.root));
            if let Some(path) = built.file_path {
                log_info!("sinklog", "writing to {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("cannot set up logging: {e}");
            process::exit(1);
        }
    }

    log_color!(LogLevel::Info, LogColor::new(0x7f, 0xd9, 0x62), "sinklog", "colored line");
    log_warn!("sinklog", "a warning");
    log_error!("sinklog", "an error");

    // The atexit hook drains the root as well; finishing here keeps the
    // output complete even if the process is torn down differently.
    registry::global_logger_finish();
}
