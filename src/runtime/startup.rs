use std::env;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use crate::config;

/// Initialise `env_logger`. `RUST_LOG` overrides the configured level.
///
/// The terminal owns stdout/stderr while the page is up, so records go to the
/// log file; stderr is only used when the file cannot be created.
pub fn init_logging(settings: &config::Settings) -> Option<PathBuf> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.logging.level.as_str()),
    );
    builder.format_timestamp_millis();

    let path = settings.log_path();
    let file = path.as_deref().and_then(|p| match open_log_file(p) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("encore: cannot open log file {}: {e}", p.display());
            None
        }
    });
    let logging_to_file = file.is_some();
    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // A logger may already be installed (e.g. by a test harness).
    let _ = builder.try_init();

    if logging_to_file { path } else { None }
}

fn open_log_file(path: &std::path::Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    File::create(path)
}

/// Paths from the command line; the current directory when there are none.
pub fn source_paths(args: impl IntoIterator<Item = OsString>) -> io::Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = args.into_iter().map(PathBuf::from).collect();
    if paths.is_empty() {
        Ok(vec![env::current_dir()?])
    } else {
        Ok(paths)
    }
}
