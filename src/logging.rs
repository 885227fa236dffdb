// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::errors::ReconError;

/// File writer handle usable as a tracing `MakeWriter` target.
#[derive(Clone)]
struct LogFile(Arc<File>);

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}

/// Initialize the global tracing subscriber from configuration.
///
/// `level` follows env-filter syntax (plain levels like `info` work).
/// An empty `log_file` logs to stderr; otherwise lines are appended to the
/// given file without ANSI colors.
pub fn init(level: &str, log_file: &str) -> Result<(), ReconError> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| ReconError::LoggerInit(e.to_string()))?;

    if log_file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|e| ReconError::LoggerInit(e.to_string()))?;
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| ReconError::LoggerInit(format!("{log_file}: {e}")))?;
        let writer = LogFile(Arc::new(file));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .try_init()
            .map_err(|e| ReconError::LoggerInit(e.to_string()))?;
    }

    Ok(())
}
