use std::{
    fs::{File, OpenOptions},
    io::{self, LineWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::trace::trace::TraceEvent;

struct Sink {
    path: PathBuf,
    writer: LineWriter<File>,
    lines: u64,
    broken: bool,
}

/// Appends one JSON line per routed event. A logger without a file is a no-op.
///
/// Opening is strict: an explicitly requested trace file that cannot be
/// created is a startup error. Once open, the first write failure is logged
/// and the trace stops; routing carries on.
pub struct TraceLogger {
    sink: Option<Mutex<Sink>>,
}

impl TraceLogger {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "form trace enabled");
        Ok(Self {
            sink: Some(Mutex::new(Sink {
                path,
                writer: LineWriter::new(file),
                lines: 0,
                broken: false,
            })),
        })
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn from_path(path: Option<&str>) -> io::Result<Self> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Lines written so far.
    pub fn lines_written(&self) -> u64 {
        self.sink
            .as_ref()
            .and_then(|sink| sink.lock().ok().map(|s| s.lines))
            .unwrap_or(0)
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        let Ok(mut sink) = sink.lock() else {
            return;
        };
        if sink.broken {
            return;
        }

        let result = serde_json::to_writer(&mut sink.writer, event)
            .map_err(io::Error::from)
            .and_then(|()| sink.writer.write_all(b"\n"));

        match result {
            Ok(()) => sink.lines += 1,
            Err(e) => {
                sink.broken = true;
                warn!(
                    "form trace '{}' stopped after {} lines: {}",
                    sink.path.display(),
                    sink.lines,
                    e
                );
            }
        }
    }
}
