//! In-memory connection for unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use busbar_sf_client::{Connection, Error, ErrorKind, RequestOptions, Result};
use serde_json::Value;

/// Records every request and answers from a queue of scripted responses.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnection {
    responses: Mutex<VecDeque<Result<Value>>>,
    requests: Mutex<Vec<RequestOptions>>,
}

impl ScriptedConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, body: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(body));
        self
    }

    pub(crate) fn fail(self, err: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RequestOptions> {
        self.requests.lock().unwrap().clone()
    }
}

impl Connection for ScriptedConnection {
    async fn request(&self, options: RequestOptions) -> Result<Value> {
        self.requests.lock().unwrap().push(options);
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(Error::new(ErrorKind::Other("no scripted response".into()))))
    }
}

/// Collects formatted log output for the duration of a test.
#[derive(Clone, Debug, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Install a subscriber on the current thread that writes `ERROR` events here.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .with_writer(move || capture.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
