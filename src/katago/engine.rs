use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::katago::ResponseSource;
use crate::katago::launch::LaunchConfiguration;
use crate::katago::query::Query;
use crate::katago::response::{Response, SuccessResponse};
use crate::utils::prelude::*;

const READY_SENTINEL: &str = "Started, ready to begin handling requests";
const VERSION_PREFIX: &str = "KataGo v";

/// State shared between the owning thread and the two pipe readers.
#[derive(Default)]
struct Shared {
    /// Per-query-id FIFO of decoded responses.
    responses: Mutex<HashMap<String, VecDeque<SuccessResponse>>>,
    /// Flipped once by the stderr reader when the sentinel arrives.
    ready: AtomicBool,
    /// Set once when the stdout reader observes end of stream.
    output_closed: AtomicBool,
    /// Written once from the first matching stderr line.
    version: Mutex<Option<String>>,
    /// Lines on stdout that decoded against nothing.
    uninterpretable_lines: AtomicUsize,
}

/// A running engine child process.
///
/// Two background threads drain the child's stderr and stdout one line at a
/// time; decoded responses land in a table keyed by query id. Queries are
/// written only from the thread that owns this value. Game snapshots and the
/// response DTOs carry no references back here, so consumers never contend
/// with the readers beyond the table lock.
pub struct Engine {
    child: Child,
    stdin: Option<ChildStdin>,
    shared: Arc<Shared>,
    used_ids: HashSet<Uuid>,
    readers: Vec<JoinHandle<()>>,
    killed: bool,
}

impl Engine {
    /// Spawns the engine with the analysis subcommand and attaches one
    /// reader per output stream.
    pub fn launch(configuration: &LaunchConfiguration) -> Result<Engine> {
        configuration.validate()?;
        log::info!("launching engine: {}", configuration.command_line());

        let mut command = Command::new(&configuration.executable);
        command.args(configuration.launch_args());
        Engine::spawn(command)
    }

    /// Spawns an engine from a prepared command. Split out from [`launch`]
    /// so harnesses can wrap the engine in scripts.
    ///
    /// [`launch`]: Engine::launch
    pub fn spawn(mut command: Command) -> Result<Engine> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::EngineLaunch(format!("could not spawn the child: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::EngineLaunch("child stdin was not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::EngineLaunch("child stdout was not piped".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::EngineLaunch("child stderr was not piped".into()))?;

        let shared = Arc::new(Shared::default());
        let readers = vec![
            thread::spawn({
                let shared = Arc::clone(&shared);
                move || read_control_stream(stderr, &shared)
            }),
            thread::spawn({
                let shared = Arc::clone(&shared);
                move || read_response_stream(stdout, &shared)
            }),
        ];

        Ok(Engine {
            child,
            stdin: Some(stdin),
            shared,
            used_ids: HashSet::new(),
            readers,
            killed: false,
        })
    }

    /// Whether the readiness sentinel has been observed and the engine has
    /// not been killed since.
    pub fn ready(&self) -> bool {
        !self.killed && self.shared.ready.load(Ordering::Acquire)
    }

    /// The version string from the engine's banner, once it has appeared.
    pub fn version(&self) -> Option<String> {
        self.shared.version.lock().clone()
    }

    /// How many stdout lines decoded against nothing. Each one is a lost
    /// response at worst, logged and skipped.
    pub fn uninterpretable_lines(&self) -> usize {
        self.shared.uninterpretable_lines.load(Ordering::Relaxed)
    }

    /// Spins until the readiness sentinel arrives. Fails with
    /// [`Error::EngineLaunch`] if the child exits first or the deadline
    /// passes.
    pub fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while !self.shared.ready.load(Ordering::Acquire) {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Err(Error::EngineLaunch(format!(
                    "the engine exited with {status} before becoming ready"
                )));
            }
            if Instant::now() >= deadline {
                return Err(Error::EngineLaunch(format!(
                    "readiness sentinel not observed within {timeout:?}"
                )));
            }
            thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }

    /// Assigns a fresh id to the query, writes it as one JSON line, and
    /// flushes. Fails with [`Error::NotReady`] before the readiness sentinel
    /// and after [`kill`].
    ///
    /// [`kill`]: Engine::kill
    pub fn write_query(&mut self, query: &mut Query) -> Result<String> {
        if !self.ready() {
            return Err(Error::NotReady);
        }

        let mut id = Uuid::new_v4();
        while !self.used_ids.insert(id) {
            id = Uuid::new_v4();
        }
        let id = id.to_string();
        query.id = Some(id.clone());

        let line = serde_json::to_string(query)
            .map_err(|e| Error::EngineProtocol(format!("query did not serialize: {e}")))?;
        let stdin = self.stdin.as_mut().ok_or(Error::NotReady)?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .map_err(|_| Error::NotReady)?;

        log::debug!("wrote query {id}");
        Ok(id)
    }

    /// Terminates the child. Killing is final and idempotent: pending
    /// responses are discarded, the readers drain to end of stream, and
    /// later writes fail with [`Error::NotReady`].
    pub fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        self.stdin.take();

        if let Err(e) = self.child.kill() {
            log::debug!("kill: {e}");
        }
        let _ = self.child.wait();

        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        self.shared.responses.lock().clear();
    }
}

impl ResponseSource for Engine {
    fn next_response(&self, query_id: &str) -> Option<SuccessResponse> {
        self.shared.responses.lock().get_mut(query_id)?.pop_front()
    }

    fn closed(&self) -> bool {
        self.killed || self.shared.output_closed.load(Ordering::Acquire)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.kill();
    }
}

/// The stderr loop: watches for the version banner and the readiness
/// sentinel, and mirrors everything else to the debug log.
fn read_control_stream(stream: impl Read, shared: &Shared) {
    for line in BufReader::new(stream).lines() {
        let Ok(line) = line else {
            break;
        };

        if line.starts_with(VERSION_PREFIX) {
            let mut version = shared.version.lock();
            if version.is_none() {
                *version = Some(line[VERSION_PREFIX.len()..].to_owned());
            }
        }
        if !shared.ready.load(Ordering::Acquire) && line.ends_with(READY_SENTINEL) {
            shared.ready.store(true, Ordering::Release);
            log::info!("engine is ready to accept queries");
        }

        log::debug!("engine stderr: {line}");
    }
}

/// The stdout loop: decodes each line and files successes under their query
/// id. Error and warning responses, and lines that decode against nothing,
/// are logged and skipped; losing one response is not fatal by itself.
fn read_response_stream(stream: impl Read, shared: &Shared) {
    for line in BufReader::new(stream).lines() {
        let Ok(line) = line else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Response>(&line) {
            Ok(Response::Success(response)) => {
                shared
                    .responses
                    .lock()
                    .entry(response.id.clone())
                    .or_default()
                    .push_back(response);
            }
            Ok(Response::Error(error)) => {
                log::warn!(
                    "engine rejected query {}: {} (field {})",
                    error.id.as_deref().unwrap_or("?"),
                    error.error,
                    error.field.as_deref().unwrap_or("?")
                );
            }
            Ok(Response::Warning(warning)) => {
                log::warn!(
                    "engine warning for query {}: {} (field {})",
                    warning.id.as_deref().unwrap_or("?"),
                    warning.warning,
                    warning.field.as_deref().unwrap_or("?")
                );
            }
            Err(e) => {
                shared.uninterpretable_lines.fetch_add(1, Ordering::Relaxed);
                log::warn!("engine wrote an uninterpretable line ({e}): {line}");
            }
        }
    }

    shared.output_closed.store(true, Ordering::Release);
}
