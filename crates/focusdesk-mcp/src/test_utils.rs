//! In-memory tool server for tests.
//!
//! [`FakeSpawner`] implements [`ProcessSpawner`] by wiring the client to a
//! scripted MCP server task over duplex pipes. It counts spawns and live
//! "processes" so tests can assert nothing leaks.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use focusdesk_core::{LaunchCommand, ProcessHandle, ProcessSpawner, SpawnedProcess};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
use tokio::task::JoinHandle;

/// How the fake server answers `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    Accept,
    /// Reply with a JSON-RPC error.
    Reject,
    /// Never reply.
    Hang,
    /// Close the pipes without replying.
    Exit,
}

/// Behaviour of the fake server. Read on every request, so tests can change
/// it while a connection is live.
#[derive(Debug, Clone)]
pub struct FakeServer {
    pub handshake: Handshake,
    pub advertise_tools: bool,
    pub tools: Vec<Value>,
    pub page_size: Option<usize>,
    pub fail_listing: bool,
    /// Answer `tools/list` with "method not found".
    pub list_unsupported: bool,
    /// Print a non-JSON line before anything else, like noisy launchers do.
    pub banner: bool,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            handshake: Handshake::Accept,
            advertise_tools: true,
            tools: Vec::new(),
            page_size: None,
            fail_listing: false,
            list_unsupported: false,
            banner: true,
        }
    }
}

impl FakeServer {
    pub fn with_tools(tools: Vec<Value>) -> Self {
        Self {
            tools,
            ..Self::default()
        }
    }
}

/// Tool entry in wire format.
pub fn tool_json(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": {"text": {"type": "string"}}
        },
        "annotations": {"readOnlyHint": true}
    })
}

#[derive(Default)]
struct Counters {
    spawned: AtomicUsize,
    alive: AtomicUsize,
    max_alive: AtomicUsize,
    tool_calls: AtomicUsize,
}

/// Spawner that runs [`FakeServer`] tasks instead of processes.
pub struct FakeSpawner {
    server: Arc<Mutex<FakeServer>>,
    counters: Arc<Counters>,
    commands: Mutex<Vec<LaunchCommand>>,
    exited_flags: Mutex<Vec<Arc<AtomicBool>>>,
    fail_spawn: AtomicBool,
    slow_terminate: Arc<AtomicBool>,
}

impl FakeSpawner {
    pub fn new(server: FakeServer) -> Arc<Self> {
        Arc::new(Self {
            server: Arc::new(Mutex::new(server)),
            counters: Arc::new(Counters::default()),
            commands: Mutex::new(Vec::new()),
            exited_flags: Mutex::new(Vec::new()),
            fail_spawn: AtomicBool::new(false),
            slow_terminate: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Change the behaviour of current and future servers.
    pub fn update(&self, change: impl FnOnce(&mut FakeServer)) {
        change(&mut self.server.lock().unwrap_or_else(PoisonError::into_inner));
    }

    pub fn fail_next_spawns(&self, fail: bool) {
        self.fail_spawn.store(fail, Ordering::SeqCst);
    }

    /// Make `terminate` use its whole grace period before the server goes.
    pub fn slow_terminate(&self, slow: bool) {
        self.slow_terminate.store(slow, Ordering::SeqCst);
    }

    /// Mark every spawned server as exited, as if the processes crashed.
    pub fn crash_all(&self) {
        for flag in self
            .exited_flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            flag.store(true, Ordering::SeqCst);
        }
    }

    pub fn spawned(&self) -> usize {
        self.counters.spawned.load(Ordering::SeqCst)
    }

    pub fn alive(&self) -> usize {
        self.counters.alive.load(Ordering::SeqCst)
    }

    pub fn max_alive(&self) -> usize {
        self.counters.max_alive.load(Ordering::SeqCst)
    }

    pub fn tool_calls(&self) -> usize {
        self.counters.tool_calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<LaunchCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self, command: &LaunchCommand) -> io::Result<SpawnedProcess> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", command.program.display()),
            ));
        }

        self.counters.spawned.fetch_add(1, Ordering::SeqCst);
        let alive = self.counters.alive.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_alive.fetch_max(alive, Ordering::SeqCst);

        let (client_out, server_in) = duplex(64 * 1024);
        let (server_out, client_in) = duplex(64 * 1024);
        let task = tokio::spawn(run_server(
            Arc::clone(&self.server),
            Arc::clone(&self.counters),
            server_in,
            server_out,
        ));

        let exited = Arc::new(AtomicBool::new(false));
        self.exited_flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&exited));

        Ok(SpawnedProcess {
            stdin: Box::new(client_out),
            stdout: Box::new(client_in),
            handle: Box::new(FakeHandle {
                task: Some(task),
                exited,
                slow_terminate: Arc::clone(&self.slow_terminate),
                counters: Arc::clone(&self.counters),
            }),
        })
    }
}

struct FakeHandle {
    task: Option<JoinHandle<()>>,
    exited: Arc<AtomicBool>,
    slow_terminate: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl FakeHandle {
    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.counters.alive.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ProcessHandle for FakeHandle {
    fn id(&self) -> Option<u32> {
        self.task.as_ref().map(|_| 4242)
    }

    fn has_exited(&mut self) -> bool {
        self.exited.load(Ordering::SeqCst) || self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    async fn terminate(&mut self, grace: Duration) -> io::Result<()> {
        if self.slow_terminate.load(Ordering::SeqCst) {
            tokio::time::sleep(grace).await;
        }
        self.release();
        Ok(())
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.release();
    }
}

fn ok(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn err(id: Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

async fn run_server(
    server: Arc<Mutex<FakeServer>>,
    counters: Arc<Counters>,
    input: DuplexStream,
    mut output: DuplexStream,
) {
    let snapshot = || server.lock().unwrap_or_else(PoisonError::into_inner).clone();

    if snapshot().banner && output.write_all(b"fake tool server starting\n").await.is_err() {
        return;
    }

    let mut lines = BufReader::new(input).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        // Notifications need no reply
        let Some(id) = message.get("id").cloned() else {
            continue;
        };
        let config = snapshot();
        let method = message["method"].as_str().unwrap_or_default();

        let mut extra: Option<Value> = None;
        let reply = match method {
            "initialize" => match config.handshake {
                Handshake::Accept => {
                    let capabilities = if config.advertise_tools {
                        json!({"tools": {"listChanged": true}})
                    } else {
                        json!({})
                    };
                    ok(
                        id,
                        json!({
                            "protocolVersion": "2024-11-05",
                            "capabilities": capabilities,
                            "serverInfo": {"name": "fake-tools", "version": "0.0.1"}
                        }),
                    )
                }
                Handshake::Reject => err(id, -32603, "initialization refused"),
                Handshake::Hang => continue,
                Handshake::Exit => return,
            },
            "tools/list" if config.list_unsupported => err(id, -32601, "Method not found"),
            "tools/list" if config.fail_listing => err(id, -32603, "listing failed"),
            "tools/list" => {
                let start = message["params"]["cursor"]
                    .as_str()
                    .and_then(|c| c.parse::<usize>().ok())
                    .unwrap_or(0);
                let size = config.page_size.unwrap_or(usize::MAX);
                let end = start.saturating_add(size).min(config.tools.len());
                let page: Vec<Value> = config.tools[start.min(end)..end].to_vec();
                let mut result = json!({"tools": page});
                if end < config.tools.len() {
                    result["nextCursor"] = json!(end.to_string());
                }
                ok(id, result)
            }
            "tools/call" => {
                counters.tool_calls.fetch_add(1, Ordering::SeqCst);
                let params = &message["params"];
                match params["name"].as_str().unwrap_or_default() {
                    "crash" => return,
                    "fail" => err(id, -32000, "tool exploded"),
                    "broken" => ok(
                        id,
                        json!({"content": [{"type": "text", "text": "disk full"}], "isError": true}),
                    ),
                    "notify_change" => {
                        extra = Some(json!({
                            "jsonrpc": "2.0",
                            "method": "notifications/tools/list_changed"
                        }));
                        ok(id, json!({"content": []}))
                    }
                    _ => ok(
                        id,
                        json!({
                            "content": [{"type": "text", "text": params["arguments"].to_string()}],
                            "structuredContent": params["arguments"].clone()
                        }),
                    ),
                }
            }
            _ => err(id, -32601, "Method not found"),
        };

        let mut out = String::new();
        if let Some(extra) = extra {
            out.push_str(&format!("{extra}\n"));
        }
        out.push_str(&format!("{reply}\n"));
        if output.write_all(out.as_bytes()).await.is_err() {
            return;
        }
    }
}
