//! Console-driven stand-in for the BLE peripheral stack.
//!
//! A background thread reads lines from stdin into a bounded channel; the
//! engine thread drains it on every `poll()`. At most one link edge is
//! applied per poll, and a disconnect waits until queued writes are taken,
//! so the engine observes every connection change. Notifications go to stdout.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use progressor_core::{Response, decode_response};
use progressor_hardware::error::HwError;
use progressor_traits::{BoxError, PowerControl, Transport};
use serde_json::json;

/// Lines buffered between the reader thread and the engine.
const LINE_QUEUE_DEPTH: usize = 64;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Connect,
    Disconnect,
    Write(Vec<u8>),
    Quit,
}

/// Parse one console line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match word {
        "connect" => Ok(Some(ConsoleCommand::Connect)),
        "disconnect" => Ok(Some(ConsoleCommand::Disconnect)),
        "quit" | "exit" => Ok(Some(ConsoleCommand::Quit)),
        "write" => {
            let digits: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
            hex::decode(&digits)
                .map(|bytes| Some(ConsoleCommand::Write(bytes)))
                .map_err(|e| format!("bad hex {digits:?}: {e}"))
        }
        other => Err(format!("unknown console command {other:?}")),
    }
}

enum Input {
    Line(String),
    Eof,
}

/// Reader thread feeding lines into a bounded channel.
struct LineSource {
    rx: Receiver<Input>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LineSource {
    fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = bounded(LINE_QUEUE_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = std::thread::Builder::new()
            .name("console-reader".into())
            .spawn(move || {
                for line in reader.lines() {
                    if stop_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    match line {
                        Ok(l) => {
                            if tx.send(Input::Line(l)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "console read failed");
                            break;
                        }
                    }
                }
                let _ = tx.send(Input::Eof);
            })
            .ok();
        if handle.is_none() {
            tracing::error!("failed to spawn console reader thread");
        }
        Self { rx, stop, handle }
    }
}

impl Drop for LineSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // A reader still blocked on stdin cannot be woken; only join a finished thread.
        if let Some(h) = self.handle.take()
            && h.is_finished()
        {
            let _ = h.join();
        }
    }
}

/// `Transport` over console lines. `quit` or end of input raises `shutdown`.
pub struct ConsoleTransport<W: Write> {
    input: LineSource,
    out: W,
    json: bool,
    connected: bool,
    shut_down: bool,
    inbound: VecDeque<Vec<u8>>,
    /// Link edge carried over to the next poll.
    held: Option<ConsoleCommand>,
    shutdown: Arc<AtomicBool>,
}

impl ConsoleTransport<std::io::Stdout> {
    pub fn stdio(json: bool, shutdown: Arc<AtomicBool>) -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), std::io::stdout(), json, shutdown)
    }
}

impl<W: Write> ConsoleTransport<W> {
    pub fn new<R: BufRead + Send + 'static>(
        reader: R,
        out: W,
        json: bool,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            input: LineSource::spawn(reader),
            out,
            json,
            connected: false,
            shut_down: false,
            inbound: VecDeque::new(),
            held: None,
            shutdown,
        }
    }

    /// True when applying `cmd` would flip the connection state.
    fn changes_link(&self, cmd: &ConsoleCommand) -> bool {
        match cmd {
            ConsoleCommand::Connect => !self.connected && !self.shut_down,
            ConsoleCommand::Disconnect => self.connected,
            ConsoleCommand::Write(_) | ConsoleCommand::Quit => false,
        }
    }

    fn apply(&mut self, cmd: ConsoleCommand) {
        match cmd {
            ConsoleCommand::Connect => {
                if self.shut_down {
                    tracing::warn!("connect ignored; transport is shut down");
                } else {
                    self.connected = true;
                }
            }
            ConsoleCommand::Disconnect => {
                self.connected = false;
                self.inbound.clear();
            }
            ConsoleCommand::Write(bytes) => {
                if self.connected {
                    self.inbound.push_back(bytes);
                } else {
                    tracing::warn!("write ignored while disconnected");
                }
            }
            ConsoleCommand::Quit => {
                tracing::info!("quit requested");
                self.shutdown.store(true, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, payload: &[u8]) -> String {
        let hex = hex::encode(payload);
        if !self.json {
            return hex;
        }
        let response = match decode_response(payload) {
            Ok(Response::Battery { millivolts }) => {
                json!({ "type": "battery", "millivolts": millivolts })
            }
            Ok(Response::Weight { kg, timestamp_us }) => {
                json!({ "type": "weight", "kg": kg, "timestamp_us": timestamp_us })
            }
            Ok(Response::DeviceInfo { name, major, minor }) => {
                json!({ "type": "device_info", "name": name, "major": major, "minor": minor })
            }
            Err(e) => json!({ "type": "undecodable", "error": e.to_string() }),
        };
        json!({ "event": "notify", "hex": hex, "response": response }).to_string()
    }
}

impl<W: Write> Transport for ConsoleTransport<W> {
    fn poll(&mut self) {
        let mut edge_seen = false;
        if let Some(cmd) = self.held.take() {
            edge_seen = self.changes_link(&cmd);
            self.apply(cmd);
        }
        loop {
            match self.input.rx.try_recv() {
                Ok(Input::Line(line)) => match parse_line(&line) {
                    Ok(Some(cmd)) => {
                        if self.changes_link(&cmd) {
                            if edge_seen || !self.inbound.is_empty() {
                                tracing::trace!(?cmd, "link change deferred to next poll");
                                self.held = Some(cmd);
                                break;
                            }
                            edge_seen = true;
                        }
                        self.apply(cmd);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(%line, error = %e, "console line ignored"),
                },
                Ok(Input::Eof) => {
                    tracing::info!("console input closed");
                    self.shutdown.store(true, Ordering::Relaxed);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn take_write(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }

    fn send_notification(&mut self, payload: &[u8]) -> Result<(), BoxError> {
        if !self.connected {
            return Err(Box::new(HwError::NotConnected));
        }
        let line = self.render(payload);
        writeln!(self.out, "{line}").map_err(|e| Box::new(HwError::Io(e)) as BoxError)?;
        self.out
            .flush()
            .map_err(|e| Box::new(HwError::Io(e)) as BoxError)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn stop_advertising(&mut self) -> Result<(), BoxError> {
        tracing::info!("advertising stopped");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), BoxError> {
        self.shut_down = true;
        self.connected = false;
        self.inbound.clear();
        tracing::info!("console transport shut down");
        Ok(())
    }
}

/// Host stand-in for the platform's power controller.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPower;

impl PowerControl for HostPower {
    fn flush_output(&mut self) -> Result<(), BoxError> {
        std::io::stdout()
            .flush()
            .map_err(|e| Box::new(HwError::Io(e)) as BoxError)
    }

    fn enter_deep_sleep(&mut self) {
        // The process exits once the runner sees the engine hibernating.
        tracing::info!("deep sleep entered");
    }
}
