//! WebSocket transport to the relay.
//!
//! Provides a platform-agnostic client interface. The transport only moves
//! text frames; decoding them into [`Message`](crate::protocol::Message)s is
//! the session's job.

use thiserror::Error;

/// Lifecycle of a relay connection.
///
/// A connection moves forward only: there is no automatic reconnect, so a
/// closed session stays closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

/// Events from the WebSocket client.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Handshake completed.
    Connected,
    /// Connection closed by either side.
    Disconnected,
    /// A text frame from the relay, undecoded.
    Message(String),
    /// Connection failed or errored.
    Error { message: String },
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid WebSocket URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// A bidirectional text channel to the relay.
///
/// Implementations queue events internally; callers drain them with
/// [`Transport::poll_events`] from their frame loop.
pub trait Transport {
    /// Queue a text frame for sending.
    fn send(&self, text: &str) -> Result<(), TransportError>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<SyncEvent>;
}

// ============================================================================
// WASM WebSocket Client
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod wasm_client {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

    /// WebSocket client for WASM.
    ///
    /// Browser callbacks push into a shared queue that `poll_events()` drains.
    pub struct WasmWebSocket {
        ws: Option<WebSocket>,
        events: Rc<RefCell<Vec<SyncEvent>>>,
        // Store closures to prevent them from being dropped
        _on_open: Option<Closure<dyn Fn()>>,
        _on_message: Option<Closure<dyn Fn(MessageEvent)>>,
        _on_close: Option<Closure<dyn Fn(CloseEvent)>>,
        _on_error: Option<Closure<dyn Fn(ErrorEvent)>>,
    }

    impl WasmWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                ws: None,
                events: Rc::new(RefCell::new(Vec::new())),
                _on_open: None,
                _on_message: None,
                _on_close: None,
                _on_error: None,
            }
        }

        /// Connect to a WebSocket server.
        pub fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            if self.ws.is_some() {
                return Err(TransportError::AlreadyConnected);
            }

            let ws = WebSocket::new(url).map_err(|e| TransportError::InvalidUrl(format!("{e:?}")))?;
            ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

            let events = self.events.clone();

            let events_open = events.clone();
            let on_open = Closure::wrap(Box::new(move || {
                events_open.borrow_mut().push(SyncEvent::Connected);
            }) as Box<dyn Fn()>);
            ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

            let events_msg = events.clone();
            let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
                if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
                    events_msg.borrow_mut().push(SyncEvent::Message(txt.into()));
                }
            }) as Box<dyn Fn(MessageEvent)>);
            ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

            let events_close = events.clone();
            let on_close = Closure::wrap(Box::new(move |_e: CloseEvent| {
                events_close.borrow_mut().push(SyncEvent::Disconnected);
            }) as Box<dyn Fn(CloseEvent)>);
            ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

            let events_err = events;
            let on_error = Closure::wrap(Box::new(move |_e: ErrorEvent| {
                events_err.borrow_mut().push(SyncEvent::Error {
                    message: "WebSocket error".to_string(),
                });
            }) as Box<dyn Fn(ErrorEvent)>);
            ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

            self.ws = Some(ws);
            self._on_open = Some(on_open);
            self._on_message = Some(on_message);
            self._on_close = Some(on_close);
            self._on_error = Some(on_error);

            Ok(())
        }

        /// Disconnect from the server.
        pub fn disconnect(&mut self) {
            if let Some(ws) = self.ws.take() {
                let _ = ws.close();
            }
            self._on_open = None;
            self._on_message = None;
            self._on_close = None;
            self._on_error = None;
        }
    }

    impl Transport for WasmWebSocket {
        fn send(&self, text: &str) -> Result<(), TransportError> {
            match self.ws {
                Some(ref ws) => ws
                    .send_with_str(text)
                    .map_err(|e| TransportError::SendFailed(format!("{e:?}"))),
                None => Err(TransportError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            std::mem::take(&mut *self.events.borrow_mut())
        }
    }

    impl Default for WasmWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_client::WasmWebSocket;

// ============================================================================
// Native WebSocket Client
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        _thread: Option<JoinHandle<()>>,
    }

    /// Check that `url` parses and uses a WebSocket scheme.
    pub(crate) fn validate_url(url: &str) -> Result<Url, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "ws" | "wss" => Ok(parsed),
            other => Err(TransportError::UnsupportedScheme(other.to_string())),
        }
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to a WebSocket server.
        ///
        /// Returns once the background thread is started; the handshake
        /// result arrives later as [`SyncEvent::Connected`] or
        /// [`SyncEvent::Error`].
        pub fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            if self.cmd_tx.is_some() {
                return Err(TransportError::AlreadyConnected);
            }
            validate_url(url)?;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();
            let url = url.to_string();

            let handle = thread::spawn(move || {
                log::info!("WebSocket thread: connecting to {}", url);

                let (mut socket, response) = match connect(&url) {
                    Ok(pair) => pair,
                    Err(e) => {
                        log::error!("WebSocket connection failed: {}", e);
                        let _ = event_tx.send(SyncEvent::Error {
                            message: format!("Connection failed: {e}"),
                        });
                        return;
                    }
                };

                log::info!("WebSocket connected, status: {}", response.status());
                let _ = event_tx.send(SyncEvent::Connected);

                // Short read timeout so outgoing commands are not starved.
                match socket.get_mut() {
                    tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                        let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
                        let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                    }
                    #[allow(unreachable_patterns)]
                    _ => log::debug!("TLS or other stream - using default timeout handling"),
                }

                loop {
                    match cmd_rx.try_recv() {
                        Ok(WsCommand::Send(msg)) => {
                            log::debug!("WebSocket sending: {}", preview(&msg));
                            if let Err(e) = socket.send(Message::Text(msg)) {
                                log::error!("WebSocket send error: {}", e);
                                break;
                            }
                        }
                        Ok(WsCommand::Close) => {
                            log::info!("WebSocket close requested");
                            let _ = socket.close(None);
                            break;
                        }
                        Err(TryRecvError::Disconnected) => {
                            log::info!("WebSocket command channel disconnected");
                            break;
                        }
                        Err(TryRecvError::Empty) => {}
                    }

                    match socket.read() {
                        Ok(Message::Text(txt)) => {
                            log::debug!("WebSocket received: {}", preview(&txt));
                            let _ = event_tx.send(SyncEvent::Message(txt));
                        }
                        Ok(Message::Binary(data)) => match String::from_utf8(data) {
                            Ok(txt) => {
                                let _ = event_tx.send(SyncEvent::Message(txt));
                            }
                            Err(_) => log::warn!("Dropping non-UTF-8 binary frame"),
                        },
                        Ok(Message::Ping(data)) => {
                            let _ = socket.send(Message::Pong(data));
                        }
                        Ok(Message::Close(_)) => {
                            log::info!("WebSocket received close frame");
                            break;
                        }
                        Ok(_) => {}
                        Err(tungstenite::Error::Io(ref e))
                            if e.kind() == std::io::ErrorKind::WouldBlock
                                || e.kind() == std::io::ErrorKind::TimedOut =>
                        {
                            continue;
                        }
                        Err(e) => {
                            log::error!("WebSocket read error: {}", e);
                            break;
                        }
                    }
                }

                log::info!("WebSocket thread exiting");
                let _ = event_tx.send(SyncEvent::Disconnected);
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        /// Disconnect from the server.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
        }
    }

    fn preview(text: &str) -> &str {
        let mut end = text.len().min(100);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    impl Transport for NativeWebSocket {
        fn send(&self, text: &str) -> Result<(), TransportError> {
            match self.cmd_tx {
                Some(ref tx) => tx
                    .send(WsCommand::Send(text.to_string()))
                    .map_err(|e| TransportError::SendFailed(e.to_string())),
                None => Err(TransportError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            match self.event_rx {
                Some(ref rx) => rx.try_iter().collect(),
                None => Vec::new(),
            }
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_client::NativeWebSocket;

// ============================================================================
// Platform type alias
// ============================================================================

/// Platform-specific WebSocket client type.
#[cfg(target_arch = "wasm32")]
pub type PlatformWebSocket = WasmWebSocket;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformWebSocket = NativeWebSocket;

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    /// Poll until `log` holds an event matching `pred`.
    fn wait_for(ws: &mut NativeWebSocket, log: &mut Vec<SyncEvent>, pred: impl Fn(&SyncEvent) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            log.extend(ws.poll_events());
            if log.iter().any(&pred) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_rejects_non_websocket_urls() {
        let mut ws = NativeWebSocket::new();
        assert!(matches!(
            ws.connect("http://localhost:4000/ws"),
            Err(TransportError::UnsupportedScheme(s)) if s == "http"
        ));
        assert!(matches!(ws.connect("not a url"), Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_send_before_connect_fails() {
        let ws = NativeWebSocket::new();
        assert!(matches!(ws.send("{}"), Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_connection_refused_reports_error() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut ws = NativeWebSocket::new();
        ws.connect(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
        assert!(wait_for(&mut ws, &mut Vec::new(), |e| matches!(e, SyncEvent::Error { .. })));
    }

    #[test]
    fn test_text_frames_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut socket = tungstenite::accept(stream).unwrap();
            let msg = socket.read().unwrap();
            socket.send(msg).unwrap();
            let _ = socket.close(None);
            // Drain until the close handshake finishes.
            while socket.read().is_ok() {}
        });

        let mut ws = NativeWebSocket::new();
        ws.connect(&format!("ws://{addr}/ws")).unwrap();
        assert!(matches!(ws.connect(&format!("ws://{addr}/ws")), Err(TransportError::AlreadyConnected)));
        let mut log = Vec::new();
        assert!(wait_for(&mut ws, &mut log, |e| *e == SyncEvent::Connected));

        ws.send(r#"{"type":"join"}"#).unwrap();
        assert!(wait_for(&mut ws, &mut log, |e| *e == SyncEvent::Message(r#"{"type":"join"}"#.to_string())));
        assert!(wait_for(&mut ws, &mut log, |e| *e == SyncEvent::Disconnected));
        assert_eq!(log.first(), Some(&SyncEvent::Connected));

        server.join().unwrap();
    }
}
