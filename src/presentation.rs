//! Presentation mode and the cross-frame close signal.
//!
//! When the widget is embedded, the host owns the widget's lifetime. Closing
//! is therefore a one-way notification to the host, never a local action.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

pub const IFRAME_MODE: &str = "iframe";
pub const CLOSE_SIGNAL: &str = "db-iframe-close";
pub const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    Standalone,
    Embedded,
}

impl PresentationMode {
    pub fn from_mode(mode: Option<&str>) -> Self {
        match mode {
            Some(IFRAME_MODE) => PresentationMode::Embedded,
            _ => PresentationMode::Standalone,
        }
    }

    pub fn shows_close_control(self) -> bool {
        self == PresentationMode::Embedded
    }

    /// Notify the host that the user wants the widget closed.
    ///
    /// Returns whether a signal was posted. Standalone widgets have no close
    /// control, so nothing is ever posted for them.
    pub fn request_close(self, parent: &dyn ParentFrame) -> bool {
        if !self.shows_close_control() {
            return false;
        }
        tracing::info!("posting close signal to host");
        parent.post_message(CLOSE_SIGNAL, ANY_ORIGIN);
        true
    }
}

/// Outbound message sink toward whatever embeds the widget.
///
/// Fire-and-forget: the host's reaction is not observable from here.
pub trait ParentFrame: Send + Sync {
    fn post_message(&self, payload: &str, target_origin: &str);
}

/// Writes each payload as one line, for hosts that embed the widget as a
/// child process and watch its output.
pub struct WriterFrame<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterFrame<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ParentFrame for WriterFrame<W> {
    fn post_message(&self, payload: &str, target_origin: &str) {
        let Ok(mut writer) = self.writer.lock() else {
            tracing::error!("frame writer lock poisoned; dropping {payload}");
            return;
        };
        if let Err(err) = writeln!(writer, "{payload}").and_then(|_| writer.flush()) {
            tracing::error!(error = %err, target_origin, "failed to post frame message");
        }
    }
}

/// Stands in for a host when the output stream is the terminal the widget is
/// drawn on. Writing there would paint over the UI.
pub struct LogFrame;

impl ParentFrame for LogFrame {
    fn post_message(&self, payload: &str, target_origin: &str) {
        tracing::warn!(
            payload,
            target_origin,
            "no host attached; redirect stderr to receive frame messages"
        );
    }
}

/// Frame for a host watching `stream`, unless `stream` is an interactive
/// terminal.
pub fn stream_frame<W>(stream: W) -> Arc<dyn ParentFrame>
where
    W: Write + IsTerminal + Send + 'static,
{
    if stream.is_terminal() {
        tracing::info!("stream is a terminal; frame messages go to the log");
        Arc::new(LogFrame)
    } else {
        Arc::new(WriterFrame::new(stream))
    }
}

/// A posted frame message as seen by an in-process host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMessage {
    pub payload: String,
    pub target_origin: String,
}

/// Forwards frame messages over a channel to an in-process host.
#[derive(Clone)]
pub struct ChannelFrame {
    tx: mpsc::UnboundedSender<FrameMessage>,
}

impl ChannelFrame {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FrameMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ParentFrame for ChannelFrame {
    fn post_message(&self, payload: &str, target_origin: &str) {
        let message = FrameMessage {
            payload: payload.to_string(),
            target_origin: target_origin.to_string(),
        };
        if self.tx.send(message).is_err() {
            tracing::debug!("host stopped listening for frame messages");
        }
    }
}
