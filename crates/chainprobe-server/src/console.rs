//! Terminal consumers: a remote stream watcher and an in-process writer.

use std::io::Write as _;

use chainprobe_core::multiplexer::EventWriter;
use chainprobe_core::reassembler::{SessionView, close, reduce};
use chainprobe_core::transport::decode_stream;
use chainprobe_core::{Event, TransportError};
use chrono::Utc;
use futures::StreamExt as _;
use tracing::{info, warn};

use crate::error::CliError;
use crate::render::event_line;

/// Folds events into a view while printing each one as it arrives.
#[derive(Default)]
pub struct ConsoleView {
    view: SessionView,
}

impl ConsoleView {
    pub fn apply(&mut self, event: Event) {
        let at = Utc::now();
        if let Some(line) = event_line(&event, at) {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{line}");
        }
        self.view = reduce(std::mem::take(&mut self.view), event, at);
    }

    pub fn finish(self) -> SessionView {
        close(self.view)
    }
}

/// Writer for in-process sessions.
#[derive(Default)]
pub struct ConsoleWriter {
    console: ConsoleView,
    tx: Option<tokio::sync::oneshot::Sender<SessionView>>,
}

impl ConsoleWriter {
    /// The view is delivered when the session drops the writer.
    pub fn new() -> (Self, tokio::sync::oneshot::Receiver<SessionView>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        (
            Self {
                console: ConsoleView::default(),
                tx: Some(tx),
            },
            rx,
        )
    }
}

#[async_trait::async_trait]
impl EventWriter for ConsoleWriter {
    async fn write_event(&mut self, event: &Event) -> Result<(), TransportError> {
        self.console.apply(event.clone());
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let view = close(std::mem::take(&mut self.console.view));
            let _ = tx.send(view);
        }
    }
}

/// Opens a streamed session on `server` and prints it until the stream ends.
pub async fn watch(http: &reqwest::Client, server: &str) -> Result<SessionView, CliError> {
    let url = format!(
        "{}/api/test-transaction-stream",
        server.trim_end_matches('/')
    );
    info!(%url, "opening session stream");
    let response = http.post(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(CliError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let mut console = ConsoleView::default();
    let mut events = Box::pin(decode_stream(response.bytes_stream()));
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => console.apply(event),
            Err(err) => {
                warn!(error = %err, "stream interrupted");
                break;
            }
        }
    }
    Ok(console.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainprobe_core::NetworkId;
    use chainprobe_core::reassembler::SessionStatus;

    #[tokio::test]
    async fn dropped_writer_delivers_closed_view() {
        let (mut writer, view) = ConsoleWriter::new();
        writer
            .write_event(&Event::progress(NetworkId::Contract, "Connecting..."))
            .await
            .expect("write");
        drop(writer);
        let view = view.await.expect("view");
        assert_eq!(view.logs(NetworkId::Contract).len(), 1);
        assert_eq!(view.status(), &SessionStatus::Disconnected);
    }
}
