//! Transport over a WebView message pipe.
//!
//! The embedding host and this client exchange newline-delimited
//! [`WebViewFrame`]s over any byte stream: an OS pipe, a socket pair, or the
//! stdio of an embedded process.  One line, one frame:
//!
//! ```text
//! → {"type":"call","queryID":1,"query":"{\"method\":\"GET\",\"endpoint\":\"version\",\"body\":\"\"}"}
//! ← {"type":"response","queryID":1,"response":"\"4.42.0\""}
//! ← {"type":"push","notification":"{\"subject\":\"accounts\",\"action\":\"reload\"}"}
//! ```

use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wallet_bridge_core::protocol::{decode_frame, encode_frame, encode_native_query, WebViewFrame};
use wallet_bridge_core::{Query, RequestId};

use crate::application::transport::{InboundSink, Transport, TransportError};

type Reader = Box<dyn AsyncRead + Unpin + Send>;
type Writer = Box<dyn AsyncWrite + Unpin + Send>;

/// [`Transport`] over a pair of byte streams carrying [`WebViewFrame`]s.
pub struct WebViewTransport {
    reader: StdMutex<Option<Reader>>,
    writer: Mutex<Option<Writer>>,
    read_task: StdMutex<Option<JoinHandle<()>>>,
}

impl WebViewTransport {
    /// Uses `reader` for frames from the host and `writer` for frames to it.
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            reader: StdMutex::new(Some(Box::new(reader))),
            writer: Mutex::new(Some(Box::new(writer))),
            read_task: StdMutex::new(None),
        }
    }

    /// Talks to the host over this process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }

    async fn write_frame(&self, frame: &WebViewFrame) -> Result<(), TransportError> {
        let mut line = encode_frame(frame).map_err(|e| TransportError::Send(e.to_string()))?;
        line.push('\n');
        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(TransportError::Closed)?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

async fn read_frames(reader: Reader, sink: InboundSink) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("webview pipe reached EOF");
                break;
            }
            Err(e) => {
                warn!("webview pipe read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_frame(&line) {
            Ok(WebViewFrame::Response { query_id, response }) => {
                sink.response(RequestId(query_id), response);
            }
            Ok(WebViewFrame::Push { notification }) => {
                sink.push(notification);
            }
            Ok(WebViewFrame::Call { query_id, .. }) => {
                warn!(request_id = query_id, "host sent a call frame; ignored");
            }
            Err(e) => warn!("skipping undecodable webview frame: {e}"),
        }
    }
    sink.closed();
}

#[async_trait]
impl Transport for WebViewTransport {
    fn name(&self) -> &'static str {
        "webview"
    }

    async fn open(&self, sink: InboundSink) -> Result<(), TransportError> {
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| TransportError::Connect("webview pipe was already opened".to_string()))?;
        let handle = tokio::spawn(read_frames(reader, sink));
        *self
            .read_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
        Ok(())
    }

    async fn call(&self, id: RequestId, query: &Query) -> Result<(), TransportError> {
        let query = encode_native_query(query).map_err(|e| TransportError::Send(e.to_string()))?;
        self.write_frame(&WebViewFrame::Call {
            query_id: id.get(),
            query,
        })
        .await
    }

    async fn close(&self) {
        let task = self
            .read_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("webview pipe shutdown: {e}");
            }
        }
    }
}
