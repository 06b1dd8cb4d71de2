//! Concrete [`Transport`](crate::application::Transport) implementations.

pub mod http;
pub mod mock;
pub mod native;
pub mod webview;

pub use http::HttpTransport;
pub use mock::MockTransport;
pub use native::{NativeChannel, NativeChannelTransport, NativeSignals};
pub use webview::WebViewTransport;
