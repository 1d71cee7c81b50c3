pub mod consumer;
pub mod event;
pub mod framer;
pub mod upstream;

pub use consumer::{ConsumeStatus, StreamConsumer};
pub use event::{DONE_SENTINEL, ERROR_SENTINEL, StreamEvent, classify};
pub use framer::{DATA_PREFIX, StreamFramer};
pub use upstream::{AnthropicStreamParser, UpstreamEvent};
