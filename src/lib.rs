pub mod commands;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod fetch;
pub mod registry;
pub mod server;
pub mod types;

pub use context::{Api, Context, ReplyAck};
pub use dispatcher::{DispatchError, Dispatcher, PSK_HEADER};
pub use fetch::{FileFetcher, HttpFileFetcher};
pub use registry::{Handler, HandlerRegistry};
pub use types::{EventName, OutboundReply, StoredMessage};
