pub mod core;
pub mod error;
pub mod event;
pub mod handler;
pub mod hostname;
pub mod metrics;
pub mod payload;
pub mod session;

pub use crate::core::{Core, CoreState};
pub use error::IngestError;
pub use event::RawEvent;
pub use handler::{IngestReply, ingest, ingest_handler, server_from_query};
pub use hostname::is_valid_hostname;
pub use payload::IngestPayload;
pub use session::{IngestSession, Outcome};
