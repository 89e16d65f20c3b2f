//! Gravity Forms REST API module
//!
//! Typed access to the Gravity Forms v2 entries API: a flat-JSON entry model,
//! an authenticated transport with request tracing, and the named entry
//! operations built on top of both.

pub mod client;
pub mod config;
pub mod constants;
pub mod entries;
pub mod entry;
pub mod error;
pub mod trace;

pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, Credentials};
pub use entries::EntryService;
pub use entry::{ENTRY_TIME_FORMAT, Entry, EntryMeta, FieldValue};
pub use error::{ApiError, ErrorKind, Result};
pub use trace::{LogObserver, NoopObserver, RequestObserver, RequestTrace};
