//! Local screen-text memory.
//!
//! screenmem keeps a searchable record of the text that passes across the
//! screen. Captures are deduplicated over a short time window and stored in
//! SQLite with an FTS5 index. A separate rolling buffer keeps a few minutes of
//! downscaled JPEG frames for later OCR. A small read-only HTTP API answers
//! status and search queries on loopback.
//!
//! # Architecture
//!
//! - **Storage**: SQLite in WAL mode; an external-content FTS5 table kept in
//!   sync by triggers inside the same transaction as each insert or purge
//! - **Ingest**: pluggable [`capture::Extractor`] strategies feeding a
//!   [`capture::IngestPipeline`] that suppresses repeats within the duplicate window
//! - **Frames**: [`frames::FrameRetentionStore`] bounded by age and by count
//! - **API**: hand-rolled HTTP/1.1, one request per connection, JSON bodies with sorted keys
//!
//! # Modules
//!
//! - [`config`]: TOML configuration, environment overrides and data directory layout
//! - [`db`]: connection setup, schema and health checks
//! - [`records`]: the capture record store
//! - [`hashing`]: content hashing
//! - [`capture`]: extractors, the ingest pipeline and the background daemon
//! - [`frames`]: the frame buffer and OCR search over it
//! - [`probe`]: permission and screen-capture probes
//! - [`api`]: the query API

pub mod api;
pub mod capture;
pub mod config;
pub mod db;
pub mod frames;
pub mod hashing;
pub mod probe;
pub mod records;
