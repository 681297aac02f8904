//! A small blocking Rust client for the NASA Harmony service.
//!
//! This crate covers the job-submission side of Harmony:
//! describe a coverage request (collection, bounding box, time range), submit it,
//! then query the returned job id for status until it completes.
//!
//! ## Quick start
//! - Configure the service and credentials via environment variables (`HARMONY_URL`,
//!   `EDL_USERNAME`, `EDL_PASSWORD`) or pass them to [`Client::new`].
//! - Build a [`Request`] and call [`Client::submit`], then poll [`Client::status`].
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use harmony_client::{BoundingBox, Client, Collection, Request, StatusView, TemporalRange};
//!
//! fn main() -> harmony_client::Result<()> {
//!     let client = Client::from_env()?;
//!     let start = NaiveDate::from_ymd_opt(2010, 12, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!     let stop = NaiveDate::from_ymd_opt(2010, 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!
//!     let request = Request::new(Collection::new("C1940468263-POCLOUD"))
//!         .with_spatial(BoundingBox::new(-107.0, 40.0, -105.0, 42.0)?)
//!         .with_temporal(TemporalRange::new(start, stop)?);
//!
//!     let job_id = client.submit(&request)?;
//!     if let StatusView::Progress(p) = client.status(&job_id, true)? {
//!         println!("{job_id}: {p}%");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The client verifies credentials once, with `GET /jobs`, before its first submission.
//! See [`AuthPolicy`] for what happens when that check fails.

#![forbid(unsafe_code)]

mod auth;
mod client;
mod config;
mod error;
mod job;
mod request;
mod util;

pub use client::Client;
pub use config::{AuthPolicy, ClientConfig};
pub use error::{Error, ErrorKind, Result};
pub use job::{JobState, JobStatus, StatusView};
pub use request::{BoundingBox, Collection, Request, TemporalRange, Timestamp};
