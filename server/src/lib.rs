//! # Admissions Intake Server Library
//!
//! This library implements the receiving end of the admissions intake
//! protocol. Submitters connect over TCP, send one JSON application carrying
//! a shared secret, and receive either a registration number or a failure
//! reason before the connection is closed.
//!
//! ## Request Lifecycle
//!
//! 1. The [`network::Server`] accepts a connection and spawns a handler task.
//! 2. The handler reads until the peer goes quiet for the idle window
//!    (see [`intake_shared::framing`]).
//! 3. The payload is decoded as JSON; undecodable input is answered with
//!    `"Invalid data format"`.
//! 4. The [`auth::AuthGate`] compares `auth_key` with the configured secret.
//!    Nothing past this point runs for an unauthenticated request.
//! 5. The intake fields are decoded and checked for blank text.
//! 6. The [`store::ApplicationStore`] inserts the record under a candidate
//!    from [`registration`], regenerating on collision a bounded number of
//!    times.
//! 7. The response is written and the connection closed.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Listening socket, accept loop with periodic shutdown checks, and the set
//! of in-flight handler tasks that is drained, for a bounded time, on shutdown.
//!
//! ### Connection Module (`connection`)
//! One accepted connection end to end. Failures are converted into
//! best-effort failure responses and never reach the listener.
//!
//! ### Service Module (`service`)
//! Decoding, authentication, validation and persistence of one request,
//! independent of any socket.
//!
//! ### Store Module (`store`)
//! SQLite table of applications with a unique registration number index.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use intake_server::auth::AuthGate;
//! use intake_server::config::ServerConfig;
//! use intake_server::network::Server;
//! use intake_server::service::IntakeService;
//! use intake_server::store::ApplicationStore;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("change-me");
//!     let store = ApplicationStore::open(&config.database)?;
//!     let service = IntakeService::new(AuthGate::new(config.auth_key.clone()), store);
//!
//!     let server = Server::bind(&config, service).await?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     server.run(shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Known Limitations
//!
//! Framing relies on timing alone. A request that pauses mid-send for longer
//! than the idle window is cut short and rejected as malformed; every
//! request costs at least one idle window unless the client half-closes.

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod network;
pub mod registration;
pub mod service;
pub mod store;
