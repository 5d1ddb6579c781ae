//! # Admissions Intake Client Library
//!
//! Submitting side of the admissions intake protocol.
//!
//! ## Module Organization
//!
//! ### Form Module (`form`)
//! Checks the submitter's raw input and turns it into an
//! [`intake_shared::Application`]. Start year range and month spelling are
//! enforced only here; the server trusts them.
//!
//! ### Session Module (`session`)
//! One connection per attempt: connect (10 s timeout), send the request,
//! read the reply until the server closes or goes quiet for 5 s. Failures
//! are classified so callers can tell transport problems, which are worth
//! retrying later, from rejections by the server.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use intake_client::form::ApplicationForm;
//! use intake_client::session::SubmissionSession;
//! use intake_shared::SubmissionRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let application = ApplicationForm {
//!         name: "Alice Smith".into(),
//!         address: "1 Main St".into(),
//!         qualifications: "BSc CS".into(),
//!         course: "3".into(),
//!         start_year: 2025,
//!         start_month: "September".into(),
//!     }
//!     .into_application()?;
//!
//!     let session = SubmissionSession::new("127.0.0.1:5555");
//!     let response = session
//!         .submit(&SubmissionRequest::new(application, "change-me"))
//!         .await?;
//!     println!("{:?}", response);
//!     Ok(())
//! }
//! ```

pub mod form;
pub mod session;
