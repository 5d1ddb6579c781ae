//! Wire types and protocol constants shared by the intake server and client.
//!
//! A submission is a single UTF-8 JSON document carrying the applicant's
//! intake fields plus the shared secret. The reply is a single JSON document
//! of the form `{"success": true, "registration_number": ...}` or
//! `{"success": false, "error": ...}`. Neither side sends a length prefix;
//! message boundaries come from [`framing::read_until_idle`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod framing;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5555;

/// Pending-connection queue length requested from the OS.
pub const LISTEN_BACKLOG: u32 = 5;
/// How often the accept loop wakes up to check for shutdown.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Quiet period after which the server treats the request as complete.
pub const SERVER_IDLE_WINDOW: Duration = Duration::from_secs(1);
pub const CLIENT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Quiet period after which the client treats the response as complete.
pub const CLIENT_IDLE_WINDOW: Duration = Duration::from_secs(5);

pub const READ_CHUNK_SIZE: usize = 4096;
/// Upper bound on a single framed message.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

pub const REGISTRATION_PREFIX: &str = "DBS";
/// Category code used when the submitted course is not in the catalogue.
pub const GENERIC_COURSE_CODE: &str = "GEN";

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Programmes currently offered for intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Course {
    CyberSecurity,
    InformationSystems,
    DataAnalytics,
}

impl Course {
    pub const ALL: [Course; 3] = [
        Course::CyberSecurity,
        Course::InformationSystems,
        Course::DataAnalytics,
    ];

    /// Full programme title as it travels on the wire.
    pub fn title(self) -> &'static str {
        match self {
            Course::CyberSecurity => "MSc in Cyber Security",
            Course::InformationSystems => "MSc Information Systems & Computing",
            Course::DataAnalytics => "MSc Data Analytics",
        }
    }

    /// Short code embedded in registration numbers.
    pub fn code(self) -> &'static str {
        match self {
            Course::CyberSecurity => "CS",
            Course::InformationSystems => "ISC",
            Course::DataAnalytics => "DA",
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|course| course.title() == title)
    }
}

/// Maps a submitted course title to its category code, falling back to
/// [`GENERIC_COURSE_CODE`] for anything outside the catalogue.
pub fn course_code(title: &str) -> &'static str {
    Course::from_title(title).map_or(GENERIC_COURSE_CODE, Course::code)
}

/// Returns the canonical spelling of a month name, ignoring case and
/// surrounding whitespace.
pub fn canonical_month(name: &str) -> Option<&'static str> {
    let name = name.trim();
    MONTHS
        .iter()
        .copied()
        .find(|month| month.eq_ignore_ascii_case(name))
}

/// Intake fields of one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub address: String,
    pub educational_qualifications: String,
    pub course: String,
    pub start_year: i64,
    pub start_month: String,
}

impl Application {
    /// Rejects blank free-text fields. Year and month ranges are the
    /// submitter's responsibility and are not checked here.
    pub fn validate(&self) -> Result<(), String> {
        let text_fields = [
            ("name", &self.name),
            ("address", &self.address),
            ("educational_qualifications", &self.educational_qualifications),
            ("course", &self.course),
            ("start_month", &self.start_month),
        ];

        for (field, value) in text_fields {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", field));
            }
        }
        Ok(())
    }
}

/// Complete request document: intake fields plus the shared secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(flatten)]
    pub application: Application,
    pub auth_key: String,
}

impl SubmissionRequest {
    pub fn new(application: Application, auth_key: impl Into<String>) -> Self {
        Self {
            application,
            auth_key: auth_key.into(),
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Reply to a submission. Exactly one of `registration_number` and `error`
/// is present, depending on `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResponse {
    pub fn accepted(registration_number: impl Into<String>) -> Self {
        Self {
            success: true,
            registration_number: Some(registration_number.into()),
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            registration_number: None,
            error: Some(reason.into()),
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
