//! Request processing: decode, authenticate, validate, persist

use crate::auth::AuthGate;
use crate::error::StoreError;
use crate::store::ApplicationStore;
use intake_shared::{Application, SubmissionResponse};
use log::{error, info, warn};
use serde_json::Value;

pub const ERR_INVALID_FORMAT: &str = "Invalid data format";
pub const ERR_AUTHENTICATION: &str = "Authentication failed";
pub const ERR_TOO_LARGE: &str = "Request too large";
pub const ERR_IDENTIFIER_EXHAUSTED: &str = "Could not allocate a unique registration number";
pub const ERR_STORE: &str = "Failed to store application";

/// Turns one framed request into one response. Shared by every connection
/// handler; holds no per-request state.
#[derive(Debug, Clone)]
pub struct IntakeService {
    gate: AuthGate,
    store: ApplicationStore,
}

impl IntakeService {
    pub fn new(gate: AuthGate, store: ApplicationStore) -> Self {
        Self { gate, store }
    }

    pub fn store(&self) -> &ApplicationStore {
        &self.store
    }

    /// Processes a complete request payload.
    ///
    /// Authentication runs on the raw document before any field is
    /// interpreted, so an unauthenticated payload never reaches the store.
    pub async fn process(&self, payload: &[u8]) -> SubmissionResponse {
        let document: Value = match serde_json::from_slice(payload) {
            Ok(document) => document,
            Err(e) => {
                warn!("Undecodable request: {}", e);
                return SubmissionResponse::rejected(ERR_INVALID_FORMAT);
            }
        };

        if !self.gate.verify(&document) {
            return SubmissionResponse::rejected(ERR_AUTHENTICATION);
        }

        let application: Application = match serde_json::from_value(document) {
            Ok(application) => application,
            Err(e) => return SubmissionResponse::rejected(format!("Invalid application: {}", e)),
        };
        if let Err(reason) = application.validate() {
            return SubmissionResponse::rejected(format!("Invalid application: {}", reason));
        }

        info!("Received application from: {}", application.name);

        let store = self.store.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&application))
            .await
            .unwrap_or_else(|e| Err(StoreError::Task(e.to_string())));

        match saved {
            Ok(registration_number) => SubmissionResponse::accepted(registration_number),
            Err(e) => store_failure_response(&e),
        }
    }
}

/// Maps a store failure to what the client is told. Details stay in the
/// server log.
fn store_failure_response(err: &StoreError) -> SubmissionResponse {
    error!("Failed to store application: {}", err);
    match err {
        StoreError::IdentifierExhausted { .. } => {
            SubmissionResponse::rejected(ERR_IDENTIFIER_EXHAUSTED)
        }
        _ => SubmissionResponse::rejected(ERR_STORE),
    }
}
