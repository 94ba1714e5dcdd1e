//! # Bridge Metrics
//!
//! Prometheus counters for the attestation and batch pipelines.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hyperion-bridge = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `hyperion_claims_submitted_total` - Claims accepted, by claim type
//! - `hyperion_attestations_observed_total` - Attestations that reached the threshold, by claim type
//! - `hyperion_post_observation_errors_total` - Handler failures after observation, by claim type
//! - `hyperion_equivocations_total` - Validators voting for conflicting claims
//! - `hyperion_batches_built_total` - Outgoing batches created
//! - `hyperion_batches_canceled_total` - Outgoing batches cancelled (timeout or superseded)
//! - `hyperion_confirms_stored_total` - Confirmations stored, by kind (`valset` / `batch`)
//! - `hyperion_slashes_total` - Slashes applied, by reason

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Claims accepted, labeled by claim type
    pub static ref CLAIMS_SUBMITTED: IntCounterVec = register_int_counter_vec!(
        "hyperion_claims_submitted_total",
        "Total number of claims accepted",
        &["claim_type"]
    )
    .expect("Failed to create CLAIMS_SUBMITTED metric");

    /// Attestations observed, labeled by claim type
    pub static ref ATTESTATIONS_OBSERVED: IntCounterVec = register_int_counter_vec!(
        "hyperion_attestations_observed_total",
        "Total number of attestations that reached the voting threshold",
        &["claim_type"]
    )
    .expect("Failed to create ATTESTATIONS_OBSERVED metric");

    /// Handler failures after observation, labeled by claim type
    pub static ref POST_OBSERVATION_ERRORS: IntCounterVec = register_int_counter_vec!(
        "hyperion_post_observation_errors_total",
        "Total number of claim handler failures after observation",
        &["claim_type"]
    )
    .expect("Failed to create POST_OBSERVATION_ERRORS metric");

    /// Equivocating votes
    pub static ref EQUIVOCATIONS: IntCounter = register_int_counter!(
        "hyperion_equivocations_total",
        "Total number of conflicting votes at one event nonce"
    )
    .expect("Failed to create EQUIVOCATIONS metric");

    /// Batches built
    pub static ref BATCHES_BUILT: IntCounter = register_int_counter!(
        "hyperion_batches_built_total",
        "Total number of outgoing batches built"
    )
    .expect("Failed to create BATCHES_BUILT metric");

    /// Batches cancelled
    pub static ref BATCHES_CANCELED: IntCounter = register_int_counter!(
        "hyperion_batches_canceled_total",
        "Total number of outgoing batches cancelled"
    )
    .expect("Failed to create BATCHES_CANCELED metric");

    /// Confirmations stored, labeled by kind
    pub static ref CONFIRMS_STORED: IntCounterVec = register_int_counter_vec!(
        "hyperion_confirms_stored_total",
        "Total number of orchestrator confirmations stored",
        &["kind"]
    )
    .expect("Failed to create CONFIRMS_STORED metric");

    /// Slashes, labeled by reason
    pub static ref SLASHES: IntCounterVec = register_int_counter_vec!(
        "hyperion_slashes_total",
        "Total number of validator slashes applied by the bridge",
        &["reason"]
    )
    .expect("Failed to create SLASHES metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_claim_submitted(claim_type: &str) {
    CLAIMS_SUBMITTED.with_label_values(&[claim_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_attestation_observed(claim_type: &str) {
    ATTESTATIONS_OBSERVED.with_label_values(&[claim_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_post_observation_error(claim_type: &str) {
    POST_OBSERVATION_ERRORS.with_label_values(&[claim_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_equivocation() {
    EQUIVOCATIONS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_batch_built() {
    BATCHES_BUILT.inc();
}

#[cfg(feature = "metrics")]
pub fn record_batch_canceled() {
    BATCHES_CANCELED.inc();
}

/// Record a stored confirmation (`valset` or `batch`)
#[cfg(feature = "metrics")]
pub fn record_confirm_stored(kind: &str) {
    CONFIRMS_STORED.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_slash(reason: &str) {
    SLASHES.with_label_values(&[reason]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_claim_submitted(_claim_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_attestation_observed(_claim_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_post_observation_error(_claim_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_equivocation() {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_built() {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_canceled() {}

#[cfg(not(feature = "metrics"))]
pub fn record_confirm_stored(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_slash(_reason: &str) {}
