//! Document driver capability - the seam between orchestration and browser automation
//!
//! The scenario engine and run controller depend only on this trait, never
//! on a concrete automation engine. `playwright::PlaywrightDriver` is the
//! production implementation; tests use an in-memory fake.

use async_trait::async_trait;

use crate::error::VerifyResult;

/// Default timeout for the document ready marker and results marker.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;

/// Bounded-wait operations over a live, stateful document.
///
/// The document is a single mutable shared resource; callers must not
/// interleave operations from multiple scenarios. The harness enforces this
/// by running scenarios strictly sequentially.
#[async_trait]
pub trait DocumentDriver: Send {
    /// Load the target and wait for its ready marker.
    /// Fails with [`crate::VerifyError::Load`] if the marker does not appear.
    async fn navigate(&mut self, location: &str) -> VerifyResult<()>;

    /// Set a text input's value.
    /// Fails with [`crate::VerifyError::FieldNotFound`] if the field is absent.
    async fn set_field(&mut self, field: &str, value: &str) -> VerifyResult<()>;

    /// Choose an option in a single-select field. The document is trusted to
    /// reject invalid values itself; no option-list validation here.
    async fn select_option(&mut self, field: &str, value: &str) -> VerifyResult<()>;

    /// Read back an input field's current value (retention check).
    async fn read_value(&mut self, field: &str) -> VerifyResult<String>;

    /// Invoke the named action (e.g. the calculate button). No return value.
    async fn trigger(&mut self, action: &str) -> VerifyResult<()>;

    /// Wait for an element to become visible.
    /// Fails with [`crate::VerifyError::Timeout`] if it does not in time.
    async fn wait_for_visible(&mut self, element: &str, timeout_ms: u64) -> VerifyResult<()>;

    /// Read an element's text content. The caller parses it.
    async fn read_text(&mut self, element: &str) -> VerifyResult<String>;

    /// Reload the document to a pristine state (scenario isolation).
    async fn reset(&mut self) -> VerifyResult<()>;

    /// Release the underlying automation resources.
    async fn close(&mut self) -> VerifyResult<()>;
}
