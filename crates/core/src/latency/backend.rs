//! Inference backend interface.
//!
//! The engine never talks to a model server directly. In real-backend latency
//! mode every miss is delegated to an [`InferenceBackend`], and the time it
//! reports becomes the miss latency. The response body is carried along for
//! collaborators but is never interpreted by the engine.

use std::time::Duration;

use crate::common::BackendError;

/// Output of one backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    /// Generated text, opaque to the engine.
    pub body: String,
    /// Round-trip time of the call.
    pub elapsed: Duration,
}

/// External inference service consulted on a cache miss.
///
/// Implementations must be shareable across threads because independent
/// policy runs may execute in parallel against one backend. They must not
/// retry internally on behalf of the engine's accounting: one `invoke` is one
/// miss.
pub trait InferenceBackend: Send + Sync {
    /// Runs inference for `key` and reports the response with its elapsed time.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] describing why the call failed.
    fn invoke(&self, key: &str) -> Result<BackendResponse, BackendError>;
}
