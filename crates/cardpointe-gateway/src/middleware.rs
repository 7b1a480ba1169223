//! Named response steps applied to every inbound response.

use std::fmt;
use std::sync::Arc;

use crate::response::Response;

/// Name of the step that turns on JSON decoding for [`Response::data`].
pub const DATA_DECODE: &str = "data_decode";

/// A response transformation.
pub type ResponseStep = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Ordered list of named response steps. Steps run in insertion order.
#[derive(Clone, Default)]
pub struct HandlerStack {
    steps: Vec<(String, ResponseStep)>,
}

impl fmt::Debug for HandlerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerStack")
            .field("steps", &self.names())
            .finish()
    }
}

impl HandlerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. A step with the same name is dropped first.
    pub fn push<F>(&mut self, name: impl Into<String>, step: F)
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        let name = name.into();
        self.steps.retain(|(n, _)| *n != name);
        tracing::debug!(step = %name, "pushing response step");
        self.steps.push((name, Arc::new(step)));
    }

    /// Remove a step by name. Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.steps.len();
        self.steps.retain(|(n, _)| n != name);
        let removed = self.steps.len() != before;
        if removed {
            tracing::debug!(step = %name, "removed response step");
        }
        removed
    }

    /// Swap the step registered under `name`, keeping its position.
    /// Returns `false` (and changes nothing) if no such step exists.
    pub fn replace<F>(&mut self, name: &str, step: F) -> bool
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        match self.steps.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                slot.1 = Arc::new(step);
                tracing::debug!(step = %name, "replaced response step");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Run every step over `response`.
    pub fn apply(&self, response: Response) -> Response {
        self.steps.iter().fold(response, |resp, (_, step)| step(resp))
    }
}

/// The `data_decode` step.
pub fn data_decode(response: Response) -> Response {
    response.with_decoding()
}
