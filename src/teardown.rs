//! What happens to entries still present when a table is destroyed.

/// Teardown policy for entries left in a table at destroy (or drop) time.
///
/// Destroy callbacks fire exactly once per entry on removal or replacement.
/// This policy decides whether entries that were never removed also get
/// their callbacks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Teardown {
    /// Release storage without notifying the destroy callbacks. Callers
    /// that register callbacks are expected to empty the table first.
    /// Keys and values are still dropped.
    #[default]
    Release,
    /// Hand every remaining entry to the destroy callbacks, in iteration
    /// order, before releasing storage.
    Purge,
}
