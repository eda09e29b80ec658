use thiserror::Error;

/// Errors surfaced by the layout orchestrator. The solver boundary is the
/// only fallible stage; everything upstream of it validates cheaply and
/// everything downstream is non-throwing.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The requested operation needs a non-empty selection. The scene is left
    /// untouched and no solver call is made.
    #[error("nothing to lay out: the selection is empty")]
    EmptySelection,

    /// Another layout operation is already in flight for this orchestrator.
    /// Invocations are rejected rather than queued because the operation
    /// depends on a before/after snapshot of the selection.
    #[error("a layout operation is already in progress")]
    Busy,

    /// The selection exceeds the configured solver node ceiling.
    #[error("selection has {count} layoutable shapes, exceeding the limit of {limit}")]
    SelectionTooLarge { count: usize, limit: usize },

    /// The external layout solver failed or returned incomplete output. The
    /// scene is left at its pre-operation state; retrying with a different
    /// algorithm is allowed.
    #[error("layout solver failed: {0}")]
    Solver(String),
}
