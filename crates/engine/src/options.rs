use std::time::Duration;

/// Knobs controlling how a request is executed.
///
/// Set once on the schema builder; every request executed against the schema
/// sees the same options.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Resolve sibling fields one after the other even for queries.
    /// Mutations are always serial regardless of this flag.
    pub force_serial_execution: bool,
    /// Abort execution when it runs longer than this.
    pub execution_timeout: Option<Duration>,
    /// Surface the message of unexpected errors instead of redacting it.
    /// Meant for development, not production.
    pub include_exception_details: bool,
    /// How forgiving document preparation is.
    pub validation_mode: ValidationMode,
}

/// How document-level irregularities are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Duplicate fragment names and field merge conflicts fail the request.
    #[default]
    Strict,
    /// Duplicate fragments keep the last definition, merge conflicts keep
    /// the first field.
    Lenient,
}

impl ValidationMode {
    pub fn is_strict(self) -> bool {
        matches!(self, ValidationMode::Strict)
    }
}
