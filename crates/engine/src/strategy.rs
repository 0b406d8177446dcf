use async_graphql_parser::types::OperationType;

use crate::ExecutionOptions;

/// How the fields of a selection set are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Sibling fields run concurrently. Response order still follows the
    /// query.
    Parallel,
    /// Fields run in query order, each awaited before the next starts.
    Serial,
}

impl ExecutionStrategy {
    /// Mutations are always serial; everything else is parallel unless the
    /// schema forces serial execution.
    pub fn for_operation(operation_type: OperationType, options: &ExecutionOptions) -> Self {
        if operation_type == OperationType::Mutation || options.force_serial_execution {
            ExecutionStrategy::Serial
        } else {
            ExecutionStrategy::Parallel
        }
    }

    pub fn is_serial(self) -> bool {
        matches!(self, ExecutionStrategy::Serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_are_always_serial() {
        let options = ExecutionOptions::default();
        assert_eq!(
            ExecutionStrategy::for_operation(OperationType::Mutation, &options),
            ExecutionStrategy::Serial
        );
        assert_eq!(
            ExecutionStrategy::for_operation(OperationType::Query, &options),
            ExecutionStrategy::Parallel
        );

        let options = ExecutionOptions {
            force_serial_execution: true,
            ..Default::default()
        };
        assert_eq!(
            ExecutionStrategy::for_operation(OperationType::Query, &options),
            ExecutionStrategy::Serial
        );
    }
}
