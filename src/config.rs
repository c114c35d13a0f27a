//! Runtime container configuration

/// What to pass for a scalar or untyped parameter that has neither an explicit
/// argument nor a declared default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MissingArguments {
    /// Fail resolution with [`DiError::MissingArgument`](crate::DiError::MissingArgument)
    #[default]
    Fail,
    /// Pass [`Argument::Null`](crate::Argument::Null) and let the constructor decide
    Null,
}

/// Container settings, usually assembled through
/// [`ContainerBuilder`](crate::ContainerBuilder).
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    /// Policy for absent explicit arguments
    pub missing_arguments: MissingArguments,
    /// Pre-allocated registry capacity
    pub capacity: usize,
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_arguments(mut self, policy: MissingArguments) -> Self {
        self.missing_arguments = policy;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
