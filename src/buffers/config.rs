//! Buffer pool configuration

/// Configuration for buffer pools
///
/// There is deliberately no upper bound on the number of buffers: the pool
/// always grows rather than report exhaustion.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferPoolConfig {
    /// Name of the buffer pool (used in log lines)
    pub name: String,
    /// Number of buffers allocated up front
    pub initial_count: usize,
    /// Bytes reserved in each pre-allocated buffer
    pub initial_capacity: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            initial_count: 0,
            initial_capacity: 0,
        }
    }
}

impl BufferPoolConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set initial buffer count
    pub fn with_initial_count(mut self, count: usize) -> Self {
        self.initial_count = count;
        self
    }

    /// Set the capacity reserved in pre-allocated buffers
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SensorWireError;

        if self.name.is_empty() {
            return Err(SensorWireError::invalid_parameter(
                "name",
                "Pool name cannot be empty",
            ));
        }

        if self.initial_count > 0 && self.initial_capacity == 0 {
            return Err(SensorWireError::invalid_parameter(
                "initial_capacity",
                "Pre-allocated buffers need a non-zero capacity",
            ));
        }

        Ok(())
    }

    /// Memory committed at construction time
    pub fn initial_memory(&self) -> usize {
        self.initial_count.saturating_mul(self.initial_capacity)
    }
}

/// Builder pattern for buffer pool configuration
pub struct BufferPoolConfigBuilder {
    config: BufferPoolConfig,
}

impl BufferPoolConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: BufferPoolConfig::new(name),
        }
    }

    /// Set initial count
    pub fn initial_count(mut self, count: usize) -> Self {
        self.config.initial_count = count;
        self
    }

    /// Set initial capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::error::Result<BufferPoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_validates() {
        let config = BufferPoolConfigBuilder::new("images")
            .initial_count(4)
            .initial_capacity(1 << 20)
            .build()
            .unwrap();
        assert_eq!(config.initial_memory(), 4 << 20);

        let err = BufferPoolConfigBuilder::new("images")
            .initial_count(4)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(BufferPoolConfig::new("").validate().is_err());
        assert!(BufferPoolConfig::default().validate().is_ok());
    }
}
