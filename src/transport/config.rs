//! Publisher configuration

use std::time::Duration;

use crate::buffers::BufferPoolConfig;
use crate::config::{DEFAULT_JOIN_GRACE_MS, DEFAULT_WRITE_TIMEOUT_MS};
use crate::error::{Result, SensorWireError};
use crate::topic::{Endpoint, Topic};

use super::socket::SocketOptions;

/// Configuration for a [`Publisher`](super::Publisher)
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherConfig {
    /// Topic name (used in log lines and as the pool name)
    pub topic: String,
    pub port: u16,
    /// Host to dial; `None` binds on all interfaces
    pub host: Option<String>,
    /// Pause after binding so early subscribers finish connecting
    pub join_grace: Duration,
    /// Kernel send buffer size in bytes
    pub send_buffer_size: Option<usize>,
    /// Drop subscribers that stall a write for this long; `None` waits forever
    pub write_timeout: Option<Duration>,
    pub pool: BufferPoolConfig,
}

impl PublisherConfig {
    /// Bind `port` under `topic`
    pub fn new(topic: impl Into<String>, port: u16) -> Self {
        let topic = topic.into();
        Self {
            pool: BufferPoolConfig::new(topic.clone()),
            topic,
            port,
            host: None,
            join_grace: Duration::from_millis(DEFAULT_JOIN_GRACE_MS),
            send_buffer_size: None,
            write_timeout: Some(Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS)),
        }
    }

    /// Configuration for one of the fixed topics
    pub fn for_topic(topic: &Topic) -> Self {
        Self::new(topic.name, topic.port)
    }

    /// Dial `host` instead of binding
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_join_grace(mut self, grace: Duration) -> Self {
        self.join_grace = grace;
        self
    }

    pub fn with_send_buffer_size(mut self, bytes: usize) -> Self {
        self.send_buffer_size = Some(bytes);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn with_pool(mut self, pool: BufferPoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Endpoint this configuration names
    pub fn endpoint(&self) -> Endpoint {
        match &self.host {
            Some(host) => Endpoint::connect(host.clone(), self.port),
            None => Endpoint::bind(self.port),
        }
    }

    pub fn socket_options(&self) -> SocketOptions {
        SocketOptions {
            send_buffer_size: self.send_buffer_size,
            write_timeout: self.write_timeout,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.topic.is_empty() {
            return Err(SensorWireError::invalid_parameter(
                "topic",
                "Topic name cannot be empty",
            ));
        }

        if let Some(host) = &self.host {
            if host.is_empty() {
                return Err(SensorWireError::invalid_parameter(
                    "host",
                    "Host cannot be empty; leave it unset to bind",
                ));
            }
            if self.port == 0 {
                return Err(SensorWireError::invalid_parameter(
                    "port",
                    "Cannot dial port 0",
                ));
            }
        }

        if self.send_buffer_size == Some(0) {
            return Err(SensorWireError::invalid_parameter(
                "send_buffer_size",
                "Send buffer size must be greater than 0",
            ));
        }

        if self.write_timeout == Some(Duration::ZERO) {
            return Err(SensorWireError::invalid_parameter(
                "write_timeout",
                "Write timeout must be greater than 0",
            ));
        }

        self.pool.validate()
    }
}
