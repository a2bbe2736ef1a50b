use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connection(String),

    #[error("broker command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },

    #[error("broker state lock poisoned")]
    Poisoned,
}

/// Key/value, list and pub/sub substrate shared by clients, workers and
/// the coordinator.
///
/// Every operation is individually atomic; nothing composes into a
/// transaction. List semantics follow Redis: `list_push` adds at the head,
/// `list_pop` removes from the tail, so a list drains in push order.
pub trait Broker: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BrokerError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError>;

    fn delete(&self, key: &str) -> Result<(), BrokerError>;

    fn exists(&self, key: &str) -> Result<bool, BrokerError>;

    /// Returns the list length after the push.
    fn list_push(&self, key: &str, value: &[u8]) -> Result<usize, BrokerError>;

    fn list_pop(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError>;

    /// Keeps the inclusive index range `start..=stop`, counted from the head.
    /// Negative indices count from the tail; `start > stop` empties the list.
    fn list_trim(&self, key: &str, start: isize, stop: isize) -> Result<(), BrokerError>;

    /// Returns the number of subscribers that received the message.
    fn publish(&self, channel: &str, message: &[u8]) -> Result<usize, BrokerError>;

    fn subscribe(&self, channel: &str) -> Result<(), BrokerError>;

    fn unsubscribe(&self, channel: &str) -> Result<(), BrokerError>;
}
