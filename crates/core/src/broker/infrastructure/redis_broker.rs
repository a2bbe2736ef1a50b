use std::sync::Mutex;

use crate::broker::domain::broker::{Broker, BrokerError};

/// [`Broker`] backed by a Redis server.
///
/// Commands and subscriptions use separate connections: a connection in
/// subscribe mode cannot issue regular commands.
pub struct RedisBroker {
    commands: Mutex<redis::Connection>,
    subscriptions: Mutex<redis::Connection>,
}

impl RedisBroker {
    pub fn connect(url: &str) -> Result<Self, BrokerError> {
        let client =
            redis::Client::open(url).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let commands = client
            .get_connection()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        let subscriptions = client
            .get_connection()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        log::debug!("Connected to redis at {url}");
        Ok(Self {
            commands: Mutex::new(commands),
            subscriptions: Mutex::new(subscriptions),
        })
    }

    fn query<T: redis::FromRedisValue>(
        &self,
        command: &'static str,
        cmd: &redis::Cmd,
    ) -> Result<T, BrokerError> {
        let mut con = self.commands.lock().map_err(|_| BrokerError::Poisoned)?;
        cmd.query(&mut *con).map_err(|e| BrokerError::Command {
            command,
            message: e.to_string(),
        })
    }

    fn query_subscriptions(
        &self,
        command: &'static str,
        channel: &str,
    ) -> Result<(), BrokerError> {
        let mut con = self
            .subscriptions
            .lock()
            .map_err(|_| BrokerError::Poisoned)?;
        redis::cmd(command)
            .arg(channel)
            .query::<redis::Value>(&mut *con)
            .map(|_| ())
            .map_err(|e| BrokerError::Command {
                command,
                message: e.to_string(),
            })
    }
}

impl Broker for RedisBroker {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BrokerError> {
        self.query("SET", redis::cmd("SET").arg(key).arg(value))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError> {
        self.query("GET", redis::cmd("GET").arg(key))
    }

    fn delete(&self, key: &str) -> Result<(), BrokerError> {
        self.query("DEL", redis::cmd("DEL").arg(key))
    }

    fn exists(&self, key: &str) -> Result<bool, BrokerError> {
        self.query("EXISTS", redis::cmd("EXISTS").arg(key))
    }

    fn list_push(&self, key: &str, value: &[u8]) -> Result<usize, BrokerError> {
        self.query("LPUSH", redis::cmd("LPUSH").arg(key).arg(value))
    }

    fn list_pop(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError> {
        self.query("RPOP", redis::cmd("RPOP").arg(key))
    }

    fn list_trim(&self, key: &str, start: isize, stop: isize) -> Result<(), BrokerError> {
        self.query("LTRIM", redis::cmd("LTRIM").arg(key).arg(start).arg(stop))
    }

    fn publish(&self, channel: &str, message: &[u8]) -> Result<usize, BrokerError> {
        self.query("PUBLISH", redis::cmd("PUBLISH").arg(channel).arg(message))
    }

    fn subscribe(&self, channel: &str) -> Result<(), BrokerError> {
        self.query_subscriptions("SUBSCRIBE", channel)
    }

    fn unsubscribe(&self, channel: &str) -> Result<(), BrokerError> {
        self.query_subscriptions("UNSUBSCRIBE", channel)
    }
}
