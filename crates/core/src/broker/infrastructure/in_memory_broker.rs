use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::broker::domain::broker::{Broker, BrokerError};

#[derive(Default)]
struct State {
    values: HashMap<String, Vec<u8>>,
    lists: HashMap<String, VecDeque<Vec<u8>>>,
    subscriptions: HashSet<String>,
    published: HashMap<String, Vec<Vec<u8>>>,
}

/// Process-local [`Broker`] with Redis list and key semantics.
///
/// Used when every role runs in one process and as the broker double in
/// tests. Share it between threads behind an `Arc`.
#[derive(Default)]
pub struct InMemoryBroker {
    state: Mutex<State>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, BrokerError> {
        self.state.lock().map_err(|_| BrokerError::Poisoned)
    }

    pub fn list_len(&self, key: &str) -> Result<usize, BrokerError> {
        Ok(self.state()?.lists.get(key).map_or(0, VecDeque::len))
    }

    pub fn is_subscribed(&self, channel: &str) -> Result<bool, BrokerError> {
        Ok(self.state()?.subscriptions.contains(channel))
    }

    /// Messages published to `channel` while this handle was subscribed.
    pub fn published(&self, channel: &str) -> Result<Vec<Vec<u8>>, BrokerError> {
        Ok(self
            .state()?
            .published
            .get(channel)
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolves a Redis-style inclusive range to `start..end` over `len` items.
fn trim_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize + 1))
}

impl Broker for InMemoryBroker {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        state.lists.remove(key);
        state.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError> {
        Ok(self.state()?.values.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        state.values.remove(key);
        state.lists.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, BrokerError> {
        let state = self.state()?;
        Ok(state.values.contains_key(key) || state.lists.contains_key(key))
    }

    fn list_push(&self, key: &str, value: &[u8]) -> Result<usize, BrokerError> {
        let mut state = self.state()?;
        let list = state.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_vec());
        Ok(list.len())
    }

    fn list_pop(&self, key: &str) -> Result<Option<Vec<u8>>, BrokerError> {
        let mut state = self.state()?;
        let Some(list) = state.lists.get_mut(key) else {
            return Ok(None);
        };
        let value = list.pop_back();
        if list.is_empty() {
            state.lists.remove(key);
        }
        Ok(value)
    }

    fn list_trim(&self, key: &str, start: isize, stop: isize) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        let Some(list) = state.lists.get_mut(key) else {
            return Ok(());
        };
        match trim_range(list.len(), start, stop) {
            Some((from, to)) => {
                list.truncate(to);
                list.drain(..from);
            }
            None => list.clear(),
        }
        if list.is_empty() {
            state.lists.remove(key);
        }
        Ok(())
    }

    fn publish(&self, channel: &str, message: &[u8]) -> Result<usize, BrokerError> {
        let mut state = self.state()?;
        if !state.subscriptions.contains(channel) {
            return Ok(0);
        }
        state
            .published
            .entry(channel.to_string())
            .or_default()
            .push(message.to_vec());
        Ok(1)
    }

    fn subscribe(&self, channel: &str) -> Result<(), BrokerError> {
        self.state()?.subscriptions.insert(channel.to_string());
        Ok(())
    }

    fn unsubscribe(&self, channel: &str) -> Result<(), BrokerError> {
        self.state()?.subscriptions.remove(channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn broker_with_list(key: &str, items: &[&[u8]]) -> InMemoryBroker {
        let broker = InMemoryBroker::new();
        for item in items {
            broker.list_push(key, item).unwrap();
        }
        broker
    }

    #[test]
    fn test_put_get_delete() {
        let broker = InMemoryBroker::new();
        assert_eq!(broker.get("k").unwrap(), None);
        broker.put("k", b"v").unwrap();
        assert!(broker.exists("k").unwrap());
        assert_eq!(broker.get("k").unwrap(), Some(b"v".to_vec()));
        broker.delete("k").unwrap();
        assert!(!broker.exists("k").unwrap());
    }

    #[test]
    fn test_empty_value_still_exists() {
        let broker = InMemoryBroker::new();
        broker.put("k", b"").unwrap();
        assert_eq!(broker.get("k").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_list_drains_in_push_order() {
        let broker = broker_with_list("q", &[b"1", b"2", b"3"]);
        assert_eq!(broker.list_pop("q").unwrap(), Some(b"1".to_vec()));
        assert_eq!(broker.list_pop("q").unwrap(), Some(b"2".to_vec()));
        assert_eq!(broker.list_pop("q").unwrap(), Some(b"3".to_vec()));
        assert_eq!(broker.list_pop("q").unwrap(), None);
        assert!(!broker.exists("q").unwrap());
    }

    #[test]
    fn test_push_returns_length() {
        let broker = InMemoryBroker::new();
        assert_eq!(broker.list_push("q", b"a").unwrap(), 1);
        assert_eq!(broker.list_push("q", b"b").unwrap(), 2);
    }

    // Head is the most recent push: [3, 2, 1]
    #[rstest]
    #[case::keep_head(0, 0, vec![b"3".to_vec()])]
    #[case::keep_all(0, -1, vec![b"3".to_vec(), b"2".to_vec(), b"1".to_vec()])]
    #[case::keep_tail(-1, -1, vec![b"1".to_vec()])]
    #[case::stop_past_end(1, 10, vec![b"2".to_vec(), b"1".to_vec()])]
    #[case::start_past_stop(1, 0, vec![])]
    #[case::start_past_end(5, 10, vec![])]
    fn test_list_trim(#[case] start: isize, #[case] stop: isize, #[case] head_first: Vec<Vec<u8>>) {
        let broker = broker_with_list("q", &[b"1", b"2", b"3"]);
        broker.list_trim("q", start, stop).unwrap();
        let mut drained = Vec::new();
        while let Some(v) = broker.list_pop("q").unwrap() {
            drained.push(v);
        }
        drained.reverse();
        assert_eq!(drained, head_first);
    }

    #[test]
    fn test_trim_missing_list_is_noop() {
        let broker = InMemoryBroker::new();
        broker.list_trim("missing", 1, 0).unwrap();
        assert_eq!(broker.list_len("missing").unwrap(), 0);
    }

    #[test]
    fn test_publish_reaches_only_subscribed_channels() {
        let broker = InMemoryBroker::new();
        assert_eq!(broker.publish("chan", b"x").unwrap(), 0);
        broker.subscribe("chan").unwrap();
        assert_eq!(broker.publish("chan", b"y").unwrap(), 1);
        assert_eq!(broker.published("chan").unwrap(), vec![b"y".to_vec()]);
        broker.unsubscribe("chan").unwrap();
        assert!(!broker.is_subscribed("chan").unwrap());
    }
}
