use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::broker::domain::broker::Broker;
use crate::codec::assignment_codec::{encode_admission, AdmissionReply, Assignment};
use crate::shared::cancellation::CancellationToken;
use crate::shared::constants::{REGISTER_LIST_KEY, RELEASE_LIST_KEY, WORKER_IDLE_INTERVAL};
use crate::shared::dispatch_error::DispatchError;

/// What one registration step did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Both lists were empty.
    Idle,
    Assigned { client_id: String, slot: usize },
    Rejected { client_id: String },
    /// A client left. `slot` is `None` if it was never admitted.
    Released { client_id: String, slot: Option<usize> },
    /// A registration whose client had already given up.
    Withdrawn { client_id: String },
}

/// Hands out detect worker slots to registering clients.
///
/// Slot `n` (1-based) always maps to the keys `in{n}`, `out{n}` and
/// `chan{n}`, so detect workers can be started against a slot before any
/// client shows up.
///
/// Clients leave by pushing their id onto the release list. A release from
/// a client that was never admitted is remembered, so its registration is
/// dropped when it surfaces.
pub struct Coordinator {
    broker: Arc<dyn Broker>,
    slots: Vec<Option<String>>,
    withdrawn: HashSet<String>,
    idle_interval: Duration,
}

impl Coordinator {
    pub fn new(broker: Arc<dyn Broker>, pool_size: usize) -> Self {
        Self {
            broker,
            slots: vec![None; pool_size],
            withdrawn: HashSet::new(),
            idle_interval: WORKER_IDLE_INTERVAL,
        }
    }

    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.idle_interval = idle_interval;
        self
    }

    pub fn slot_assignment(slot: usize) -> Assignment {
        Assignment {
            input_key: format!("in{slot}"),
            output_key: format!("out{slot}"),
            channel: format!("chan{slot}"),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Client holding `slot`, if any.
    pub fn occupant(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot.checked_sub(1)?)?.as_deref()
    }

    /// Handles one pending release, or else admits the oldest waiting
    /// client (or tells it the pool is busy).
    pub fn step(&mut self) -> Result<Admission, DispatchError> {
        if let Some(raw) = self.broker.list_pop(RELEASE_LIST_KEY)? {
            let Some(client_id) = client_id(raw) else {
                return Ok(Admission::Idle);
            };
            let slot = self.apply_release(&client_id)?;
            return Ok(Admission::Released { client_id, slot });
        }
        self.admit()
    }

    fn admit(&mut self) -> Result<Admission, DispatchError> {
        let Some(raw) = self.broker.list_pop(REGISTER_LIST_KEY)? else {
            return Ok(Admission::Idle);
        };
        let Some(client_id) = client_id(raw) else {
            return Ok(Admission::Idle);
        };
        if self.withdrawn.remove(&client_id) {
            log::info!("Client {client_id} gave up before admission");
            return Ok(Admission::Withdrawn { client_id });
        }

        let mut free = self.slots.iter().position(Option::is_none);
        if free.is_none() {
            // Releases queued behind this registration still count.
            while let Some(raw) = self.broker.list_pop(RELEASE_LIST_KEY)? {
                if let Some(leaving) = self::client_id(raw) {
                    self.apply_release(&leaving)?;
                }
            }
            free = self.slots.iter().position(Option::is_none);
        }

        match free {
            Some(index) => {
                let slot = index + 1;
                let reply = AdmissionReply::Assigned(Self::slot_assignment(slot));
                self.broker.put(&client_id, &encode_admission(&reply)?)?;
                self.slots[index] = Some(client_id.clone());
                log::info!("Client {client_id} admitted to slot {slot}");
                Ok(Admission::Assigned { client_id, slot })
            }
            None => {
                self.broker
                    .put(&client_id, &encode_admission(&AdmissionReply::Busy)?)?;
                log::warn!("Client {client_id} rejected, all {} slots busy", self.slots.len());
                Ok(Admission::Rejected { client_id })
            }
        }
    }

    fn apply_release(&mut self, client_id: &str) -> Result<Option<usize>, DispatchError> {
        let slot = self.release_client(client_id)?;
        if slot.is_none() {
            self.withdrawn.insert(client_id.to_string());
        }
        Ok(slot)
    }

    /// Frees `slot` and clears any requests left on its keys.
    pub fn release(&mut self, slot: usize) -> Result<Option<String>, DispatchError> {
        let Some(entry) = slot.checked_sub(1).and_then(|i| self.slots.get_mut(i)) else {
            return Ok(None);
        };
        let previous = entry.take();
        if let Some(client_id) = &previous {
            let assignment = Self::slot_assignment(slot);
            self.broker.delete(&assignment.input_key)?;
            self.broker.delete(&assignment.output_key)?;
            self.broker.delete(client_id)?;
            log::info!("Slot {slot} released by {client_id}");
        }
        Ok(previous)
    }

    /// Frees whichever slot `client_id` holds. Returns that slot.
    pub fn release_client(&mut self, client_id: &str) -> Result<Option<usize>, DispatchError> {
        let Some(index) = self
            .slots
            .iter()
            .position(|s| s.as_deref() == Some(client_id))
        else {
            return Ok(None);
        };
        self.release(index + 1)?;
        Ok(Some(index + 1))
    }

    /// Serves registrations and releases until `cancel` trips.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<(), DispatchError> {
        log::info!("Coordinator serving {} slots", self.slots.len());
        while !cancel.is_cancelled() {
            if self.step()? == Admission::Idle {
                thread::sleep(self.idle_interval);
            }
        }
        Ok(())
    }
}

fn client_id(raw: Vec<u8>) -> Option<String> {
    match String::from_utf8(raw) {
        Ok(id) if !id.is_empty() => Some(id),
        _ => {
            log::warn!("Ignoring an unreadable client id");
            None
        }
    }
}
