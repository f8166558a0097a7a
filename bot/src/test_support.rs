//! In-process fakes for the bot's capability traits.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::engine::events::{ConversationId, InboundEvent, MessageId};
use crate::engine::render::Reply;
use crate::engine::store::{ConfigStore, ServerRecord, StoreError};
use crate::engine::transport::{EditOutcome, Transport, TransportError};
use crate::minecraft::address::ServerAddress;
use crate::minecraft::ping::{PingCapability, PingError};
use crate::minecraft::status::ServerStatus;

#[derive(Debug, Clone)]
pub enum PingBehavior {
    Online(ServerStatus),
    Unreachable,
    /// Never answers.
    Hang,
}

pub struct FakePinger {
    behavior: PingBehavior,
    calls: AtomicUsize,
    last_target: Mutex<Option<(String, u16)>>,
}

impl FakePinger {
    pub fn new(behavior: PingBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_target: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<(String, u16)> {
        self.last_target.lock().unwrap().clone()
    }
}

#[async_trait]
impl PingCapability for FakePinger {
    async fn ping(
        &self,
        host: &str,
        port: u16,
        _timeout: Duration,
    ) -> Result<ServerStatus, PingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_target.lock().unwrap() = Some((host.to_string(), port));

        match &self.behavior {
            PingBehavior::Online(status) => Ok(status.clone()),
            PingBehavior::Unreachable => Err(PingError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            PingBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// `ConfigStore` over a map, with the same upsert semantics as the table.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<ConversationId, ServerRecord>>,
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ServerRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(&conversation_id).cloned())
    }

    async fn upsert(
        &self,
        conversation_id: ConversationId,
        address: &ServerAddress,
    ) -> Result<ServerRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let next_id = records.len() as i64 + 1;
        let now = Utc::now();
        let record = records
            .entry(conversation_id)
            .and_modify(|r| {
                r.address = address.clone();
                r.updated_at = now;
            })
            .or_insert_with(|| ServerRecord {
                id: next_id,
                conversation_id,
                address: address.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(record.clone())
    }

    async fn delete(&self, conversation_id: ConversationId) -> Result<bool, StoreError> {
        Ok(self.records.lock().unwrap().remove(&conversation_id).is_some())
    }
}

/// Every call fails as if the database were gone.
pub struct FailingStore;

#[async_trait]
impl ConfigStore for FailingStore {
    async fn get(&self, _: ConversationId) -> Result<Option<ServerRecord>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn upsert(&self, _: ConversationId, _: &ServerAddress) -> Result<ServerRecord, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn delete(&self, _: ConversationId) -> Result<bool, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub reply: Reply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub reply: Reply,
    pub outcome: EditOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub callback_id: String,
    pub text: Option<String>,
}

#[derive(Default)]
struct TransportLog {
    next_message_id: MessageId,
    /// Current content of every message the fake has sent.
    messages: HashMap<(ConversationId, MessageId), Reply>,
    sent: Vec<SentMessage>,
    edits: Vec<Edit>,
    answers: Vec<Answer>,
    batches: VecDeque<Vec<InboundEvent>>,
}

/// Records outgoing traffic and serves queued event batches. Once the queue
/// is drained, `receive_events` waits forever, like an idle long poll.
#[derive(Default)]
pub struct FakeTransport {
    log: Mutex<TransportLog>,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
}

impl FakeTransport {
    pub fn push_batch(&self, events: Vec<InboundEvent>) {
        self.log.lock().unwrap().batches.push_back(events);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn last_sent(&self) -> Option<SentMessage> {
        self.log.lock().unwrap().sent.last().cloned()
    }

    pub fn edits(&self) -> Vec<Edit> {
        self.log.lock().unwrap().edits.clone()
    }

    pub fn last_edit(&self) -> Option<Edit> {
        self.log.lock().unwrap().edits.last().cloned()
    }

    pub fn answers(&self) -> Vec<Answer> {
        self.log.lock().unwrap().answers.clone()
    }

    pub fn content(&self, conversation_id: ConversationId, message_id: MessageId) -> Option<Reply> {
        self.log
            .lock()
            .unwrap()
            .messages
            .get(&(conversation_id, message_id))
            .cloned()
    }
}

fn api_error(description: &str) -> TransportError {
    TransportError::Api {
        code: 400,
        description: description.to_string(),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_message(
        &self,
        conversation_id: ConversationId,
        reply: &Reply,
    ) -> Result<MessageId, TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(api_error("Bad Request: chat not found"));
        }

        let mut log = self.log.lock().unwrap();
        log.next_message_id += 1;
        let message_id = log.next_message_id;
        log.messages
            .insert((conversation_id, message_id), reply.clone());
        log.sent.push(SentMessage {
            conversation_id,
            message_id,
            reply: reply.clone(),
        });
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<EditOutcome, TransportError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(api_error("Bad Request: message can't be edited"));
        }

        let mut log = self.log.lock().unwrap();
        let outcome = match log.messages.get_mut(&(conversation_id, message_id)) {
            None => return Err(api_error("Bad Request: message to edit not found")),
            Some(current) if current == reply => EditOutcome::Unmodified,
            Some(current) => {
                *current = reply.clone();
                EditOutcome::Edited
            }
        };
        log.edits.push(Edit {
            conversation_id,
            message_id,
            reply: reply.clone(),
            outcome,
        });
        Ok(outcome)
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.log.lock().unwrap().answers.push(Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn receive_events(&self) -> Result<Vec<InboundEvent>, TransportError> {
        let next = self.log.lock().unwrap().batches.pop_front();
        match next {
            Some(batch) => Ok(batch),
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
