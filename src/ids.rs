use crate::model::NodeId;
use chrono::Utc;
use uuid::Uuid;

/// Source of fresh node ids, injected into every editor operation that
/// creates nodes.
pub trait IdGenerator {
    fn next_id(&mut self, prefix: &str) -> NodeId;
}

/// `prefix-N` with one counter shared by all prefixes, so ids stay unique
/// even across kinds. Deterministic, which makes it the test default.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_after(counter: u64) -> Self {
        Self { counter }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> NodeId {
        self.counter += 1;
        NodeId::Client(format!("{}-{}", prefix, self.counter))
    }
}

/// `prefix-<millis>` ids. Calls landing in the same millisecond (or after
/// the clock stepped back) get a `-<seq>` suffix instead of colliding.
#[derive(Debug, Default, Clone)]
pub struct TimestampIds {
    last_millis: i64,
    sequence: u32,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&mut self, prefix: &str) -> NodeId {
        let now = Utc::now().timestamp_millis();
        if now > self.last_millis {
            self.last_millis = now;
            self.sequence = 0;
            return NodeId::Client(format!("{}-{}", prefix, now));
        }
        self.sequence += 1;
        NodeId::Client(format!("{}-{}-{}", prefix, self.last_millis, self.sequence))
    }
}

/// Stateless `prefix-<uuid>` ids for callers that cannot keep a generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> NodeId {
        NodeId::Client(format!("{}-{}", prefix, Uuid::new_v4().simple()))
    }
}
