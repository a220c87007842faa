//! # Message Store
//!
//! The conversation history: an ordered log that only ever grows by `append`
//! or changes by `patch`. Insertion order is chronological order is display
//! order. Nothing here touches the network or the disk.
//!
//! ```text
//! MessageStore
//! ├── messages: Vec<Message>   // tail = newest
//! └── clock: IdClock           // time-derived, strictly increasing ids
//! ```

use std::fmt;

use log::{debug, warn};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "you",
            Role::Assistant => "assistant",
        }
    }
}

/// Opaque message identifier. Milliseconds since the Unix epoch at creation,
/// bumped forward when two ids are minted within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub truncated: bool,
}

/// Mints strictly increasing ids from the wall clock.
#[derive(Debug, Default)]
struct IdClock {
    last: i64,
}

impl IdClock {
    fn next(&mut self) -> MessageId {
        let now = chrono::Utc::now().timestamp_millis();
        self.last = if now > self.last { now } else { self.last + 1 };
        MessageId(self.last)
    }
}

/// Append/patch-only message log for one session.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    clock: IdClock,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record with a fresh id at the tail. Always succeeds.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> MessageId {
        let id = self.clock.next();
        let content = content.into();
        debug!("Store append: id={} role={:?} len={}", id, role, content.len());
        self.messages.push(Message {
            id,
            role,
            content,
            truncated: false,
        });
        id
    }

    /// Mints an id without inserting anything.
    ///
    /// The assistant bubble for a turn exists before its history entry; the
    /// entry is created later by [`patch`](Self::patch) under this id.
    pub fn reserve_id(&mut self) -> MessageId {
        self.clock.next()
    }

    /// Overwrites `content`/`truncated` of an assistant record in place, or
    /// inserts a new assistant record with `id` if none exists.
    ///
    /// Returns `false` (and changes nothing) when `id` names a user message.
    pub fn patch(&mut self, id: MessageId, content: impl Into<String>, truncated: bool) -> bool {
        let content = content.into();
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(existing) if existing.role == Role::User => {
                warn!("Refusing to patch user message {}", id);
                false
            }
            Some(existing) => {
                debug!("Store patch: id={} len={} truncated={}", id, content.len(), truncated);
                existing.content = content;
                existing.truncated = truncated;
                true
            }
            None => {
                debug!("Store patch inserted missing id={}", id);
                self.messages.push(Message {
                    id,
                    role: Role::Assistant,
                    content,
                    truncated,
                });
                true
            }
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a MessageStore {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut store = MessageStore::new();
        store.append(Role::User, "one");
        store.append(Role::Assistant, "two");
        store.append(Role::User, "three");

        let contents: Vec<&str> = store.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut store = MessageStore::new();
        let ids: Vec<MessageId> = (0..50).map(|_| store.append(Role::User, "x")).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should be < {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_reserved_id_does_not_insert() {
        let mut store = MessageStore::new();
        let user = store.append(Role::User, "hi");
        let reserved = store.reserve_id();
        assert!(reserved > user);
        assert_eq!(store.len(), 1);
        assert!(store.get(reserved).is_none());
    }

    #[test]
    fn test_patch_inserts_missing_record() {
        let mut store = MessageStore::new();
        store.append(Role::User, "hi");
        let reply = store.reserve_id();

        assert!(store.patch(reply, "hello", true));
        let msg = store.get(reply).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "hello");
        assert!(msg.truncated);
        assert_eq!(store.last().unwrap().id, reply);
    }

    #[test]
    fn test_patch_overwrites_in_place() {
        let mut store = MessageStore::new();
        let a = store.append(Role::Assistant, "draft");
        let b = store.append(Role::User, "next");

        assert!(store.patch(a, "final", false));
        let ids: Vec<MessageId> = store.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a, b], "patch must not reorder");
        assert_eq!(store.get(a).unwrap().content, "final");
    }

    #[test]
    fn test_patch_refuses_user_messages() {
        let mut store = MessageStore::new();
        let id = store.append(Role::User, "original");
        assert!(!store.patch(id, "edited", false));
        assert_eq!(store.get(id).unwrap().content, "original");
    }
}
