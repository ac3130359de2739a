//! Reporting of invalid special tags.
//!
//! A malformed tag never fails a render. The formatter hands a message to an
//! [`InvalidTagReporter`] and carries on. The UI side usually holds a
//! [`NoticeReceiver`] and shows the latest message as a transient status.

use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use log::warn;

pub trait InvalidTagReporter {
    /// Must return without waiting on the consumer.
    fn report(&self, message: String);
}

/// Reporter that only writes to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl InvalidTagReporter for LogReporter {
    fn report(&self, message: String) {
        warn!("{message}");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    /// Messages replaced by this one before anybody looked.
    pub coalesced: usize,
    pub posted_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Notice>,
}

/// Sending half of the notice channel. Cheap to clone.
#[derive(Clone, Debug)]
pub struct NoticeSender {
    slot: Arc<Mutex<Slot>>,
}

/// Receiving half of the notice channel.
#[derive(Debug)]
pub struct NoticeReceiver {
    slot: Arc<Mutex<Slot>>,
}

/// Creates a single-slot channel where the newest notice replaces any
/// undelivered one.
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    let slot = Arc::new(Mutex::new(Slot::default()));
    (
        NoticeSender { slot: slot.clone() },
        NoticeReceiver { slot },
    )
}

impl NoticeSender {
    /// Posts `message`. Returns `false` if the slot was busy and the message
    /// was dropped.
    pub fn post(&self, message: String) -> bool {
        let mut slot = match self.slot.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        let coalesced = slot
            .latest
            .as_ref()
            .map(|previous| previous.coalesced + 1)
            .unwrap_or(0);
        slot.latest = Some(Notice {
            message,
            coalesced,
            posted_at: Instant::now(),
        });
        true
    }
}

impl InvalidTagReporter for NoticeSender {
    fn report(&self, message: String) {
        warn!("{message}");
        self.post(message);
    }
}

impl NoticeReceiver {
    /// Takes the pending notice, if any.
    pub fn take_latest(&self) -> Option<Notice> {
        match self.slot.lock() {
            Ok(mut slot) => slot.latest.take(),
            Err(poisoned) => poisoned.into_inner().latest.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_message_wins() {
        let (sender, receiver) = notice_channel();
        sender.report("first".to_string());
        sender.report("second".to_string());
        let notice = receiver.take_latest().expect("pending notice");
        assert_eq!(notice.message, "second");
        assert_eq!(notice.coalesced, 1);
        assert!(receiver.take_latest().is_none());
    }

    #[test]
    fn coalesce_count_resets_after_take() {
        let (sender, receiver) = notice_channel();
        assert!(sender.post("a".to_string()));
        receiver.take_latest();
        assert!(sender.post("b".to_string()));
        assert_eq!(receiver.take_latest().map(|n| n.coalesced), Some(0));
    }

    #[test]
    fn senders_on_other_threads_share_the_slot() {
        let (sender, receiver) = notice_channel();
        let handles: Vec<_> = (0..4)
            .map(|idx| {
                let sender = sender.clone();
                std::thread::spawn(move || {
                    sender.report(format!("from {idx}"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("reporter thread");
        }
        let notice = receiver.take_latest().expect("pending notice");
        assert!(notice.message.starts_with("from "));
    }
}
