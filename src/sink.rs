//! Collaborator contracts through which the organizing pipeline reports.
//!
//! The core never prints. It pushes human-readable lines into a
//! [`MessageSink`] and percent-complete values into a [`ProgressSink`].
//! Both are `Send` so a job can run on a background thread.

use crossbeam_channel::Sender;

use crate::job::JobEvent;

/// Append-only, ordered receiver of human-readable messages.
pub trait MessageSink: Send {
    /// Delivers one message.
    fn message(&mut self, text: &str);
}

/// Receiver of percent-complete values (0–100).
pub trait ProgressSink: Send {
    /// Delivers one progress value.
    fn progress(&mut self, percent: u8);
}

/// Collects messages in memory.
impl MessageSink for Vec<String> {
    fn message(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// Collects progress values in memory.
impl ProgressSink for Vec<u8> {
    fn progress(&mut self, percent: u8) {
        self.push(percent);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn message(&mut self, _text: &str) {}
}

impl ProgressSink for NullSink {
    fn progress(&mut self, _percent: u8) {}
}

// A closed receiver means nobody is listening any more. The job keeps going
// regardless, so send errors are ignored.
impl MessageSink for Sender<JobEvent> {
    fn message(&mut self, text: &str) {
        let _ = self.send(JobEvent::Message(text.to_string()));
    }
}

impl ProgressSink for Sender<JobEvent> {
    fn progress(&mut self, percent: u8) {
        let _ = self.send(JobEvent::Progress(percent));
    }
}
