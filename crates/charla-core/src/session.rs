//! Session state machine between the conversation store and the completion
//! client.
//!
//! The session enforces the single-flight discipline: `submit` refuses a new
//! request while one is pending, and `resolve` discards a reply whose
//! originating conversation has since been cleared. Transport is kept out of
//! this module; the caller runs the actual request and feeds the result back
//! through `resolve`, which is what makes the full submit/reply/clear cycle
//! testable without a network.

use anyhow::Result;

use crate::conversation::{Conversation, Role};

/// Handle for one outstanding completion request.
///
/// Carries the conversation generation at submit time; a reply presented
/// with a stale ticket is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    conversation: Conversation,
    in_flight: Option<Ticket>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` as a user message and open a request slot.
    ///
    /// Returns `None` without touching the conversation when a request is
    /// already pending or the input is blank.
    pub fn submit(&mut self, text: &str) -> Option<Ticket> {
        if self.in_flight.is_some() || text.trim().is_empty() {
            return None;
        }
        self.conversation.push(Role::User, text);
        let ticket = Ticket {
            generation: self.conversation.generation(),
        };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Feed the outcome of a completion request back into the conversation.
    ///
    /// A success appends an assistant message, a failure appends an
    /// error-role message with a user-facing explanation; either way the
    /// submit gate re-opens. A ticket from a cleared generation is discarded
    /// without appending anything.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<String>) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
        if ticket.generation != self.conversation.generation() {
            return;
        }
        match result {
            Ok(reply) => {
                self.conversation.push(Role::Assistant, reply);
            }
            Err(err) => {
                self.conversation
                    .push(Role::Error, format!("Request failed: {err:#}"));
            }
        }
    }

    /// Discard the conversation. The gate re-opens immediately; a reply
    /// still in flight is suppressed by its stale ticket, not by the gate.
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.in_flight = None;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{format_line, segment, InlineStyle, Segment};
    use anyhow::anyhow;

    #[test]
    fn submit_appends_user_message_and_gates_further_submits() {
        let mut session = ChatSession::new();

        let ticket = session.submit("Hello").expect("first submit accepted");
        assert!(session.is_busy());
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.conversation().last().unwrap().role, Role::User);
        assert_eq!(session.conversation().last().unwrap().text, "Hello");

        assert!(session.submit("again").is_none());
        session.resolve(ticket, Ok("hi".to_string()));
        assert!(!session.is_busy());
    }

    #[test]
    fn blank_input_is_rejected() {
        let mut session = ChatSession::new();
        assert!(session.submit("   ").is_none());
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn failed_request_becomes_an_error_message_and_reopens_gate() {
        let mut session = ChatSession::new();
        let ticket = session.submit("question").unwrap();

        session.resolve(ticket, Err(anyhow!("request timed out")));

        let last = session.conversation().last().unwrap();
        assert_eq!(last.role, Role::Error);
        assert!(!last.text.is_empty());
        assert!(last.text.contains("timed out"));

        // The session stays usable.
        assert!(session.submit("retry").is_some());
    }

    #[test]
    fn reply_after_clear_is_discarded() {
        let mut session = ChatSession::new();
        let ticket = session.submit("Hello").unwrap();

        session.clear();
        assert!(!session.is_busy());

        session.resolve(ticket, Ok("late reply".to_string()));
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn reply_for_superseded_ticket_is_discarded() {
        let mut session = ChatSession::new();
        let stale = session.submit("first").unwrap();
        session.clear();
        let fresh = session.submit("second").unwrap();

        session.resolve(stale, Ok("stale".to_string()));
        assert_eq!(session.conversation().len(), 1);

        session.resolve(fresh, Ok("current".to_string()));
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(session.conversation().last().unwrap().text, "current");
    }

    #[test]
    fn submit_reply_render_round_trip() {
        let mut session = ChatSession::new();
        let ticket = session.submit("Hello").unwrap();
        session.resolve(ticket, Ok("**Hi** there".to_string()));

        let reply = session.conversation().last().unwrap();
        assert_eq!(reply.role, Role::Assistant);

        let segments = segment(&reply.text);
        assert_eq!(segments.len(), 1);
        let Segment::Prose { text } = &segments[0] else {
            panic!("expected a prose segment");
        };

        let spans = format_line(text);
        assert_eq!(spans[0].style, InlineStyle::Bold);
        assert_eq!(spans[0].text, "Hi");
        assert_eq!(spans[1].style, InlineStyle::Plain);
        assert_eq!(spans[1].text, " there");
    }
}
