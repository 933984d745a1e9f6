// Answer streaming boundary.
//
// The text generator is an external collaborator: the engine only consumes an
// async sequence of *cumulative* text chunks per question. Generation runs on
// a worker thread per request and reports through an mpsc channel the frame
// loop drains at the top of every tick, so the store only ever mutates on the
// main thread. A failed generation is substituted with fixed fallback text
// and pushed through the exact same chunk-by-chunk path, so the rest of the
// app never sees an error state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use super::star::StarId;

/// Per-character reveal cadence for locally simulated streams.
const REVEAL_INTERVAL: Duration = Duration::from_millis(30);

/// Shown when the generator cannot be reached at all.
pub const FALLBACK_OFFLINE: &str = "**Signal lost.**\nThe knowledge relay is \
    out of reach. Check the connection and send the question again.";
/// Shown when a stream starts and then dies.
pub const FALLBACK_INTERRUPTED: &str = "**Signal degraded.**\nThe question was \
    heard, but interference cut the reply short. Try again in a moment.";

/// Why a generation attempt failed. The streaming layer maps each variant to
/// fallback text; callers never observe the error directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerError {
    Unavailable,
    Interrupted,
}

impl AnswerError {
    fn fallback(self) -> &'static str {
        match self {
            AnswerError::Unavailable => FALLBACK_OFFLINE,
            AnswerError::Interrupted => FALLBACK_INTERRUPTED,
        }
    }
}

/// One event from an in-flight stream. `text` is the full answer so far —
/// later events strictly supersede earlier ones.
#[derive(Debug, Clone)]
pub struct AnswerEvent {
    pub star: StarId,
    pub text: String,
    pub finished: bool,
}

/// The external text generator, reduced to the one call the engine needs.
///
/// `emit` receives cumulative text snapshots as they grow. Returning an error
/// hands control to the fallback path; implementations should not emit after
/// failing.
pub trait AnswerSource: Send + 'static {
    fn stream(&self, question: &str, emit: &mut dyn FnMut(&str)) -> Result<(), AnswerError>;
}

/// Offline responder: composes a canned reflection on the question and
/// reveals it at reading pace. Stands in for a remote model without changing
/// the delivery contract.
pub struct CannedAnswerSource;

impl AnswerSource for CannedAnswerSource {
    fn stream(&self, question: &str, emit: &mut dyn FnMut(&str)) -> Result<(), AnswerError> {
        let trimmed = question.trim_end_matches(['?', '!', '.']);
        let text = format!(
            "**{trimmed}** is one of those questions that rewards patience. \
             The honest core of it: what we call an answer here is a \
             **starting point** — follow the connected stars nearby to see \
             how your question sits among its neighbors."
        );
        reveal_gradually(&text, emit);
        Ok(())
    }
}

/// Drip `text` through `emit` one character per interval, cumulatively.
fn reveal_gradually(text: &str, emit: &mut dyn FnMut(&str)) {
    let mut shown = String::with_capacity(text.len());
    for c in text.chars() {
        shown.push(c);
        emit(&shown);
        thread::sleep(REVEAL_INTERVAL);
    }
}

/// Start answering `question` for `star` on a worker thread. Events arrive on
/// `tx` in generation order; the final event carries `finished: true` with
/// the complete text. Generation failure substitutes fallback text through
/// the same gradual reveal, so downstream code has a single path.
pub fn spawn_answer_stream(
    source: impl AnswerSource,
    star: StarId,
    question: String,
    tx: Sender<AnswerEvent>,
) {
    thread::spawn(move || {
        let mut latest = String::new();
        let result = {
            let tx = tx.clone();
            let latest = &mut latest;
            source.stream(&question, &mut move |text: &str| {
                latest.clear();
                latest.push_str(text);
                // A dead receiver just means the session ended; generation
                // keeps going, there is no cancellation path.
                let _ = tx.send(AnswerEvent {
                    star,
                    text: text.to_string(),
                    finished: false,
                });
            })
        };

        let final_text = match result {
            Ok(()) => latest,
            Err(err) => {
                log::warn!("answer stream failed ({err:?}); substituting fallback");
                let fallback = err.fallback();
                let tx = tx.clone();
                reveal_gradually(fallback, &mut move |text: &str| {
                    let _ = tx.send(AnswerEvent {
                        star,
                        text: text.to_string(),
                        finished: false,
                    });
                });
                fallback.to_string()
            }
        };

        let _ = tx.send(AnswerEvent {
            star,
            text: final_text,
            finished: true,
        });
    });
}

/// Convenience for the app: a channel pair with the right event type.
pub fn answer_channel() -> (Sender<AnswerEvent>, Receiver<AnswerEvent>) {
    mpsc::channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test double that emits a fixed chunk sequence instantly.
    struct ScriptedSource(Vec<&'static str>);

    impl AnswerSource for ScriptedSource {
        fn stream(&self, _q: &str, emit: &mut dyn FnMut(&str)) -> Result<(), AnswerError> {
            for chunk in &self.0 {
                emit(chunk);
            }
            Ok(())
        }
    }

    struct FailingSource(AnswerError);

    impl AnswerSource for FailingSource {
        fn stream(&self, _q: &str, _emit: &mut dyn FnMut(&str)) -> Result<(), AnswerError> {
            Err(self.0)
        }
    }

    fn drain(rx: Receiver<AnswerEvent>) -> Vec<AnswerEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.recv_timeout(Duration::from_secs(30)) {
            let done = ev.finished;
            events.push(ev);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn chunks_arrive_in_order_and_finish_with_the_last() {
        let (tx, rx) = answer_channel();
        spawn_answer_stream(
            ScriptedSource(vec!["Grav", "Gravity is", "Gravity is the force..."]),
            StarId(1),
            "What is gravity?".into(),
            tx,
        );
        let events = drain(rx);
        let last = events.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.text, "Gravity is the force...");
        // Cumulative contract: every event's text is a prefix of the final.
        for ev in &events {
            assert!(last.text.starts_with(&ev.text));
        }
    }

    #[test]
    fn failure_streams_the_fallback_character_by_character() {
        let (tx, rx) = answer_channel();
        spawn_answer_stream(
            FailingSource(AnswerError::Unavailable),
            StarId(2),
            "anything".into(),
            tx,
        );
        let events = drain(rx);
        let last = events.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.text, FALLBACK_OFFLINE);

        // The reveal is genuinely gradual: strictly growing prefixes.
        let mut prev_len = 0;
        for ev in &events {
            assert!(ev.text.chars().count() >= prev_len);
            assert!(FALLBACK_OFFLINE.starts_with(&ev.text));
            prev_len = ev.text.chars().count();
        }
        assert!(events.len() > FALLBACK_OFFLINE.chars().count() / 2);
    }

    #[test]
    fn canned_source_answers_every_question() {
        let (tx, rx) = answer_channel();
        spawn_answer_stream(CannedAnswerSource, StarId(3), "Why is the sky blue?".into(), tx);
        let events = drain(rx);
        let last = events.last().unwrap();
        assert!(last.finished);
        assert!(last.text.contains("Why is the sky blue"));
        assert!(!last.text.is_empty());
    }
}
