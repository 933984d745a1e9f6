// Star entities and the field that owns them.
//
// The StarField is the single source of mutable shared state: the submission
// handler appends, the answer-stream handler updates in place, and everything
// else reads it once per tick. Enumeration order is insertion order, which
// the HUD relies on for its "most recent first" listing.

use std::collections::HashMap;
use std::time::SystemTime;

use glam::Vec3;

/// Opaque star identifier. Allocated by [`StarField::next_id`], monotonically
/// increasing, never reused — stars cannot be deleted, so an id stays valid
/// for the lifetime of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarId(pub u64);

/// A question/answer pair pinned to a fixed point in the universe.
#[derive(Debug, Clone)]
pub struct Star {
    pub id: StarId,
    /// The user's question. Immutable after creation.
    pub content: String,
    /// The answer text. Starts empty and is replaced wholesale by each
    /// cumulative stream chunk — it only ever grows until the stream ends.
    pub answer: String,
    /// Assigned once by the position synthesizer. Immutable.
    pub position: Vec3,
    /// `None` while the answer is still streaming; finalized exactly once
    /// when the stream completes. Seed stars are born with a topic.
    pub topic: Option<String>,
    pub created_at: SystemTime,
}

impl Star {
    pub fn new(id: StarId, content: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            content: content.into(),
            answer: String::new(),
            position,
            topic: None,
            created_at: SystemTime::now(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = answer.into();
        self
    }
}

/// Insertion-ordered store of every star placed this session.
pub struct StarField {
    stars: Vec<Star>,
    index: HashMap<StarId, usize>,
    next_id: u64,
}

impl StarField {
    pub fn new() -> Self {
        Self {
            stars: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }

    /// Allocate a fresh id. Ids are handed out in order and never recycled.
    pub fn next_id(&mut self) -> StarId {
        let id = StarId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a star. A duplicate id is a programming error (the allocation
    /// scheme makes it impossible), so this asserts rather than returning.
    pub fn add(&mut self, star: Star) {
        assert!(
            !self.index.contains_key(&star.id),
            "duplicate star id {:?}",
            star.id
        );
        self.index.insert(star.id, self.stars.len());
        self.stars.push(star);
    }

    /// Replace a star's answer with the latest cumulative text. Unknown ids
    /// are tolerated silently — stream chunks may arrive after the session
    /// that spawned them has been reset.
    pub fn update_answer(&mut self, id: StarId, answer: &str) {
        if let Some(&i) = self.index.get(&id) {
            self.stars[i].answer.clear();
            self.stars[i].answer.push_str(answer);
        }
    }

    /// Set a star's topic, at most once. A star that already has a topic
    /// keeps it; unknown ids are ignored like [`update_answer`].
    ///
    /// [`update_answer`]: StarField::update_answer
    pub fn finalize_topic(&mut self, id: StarId, topic: &str) {
        if let Some(&i) = self.index.get(&id) {
            let star = &mut self.stars[i];
            debug_assert!(star.topic.is_none(), "topic finalized twice for {id:?}");
            if star.topic.is_none() {
                star.topic = Some(topic.to_string());
            }
        }
    }

    pub fn get(&self, id: StarId) -> Option<&Star> {
        self.index.get(&id).map(|&i| &self.stars[i])
    }

    /// All stars in insertion order.
    pub fn all(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(n: usize) -> StarField {
        let mut field = StarField::new();
        for i in 0..n {
            let id = field.next_id();
            field.add(Star::new(id, format!("question {i}"), Vec3::splat(i as f32)));
        }
        field
    }

    #[test]
    fn enumeration_preserves_insertion_order() {
        let field = field_with(5);
        let ids: Vec<u64> = field.all().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut field = StarField::new();
        let a = field.next_id();
        let b = field.next_id();
        assert_ne!(a, b);
        field.add(Star::new(b, "q", Vec3::ZERO));
        // Allocating after an out-of-order add still moves forward.
        let c = field.next_id();
        assert!(c > b && c > a);
    }

    #[test]
    #[should_panic(expected = "duplicate star id")]
    fn duplicate_id_insertion_panics() {
        let mut field = StarField::new();
        let id = field.next_id();
        field.add(Star::new(id, "first", Vec3::ZERO));
        field.add(Star::new(id, "second", Vec3::ONE));
    }

    #[test]
    fn cumulative_chunks_replace_rather_than_append() {
        let mut field = field_with(1);
        let id = field.all()[0].id;
        for chunk in ["Grav", "Gravity is", "Gravity is the force..."] {
            field.update_answer(id, chunk);
        }
        assert_eq!(field.get(id).unwrap().answer, "Gravity is the force...");
    }

    #[test]
    fn update_for_unknown_id_is_a_noop() {
        let mut field = field_with(2);
        field.update_answer(StarId(999), "late chunk");
        assert!(field.all().iter().all(|s| s.answer.is_empty()));
    }

    #[test]
    fn topic_finalizes_at_most_once() {
        let mut field = field_with(1);
        let id = field.all()[0].id;
        field.finalize_topic(id, "Science");
        assert_eq!(field.get(id).unwrap().topic.as_deref(), Some("Science"));
    }

    #[test]
    fn seeded_topic_survives_release_mode_refinalize() {
        let mut field = StarField::new();
        let id = field.next_id();
        field.add(Star::new(id, "q", Vec3::ZERO).with_topic("Art"));
        // debug_assert fires under cfg(debug_assertions); the release-path
        // contract is "first topic wins".
        if !cfg!(debug_assertions) {
            field.finalize_topic(id, "History");
        }
        assert_eq!(field.get(id).unwrap().topic.as_deref(), Some("Art"));
    }
}
