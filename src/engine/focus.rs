// Session focus state: which star anchors the neighbor context, and which
// star the camera/answer panel is on.
//
// Anchor and viewing split so that navigating the related-star list keeps the
// connection lines rooted at the original selection.

use super::star::StarId;

/// What the session is currently doing. Drives which HUD pieces render and
/// whether the answer panel shows a streaming cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Streaming,
    Viewing,
}

/// Anchor/viewing pair.
///
/// Invariant: `anchor` is `None` exactly when `viewing` is `None`. The three
/// mutators below are the only way to change the pair, and each preserves it.
#[derive(Debug, Default)]
pub struct FocusState {
    anchor: Option<StarId>,
    viewing: Option<StarId>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit selection of a star in the scene: it becomes both the context
    /// root and the viewed star.
    pub fn select(&mut self, id: StarId) {
        self.anchor = Some(id);
        self.viewing = Some(id);
    }

    /// Navigate to a neighbor from the answer panel: only the viewed star
    /// moves, the anchor (and its connection lines) stays put. Ignored when
    /// no session is open, which keeps the pair invariant intact.
    pub fn drift(&mut self, id: StarId) {
        if self.anchor.is_some() {
            self.viewing = Some(id);
        }
    }

    /// Close the session: both halves clear together.
    pub fn clear(&mut self) {
        self.anchor = None;
        self.viewing = None;
    }

    pub fn anchor(&self) -> Option<StarId> {
        self.anchor
    }

    pub fn viewing(&self) -> Option<StarId> {
        self.viewing
    }

    pub fn is_open(&self) -> bool {
        self.viewing.is_some()
    }

    /// True when the user has navigated away from the anchor.
    pub fn is_drifted(&self) -> bool {
        match (self.anchor, self.viewing) {
            (Some(a), Some(v)) => a != v,
            _ => false,
        }
    }
}
