//! Card flip state machine
//!
//! A flip is two half-rotations. The displayed content is swapped at the rib,
//! the edge-on midpoint where the card has no visible face, so a mirrored or
//! stale image never shows during the rotation.
//!
//! The half-rotations end on `segment_complete`, raised by the renderer when
//! its transition finishes. With `auto_segments` the card raises it itself from
//! `advance` after half the flip duration.

use serde::{Deserialize, Serialize};

use crate::consts::{FLIP_DURATION_MS, REVERSE_IMAGE};
use crate::settings::Settings;

/// Which side of the card is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Face,
    Reverse,
}

/// Direction of a flip in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlipDirection {
    ToFace,
    ToReverse,
}

impl FlipDirection {
    /// Side shown once the flip settles
    pub fn target(self) -> Side {
        match self {
            FlipDirection::ToFace => Side::Face,
            FlipDirection::ToReverse => Side::Reverse,
        }
    }
}

/// Per-card animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipState {
    Hidden,
    /// First half-rotation, from flat to edge-on
    FlippingToRib(FlipDirection),
    /// Edge-on, lingering for the rib dwell
    AtRib(FlipDirection),
    /// Second half-rotation, from edge-on to flat
    FlippingToFinal(FlipDirection),
    Revealed,
}

impl FlipState {
    pub fn is_flipping(self) -> bool {
        matches!(
            self,
            FlipState::FlippingToRib(_) | FlipState::AtRib(_) | FlipState::FlippingToFinal(_)
        )
    }

    pub fn direction(self) -> Option<FlipDirection> {
        match self {
            FlipState::FlippingToRib(d) | FlipState::AtRib(d) | FlipState::FlippingToFinal(d) => {
                Some(d)
            }
            FlipState::Hidden | FlipState::Revealed => None,
        }
    }
}

/// Notifications raised by a card, in the order they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipEvent {
    FlipStart(FlipDirection),
    Rib(FlipDirection),
    FlipEnd(Side),
    Face,
    Reverse,
    Highlight(bool),
}

/// Per-card appearance and timing
#[derive(Debug, Clone, PartialEq)]
pub struct FlipOptions {
    pub face_image: String,
    pub back_image: String,
    pub face_bg: String,
    pub back_bg: String,
    /// Full flip, both halves
    pub duration_ms: u64,
    pub dwell_at_rib_ms: u64,
    /// Commands are ignored for this long after a flip settles
    pub post_flip_pause_ms: u64,
    /// Keep the back image readable by mirroring it while shown
    pub mirror_back: bool,
    /// Settle every flip synchronously
    pub reduced_motion: bool,
    /// Raise `segment_complete` internally after each half-rotation
    pub auto_segments: bool,
}

impl Default for FlipOptions {
    fn default() -> Self {
        Self {
            face_image: "assets/img/cards/0.png".to_string(),
            back_image: REVERSE_IMAGE.to_string(),
            face_bg: "#000000".to_string(),
            back_bg: "#000000".to_string(),
            duration_ms: FLIP_DURATION_MS,
            dwell_at_rib_ms: 0,
            post_flip_pause_ms: 0,
            mirror_back: true,
            reduced_motion: false,
            auto_segments: false,
        }
    }
}

impl FlipOptions {
    /// Options for a card showing `face_image`, styled by the settings
    pub fn from_settings(settings: &Settings, face_image: &str) -> Self {
        let card = &settings.card;
        Self {
            face_image: face_image.to_string(),
            back_image: card.back_image.clone(),
            face_bg: card.face_bg.clone(),
            back_bg: card.back_bg.clone(),
            duration_ms: card.duration_ms,
            dwell_at_rib_ms: card.dwell_at_rib_ms,
            post_flip_pause_ms: card.post_flip_pause_ms,
            mirror_back: card.mirror_back,
            reduced_motion: settings.reduced_motion,
            auto_segments: card.auto_segments,
        }
    }

    fn half_ms(&self) -> u64 {
        self.duration_ms / 2
    }
}

/// What the renderer should currently draw on the card plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceContent<'a> {
    pub side: Side,
    pub image: &'a str,
    pub background: &'a str,
    pub mirrored: bool,
}

/// A single card's flip animator
#[derive(Debug, Clone)]
pub struct FlipCard {
    options: FlipOptions,
    state: FlipState,
    /// Content on the plane; changes only at the rib
    shown: Side,
    highlighted: bool,
    locked: bool,
    /// End of the post-flip cooldown
    available_at: u64,
    segment_started_at: u64,
    rib_until: u64,
    events: Vec<FlipEvent>,
}

impl FlipCard {
    /// Create a face-down card
    pub fn new(options: FlipOptions) -> Self {
        Self {
            options,
            state: FlipState::Hidden,
            shown: Side::Reverse,
            highlighted: false,
            locked: false,
            available_at: 0,
            segment_started_at: 0,
            rib_until: 0,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> FlipState {
        self.state
    }

    pub fn options(&self) -> &FlipOptions {
        &self.options
    }

    pub fn is_face(&self) -> bool {
        self.state == FlipState::Revealed
    }

    pub fn is_flipping(&self) -> bool {
        self.state.is_flipping()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Earliest time a new command is accepted
    pub fn available_at(&self) -> u64 {
        self.available_at
    }

    /// True when a command issued at `now` would be accepted for some direction
    pub fn is_settled(&self, now: u64) -> bool {
        !self.is_blocked(now)
    }

    fn is_blocked(&self, now: u64) -> bool {
        self.locked || self.is_flipping() || now < self.available_at
    }

    /// Start turning the face up. Returns false if the command was ignored.
    pub fn flip_to_face(&mut self, now: u64) -> bool {
        if self.is_blocked(now) || self.state == FlipState::Revealed {
            return false;
        }
        self.begin(FlipDirection::ToFace, now);
        true
    }

    /// Start turning the face down. Returns false if the command was ignored.
    pub fn flip_to_reverse(&mut self, now: u64) -> bool {
        if self.is_blocked(now) || self.state == FlipState::Hidden {
            return false;
        }
        self.begin(FlipDirection::ToReverse, now);
        true
    }

    pub fn toggle(&mut self, now: u64) -> bool {
        if self.is_face() {
            self.flip_to_reverse(now)
        } else {
            self.flip_to_face(now)
        }
    }

    /// A half-rotation finished
    pub fn segment_complete(&mut self, now: u64) {
        match self.state {
            FlipState::FlippingToRib(dir) => self.reach_rib(dir, now),
            FlipState::FlippingToFinal(dir) => self.finish(dir, now),
            // Stray transition end
            FlipState::Hidden | FlipState::Revealed | FlipState::AtRib(_) => {}
        }
    }

    /// Move time-driven transitions forward: rib dwell and auto segments
    pub fn advance(&mut self, now: u64) {
        loop {
            let segment_end = self.segment_started_at.saturating_add(self.options.half_ms());
            match self.state {
                FlipState::AtRib(dir) if now >= self.rib_until => {
                    self.state = FlipState::FlippingToFinal(dir);
                    self.segment_started_at = self.rib_until;
                }
                FlipState::FlippingToRib(_) | FlipState::FlippingToFinal(_)
                    if self.options.auto_segments && now >= segment_end =>
                {
                    self.segment_complete(segment_end);
                }
                _ => break,
            }
        }
    }

    /// Disable the card for good (matched). A flip in flight still settles.
    pub fn lock(&mut self) {
        self.locked = true;
        self.set_highlight(false);
    }

    pub fn set_highlight(&mut self, enabled: bool) {
        if self.highlighted != enabled {
            self.highlighted = enabled;
            self.events.push(FlipEvent::Highlight(enabled));
        }
    }

    /// Content currently on the card plane
    pub fn displayed(&self) -> FaceContent<'_> {
        match self.shown {
            Side::Face => FaceContent {
                side: Side::Face,
                image: &self.options.face_image,
                background: &self.options.face_bg,
                mirrored: false,
            },
            Side::Reverse => FaceContent {
                side: Side::Reverse,
                image: &self.options.back_image,
                background: &self.options.back_bg,
                mirrored: self.options.mirror_back,
            },
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<FlipEvent> {
        std::mem::take(&mut self.events)
    }

    fn begin(&mut self, dir: FlipDirection, now: u64) {
        self.events.push(FlipEvent::FlipStart(dir));
        if dir == FlipDirection::ToFace {
            self.set_highlight(true);
        }
        self.state = FlipState::FlippingToRib(dir);
        self.segment_started_at = now;

        if self.options.reduced_motion {
            self.reach_rib(dir, now);
            self.finish(dir, now);
        }
    }

    fn reach_rib(&mut self, dir: FlipDirection, now: u64) {
        self.shown = dir.target();
        self.events.push(FlipEvent::Rib(dir));

        let dwell = if self.options.reduced_motion {
            0
        } else {
            self.options.dwell_at_rib_ms
        };
        if dwell == 0 {
            self.state = FlipState::FlippingToFinal(dir);
            self.segment_started_at = now;
        } else {
            self.state = FlipState::AtRib(dir);
            self.rib_until = now.saturating_add(dwell);
        }
    }

    fn finish(&mut self, dir: FlipDirection, now: u64) {
        let side = dir.target();
        self.state = match side {
            Side::Face => FlipState::Revealed,
            Side::Reverse => FlipState::Hidden,
        };
        if side == Side::Reverse {
            self.set_highlight(false);
        }
        self.events.push(FlipEvent::FlipEnd(side));
        self.events.push(match side {
            Side::Face => FlipEvent::Face,
            Side::Reverse => FlipEvent::Reverse,
        });
        self.available_at = now.saturating_add(self.options.post_flip_pause_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> FlipCard {
        FlipCard::new(FlipOptions::default())
    }

    /// Drive both half-rotations to completion
    fn settle(card: &mut FlipCard, now: u64) {
        card.segment_complete(now);
        card.advance(now);
        card.segment_complete(now);
    }

    #[test]
    fn test_flip_to_face_sequence() {
        let mut c = card();
        assert!(c.flip_to_face(0));
        assert_eq!(c.state(), FlipState::FlippingToRib(FlipDirection::ToFace));
        // Content not swapped before the rib
        assert_eq!(c.displayed().side, Side::Reverse);

        c.segment_complete(300);
        assert_eq!(c.displayed().side, Side::Face);
        assert_eq!(c.state(), FlipState::FlippingToFinal(FlipDirection::ToFace));

        c.segment_complete(600);
        assert_eq!(c.state(), FlipState::Revealed);
        assert_eq!(
            c.drain_events(),
            vec![
                FlipEvent::FlipStart(FlipDirection::ToFace),
                FlipEvent::Highlight(true),
                FlipEvent::Rib(FlipDirection::ToFace),
                FlipEvent::FlipEnd(Side::Face),
                FlipEvent::Face,
            ]
        );
    }

    #[test]
    fn test_noop_commands() {
        let mut c = card();
        assert!(!c.flip_to_reverse(0));
        assert!(c.drain_events().is_empty());

        c.flip_to_face(0);
        settle(&mut c, 600);
        c.drain_events();
        assert!(!c.flip_to_face(1000));
        assert!(c.drain_events().is_empty());
        assert_eq!(c.state(), FlipState::Revealed);
    }

    #[test]
    fn test_mid_flip_command_ignored() {
        let mut c = card();
        c.flip_to_face(0);
        assert!(!c.flip_to_reverse(10));
        assert!(!c.toggle(20));
        assert_eq!(c.state().direction(), Some(FlipDirection::ToFace));

        c.segment_complete(300);
        assert!(!c.flip_to_reverse(310));
        assert_eq!(c.state(), FlipState::FlippingToFinal(FlipDirection::ToFace));
    }

    #[test]
    fn test_rib_dwell() {
        let mut c = FlipCard::new(FlipOptions {
            dwell_at_rib_ms: 140,
            ..Default::default()
        });
        c.flip_to_face(0);
        c.segment_complete(300);
        assert_eq!(c.state(), FlipState::AtRib(FlipDirection::ToFace));
        // A stray segment signal during the dwell does nothing
        c.segment_complete(350);
        assert_eq!(c.state(), FlipState::AtRib(FlipDirection::ToFace));

        c.advance(439);
        assert_eq!(c.state(), FlipState::AtRib(FlipDirection::ToFace));
        c.advance(440);
        assert_eq!(c.state(), FlipState::FlippingToFinal(FlipDirection::ToFace));
    }

    #[test]
    fn test_cooldown_blocks_commands() {
        let mut c = FlipCard::new(FlipOptions {
            post_flip_pause_ms: 200,
            ..Default::default()
        });
        c.flip_to_face(0);
        settle(&mut c, 600);
        assert_eq!(c.available_at(), 800);
        assert!(!c.flip_to_reverse(799));
        assert!(c.flip_to_reverse(800));
    }

    #[test]
    fn test_reduced_motion_same_events() {
        let mut animated = card();
        animated.flip_to_face(0);
        settle(&mut animated, 600);
        animated.flip_to_reverse(600);
        settle(&mut animated, 1200);

        let mut reduced = FlipCard::new(FlipOptions {
            reduced_motion: true,
            ..Default::default()
        });
        reduced.flip_to_face(0);
        assert_eq!(reduced.state(), FlipState::Revealed);
        reduced.flip_to_reverse(0);
        assert_eq!(reduced.state(), FlipState::Hidden);

        assert_eq!(animated.drain_events(), reduced.drain_events());
    }

    #[test]
    fn test_auto_segments() {
        let mut c = FlipCard::new(FlipOptions {
            auto_segments: true,
            post_flip_pause_ms: 50,
            ..Default::default()
        });
        c.flip_to_face(1000);
        c.advance(1299);
        assert_eq!(c.state(), FlipState::FlippingToRib(FlipDirection::ToFace));
        c.advance(1300);
        assert_eq!(c.state(), FlipState::FlippingToFinal(FlipDirection::ToFace));

        // A late tick settles at the segment's own end time
        c.advance(5000);
        assert_eq!(c.state(), FlipState::Revealed);
        assert_eq!(c.available_at(), 1650);
    }

    #[test]
    fn test_huge_timings_do_not_overflow() {
        let mut c = FlipCard::new(FlipOptions {
            duration_ms: u64::MAX,
            dwell_at_rib_ms: u64::MAX,
            post_flip_pause_ms: u64::MAX,
            auto_segments: true,
            ..Default::default()
        });
        c.flip_to_face(10);
        c.advance(u64::MAX / 2);
        assert_eq!(c.state(), FlipState::FlippingToRib(FlipDirection::ToFace));

        // Rib reached; the dwell end clamps to the end of time
        c.advance(u64::MAX - 1);
        assert_eq!(c.state(), FlipState::AtRib(FlipDirection::ToFace));

        c.advance(u64::MAX);
        assert_eq!(c.state(), FlipState::Revealed);
        assert_eq!(c.available_at(), u64::MAX);
        assert!(!c.flip_to_reverse(u64::MAX - 1));
    }

    #[test]
    fn test_locked_card_finishes_but_rejects() {
        let mut c = card();
        c.flip_to_face(0);
        c.lock();
        assert!(!c.is_highlighted());
        settle(&mut c, 600);
        assert_eq!(c.state(), FlipState::Revealed);
        assert!(!c.flip_to_reverse(10_000));
    }

    #[test]
    fn test_mirrored_back() {
        let c = card();
        let shown = c.displayed();
        assert_eq!(shown.image, REVERSE_IMAGE);
        assert!(shown.mirrored);

        let plain = FlipCard::new(FlipOptions {
            mirror_back: false,
            ..Default::default()
        });
        assert!(!plain.displayed().mirrored);
    }
}
