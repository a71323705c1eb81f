//! Per-hand stroke buffers and the committed stroke collection.
//!
//! Each hand owns one slot. A slot goes `Idle -> Active` on its first drawn
//! point and back to `Idle` when the stroke is committed or the ledger is
//! cleared. Erasing shrinks buffers but never changes a slot's state.

use std::mem;

use crate::{
    config::BrushConfig,
    erase::{erase, erase_strokes},
    gesture::Gesture,
    types::{Hand, Point, Stroke},
};

pub const HAND_SLOTS: usize = Hand::ALL.len();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Active,
}

#[derive(Clone, Debug, Default)]
pub struct HandSlot {
    buffer: Vec<Point>,
    active: bool,
    /// Consecutive `None` gestures seen while active.
    idle_frames: u32,
}

impl HandSlot {
    pub fn points(&self) -> &[Point] {
        &self.buffer
    }

    pub fn state(&self) -> SlotState {
        if self.active {
            SlotState::Active
        } else {
            SlotState::Idle
        }
    }

    fn reset(&mut self) -> Vec<Point> {
        self.active = false;
        self.idle_frames = 0;
        mem::take(&mut self.buffer)
    }
}

/// What a gesture did to the ledger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LedgerOutcome {
    Appended(Point),
    Erased { removed: usize },
    Committed { index: usize, points: usize },
    /// An open stroke is waiting out the release grace period.
    Holding { idle_frames: u32 },
    Unchanged,
}

#[derive(Clone, Debug, Default)]
pub struct StrokeLedger {
    slots: [HandSlot; HAND_SLOTS],
    strokes: Vec<Stroke>,
    release_grace_frames: u32,
}

impl StrokeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release_grace(frames: u32) -> Self {
        Self {
            release_grace_frames: frames,
            ..Self::default()
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn slot(&self, hand: Hand) -> &HandSlot {
        &self.slots[hand.index()]
    }

    pub fn slots(&self) -> impl Iterator<Item = (Hand, &HandSlot)> {
        Hand::ALL.into_iter().zip(self.slots.iter())
    }

    /// Applies one hand's gesture for this frame.
    ///
    /// `tip` is the index fingertip in canvas pixels. It is only read for
    /// `Draw` and `Erase`.
    pub fn apply(
        &mut self,
        hand: Hand,
        gesture: Gesture,
        tip: Point,
        brush: &BrushConfig,
        erase_radius: f32,
    ) -> LedgerOutcome {
        match gesture {
            Gesture::Draw => {
                let slot = &mut self.slots[hand.index()];
                slot.buffer.push(tip);
                slot.active = true;
                slot.idle_frames = 0;
                LedgerOutcome::Appended(tip)
            }
            Gesture::Erase => {
                let mut removed = erase_strokes(&mut self.strokes, tip, erase_radius);
                let slot = &mut self.slots[hand.index()];
                let kept = erase(&slot.buffer, tip, erase_radius);
                removed += slot.buffer.len() - kept.len();
                slot.buffer = kept;
                slot.idle_frames = 0;
                LedgerOutcome::Erased { removed }
            }
            Gesture::Fist => self.commit(hand, brush),
            Gesture::None => self.release(hand, brush),
        }
    }

    /// Moves the slot's buffer into the stroke collection if it holds any
    /// points. The slot is idle afterwards either way.
    pub fn commit(&mut self, hand: Hand, brush: &BrushConfig) -> LedgerOutcome {
        let points = self.slots[hand.index()].reset();
        if points.is_empty() {
            return LedgerOutcome::Unchanged;
        }

        let count = points.len();
        self.strokes.push(Stroke {
            points,
            color: brush.color(),
            size: brush.size(),
        });
        let index = self.strokes.len() - 1;
        log::debug!(
            "committed {count}-point stroke #{index} from {:?} hand",
            hand
        );
        LedgerOutcome::Committed {
            index,
            points: count,
        }
    }

    fn release(&mut self, hand: Hand, brush: &BrushConfig) -> LedgerOutcome {
        let grace = self.release_grace_frames;
        let slot = &mut self.slots[hand.index()];
        if !slot.active {
            return LedgerOutcome::Unchanged;
        }
        if slot.idle_frames < grace {
            slot.idle_frames += 1;
            return LedgerOutcome::Holding {
                idle_frames: slot.idle_frames,
            };
        }
        self.commit(hand, brush)
    }

    /// Erases around `center` in committed strokes only.
    pub fn erase_committed(&mut self, center: Point, radius: f32) -> usize {
        erase_strokes(&mut self.strokes, center, radius)
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        for slot in &mut self.slots {
            slot.reset();
        }
    }
}
