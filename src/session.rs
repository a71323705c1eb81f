use std::sync::Arc;

use crate::{
    config::{BrushConfig, SessionConfig},
    erase::EraseSource,
    gesture::{self, Gesture, INDEX_TIP},
    ledger::{HAND_SLOTS, LedgerOutcome, StrokeLedger},
    particles::ParticleSystem,
    types::{CanvasSize, Frame, Hand, HandObservation, Observation, ParticleShape, Point, Stroke},
};

#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSprite {
    pub position: Point,
    pub color: [u8; 4],
    pub shape: ParticleShape,
    pub opacity: f32,
}

/// The pointer eraser's on-screen ring. Drawn mirrored so it sits under the
/// pointer in the mirrored video, while erasing uses the raw position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EraserCursor {
    pub center: Point,
    pub radius: f32,
}

/// Everything the renderer needs for one frame, back to front.
#[derive(Clone, Debug)]
pub struct RenderList {
    pub canvas: CanvasSize,
    pub video: Option<Arc<Frame>>,
    /// Committed strokes first, then open hand buffers in slot order.
    pub strokes: Vec<Stroke>,
    pub particles: Vec<ParticleSprite>,
    pub eraser: Option<EraserCursor>,
}

/// What happened to one hand during a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandUpdate {
    pub hand: Hand,
    pub gesture: Gesture,
    pub outcome: LedgerOutcome,
}

/// All mutable drawing state for one canvas.
pub struct DrawingSession {
    config: SessionConfig,
    brush: BrushConfig,
    canvas: CanvasSize,
    ledger: StrokeLedger,
    particles: ParticleSystem,
    frames: u64,
}

impl DrawingSession {
    pub fn new(config: SessionConfig, brush: BrushConfig) -> Self {
        let particles = match config.seed {
            Some(seed) => ParticleSystem::with_seed(seed),
            None => ParticleSystem::new(),
        };

        Self {
            canvas: config.canvas,
            ledger: StrokeLedger::with_release_grace(config.release_grace_frames),
            particles,
            brush,
            config,
            frames: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushConfig {
        &mut self.brush
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        if canvas != self.canvas {
            log::debug!("canvas resized to {}x{}", canvas.width, canvas.height);
            self.canvas = canvas;
        }
    }

    pub fn ledger(&self) -> &StrokeLedger {
        &self.ledger
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Runs one frame: hand gestures, pointer erase, particle step, then the
    /// render list. `pointer` is the standing pointer-erase position, if any.
    pub fn process_frame(
        &mut self,
        observation: &Observation,
        pointer: Option<Point>,
    ) -> RenderList {
        if let Some(video) = &observation.video {
            self.set_canvas_size(video.size());
        }

        let updates = self.apply_hands(&observation.hands);
        for update in &updates {
            log::trace!(
                "frame {}: {:?} {} -> {:?}",
                self.frames,
                update.hand,
                update.gesture.label(),
                update.outcome
            );
        }

        if let Some(pointer) = pointer {
            let radius = self.config.erase_radius(EraseSource::Pointer);
            let removed = self.ledger.erase_committed(pointer, radius);
            if removed > 0 {
                log::trace!("pointer erased {removed} points at {pointer:?}");
            }
        }

        self.particles.advance();
        self.frames += 1;

        self.render_list(observation.video.clone(), pointer)
    }

    /// Classifies each observed hand and applies it to its slot. Slots with no
    /// hand this frame are treated as showing no gesture.
    pub fn apply_hands(&mut self, hands: &[HandObservation]) -> Vec<HandUpdate> {
        let mut seen = [false; HAND_SLOTS];
        let mut updates = Vec::with_capacity(HAND_SLOTS);

        for observation in hands {
            let Some(hand) = observation.handedness.hand() else {
                log::debug!(
                    "skipping hand with handedness {}",
                    observation.handedness.label()
                );
                continue;
            };
            seen[hand.index()] = true;

            let gesture = gesture::classify(Some(observation.landmarks.as_slice()));
            if gesture == Gesture::None
                && observation.landmarks.len() != gesture::NUM_LANDMARKS
            {
                log::warn!(
                    "{:?} hand has {} landmarks, expected {}",
                    hand,
                    observation.landmarks.len(),
                    gesture::NUM_LANDMARKS
                );
            }

            let tip = observation
                .landmarks
                .get(INDEX_TIP)
                .map(|p| self.canvas.project(*p))
                .unwrap_or_default();
            updates.push(self.dispatch(hand, gesture, tip));
        }

        for hand in Hand::ALL {
            if !seen[hand.index()] {
                updates.push(self.dispatch(hand, Gesture::None, Point::default()));
            }
        }

        updates
    }

    fn dispatch(&mut self, hand: Hand, gesture: Gesture, tip: Point) -> HandUpdate {
        let radius = self.config.erase_radius(EraseSource::Finger);
        let outcome = self.ledger.apply(hand, gesture, tip, &self.brush, radius);
        if let LedgerOutcome::Appended(point) = outcome {
            self.particles.spawn_burst(
                point,
                self.brush.color(),
                self.brush.shape(),
                &self.config.burst,
            );
        }
        HandUpdate {
            hand,
            gesture,
            outcome,
        }
    }

    /// Empties the drawing, both hand slots and all particles.
    pub fn clear_all(&mut self) {
        self.ledger.clear();
        self.particles.clear();
        log::debug!("canvas cleared");
    }

    pub fn render_list(&self, video: Option<Arc<Frame>>, pointer: Option<Point>) -> RenderList {
        let committed = self
            .ledger
            .strokes()
            .iter()
            .filter(|stroke| stroke.is_drawable())
            .cloned();
        let open = self
            .ledger
            .slots()
            .filter(|(_, slot)| slot.points().len() >= 2)
            .map(|(_, slot)| Stroke {
                points: slot.points().to_vec(),
                color: self.brush.color(),
                size: self.brush.size(),
            });

        let particles = self
            .particles
            .particles()
            .iter()
            .map(|p| ParticleSprite {
                position: p.position(),
                color: p.color,
                shape: p.shape,
                opacity: p.opacity(),
            })
            .collect();

        let eraser = pointer.map(|p| EraserCursor {
            center: Point::new(self.canvas.width as f32 - p.x, p.y),
            radius: self.config.erase_radius(EraseSource::Pointer),
        });

        RenderList {
            canvas: self.canvas,
            video,
            strokes: committed.chain(open).collect(),
            particles,
            eraser,
        }
    }
}
