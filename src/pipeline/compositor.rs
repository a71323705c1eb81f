use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::script::{BrushChange, SessionEvent};
use crate::{
    session::{DrawingSession, RenderList},
    types::Point,
};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct CompositedFrame {
    pub index: u64,
    pub render: RenderList,
}

/// Owns the session and applies events strictly in arrival order. Pointer
/// moves between frames leave a standing erase request that every following
/// frame applies until the pointer leaves.
pub struct EventLoop {
    session: DrawingSession,
    pointer: Option<Point>,
}

impl EventLoop {
    pub fn new(session: DrawingSession) -> Self {
        Self {
            session,
            pointer: None,
        }
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn into_session(self) -> DrawingSession {
        self.session
    }

    pub fn handle(&mut self, event: SessionEvent) -> Option<CompositedFrame> {
        match event {
            SessionEvent::Frame(observation) => {
                let index = self.session.frames_processed();
                let render = self.session.process_frame(&observation, self.pointer);
                return Some(CompositedFrame { index, render });
            }
            SessionEvent::PointerMove(point) => self.pointer = Some(point),
            SessionEvent::PointerLeave => self.pointer = None,
            SessionEvent::Brush(change) => {
                let brush = self.session.brush_mut();
                match change {
                    BrushChange::Color(color) => brush.set_color_rgba(color),
                    BrushChange::Size(size) => brush.set_size(size),
                    BrushChange::Shape(shape) => brush.set_shape(shape),
                }
            }
            SessionEvent::Resize(canvas) => self.session.set_canvas_size(canvas),
            SessionEvent::Clear => self.session.clear_all(),
        }
        None
    }
}

pub struct CompositorHandle {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<DrawingSession>>,
}

impl CompositorHandle {
    /// Waits for the input channel to drain and hands back the session.
    pub fn join(mut self) -> Option<DrawingSession> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(session) => Some(session),
            Err(_) => {
                log::error!("frame compositor thread panicked");
                None
            }
        }
    }

    pub fn stop(mut self) -> Option<DrawingSession> {
        self.stop.store(true, Ordering::SeqCst);
        let handle = self.handle.take()?;
        handle.join().ok()
    }
}

impl Drop for CompositorHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn start_frame_compositor(
    session: DrawingSession,
    event_rx: Receiver<SessionEvent>,
    frame_tx: Sender<CompositedFrame>,
) -> CompositorHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        log::info!("frame compositor started");
        let mut event_loop = EventLoop::new(session);
        run_compositor_loop(&mut event_loop, &event_rx, &frame_tx, &stop_flag);
        log::info!(
            "frame compositor stopped after {} frames",
            event_loop.session().frames_processed()
        );
        event_loop.into_session()
    });

    CompositorHandle {
        stop,
        handle: Some(handle),
    }
}

fn run_compositor_loop(
    event_loop: &mut EventLoop,
    event_rx: &Receiver<SessionEvent>,
    frame_tx: &Sender<CompositedFrame>,
    stop: &AtomicBool,
) {
    let mut renderer_attached = true;

    while !stop.load(Ordering::Relaxed) {
        let event = match event_rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let Some(frame) = event_loop.handle(event) else {
            continue;
        };
        // Keep drawing without a renderer so state stays consistent.
        if renderer_attached && frame_tx.send(frame).is_err() {
            log::warn!("renderer went away; continuing without output");
            renderer_attached = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BrushConfig, SessionConfig},
        gesture::{Gesture, synthetic_landmarks},
        types::{CanvasSize, HandObservation, Handedness, Observation, ParticleShape},
    };
    use crossbeam_channel::{bounded, unbounded};

    fn session() -> DrawingSession {
        let config = SessionConfig {
            canvas: CanvasSize::new(256, 256),
            seed: Some(2),
            ..SessionConfig::default()
        };
        DrawingSession::new(config, BrushConfig::default())
    }

    fn right(gesture: Gesture, x: f32, y: f32) -> SessionEvent {
        SessionEvent::Frame(Observation {
            video: None,
            hands: vec![HandObservation {
                landmarks: synthetic_landmarks(gesture, Point::new(x / 256.0, y / 256.0)),
                handedness: Handedness::Right,
            }],
        })
    }

    #[test]
    fn pointer_request_stands_until_leave() {
        let mut event_loop = EventLoop::new(session());
        for event in [
            right(Gesture::Draw, 16.0, 16.0),
            right(Gesture::Draw, 200.0, 200.0),
            right(Gesture::Fist, 0.0, 0.0),
        ] {
            event_loop.handle(event);
        }
        assert_eq!(event_loop.session().ledger().strokes()[0].points.len(), 2);

        event_loop.handle(SessionEvent::PointerMove(Point::new(16.0, 16.0)));
        let frame = event_loop.handle(SessionEvent::Frame(Observation::default())).unwrap();
        assert!(frame.render.eraser.is_some());
        assert_eq!(
            event_loop.session().ledger().strokes()[0].points,
            vec![Point::new(200.0, 200.0)]
        );

        // A stroke committed under a resting pointer goes in the same frame.
        for event in [right(Gesture::Draw, 20.0, 20.0), right(Gesture::Fist, 0.0, 0.0)] {
            event_loop.handle(event);
        }
        event_loop.handle(SessionEvent::Frame(Observation::default()));
        assert_eq!(event_loop.session().ledger().strokes().len(), 1);

        event_loop.handle(SessionEvent::PointerLeave);
        let frame = event_loop.handle(SessionEvent::Frame(Observation::default())).unwrap();
        assert!(frame.render.eraser.is_none());
    }

    #[test]
    fn brush_changes_apply_between_frames() {
        let mut event_loop = EventLoop::new(session());
        event_loop.handle(SessionEvent::Brush(BrushChange::Color([1, 2, 3, 255])));
        event_loop.handle(SessionEvent::Brush(BrushChange::Size(11.0)));
        event_loop.handle(SessionEvent::Brush(BrushChange::Shape(ParticleShape::Heart)));
        event_loop.handle(right(Gesture::Draw, 50.0, 50.0));

        let particles = event_loop.session().particles().particles();
        assert!(!particles.is_empty());
        assert!(particles.iter().all(|p| p.color == [1, 2, 3, 255]));
        assert!(particles.iter().all(|p| p.shape == ParticleShape::Heart));
        assert_eq!(event_loop.session().brush().size(), 11.0);
    }

    #[test]
    fn frame_indices_count_frames_only() {
        let mut event_loop = EventLoop::new(session());
        assert!(event_loop.handle(SessionEvent::Clear).is_none());
        let first = event_loop.handle(SessionEvent::Frame(Observation::default())).unwrap();
        assert!(event_loop.handle(SessionEvent::Resize(CanvasSize::new(64, 64))).is_none());
        let second = event_loop.handle(SessionEvent::Frame(Observation::default())).unwrap();
        assert_eq!((first.index, second.index), (0, 1));
        assert_eq!(second.render.canvas, CanvasSize::new(64, 64));
    }

    #[test]
    fn threaded_compositor_preserves_order() {
        let (event_tx, event_rx) = unbounded();
        let (frame_tx, frame_rx) = unbounded();
        let compositor = start_frame_compositor(session(), event_rx, frame_tx);

        for x in [10.0, 20.0, 30.0] {
            event_tx.send(right(Gesture::Draw, x, 10.0)).unwrap();
        }
        event_tx.send(right(Gesture::Fist, 0.0, 0.0)).unwrap();
        drop(event_tx);

        let indices: Vec<u64> = frame_rx.iter().map(|frame| frame.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let session = compositor.join().unwrap();
        assert_eq!(
            session.ledger().strokes()[0].points,
            vec![
                Point::new(10.0, 10.0),
                Point::new(20.0, 10.0),
                Point::new(30.0, 10.0)
            ]
        );
    }

    #[test]
    fn keeps_running_without_a_renderer() {
        let (event_tx, event_rx) = unbounded();
        let (frame_tx, frame_rx) = bounded(1);
        drop(frame_rx);
        let compositor = start_frame_compositor(session(), event_rx, frame_tx);

        event_tx.send(right(Gesture::Draw, 10.0, 10.0)).unwrap();
        event_tx.send(right(Gesture::Fist, 0.0, 0.0)).unwrap();
        drop(event_tx);

        let session = compositor.join().unwrap();
        assert_eq!(session.ledger().strokes().len(), 1);
    }
}
