use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::Sender;

use super::{background::BackgroundFrames, script::SessionEvent};

/// Replays session events on their own thread, the way a capture device
/// would deliver them. Frames pick up the next background image on the way.
#[derive(Debug)]
pub struct SourceStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SourceStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Waits for every event to be handed off.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SourceStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// `frame_interval` paces frames like a live camera; `None` replays as fast
/// as the consumer accepts them.
pub fn start_script_source(
    events: Vec<SessionEvent>,
    background: Option<BackgroundFrames>,
    frame_interval: Option<Duration>,
    event_tx: Sender<SessionEvent>,
) -> SourceStream {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let total = events.len();
        let mut frame_index = 0usize;
        let mut sent = 0usize;

        for mut event in events {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }

            let frame_start = Instant::now();
            let is_frame = if let SessionEvent::Frame(observation) = &mut event {
                observation.video = background
                    .as_ref()
                    .and_then(|frames| frames.frame(frame_index));
                frame_index += 1;
                true
            } else {
                false
            };

            if event_tx.send(event).is_err() {
                log::warn!("event consumer went away after {sent} of {total} events");
                return;
            }
            sent += 1;

            if let (true, Some(interval)) = (is_frame, frame_interval) {
                if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }

        log::info!("event source finished: {sent} events, {frame_index} frames");
    });

    SourceStream {
        stop,
        handle: Some(handle),
    }
}
