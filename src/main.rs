use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, bounded};
use gesture_canvas::{
    BrushConfig, DrawingSession, SessionConfig,
    config::DEFAULT_CANVAS,
    pipeline::{
        BackgroundFrames, CompositedFrame, parse_script, rasterize, start_frame_compositor,
        start_script_source,
    },
    types::CanvasSize,
};

const USAGE: &str = "usage: gesture-canvas SCRIPT [--background PATH] [--out DIR] [--every N] \
                     [--seed N] [--fps N] [--grace N] [--size WxH]";

const EVENT_QUEUE: usize = 64;
const FRAME_QUEUE: usize = 4;

#[derive(Debug, PartialEq)]
struct CliOptions {
    script: PathBuf,
    background: Option<PathBuf>,
    out_dir: PathBuf,
    every: u64,
    seed: Option<u64>,
    fps: Option<f32>,
    grace: u32,
    size: Option<CanvasSize>,
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut script = None;
    let mut options = CliOptions {
        script: PathBuf::new(),
        background: None,
        out_dir: PathBuf::from("frames"),
        every: 1,
        seed: None,
        fps: None,
        grace: 0,
        size: None,
    };

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} needs a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--background" => options.background = Some(PathBuf::from(value("--background")?)),
            "--out" => options.out_dir = PathBuf::from(value("--out")?),
            "--every" => {
                let every: u64 = parse_flag("--every", &value("--every")?)?;
                if every == 0 {
                    bail!("--every must be at least 1");
                }
                options.every = every;
            }
            "--seed" => options.seed = Some(parse_flag("--seed", &value("--seed")?)?),
            "--fps" => {
                let fps: f32 = parse_flag("--fps", &value("--fps")?)?;
                if !(fps.is_finite() && fps > 0.0) {
                    bail!("--fps must be a positive number");
                }
                options.fps = Some(fps);
            }
            "--grace" => options.grace = parse_flag("--grace", &value("--grace")?)?,
            "--size" => options.size = Some(parse_size(&value("--size")?)?),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            path => {
                if script.is_some() {
                    bail!("only one script may be given\n{USAGE}");
                }
                script = Some(PathBuf::from(path));
            }
        }
    }

    options.script = script.with_context(|| format!("missing script path\n{USAGE}"))?;
    Ok(options)
}

fn parse_flag<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid value {value:?} for {flag}"))
}

fn parse_size(value: &str) -> Result<CanvasSize> {
    let (w, h) = value
        .split_once('x')
        .with_context(|| format!("--size expects WIDTHxHEIGHT, got {value:?}"))?;
    let width: u32 = parse_flag("--size", w)?;
    let height: u32 = parse_flag("--size", h)?;
    if width == 0 || height == 0 {
        bail!("--size dimensions must be non-zero");
    }
    Ok(CanvasSize::new(width, height))
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args(std::env::args().skip(1))?;
    run(&options)
}

fn run(options: &CliOptions) -> Result<()> {
    let source = fs::read_to_string(&options.script)
        .with_context(|| format!("failed to read script {}", options.script.display()))?;
    let events = parse_script(&source)
        .with_context(|| format!("failed to parse script {}", options.script.display()))?;
    let background = options
        .background
        .as_deref()
        .map(BackgroundFrames::load)
        .transpose()?;
    fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("failed to create {}", options.out_dir.display()))?;

    log::info!(
        "replaying {} events from {}",
        events.len(),
        options.script.display()
    );

    let config = SessionConfig {
        canvas: options.size.unwrap_or(DEFAULT_CANVAS),
        release_grace_frames: options.grace,
        seed: options.seed,
        ..SessionConfig::default()
    };
    let session = DrawingSession::new(config, BrushConfig::default());

    let (event_tx, event_rx) = bounded(EVENT_QUEUE);
    let (frame_tx, frame_rx) = bounded(FRAME_QUEUE);
    let compositor = start_frame_compositor(session, event_rx, frame_tx);
    let frame_interval = options.fps.map(|fps| Duration::from_secs_f32(1.0 / fps));
    let source = start_script_source(events, background, frame_interval, event_tx);

    // A failed write drops the receiver, which lets the compositor finish
    // without a renderer before the threads are joined.
    let written = write_frames(frame_rx, &options.out_dir, options.every);

    source.join();
    let session = compositor.join();
    let written = written?;
    let session = session.context("frame compositor stopped unexpectedly")?;

    log::info!(
        "wrote {written} frames to {} ({} processed, {} strokes committed)",
        options.out_dir.display(),
        session.frames_processed(),
        session.ledger().strokes().len()
    );
    Ok(())
}

fn write_frames(frame_rx: Receiver<CompositedFrame>, dir: &Path, every: u64) -> Result<usize> {
    let mut written = 0usize;
    let mut pending = None;
    for frame in frame_rx.iter() {
        if frame.index % every == 0 {
            write_frame(dir, &frame)?;
            written += 1;
            pending = None;
        } else {
            pending = Some(frame);
        }
    }
    // The final frame is always kept.
    if let Some(frame) = pending {
        write_frame(dir, &frame)?;
        written += 1;
    }
    Ok(written)
}

fn write_frame(dir: &Path, frame: &CompositedFrame) -> Result<()> {
    let path = dir.join(format!("frame_{:05}.png", frame.index));
    rasterize(&frame.render)
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::trace!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn defaults_apply_when_only_a_script_is_given() {
        let options = parse_args(args("demo.gcs")).unwrap();
        assert_eq!(options.script, PathBuf::from("demo.gcs"));
        assert_eq!(options.out_dir, PathBuf::from("frames"));
        assert_eq!(options.every, 1);
        assert_eq!(options.grace, 0);
        assert!(options.background.is_none());
        assert!(options.seed.is_none());
        assert!(options.fps.is_none());
        assert!(options.size.is_none());
    }

    #[test]
    fn flags_are_parsed() {
        let options = parse_args(args(
            "--out out --every 3 demo.gcs --seed 7 --fps 30 --grace 2 --size 320x240 --background bg.png",
        ))
        .unwrap();
        assert_eq!(options.script, PathBuf::from("demo.gcs"));
        assert_eq!(options.out_dir, PathBuf::from("out"));
        assert_eq!(options.every, 3);
        assert_eq!(options.seed, Some(7));
        assert_eq!(options.fps, Some(30.0));
        assert_eq!(options.grace, 2);
        assert_eq!(options.size, Some(CanvasSize::new(320, 240)));
        assert_eq!(options.background, Some(PathBuf::from("bg.png")));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse_args(args("")).is_err());
        assert!(parse_args(args("a.gcs b.gcs")).is_err());
        assert!(parse_args(args("a.gcs --every 0")).is_err());
        assert!(parse_args(args("a.gcs --every")).is_err());
        assert!(parse_args(args("a.gcs --fps -1")).is_err());
        assert!(parse_args(args("a.gcs --size 640")).is_err());
        assert!(parse_args(args("a.gcs --size 0x480")).is_err());
        assert!(parse_args(args("a.gcs --verbose")).is_err());
    }

    #[test]
    fn write_failure_is_reported_instead_of_hanging() {
        let root = std::env::temp_dir().join(format!("gesture-canvas-run-{}", std::process::id()));
        let out_dir = root.join("out");
        // A directory where the first frame should go makes its write fail.
        fs::create_dir_all(out_dir.join("frame_00000.png")).unwrap();

        let script = root.join("long.gcs");
        let mut text = String::from("size 64 48\n");
        for _ in 0..(EVENT_QUEUE + FRAME_QUEUE) * 3 {
            text.push_str("frame\n");
        }
        fs::write(&script, text).unwrap();

        let options = CliOptions {
            script,
            background: None,
            out_dir,
            every: 1,
            seed: Some(1),
            fps: None,
            grace: 0,
            size: None,
        };
        let err = run(&options).unwrap_err();
        fs::remove_dir_all(&root).unwrap();

        assert!(format!("{err:#}").contains("frame_00000.png"), "{err:#}");
    }
}
