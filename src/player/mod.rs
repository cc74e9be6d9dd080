// The real transport collaborator: a cpal output stream whose callback owns
// the Engine, plus a loader thread that decodes WAVs off the event loop.
// The handle merges loader results and engine events into TransportEvents so
// the coordinator sees one collaborator, not two threads.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::shared::TrackId;
use crate::transport::{Transport, TransportEvent};

mod buffer;
mod engine;

pub use buffer::{StereoFrame, TrackBuffer};

use engine::{Engine, EngineCommand, EngineEvent};

struct LoadRequest {
    track: TrackId,
    path: PathBuf,
}

struct LoadResult {
    track: TrackId,
    result: Result<TrackBuffer, String>,
}

pub struct Player {
    cmd_tx: Sender<EngineCommand>,
    event_rx: Receiver<EngineEvent>,
    load_tx: Sender<LoadRequest>,
    loaded_rx: Receiver<LoadResult>,
    current: Option<TrackId>,
    _output_stream: cpal::Stream,
}

pub fn start_player() -> anyhow::Result<Player> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    ensure_stereo(channels)?;

    let (cmd_tx, cmd_rx) = crossbeam_channel::bounded::<EngineCommand>(64);
    let (event_tx, event_rx) = crossbeam_channel::bounded::<EngineEvent>(256);

    let output_stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_output_stream_f32(
            &device,
            &config.into(),
            cmd_rx,
            event_tx,
            channels,
        )?,
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 for now)"),
    };
    output_stream.play().context("failed to play output stream")?;

    let (load_tx, loaded_rx) = start_loader(sample_rate);

    log::info!("player started at {sample_rate} Hz, {channels} channels");

    Ok(Player {
        cmd_tx,
        event_rx,
        load_tx,
        loaded_rx,
        current: None,
        _output_stream: output_stream,
    })
}

// the render callback casts the device buffer straight to StereoFrames, so
// anything but two interleaved channels would read and write out of bounds
fn ensure_stereo(channels: usize) -> anyhow::Result<()> {
    if channels != 2 {
        anyhow::bail!("unsupported channel count {channels} (stereo output only)");
    }
    Ok(())
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    cmd_rx: Receiver<EngineCommand>,
    event_tx: Sender<EngineEvent>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(config.sample_rate, event_tx);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = cmd_rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels;
            let frames: &mut [StereoFrame] = unsafe {
                // casting raw floats to StereoFrames, same layout
                std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut StereoFrame, n_frames)
            };
            engine.render_block(frames);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// Decode requests are processed in order on their own thread; each result
// carries the TrackId it was requested under so a swap mid-decode can be
// recognized and dropped.
fn start_loader(target_rate: u32) -> (Sender<LoadRequest>, Receiver<LoadResult>) {
    let (load_tx, load_rx) = crossbeam_channel::bounded::<LoadRequest>(8);
    let (result_tx, result_rx) = crossbeam_channel::bounded::<LoadResult>(8);

    thread::spawn(move || {
        log::info!("track loader started (target rate {target_rate} Hz)");
        for req in load_rx.iter() {
            let result = TrackBuffer::load_wav(&req.path, target_rate)
                .map_err(|e| format!("{e:#}"));
            if let Err(ref msg) = result {
                log::error!("failed to decode {}: {msg}", req.path.display());
            }
            if result_tx.try_send(LoadResult { track: req.track, result }).is_err() {
                break;
            }
        }
        log::info!("track loader shutting down");
    });

    (load_tx, result_rx)
}

impl Transport for Player {
    fn load(&mut self, track: TrackId, path: &Path) {
        self.current = Some(track);
        let _ = self.load_tx.try_send(LoadRequest { track, path: path.to_path_buf() });
    }

    fn play_pause(&mut self) {
        let _ = self.cmd_tx.try_send(EngineCommand::PlayPause);
    }

    fn play_region(&mut self, start: f64, end: f64) {
        let _ = self.cmd_tx.try_send(EngineCommand::PlayRegion { start, end });
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = drain_load_results(&self.loaded_rx, self.current, &self.cmd_tx) {
            return Some(event);
        }

        match self.event_rx.try_recv().ok()? {
            EngineEvent::Time(t) => Some(TransportEvent::TimeUpdate(t)),
            EngineEvent::Finished => Some(TransportEvent::Finished),
        }
    }
}

// a decode that finished after the track was swapped must not reach the
// engine; skip past it so a queued fresh result still surfaces this tick
fn drain_load_results(
    loaded_rx: &Receiver<LoadResult>,
    current: Option<TrackId>,
    cmd_tx: &Sender<EngineCommand>,
) -> Option<TransportEvent> {
    while let Ok(loaded) = loaded_rx.try_recv() {
        if current != Some(loaded.track) {
            log::debug!("dropping stale decode result for {:?}", loaded.track);
            continue;
        }
        return Some(match loaded.result {
            Ok(buffer) => {
                let duration = buffer.duration_seconds();
                let _ = cmd_tx.try_send(EngineCommand::SetTrack(buffer));
                TransportEvent::Ready { track: loaded.track, duration }
            }
            Err(message) => TransportEvent::LoadFailed { track: loaded.track, message },
        });
    }
    None
}
