use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, warn};

use super::{AudioFeed, AudioSource};
use crate::error::{Error, Result};

struct Worker {
    handle: JoinHandle<()>,
    stop: mpsc::Sender<()>,
}

/// Captures what the system is playing.
///
/// On Windows this opens a WASAPI loopback stream on the default output
/// device; elsewhere it falls back to the default input device. The stream
/// lives on a dedicated thread for its whole lifetime.
#[derive(Default)]
pub struct CpalLoopbackSource {
    worker: Option<Worker>,
}

impl CpalLoopbackSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSource for CpalLoopbackSource {
    fn start(&mut self, feed: AudioFeed) -> Result<u32> {
        self.stop();

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let stream = match open_stream(feed) {
                    Ok((stream, sample_rate)) => {
                        let _ = ready_tx.send(Ok(sample_rate));
                        stream
                    }
                    Err(error) => {
                        let _ = ready_tx.send(Err(error));
                        return;
                    }
                };
                // Blocks until stopped or the source is dropped
                let _ = stop_rx.recv();
                drop(stream);
            })?;

        match ready_rx.recv() {
            Ok(Ok(sample_rate)) => {
                debug!(sample_rate, "audio capture started");
                self.worker = Some(Worker {
                    handle,
                    stop: stop_tx,
                });
                Ok(sample_rate)
            }
            Ok(Err(error)) => {
                let _ = handle.join();
                Err(error)
            }
            Err(_) => Err(Error::Audio("capture thread exited".to_owned())),
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            if worker.handle.join().is_err() {
                warn!("audio capture thread panicked");
            }
            debug!("audio capture stopped");
        }
    }
}

impl Drop for CpalLoopbackSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_stream(feed: AudioFeed) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();

    #[cfg(target_os = "windows")]
    let (device, config) = {
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_owned()))?;
        let config = device
            .default_output_config()
            .map_err(|e| Error::Audio(e.to_string()))?;
        (device, config)
    };
    #[cfg(not(target_os = "windows"))]
    let (device, config) = {
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_owned()))?;
        let config = device
            .default_input_config()
            .map_err(|e| Error::Audio(e.to_string()))?;
        (device, config)
    };

    let channels = usize::from(config.channels());
    let sample_rate = config.sample_rate().0;
    let stream_config: cpal::StreamConfig = config.clone().into();
    let err_fn = |err: cpal::StreamError| warn!(%err, "audio stream error");

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                feed.push_interleaved_f32(data, channels);
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                feed.push_interleaved_i16(data, channels);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(Error::Audio(format!("unsupported sample format {other:?}")));
        }
    }
    .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok((stream, sample_rate))
}
