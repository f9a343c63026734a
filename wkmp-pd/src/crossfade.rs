//! PCM Crossfade Session (C7): a persistent encoder fed by an in-process
//! mixer that overlaps the tail of one decoded track with the head of the
//! next. The pump loop and linear-gain mixing math implement spec §4.7/§8.

use crate::pipeline::{self, Output, PipelineHandle};
use chrono::{DateTime, Utc};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, warn};

/// A PCM source the pump reads 20ms frames from: either a decoder
/// subprocess's stdout or a FIFO-backed file, depending on how the
/// pipeline supervisor demultiplexed it.
pub type PcmSource = Pin<Box<dyn AsyncRead + Send>>;

/// 20ms frame at the mount's sample rate, per spec §4.7: `sample_rate/50`
/// samples/channel.
pub fn frame_bytes(sample_rate: u32, channels: u16) -> usize {
    let frame_samples = sample_rate as usize / 50;
    frame_samples * channels as usize * 2
}

struct Fade {
    start: DateTime<Utc>,
    duration: chrono::Duration,
}

impl Fade {
    fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.duration <= chrono::Duration::zero() {
            return 1.0;
        }
        let elapsed = (now - self.start).num_nanoseconds().unwrap_or(0) as f64;
        let total = self.duration.num_nanoseconds().unwrap_or(1).max(1) as f64;
        (elapsed / total).clamp(0.0, 1.0)
    }
}

/// Mix two interleaved S16LE frames with linear gain. `p=0` returns `cur`
/// byte-for-byte, `p=1` returns `next` byte-for-byte.
pub fn mix_frame(cur: &[u8], next: &[u8], p: f64) -> Vec<u8> {
    debug_assert_eq!(cur.len(), next.len());
    debug_assert_eq!(cur.len() % 2, 0);

    let cur_v = 1.0 - p;
    let next_v = p;

    let mut out = Vec::with_capacity(cur.len());
    for (a_bytes, b_bytes) in cur.chunks_exact(2).zip(next.chunks_exact(2)) {
        let a = i16::from_le_bytes([a_bytes[0], a_bytes[1]]) as f64;
        let b = i16::from_le_bytes([b_bytes[0], b_bytes[1]]) as f64;
        let mixed = (a * cur_v + b * next_v).round();
        let clamped = mixed.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        out.extend_from_slice(&clamped.to_le_bytes());
    }
    out
}

enum PumpCommand {
    Play { handle: PipelineHandle, source: PcmSource },
    Close,
}

/// A decoder subprocess currently feeding the pump, either as `cur` or
/// `next`.
struct DecoderStream {
    source: PcmSource,
    handle: PipelineHandle,
}

/// Stop a demoted/closed decoder's subprocess off the pump's hot path: the
/// graceful-then-kill shutdown in `PipelineHandle::stop` can take up to 5s,
/// which the pump loop must not block on. Dropping the handle alone never
/// sends it a signal (`tokio::process::Command` has no `kill_on_drop` set),
/// so without this the old `cur` decoder keeps running after every
/// crossfade, violating the "at most two decoder subprocesses" invariant.
fn stop_decoder_in_background(stream: DecoderStream) {
    tokio::spawn(async move {
        if let Err(e) = stream.handle.stop().await {
            warn!(error = %e, "failed to stop demoted crossfade decoder");
        }
    });
}

/// Owns the persistent encoder for one mount's crossfade-enabled sequence.
/// The pump loop runs as a dedicated task started on first `play`.
pub struct CrossfadeSession {
    tx: mpsc::Sender<PumpCommand>,
}

impl CrossfadeSession {
    /// Start the persistent encoder and the pump task. `encoder_stdin`
    /// receives mixed/passthrough frames; `frame_size` is precomputed from
    /// the mount's sample rate/channel count.
    pub fn start(
        mut encoder_stdin: tokio::process::ChildStdin,
        frame_size: usize,
        fade_duration: chrono::Duration,
        on_track_end: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        let (tx, mut rx) = mpsc::channel::<PumpCommand>(4);
        let on_track_end = Arc::new(on_track_end);

        tokio::spawn(async move {
            let mut cur: Option<DecoderStream> = None;
            let mut next: Option<DecoderStream> = None;
            let mut fade: Option<Fade> = None;

            loop {
                // Drain any pending commands without blocking the pump.
                while let Ok(cmd) = rx.try_recv() {
                    match cmd {
                        PumpCommand::Play { handle, source } => {
                            let incoming = DecoderStream { source, handle };
                            if cur.is_none() {
                                cur = Some(incoming);
                            } else {
                                next = Some(incoming);
                                fade = Some(Fade { start: Utc::now(), duration: fade_duration });
                            }
                        }
                        PumpCommand::Close => {
                            if let Some(stream) = cur.take() {
                                stop_decoder_in_background(stream);
                            }
                            if let Some(stream) = next.take() {
                                stop_decoder_in_background(stream);
                            }
                            return;
                        }
                    }
                }

                let Some(cur_stream) = cur.as_mut() else {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    continue;
                };

                let mut cur_buf = vec![0u8; frame_size];
                let read = cur_stream.source.read_exact(&mut cur_buf).await;

                if read.is_err() {
                    // EOF mid-track or mid-fade: treat as immediate
                    // end-of-track, promote next if any.
                    on_track_end();
                    let demoted = cur.take();
                    cur = next.take();
                    fade = None;
                    if let Some(demoted) = demoted {
                        stop_decoder_in_background(demoted);
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    continue;
                }

                let out_frame = if let (Some(next_stream), Some(f)) = (next.as_mut(), fade.as_ref()) {
                    let mut next_buf = vec![0u8; frame_size];
                    match next_stream.source.read_exact(&mut next_buf).await {
                        Ok(_) => {
                            let p = f.progress(Utc::now());
                            let mixed = mix_frame(&cur_buf, &next_buf, p);
                            if p >= 1.0 {
                                let demoted = cur.take();
                                cur = next.take();
                                fade = None;
                                if let Some(demoted) = demoted {
                                    stop_decoder_in_background(demoted);
                                }
                            }
                            mixed
                        }
                        Err(_) => {
                            // next not yet producing frames: fall back to
                            // writing cur alone.
                            cur_buf.clone()
                        }
                    }
                } else {
                    cur_buf.clone()
                };

                if encoder_stdin.write_all(&out_frame).await.is_err() {
                    warn!("encoder stdin closed, stopping pump");
                    return;
                }
            }
        });

        Arc::new(CrossfadeSession { tx })
    }

    pub async fn play(&self, handle: PipelineHandle, source: PcmSource) -> crate::Result<()> {
        self.tx
            .send(PumpCommand::Play { handle, source })
            .await
            .map_err(|_| crate::error::SubprocessError::StreamClosed.into())
    }

    pub async fn close(&self) {
        let _ = self.tx.send(PumpCommand::Close).await;
    }
}

/// Spawn the per-media decoder subprocess whose pipeline decodes/resamples
/// to `S16LE`/`sample_rate`/`channels` and throttles stdout in real time.
pub async fn spawn_decoder(
    gstreamer_bin: &str,
    media_path: &str,
    sample_rate: u32,
    channels: u16,
) -> crate::Result<(PipelineHandle, PcmSource)> {
    let pipeline_string = format!(
        "filesrc location=\"{media_path}\" ! decodebin ! audioconvert ! audioresample \
         ! audio/x-raw,format=S16LE,rate={sample_rate},channels={channels} \
         ! identity sync=true ! fdsink fd=1"
    );
    let (handle, output) = pipeline::spawn_single(gstreamer_bin, &pipeline_string).await?;
    let Output::Single { reader } = output else {
        unreachable!("spawn_single always returns Output::Single")
    };
    debug!(media_path, "spawned crossfade decoder");
    Ok((handle, Box::pin(reader)))
}
