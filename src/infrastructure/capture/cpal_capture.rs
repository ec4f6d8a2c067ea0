//! Audio capture using cpal
//!
//! Each handle owns one input stream running on a dedicated thread
//! (cpal::Stream is not Send). Samples are collected as mono i16 at the
//! device rate, then resampled to the format rate and written as FLAC
//! when the capture stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::flac_encoder::encode_to_flac;
use crate::application::ports::{CaptureBackend, CaptureError, CaptureHandle, OutputSink};
use crate::domain::recording::{AudioFormat, AudioSource, EncoderSettings};

/// Name fragments of devices that expose the far end of a call
const DUPLEX_DEVICE_HINTS: [&str; 2] = ["monitor", "loopback"];

/// Allocates cpal capture handles
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalCaptureBackend;

impl CpalCaptureBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for CpalCaptureBackend {
    fn allocate(&self) -> Box<dyn CaptureHandle> {
        Box::new(CpalCapture::new())
    }
}

/// One cpal input stream bound to a capture source
pub struct CpalCapture {
    audio_source: Option<AudioSource>,
    device_name: Option<String>,
    settings: Option<EncoderSettings>,
    sink: Option<OutputSink>,
    /// Recorded audio samples (mono, i16, at device sample rate)
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    device_sample_rate: u32,
    is_recording: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self {
            audio_source: None,
            device_name: None,
            settings: None,
            sink: None,
            audio_buffer: Arc::new(StdMutex::new(Vec::new())),
            device_sample_rate: 0,
            is_recording: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    fn bound_source(&self) -> Result<AudioSource, CaptureError> {
        self.audio_source
            .ok_or_else(|| CaptureError::Configure("capture handle is not bound".to_string()))
    }

    /// Pick the input device that best matches a capture source
    fn select_device(audio_source: AudioSource) -> Result<String, CaptureError> {
        let unavailable = |reason: String| CaptureError::SourceUnavailable {
            audio_source,
            reason,
        };
        let host = cpal::default_host();

        let device = match audio_source {
            AudioSource::VoiceCall => host
                .input_devices()
                .map_err(|e| unavailable(e.to_string()))?
                .find(|d| {
                    d.name()
                        .map(|n| {
                            let n = n.to_lowercase();
                            DUPLEX_DEVICE_HINTS.iter().any(|hint| n.contains(hint))
                        })
                        .unwrap_or(false)
                }),
            AudioSource::VoiceRecognition | AudioSource::VoiceCommunication => {
                host.default_input_device()
            }
            AudioSource::Mic => host
                .input_devices()
                .map_err(|e| unavailable(e.to_string()))?
                .next(),
        };

        let device = device.ok_or_else(|| unavailable("no matching input device".to_string()))?;
        device.name().map_err(|e| unavailable(e.to_string()))
    }

    fn find_device(name: &str) -> Option<cpal::Device> {
        cpal::default_host()
            .input_devices()
            .ok()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
    }

    /// Get a suitable input configuration, preferring mono and the target rate
    fn get_input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), String> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| format!("Failed to get configs: {}", e))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= target_rate
                && config.max_sample_rate().0 >= target_rate;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > target_rate;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or_else(|| "No suitable config found".to_string())?;

        let sample_rate = if config_range.min_sample_rate().0 <= target_rate
            && config_range.max_sample_rate().0 >= target_rate
        {
            SampleRate(target_rate)
        } else {
            config_range.min_sample_rate()
        };

        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, config_range.sample_format()))
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        audio_buffer: Arc<StdMutex<Vec<i16>>>,
        is_recording: Arc<AtomicBool>,
    ) -> Result<cpal::Stream, String> {
        let channels = config.channels;
        let on_error = |err: cpal::StreamError| warn!("Audio stream error: {}", err);

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if is_recording.load(Ordering::SeqCst) {
                        let mono = stereo_to_mono(data, channels);
                        if let Ok(mut buffer) = audio_buffer.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if is_recording.load(Ordering::SeqCst) {
                        let i16_data: Vec<i16> =
                            data.iter().map(|&s| (s * 32767.0) as i16).collect();
                        let mono = stereo_to_mono(&i16_data, channels);
                        if let Ok(mut buffer) = audio_buffer.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                on_error,
                None,
            ),
            _ => return Err("Unsupported sample format".to_string()),
        };

        stream.map_err(|e| e.to_string())
    }

    /// Stream thread: open the device, report readiness, run until stopped
    fn run_stream(
        device_name: String,
        target_rate: u32,
        audio_buffer: Arc<StdMutex<Vec<i16>>>,
        is_recording: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<u32, String>>,
    ) {
        let opened = Self::find_device(&device_name)
            .ok_or_else(|| format!("device {} disappeared", device_name))
            .and_then(|device| {
                let (config, sample_format) = Self::get_input_config(&device, target_rate)?;
                let stream = Self::build_stream(
                    &device,
                    &config,
                    sample_format,
                    Arc::clone(&audio_buffer),
                    Arc::clone(&is_recording),
                )?;
                stream.play().map_err(|e| e.to_string())?;
                Ok((stream, config.sample_rate.0))
            });

        let stream = match opened {
            Ok((stream, rate)) => {
                let _ = ready.send(Ok(rate));
                stream
            }
            Err(e) => {
                is_recording.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(e));
                return;
            }
        };

        while is_recording.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        drop(stream);
    }

    fn halt_worker(&mut self) -> Option<JoinHandle<()>> {
        self.is_recording.store(false, Ordering::SeqCst);
        self.worker.take()
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureHandle for CpalCapture {
    async fn bind(&mut self, audio_source: AudioSource) -> Result<(), CaptureError> {
        let name = tokio::task::spawn_blocking(move || Self::select_device(audio_source))
            .await
            .map_err(|e| CaptureError::SourceUnavailable {
                audio_source,
                reason: format!("device probe failed: {}", e),
            })??;

        debug!("Audio source {} uses input device {}", audio_source, name);
        self.audio_source = Some(audio_source);
        self.device_name = Some(name);
        Ok(())
    }

    async fn configure(&mut self, format: AudioFormat) -> Result<(), CaptureError> {
        self.bound_source()?;
        self.settings = Some(format.settings());
        Ok(())
    }

    async fn prepare(&mut self, sink: &OutputSink) -> Result<(), CaptureError> {
        if let Some(parent) = sink.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CaptureError::Io(format!("{}: {}", parent.display(), e)))?;
        }
        self.sink = Some(sink.clone());
        Ok(())
    }

    async fn start(&mut self) -> Result<(), CaptureError> {
        let audio_source = self.bound_source()?;
        let settings = self
            .settings
            .ok_or_else(|| CaptureError::Configure("encoder not configured".to_string()))?;
        let device_name = self
            .device_name
            .clone()
            .ok_or_else(|| CaptureError::Configure("no input device".to_string()))?;
        if self.sink.is_none() {
            return Err(CaptureError::Configure("output sink not prepared".to_string()));
        }

        if let Ok(mut buffer) = self.audio_buffer.lock() {
            buffer.clear();
        }
        self.is_recording.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = oneshot::channel();
        let audio_buffer = Arc::clone(&self.audio_buffer);
        let is_recording = Arc::clone(&self.is_recording);
        let target_rate = settings.sample_rate;
        self.worker = Some(std::thread::spawn(move || {
            Self::run_stream(device_name, target_rate, audio_buffer, is_recording, ready_tx)
        }));

        let started = ready_rx
            .await
            .unwrap_or_else(|_| Err("capture thread exited".to_string()));

        match started {
            Ok(rate) => {
                self.device_sample_rate = rate;
                Ok(())
            }
            Err(reason) => {
                self.halt_worker();
                Err(CaptureError::StartFailed {
                    audio_source,
                    reason,
                })
            }
        }
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let worker = self
            .halt_worker()
            .ok_or_else(|| CaptureError::StopFailed("capture is not running".to_string()))?;
        tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|e| CaptureError::StopFailed(e.to_string()))?
            .map_err(|_| CaptureError::StopFailed("capture thread panicked".to_string()))?;

        let samples = match self.audio_buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(_) => Vec::new(),
        };
        if samples.is_empty() {
            return Err(CaptureError::StopFailed("No audio data captured".to_string()));
        }

        let sink = self
            .sink
            .clone()
            .ok_or_else(|| CaptureError::StopFailed("no output sink".to_string()))?;
        let target_rate = self
            .settings
            .map(|s| s.sample_rate)
            .unwrap_or(self.device_sample_rate);
        let device_rate = self.device_sample_rate;

        let encoded = tokio::task::spawn_blocking(move || {
            let resampled = resample(&samples, device_rate, target_rate)?;
            encode_to_flac(&resampled, target_rate).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| CaptureError::StopFailed(format!("Encode task error: {}", e)))?
        .map_err(CaptureError::StopFailed)?;

        tokio::fs::write(&sink.path, encoded)
            .await
            .map_err(|e| CaptureError::Io(format!("{}: {}", sink.path.display(), e)))?;
        debug!("Wrote {}", sink.path.display());
        Ok(())
    }

    async fn release(&mut self) {
        // The stream thread exits on its own once the flag drops
        drop(self.halt_worker());
        if let Ok(mut buffer) = self.audio_buffer.lock() {
            buffer.clear();
        }
        self.sink = None;
    }
}

/// Mix interleaved channels down to mono
fn stereo_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / chunk.len() as i32) as i16
        })
        .collect()
}

/// Resample mono audio between rates
fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Result<Vec<i16>, String> {
    if source_rate == target_rate || source_rate == 0 {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| format!("Resampler init failed: {}", e))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());
        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        chunk.resize(frames_needed, 0.0);

        let input = vec![chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| format!("Resampling failed: {}", e))?;

        output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_to_mono_single_channel() {
        let mono = vec![100i16, 200, 300];
        assert_eq!(stereo_to_mono(&mono, 1), mono);
    }

    #[test]
    fn stereo_to_mono_two_channels() {
        let stereo = vec![100i16, 200, 300, 400];
        assert_eq!(stereo_to_mono(&stereo, 2), vec![150, 350]);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![1i16, 2, 3];
        assert_eq!(resample(&samples, 16_000, 16_000).unwrap(), samples);
    }

    #[test]
    fn resample_changes_length_by_ratio() {
        let samples = vec![0i16; 48_000];
        let out = resample(&samples, 48_000, 16_000).unwrap();
        assert!(out.len() > 15_000 && out.len() <= 16_000);
    }

    #[tokio::test]
    async fn unbound_handle_refuses_to_start() {
        let mut capture = CpalCapture::new();
        assert!(capture.configure(AudioFormat::Speech).await.is_err());
        assert!(capture.start().await.is_err());
    }

    #[tokio::test]
    async fn stop_without_start_fails() {
        let mut capture = CpalCapture::new();
        let err = capture.stop().await.unwrap_err();
        assert!(matches!(err, CaptureError::StopFailed(_)));
        capture.release().await;
    }
}
