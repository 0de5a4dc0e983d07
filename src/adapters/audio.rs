//! Audio adapters: SD-card asset store and WAV playback engine.
//!
//! | Type               | Implements       | Connects to                 |
//! |--------------------|------------------|-----------------------------|
//! | [`FileAssetStore`] | `AssetStore`     | FAT volume mounted at root  |
//! | [`WavPlayer`]      | `PlaybackEngine` | any [`PcmOutput`]           |
//! | [`NullPcmOutput`]  | `PcmOutput`      | nothing (host runs, tests)  |
//! | `I2sPcmOutput`     | `PcmOutput`      | I2S amplifier (ESP-IDF)     |
//!
//! Playback is pull-driven: every control-loop pass calls `pump()`, which
//! hands the output whatever it can take without waiting.  A chunk is
//! only decoded once the previous one has been fully accepted.  Nothing
//! here spawns a task or blocks.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::app::ports::{AssetStore, PlaybackEngine};
use crate::config::VehicleConfig;
use crate::error::{AudioError, StorageError};

// ───────────────────────────────────────────────────────────────
// Asset store
// ───────────────────────────────────────────────────────────────

/// Opens assets below a mount point.  Asset paths are absolute within
/// the volume (`/horn.wav`).
pub struct FileAssetStore {
    root: PathBuf,
    available: bool,
}

impl FileAssetStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let available = root.is_dir();
        if available {
            info!("assets: using {}", root.display());
        } else {
            warn!("assets: {} not mounted", root.display());
        }
        Self { root, available }
    }

    /// Store rooted at the configured `asset_root`.
    pub fn from_config(config: &VehicleConfig) -> Self {
        Self::new(&config.asset_root)
    }

    /// Host path of an asset.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetStore for FileAssetStore {
    type Stream = BufReader<File>;

    fn is_available(&self) -> bool {
        self.available
    }

    fn open(&mut self, path: &str) -> Result<Self::Stream, StorageError> {
        if !self.available {
            return Err(StorageError::NotMounted);
        }
        let file = File::open(self.resolve(path)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::IoError,
        })?;
        Ok(BufReader::new(file))
    }
}

// ───────────────────────────────────────────────────────────────
// PCM output
// ───────────────────────────────────────────────────────────────

/// Sample layout of a decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    fn bytes_per_frame(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }
}

/// Sink for mono signed 16-bit samples.
pub trait PcmOutput {
    /// Prepare for a stream in `format`.
    fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError>;
    /// Accept a prefix of `samples` without waiting.  Returns how many
    /// were taken; `Ok(0)` means the output is full right now.
    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError>;
    /// Silence the output.
    fn stop(&mut self);
}

impl<T: PcmOutput + ?Sized> PcmOutput for Box<T> {
    fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError> {
        (**self).configure(format)
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        (**self).write(samples)
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}

/// Discards samples, keeping count.
#[derive(Debug, Default)]
pub struct NullPcmOutput {
    pub format: Option<WavFormat>,
    pub samples_written: usize,
    pub peak: i16,
}

impl PcmOutput for NullPcmOutput {
    fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError> {
        self.format = Some(*format);
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
        self.samples_written += samples.len();
        if let Some(p) = samples.iter().map(|s| s.saturating_abs()).max() {
            self.peak = self.peak.max(p);
        }
        Ok(samples.len())
    }

    fn stop(&mut self) {
        self.format = None;
    }
}

/// Frames per I2S DMA buffer.  The driver must be configured with the
/// same value so every staged write fills exactly one buffer.
pub const DMA_FRAMES: usize = 240;

#[cfg(target_os = "espidf")]
pub use i2s::I2sPcmOutput;

#[cfg(target_os = "espidf")]
mod i2s {
    use esp_idf_hal::delay::NON_BLOCK;
    use esp_idf_hal::i2s::{I2sDriver, I2sTx};
    use esp_idf_svc::sys::ESP_ERR_TIMEOUT;
    use log::warn;

    use super::{DMA_FRAMES, PcmOutput, WavFormat};
    use crate::error::AudioError;

    const DMA_BYTES: usize = DMA_FRAMES * 2;

    /// Mono 16-bit output to an external I2S amplifier at a fixed rate.
    ///
    /// Samples are staged one DMA buffer at a time and handed over only
    /// when a whole buffer is free, so a write either lands completely or
    /// not at all.
    pub struct I2sPcmOutput<'d> {
        driver: I2sDriver<'d, I2sTx>,
        sample_rate: u32,
        enabled: bool,
        staged: Vec<u8>,
    }

    impl<'d> I2sPcmOutput<'d> {
        pub fn new(driver: I2sDriver<'d, I2sTx>, sample_rate: u32) -> Self {
            Self {
                driver,
                sample_rate,
                enabled: false,
                staged: Vec::with_capacity(DMA_BYTES),
            }
        }

        /// Try to hand the staged buffer to DMA.  `Ok(false)` if every
        /// buffer is still queued.
        fn flush(&mut self) -> Result<bool, AudioError> {
            match self.driver.write(&self.staged, NON_BLOCK) {
                Ok(_) => {
                    self.staged.clear();
                    Ok(true)
                }
                Err(e) if e.code() == ESP_ERR_TIMEOUT as i32 => Ok(false),
                Err(e) => {
                    warn!("i2s: write failed: {}", e);
                    Err(AudioError::OutputFailed)
                }
            }
        }
    }

    impl PcmOutput for I2sPcmOutput<'_> {
        fn configure(&mut self, format: &WavFormat) -> Result<(), AudioError> {
            if format.sample_rate != self.sample_rate {
                warn!(
                    "i2s: {} Hz asset on a {} Hz output",
                    format.sample_rate, self.sample_rate
                );
                return Err(AudioError::UnsupportedFormat);
            }
            if !self.enabled {
                self.driver.tx_enable().map_err(|_| AudioError::OutputFailed)?;
                self.enabled = true;
            }
            Ok(())
        }

        /// Fills every free DMA buffer, then returns.
        fn write(&mut self, samples: &[i16]) -> Result<usize, AudioError> {
            let mut taken = 0;
            loop {
                if self.staged.len() == DMA_BYTES && !self.flush()? {
                    break;
                }
                let rest = &samples[taken..];
                if rest.is_empty() {
                    break;
                }
                let n = rest.len().min((DMA_BYTES - self.staged.len()) / 2);
                for s in &rest[..n] {
                    self.staged.extend_from_slice(&s.to_le_bytes());
                }
                taken += n;
            }
            Ok(taken)
        }

        fn stop(&mut self) {
            // A partial tail is shorter than one buffer; drop it.
            self.staged.clear();
            if self.enabled {
                if let Err(e) = self.driver.tx_disable() {
                    warn!("i2s: disable failed: {}", e);
                }
                self.enabled = false;
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WAV decoding
// ───────────────────────────────────────────────────────────────

const WAVE_FORMAT_PCM: u16 = 1;

/// Frames decoded per `pump()` call.
pub const CHUNK_FRAMES: usize = 256;

fn read_u16(r: &mut impl Read) -> Result<u16, AudioError> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b).map_err(|_| AudioError::Truncated)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32(r: &mut impl Read) -> Result<u32, AudioError> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b).map_err(|_| AudioError::Truncated)?;
    Ok(u32::from_le_bytes(b))
}

fn read_tag(r: &mut impl Read) -> Result<[u8; 4], AudioError> {
    let mut tag = [0u8; 4];
    r.read_exact(&mut tag).map_err(|_| AudioError::Truncated)?;
    Ok(tag)
}

fn skip(r: &mut impl Read, n: u64) -> Result<(), AudioError> {
    let copied = io::copy(&mut r.take(n), &mut io::sink()).map_err(|_| AudioError::Truncated)?;
    if copied != n {
        return Err(AudioError::Truncated);
    }
    Ok(())
}

/// Parse a RIFF/WAVE header up to the start of the `data` chunk.
///
/// Returns the format and the data length in bytes.  Chunks other than
/// `fmt ` and `data` are skipped.
pub fn read_header(r: &mut impl Read) -> Result<(WavFormat, u32), AudioError> {
    if &read_tag(r)? != b"RIFF" {
        return Err(AudioError::InvalidHeader);
    }
    let _riff_len = read_u32(r)?;
    if &read_tag(r)? != b"WAVE" {
        return Err(AudioError::InvalidHeader);
    }

    let mut format = None;
    loop {
        let tag = read_tag(r)?;
        let len = read_u32(r)?;
        match &tag {
            b"fmt " => {
                if len < 16 {
                    return Err(AudioError::InvalidHeader);
                }
                let audio_format = read_u16(r)?;
                let channels = read_u16(r)?;
                let sample_rate = read_u32(r)?;
                let _byte_rate = read_u32(r)?;
                let _block_align = read_u16(r)?;
                let bits_per_sample = read_u16(r)?;
                // Chunks are word-aligned.
                skip(r, u64::from(len - 16) + u64::from(len & 1))?;

                if audio_format != WAVE_FORMAT_PCM
                    || channels == 0
                    || !matches!(bits_per_sample, 8 | 16)
                {
                    return Err(AudioError::UnsupportedFormat);
                }
                format = Some(WavFormat {
                    channels,
                    sample_rate,
                    bits_per_sample,
                });
            }
            b"data" => {
                let format = format.ok_or(AudioError::InvalidHeader)?;
                return Ok((format, len));
            }
            _ => skip(r, u64::from(len) + u64::from(len & 1))?,
        }
    }
}

/// Downmix one interleaved frame to a mono sample.
fn frame_to_mono(frame: &[u8], format: &WavFormat) -> i16 {
    let channels = i32::from(format.channels);
    let sum: i32 = match format.bits_per_sample {
        8 => frame.iter().map(|&b| (i32::from(b) - 128) << 8).sum(),
        _ => frame
            .chunks_exact(2)
            .map(|c| i32::from(i16::from_le_bytes([c[0], c[1]])))
            .sum(),
    };
    (sum / channels) as i16
}

fn apply_gain(sample: i16, gain: f32) -> i16 {
    (f32::from(sample) * gain).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

struct ActiveStream<R> {
    reader: R,
    format: WavFormat,
    remaining: u32,
}

/// Single-voice WAV player.
pub struct WavPlayer<R, O> {
    output: O,
    gain: f32,
    stream: Option<ActiveStream<R>>,
    frame_buf: Vec<u8>,
    /// Decoded chunk; `samples[sent..]` is still waiting for the output.
    samples: Vec<i16>,
    sent: usize,
}

impl<R: Read, O: PcmOutput> WavPlayer<R, O> {
    pub fn new(output: O, gain: f32) -> Self {
        Self {
            output,
            gain,
            stream: None,
            frame_buf: Vec::new(),
            samples: Vec::with_capacity(CHUNK_FRAMES),
            sent: 0,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn format(&self) -> Option<WavFormat> {
        self.stream.as_ref().map(|s| s.format)
    }

    /// Samples decoded but not yet accepted by the output.
    pub fn pending(&self) -> usize {
        self.samples.len() - self.sent
    }

    fn finish(&mut self) {
        self.stream = None;
        self.samples.clear();
        self.sent = 0;
        self.output.stop();
    }

    /// Offer the pending samples to the output.
    fn flush(&mut self) -> bool {
        match self.output.write(&self.samples[self.sent..]) {
            Ok(n) => {
                self.sent = (self.sent + n).min(self.samples.len());
                true
            }
            Err(e) => {
                warn!("wav: output failed: {}", e);
                self.finish();
                false
            }
        }
    }
}

impl<R: Read, O: PcmOutput> PlaybackEngine<R> for WavPlayer<R, O> {
    fn begin(&mut self, mut stream: R) -> Result<(), AudioError> {
        self.stream = None;
        self.samples.clear();
        self.sent = 0;
        let (format, data_len) = read_header(&mut stream)?;
        self.output.configure(&format)?;
        debug!(
            "wav: {} ch, {} Hz, {}-bit, {} bytes",
            format.channels, format.sample_rate, format.bits_per_sample, data_len
        );
        self.stream = Some(ActiveStream {
            reader: stream,
            format,
            remaining: data_len,
        });
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    fn pump(&mut self) -> bool {
        if self.pending() > 0 {
            return self.stream.is_some() && self.flush();
        }
        let Some(active) = self.stream.as_mut() else {
            return false;
        };

        let frame_len = active.format.bytes_per_frame();
        let want = (CHUNK_FRAMES * frame_len).min(active.remaining as usize);
        let want = want - want % frame_len;
        if want == 0 {
            self.finish();
            return false;
        }

        self.frame_buf.resize(want, 0);
        let got = match read_up_to(&mut active.reader, &mut self.frame_buf) {
            Ok(n) => n - n % frame_len,
            Err(e) => {
                warn!("wav: read failed: {}", e);
                0
            }
        };
        if got == 0 {
            self.finish();
            return false;
        }
        active.remaining = active.remaining.saturating_sub(got as u32);

        self.samples.clear();
        self.sent = 0;
        for frame in self.frame_buf[..got].chunks_exact(frame_len) {
            self.samples
                .push(apply_gain(frame_to_mono(frame, &active.format), self.gain));
        }
        self.flush()
    }

    fn stop(&mut self) {
        self.finish();
    }
}

/// `read` until `buf` is full or the reader is exhausted.
fn read_up_to(r: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
