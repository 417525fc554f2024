use std::collections::VecDeque;

use byteorder::{ByteOrder, LittleEndian};
use chfft::RFft1D;

use crate::config::Config;

use super::Fingerprint;

#[derive(Clone, Copy, Debug)]
struct PeakSlot {
    bin: usize,
    magnitude: f32,
    valid: bool,
}

#[derive(Debug)]
struct Mark {
    frame: i64,
    peaks: Vec<PeakSlot>,
}

/// Streaming landmark fingerprint generator.
///
/// Owns a sliding short-time spectrogram, an adaptive per-bin threshold, and
/// a rolling buffer of recent peaks. Feed it PCM bytes with [`push`](Self::push)
/// and flush it with [`finish`](Self::finish); mirrors the teacher's
/// `SignatureGenerator` object shape (`do_fft`/`get_signature`) rather than an
/// async `Stream`.
pub struct Fingerprinter {
    config: Config,

    /// Precomputed Hann window, length `nfft`.
    hann: Vec<f32>,
    /// Precomputed log-domain Gaussian mask kernel, `half x half`.
    mask_kernel: Vec<Vec<f32>>,

    fft: RFft1D<f32>,

    /// Leftover byte when an odd number of bytes has been pushed so far.
    pending_byte: Option<u8>,
    /// Unconsumed PCM samples, starting at `base_sample_index`.
    samples: Vec<i16>,
    /// Absolute sample index of `samples[0]`.
    base_sample_index: i64,

    /// Next frame index to process once enough samples are buffered.
    next_frame: i64,

    /// Per-bin adaptive threshold, length `half`.
    threshold: Vec<f32>,

    /// Ring of recent peak marks, contiguous by frame index (one mark per
    /// processed frame, even when it carries zero peaks).
    marks: VecDeque<Mark>,
}

impl Fingerprinter {
    /// Creates a new fingerprinter with the given configuration.
    pub fn new(config: Config) -> Self {
        let nfft = config.nfft;
        let half = nfft / 2;

        let hann: Vec<f32> = (0..nfft)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (nfft as f32 - 1.0)).cos())
            })
            .collect();

        let mask_kernel: Vec<Vec<f32>> = (0..half)
            .map(|i| {
                let denom = config.mask_df * (i as f32 + 3.0).sqrt();
                (0..half)
                    .map(|j| {
                        let x = (j as f32 - i as f32) / denom;
                        -0.5 * x * x
                    })
                    .collect()
            })
            .collect();

        let threshold = vec![1e-6_f32.ln(); half];

        Fingerprinter {
            fft: RFft1D::<f32>::new(nfft),
            hann,
            mask_kernel,
            threshold,
            samples: Vec::new(),
            base_sample_index: 0,
            pending_byte: None,
            next_frame: 0,
            marks: VecDeque::new(),
            config,
        }
    }

    /// Feeds a chunk of raw little-endian 16-bit mono PCM bytes.
    ///
    /// Chunks are boundary-agnostic: any number of bytes (including an odd
    /// count, or fewer than one frame) may be pushed at a time.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Fingerprint> {
        let mut incoming = Vec::with_capacity(bytes.len() + 1);
        if let Some(pending) = self.pending_byte.take() {
            incoming.push(pending);
        }
        incoming.extend_from_slice(bytes);

        let whole_samples = incoming.len() / 2;
        if incoming.len() % 2 == 1 {
            self.pending_byte = Some(incoming[incoming.len() - 1]);
        }

        self.samples.reserve(whole_samples);
        for chunk in incoming[..whole_samples * 2].chunks_exact(2) {
            self.samples.push(LittleEndian::read_i16(chunk));
        }

        let mut out = Vec::new();
        loop {
            let frame_start = self.next_frame * self.config.step as i64;
            let needed_end = frame_start + self.config.nfft as i64;
            let available_end = self.base_sample_index + self.samples.len() as i64;
            if needed_end > available_end {
                break;
            }

            let local_start = (frame_start - self.base_sample_index) as usize;
            let frame: Vec<i16> =
                self.samples[local_start..local_start + self.config.nfft].to_vec();
            out.extend(self.process_frame(&frame));
            self.next_frame += 1;

            self.compact_buffer_if_needed();
        }

        out
    }

    /// Signals end-of-stream. Any anchors whose pruning window never closed
    /// during `push` are dropped, per the streaming contract.
    pub fn finish(&mut self) -> Vec<Fingerprint> {
        Vec::new()
    }

    fn compact_buffer_if_needed(&mut self) {
        let byte_len = self.samples.len() * self.config.bytes_per_sample as usize;
        if byte_len <= self.config.buffer_soft_cap_bytes {
            return;
        }

        let next_needed_start = self.next_frame * self.config.step as i64;
        let drop_count = (next_needed_start - self.base_sample_index).max(0) as usize;
        let drop_count = drop_count.min(self.samples.len());
        if drop_count > 0 {
            self.samples.drain(0..drop_count);
            self.base_sample_index += drop_count as i64;
        }
    }

    fn process_frame(&mut self, frame_samples: &[i16]) -> Vec<Fingerprint> {
        let half = self.config.nfft / 2;
        let norm = (1u64 << (8 * self.config.bytes_per_sample - 1)) as f32;

        // 1. Window and scale.
        let windowed: Vec<f32> = (0..self.config.nfft)
            .map(|i| frame_samples[i] as f32 * self.hann[i] / norm)
            .collect();

        // 2. FFT; take magnitude of the first `half` bins.
        let spectrum_complex = self.fft.forward(&windowed);
        let mut spectrum: Vec<f32> = spectrum_complex[..half]
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect();

        let if_min = self.config.if_min.min(half);
        let if_max = self.config.if_max.min(half);

        // 3. Perceptual boost.
        for i in if_min..if_max {
            spectrum[i] *= (i as f32 + 16.0).sqrt();
        }

        // 4. Excess over threshold.
        let diff: Vec<f32> = (0..half)
            .map(|i| (spectrum[i].max(1e-6).ln() - self.threshold[i]).max(0.0))
            .collect();

        // 5. Top-MNLM local maxima of `diff`, kept sorted by raw magnitude.
        let mut accepted: Vec<PeakSlot> = Vec::with_capacity(self.config.mnlm);
        let scan_start = (if_min + 1).max(1);
        let scan_end = if_max.saturating_sub(1);
        if scan_start < scan_end {
            for i in scan_start..scan_end {
                if diff[i] > diff[i - 1] && diff[i] > diff[i + 1] {
                    let magnitude = spectrum[i];
                    let pos = accepted.partition_point(|p| p.magnitude >= magnitude);
                    if pos < self.config.mnlm {
                        accepted.insert(
                            pos,
                            PeakSlot {
                                bin: i,
                                magnitude,
                                valid: true,
                            },
                        );
                        if accepted.len() > self.config.mnlm {
                            accepted.truncate(self.config.mnlm);
                        }
                    }
                }
            }
        }

        // 6. Threshold bump, via the precomputed Gaussian mask kernel.
        for peak in &accepted {
            let v_ln = peak.magnitude.max(1e-6).ln();
            let kernel_row = &self.mask_kernel[peak.bin];
            for j in if_min..if_max {
                let bumped = v_ln + kernel_row[j];
                if bumped > self.threshold[j] {
                    self.threshold[j] = bumped;
                }
            }
        }

        // 7. Append mark.
        let current_frame = self.next_frame;
        self.marks.push_back(Mark {
            frame: current_frame,
            peaks: accepted,
        });

        // 8. Back-prune.
        let prune_start = (current_frame - self.config.pruning_dt).max(0);
        for mark in self.marks.iter_mut() {
            if mark.frame < prune_start || mark.frame > current_frame {
                continue;
            }
            let frames_since = (current_frame - mark.frame) as f32;
            let floor_base = frames_since * self.config.mask_decay_log;
            for peak in mark.peaks.iter_mut() {
                if !peak.valid || peak.bin == 0 {
                    continue;
                }
                let floor = self.threshold[peak.bin] + floor_base;
                if peak.magnitude.max(1e-6).ln() < floor {
                    peak.valid = false;
                }
            }
        }

        // 9. Emit anchor.
        let out = self.emit_anchor(current_frame);

        // 10. Garbage-collect marks.
        let t0 = current_frame - self.config.pruning_dt - 1;
        let gc_floor = t0 + 1 - self.config.window_dt;
        while let Some(front) = self.marks.front() {
            if front.frame < gc_floor {
                self.marks.pop_front();
            } else {
                break;
            }
        }

        // 11. Decay threshold.
        for value in self.threshold.iter_mut() {
            *value += self.config.mask_decay_log;
        }

        out
    }

    fn emit_anchor(&self, current_frame: i64) -> Vec<Fingerprint> {
        let mut out = Vec::new();

        let t0 = current_frame - self.config.pruning_dt - 1;
        if t0 < 0 {
            return out;
        }

        let base_frame = match self.marks.front() {
            Some(m) => m.frame,
            None => return out,
        };

        let anchor_idx = t0 - base_frame;
        if anchor_idx < 0 || anchor_idx as usize >= self.marks.len() {
            return out;
        }

        let anchor_peaks: Vec<PeakSlot> = self.marks[anchor_idx as usize]
            .peaks
            .iter()
            .filter(|p| p.valid)
            .cloned()
            .collect();

        let half = self.config.nfft / 2;
        let j_min = (t0 - self.config.window_dt).max(0);
        let mut emitted = 0usize;

        'anchors: for p in &anchor_peaks {
            let mut j = t0;
            while j >= j_min {
                let idx = j - base_frame;
                if idx >= 0 && (idx as usize) < self.marks.len() {
                    for q in self.marks[idx as usize].peaks.iter().filter(|q| q.valid) {
                        let bin_delta = (q.bin as i64 - p.bin as i64).abs();
                        if q.bin != p.bin && bin_delta < self.config.window_df as i64 {
                            let dt = (t0 - j) as u32;
                            let hash = pack_hash(q.bin, p.bin, dt, half);
                            out.push(Fingerprint {
                                time_ms: frame_to_ms(t0, &self.config),
                                hash,
                            });
                            emitted += 1;
                            if emitted >= self.config.mppp {
                                break 'anchors;
                            }
                        }
                    }
                }
                j -= 1;
            }
        }

        out
    }
}

fn frame_to_ms(frame: i64, config: &Config) -> f64 {
    frame as f64 * config.step as f64 * 1000.0 / config.sampling_rate as f64
}

fn pack_hash(f_past: usize, f_anchor: usize, dt: u32, half: usize) -> u32 {
    f_past as u32 + (half as u32) * (f_anchor as u32 + (half as u32) * dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn pcm_silence(seconds: f32, config: &Config) -> Vec<u8> {
        let n = (config.sampling_rate as f32 * seconds) as usize;
        vec![0u8; n * config.bytes_per_sample as usize]
    }

    fn pcm_tone(freq_hz: f32, seconds: f32, config: &Config) -> Vec<u8> {
        let n = (config.sampling_rate as f32 * seconds) as usize;
        let mut bytes = Vec::with_capacity(n * 2);
        for i in 0..n {
            let t = i as f32 / config.sampling_rate as f32;
            let sample = (0.5 * i16::MAX as f32 * (2.0 * PI * freq_hz * t).sin()) as i16;
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn silence_yields_no_fingerprints() {
        let config = Config::default();
        let pcm = pcm_silence(5.0, &config);
        let mut fp = Fingerprinter::new(config);
        let mut out = fp.push(&pcm);
        out.extend(fp.finish());
        assert!(out.is_empty());
    }

    #[test]
    fn short_input_yields_no_fingerprints() {
        let config = Config::default();
        let mut fp = Fingerprinter::new(config);
        let mut out = fp.push(&[0u8; 10]);
        out.extend(fp.finish());
        assert!(out.is_empty());
    }

    #[test]
    fn hashes_and_times_obey_invariants() {
        let config = Config::default();
        let pcm = pcm_tone(1000.0, 2.0, &config);
        let mut fp = Fingerprinter::new(config.clone());
        let mut out = fp.push(&pcm);
        out.extend(fp.finish());

        assert!(!out.is_empty(), "a steady tone should produce fingerprints");

        let half = (config.nfft / 2) as u32;
        let mut last_time = f64::NEG_INFINITY;
        for print in &out {
            assert!(print.time_ms >= last_time);
            last_time = print.time_ms;

            // time_ms must equal t*STEP*1000/SAMPLING_RATE for some t >= 0.
            let exact_t = print.time_ms * config.sampling_rate as f64
                / (config.step as f64 * 1000.0);
            let rounded_t = exact_t.round();
            assert!(rounded_t >= 0.0);
            assert!((exact_t - rounded_t).abs() < 1e-6);

            let f_past = print.hash % half;
            let f_anchor = (print.hash / half) % half;
            let dt = print.hash / (half * half);

            assert_ne!(f_anchor, f_past);
            assert!((f_anchor as i64 - f_past as i64).unsigned_abs() < config.window_df as u64);
            assert!(dt as i64 <= config.window_dt);
            assert!(print.hash < half * half * (config.window_dt as u32 + 1));
        }
    }

    #[test]
    fn anchor_frame_never_exceeds_mppp() {
        let config = Config::default();
        let pcm = pcm_tone(1000.0, 2.0, &config);
        let mut fp = Fingerprinter::new(config.clone());
        let mut out = fp.push(&pcm);
        out.extend(fp.finish());

        let mut counts = std::collections::HashMap::new();
        for print in &out {
            *counts.entry(print.time_ms.to_bits()).or_insert(0usize) += 1;
        }
        for count in counts.values() {
            assert!(*count <= config.mppp);
        }
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let config = Config::default();
        let pcm = pcm_tone(1000.0, 2.0, &config);

        let mut fp1 = Fingerprinter::new(config.clone());
        let mut out1 = fp1.push(&pcm);
        out1.extend(fp1.finish());

        let mut fp2 = Fingerprinter::new(config);
        let mut out2 = fp2.push(&pcm);
        out2.extend(fp2.finish());

        assert_eq!(out1, out2);
    }

    #[test]
    fn chunk_boundaries_do_not_affect_output() {
        let config = Config::default();
        let pcm = pcm_tone(1000.0, 2.0, &config);

        let mut whole = Fingerprinter::new(config.clone());
        let mut whole_out = whole.push(&pcm);
        whole_out.extend(whole.finish());

        let mut chunked = Fingerprinter::new(config);
        let mut chunked_out = Vec::new();
        for chunk in pcm.chunks(37) {
            chunked_out.extend(chunked.push(chunk));
        }
        chunked_out.extend(chunked.finish());

        assert_eq!(whole_out, chunked_out);
    }

    #[test]
    fn buffer_compaction_does_not_alter_output() {
        let mut config = Config::default();
        config.buffer_soft_cap_bytes = 4096;
        let pcm = pcm_tone(1000.0, 2.0, &config);

        let mut small_cap = Fingerprinter::new(config.clone());
        let mut small_cap_out = small_cap.push(&pcm);
        small_cap_out.extend(small_cap.finish());

        config.buffer_soft_cap_bytes = 10_000_000;
        let mut large_cap = Fingerprinter::new(config);
        let mut large_cap_out = large_cap.push(&pcm);
        large_cap_out.extend(large_cap.finish());

        assert_eq!(small_cap_out, large_cap_out);
    }
}
