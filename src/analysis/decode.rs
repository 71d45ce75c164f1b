//! Audio decoding to mono PCM using symphonia

use crate::error::AnalysisError;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Mono PCM at a known rate
#[derive(Debug, Clone)]
pub struct MonoBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoBuffer {
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 samples at `target_rate` (or the native
/// rate when it is already lower)
pub fn decode_to_mono(path: &Path, target_rate: u32) -> Result<MonoBuffer, AnalysisError> {
    let unreadable = |reason: String| AnalysisError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };
    let unsupported = |reason: String| AnalysisError::Unsupported {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| unsupported(format!("probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| unsupported("no audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| unsupported("no sample rate in audio track".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unsupported(format!("no decoder: {}", e)))?;

    let mut all_samples: Vec<f32> = Vec::new();
    let mut decoded_packets = 0usize;
    let mut failed_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                failed_packets += 1;
                log::debug!("Error decoding packet: {:?}", e);
                continue;
            }
        };
        decoded_packets += 1;

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let channels = spec.channels.count();
        if channels > 1 {
            all_samples.extend(
                sample_buf
                    .samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        } else {
            all_samples.extend_from_slice(sample_buf.samples());
        }
    }

    if decoded_packets == 0 {
        return Err(unreadable(format!(
            "no decodable audio ({} corrupt packets)",
            failed_packets
        )));
    }
    if failed_packets > 0 {
        log::warn!(
            "{} of {} packets failed to decode in {:?}",
            failed_packets,
            failed_packets + decoded_packets,
            path
        );
    }

    log::debug!(
        "Decoded {} samples ({:.1}s) at {}Hz from {:?}",
        all_samples.len(),
        all_samples.len() as f64 / sample_rate as f64,
        sample_rate,
        path
    );

    Ok(downsample(
        MonoBuffer {
            samples: all_samples,
            sample_rate,
        },
        target_rate,
    ))
}

/// Reduce the sample rate by box-averaging; never upsamples
pub fn downsample(buffer: MonoBuffer, target_rate: u32) -> MonoBuffer {
    if target_rate == 0 || buffer.sample_rate <= target_rate || buffer.samples.is_empty() {
        return buffer;
    }

    let ratio = buffer.sample_rate as f64 / target_rate as f64;
    let out_len = (buffer.samples.len() as f64 / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let start = (i as f64 * ratio).floor() as usize;
        let end = (((i + 1) as f64 * ratio).floor() as usize)
            .min(buffer.samples.len())
            .max(start + 1);
        let chunk = &buffer.samples[start..end];
        out.push(chunk.iter().sum::<f32>() / chunk.len() as f32);
    }

    MonoBuffer {
        samples: out,
        sample_rate: target_rate,
    }
}
