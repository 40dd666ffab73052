use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;

use crate::error::AnalysisError;
use crate::signal::Signal;

/// A decoded stream together with the metadata the reports use.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub signal: Signal,
    pub title: Option<String>,
    /// Size of the encoded input, 0 when unknown.
    pub source_bytes: u64,
}

/// Decode an in-memory container. `extension` is an optional format hint.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Signal, AnalysisError> {
    let total = bytes.len() as u64;
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }
    decode_source(Box::new(Cursor::new(bytes)), &hint, total, |_| {}).map(|d| d.signal)
}

/// Decode an audio file into a [`Signal`].
pub fn decode_file(path: &Path) -> Result<DecodedAudio, AnalysisError> {
    decode_file_with_progress(path, |_| {})
}

/// Decode an audio file, reporting the fraction of bytes consumed.
pub fn decode_file_with_progress(
    path: &Path,
    on_progress: impl Fn(f32),
) -> Result<DecodedAudio, AnalysisError> {
    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    decode_source(Box::new(file), &hint, file_size, on_progress)
}

/// Decode audio from STDIN using a container hint such as `flac` or `wav`.
pub fn decode_stdin(format_hint: &str) -> Result<DecodedAudio, AnalysisError> {
    let source = ReadOnlySource::new(std::io::stdin());
    let mut hint = Hint::new();
    hint.with_extension(format_hint);
    decode_source(Box::new(source), &hint, 0, |_| {})
}

fn extract_title(format: &mut dyn FormatReader) -> Option<String> {
    let metadata = format.metadata();
    let current = metadata.current()?;
    current
        .tags()
        .iter()
        .find(|tag| tag.std_key == Some(StandardTagKey::TrackTitle))
        .map(|tag| tag.value.to_string())
}

fn decode_source(
    source: Box<dyn MediaSource>,
    hint: &Hint,
    total_bytes: u64,
    on_progress: impl Fn(f32),
) -> Result<DecodedAudio, AnalysisError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe().format(
        hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AnalysisError::NoAudioTrack)?;

    let codec_params = track.codec_params.clone();
    let track_id = track.id;
    let title = extract_title(format.as_mut());

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channels: Vec<Vec<f32>> = codec_params
        .channels
        .map(|c| vec![Vec::new(); c.count()])
        .unwrap_or_default();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut sample_buf_capacity: u64 = 0;
    let mut bytes_decoded: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        bytes_decoded += packet.data.len() as u64;
        if total_bytes > 0 {
            on_progress((bytes_decoded as f32 / total_bytes as f32).min(1.0));
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames() as u64;
        let count = spec.channels.count();

        if channels.len() != count {
            if channels.iter().all(Vec::is_empty) {
                channels = vec![Vec::new(); count];
            } else {
                return Err(AnalysisError::InvalidSignal(format!(
                    "channel count changed from {} to {} mid-stream",
                    channels.len(),
                    count
                )));
            }
        }
        sample_rate.get_or_insert(spec.rate);

        // Reuse the buffer across packets; only reallocate when it is too small
        if sample_buf.is_none() || sample_buf_capacity < num_frames {
            sample_buf = Some(SampleBuffer::new(num_frames, spec));
            sample_buf_capacity = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };

        buf.copy_interleaved_ref(decoded);
        let samples = buf.samples();
        for (ch, out) in channels.iter_mut().enumerate() {
            out.extend(samples.iter().skip(ch).step_by(count));
        }
    }

    on_progress(1.0);

    let sample_rate = sample_rate
        .ok_or_else(|| AnalysisError::InvalidSignal("unknown sample rate".to_string()))?;
    let signal = Signal::new(sample_rate, channels)?;

    log::info!(
        "Decoded audio: {} channels, {} Hz, {:.2}s",
        signal.channel_count(),
        signal.sample_rate(),
        signal.duration_secs()
    );

    Ok(DecodedAudio {
        signal,
        title,
        source_bytes: total_bytes,
    })
}
