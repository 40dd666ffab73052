use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use phasescope::analyzer::{self, AnalyzerConfig};
use phasescope::cache;
use phasescope::decode;
use phasescope::format;
use phasescope::models::{BatchReport, FileReport};
use phasescope::AnalysisError;

/// Encode deinterleaved channels as a 16-bit PCM WAV file in memory.
fn wav_bytes(sample_rate: u32, channels: &[Vec<f32>]) -> Vec<u8> {
    let num_channels = channels.len() as u16;
    let bits_per_sample: u16 = 16;
    let num_frames = channels[0].len();
    let byte_rate = sample_rate * num_channels as u32 * bits_per_sample as u32 / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = (num_frames * num_channels as usize * (bits_per_sample as usize / 8)) as u32;

    let mut out = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    for i in 0..num_frames {
        for channel in channels {
            let sample_i16 = (channel[i] * i16::MAX as f32) as i16;
            out.extend_from_slice(&sample_i16.to_le_bytes());
        }
    }

    out
}

fn write_wav(dir: &Path, filename: &str, sample_rate: u32, channels: &[Vec<f32>]) -> PathBuf {
    let path = dir.join(filename);
    std::fs::write(&path, wav_bytes(sample_rate, channels)).unwrap();
    path
}

fn sine(frequency: f32, amplitude: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

fn negate(samples: &[f32]) -> Vec<f32> {
    samples.iter().map(|s| -s).collect()
}

/// Stereo file whose channels are exact opposites.
fn write_inverted(dir: &Path, filename: &str) -> PathBuf {
    let left = sine(440.0, 0.8, 1.0, 44100);
    let right = negate(&left);
    write_wav(dir, filename, 44100, &[left, right])
}

/// Stereo file with the same content in both channels.
fn write_dual_mono(dir: &Path, filename: &str) -> PathBuf {
    let wave = sine(440.0, 0.8, 1.0, 44100);
    write_wav(dir, filename, 44100, &[wave.clone(), wave])
}

// --- Decoding ---

#[test]
fn test_decode_bytes_deinterleaves_channels() {
    let left = vec![0.5f32; 480];
    let right = vec![-0.25f32; 480];
    let signal = decode::decode_bytes(wav_bytes(48000, &[left, right]), Some("wav")).unwrap();

    assert_eq!(signal.sample_rate(), 48000);
    assert_eq!(signal.channel_count(), 2);
    assert_eq!(signal.frames(), 480);
    assert!((signal.channels()[0][10] - 0.5).abs() < 0.001);
    assert!((signal.channels()[1][10] + 0.25).abs() < 0.001);
}

#[test]
fn test_decode_rejects_unrecognized_bytes() {
    let err = decode::decode_bytes(b"definitely not audio".to_vec(), None).unwrap_err();
    assert!(matches!(err, AnalysisError::Decode(_)), "got {:?}", err);
}

#[test]
fn test_decode_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = decode::decode_file(&dir.path().join("missing.wav")).unwrap_err();
    assert!(matches!(err, AnalysisError::Io { .. }));
}

// --- Analysis ---

#[test]
fn test_inverted_stereo_flags_phase_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_inverted(dir.path(), "inverted.wav");

    let report = analyzer::analyze_file(&path, &AnalyzerConfig::default()).unwrap();

    assert_eq!(report.channels.len(), 3);
    assert!(report.channels[0].volume < 1e-6, "downmix should cancel");
    assert!(report.channels[1].volume > 1.0);
    assert!(report.channels[2].volume > 1.0);
    assert!(report.mono_ratio < 0.3);
    assert!(report.phase_warning);
}

#[test]
fn test_dual_mono_ratio_near_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dual_mono(dir.path(), "dual.wav");

    let report = analyzer::analyze_file(&path, &AnalyzerConfig::default()).unwrap();

    assert!(
        (report.mono_ratio - 1.0).abs() < 0.05,
        "expected ratio near 1.0, got {:.4}",
        report.mono_ratio
    );
    assert!(!report.phase_warning);
}

#[test]
fn test_constant_opposed_channels_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(
        dir.path(),
        "opposed.wav",
        48000,
        &[vec![0.5; 96000], vec![-0.5; 96000]],
    );

    let report = analyzer::analyze_file(&path, &AnalyzerConfig::default()).unwrap();

    assert!((report.duration_secs - 2.0).abs() < 1e-9);
    assert_eq!(report.channels[0].volume, 0.0);
    // 4173 buckets of ~0.5 each
    assert!((report.channels[1].volume - 2086.5).abs() < 1.0);
    assert!((report.channels[2].volume - 2086.5).abs() < 1.0);
    assert_eq!(report.mono_ratio, 0.0);
    assert!(report.phase_warning);
}

#[test]
fn test_silent_file_reports_zero_ratio() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "silence.wav", 44100, &[vec![0.0; 44100], vec![0.0; 44100]]);

    let report = analyzer::analyze_file(&path, &AnalyzerConfig::default()).unwrap();

    assert!(report.channels.iter().all(|c| c.volume == 0.0));
    assert_eq!(report.mono_ratio, 0.0);
    assert!(!report.phase_warning);
}

#[test]
fn test_mono_file_uses_stem_as_title() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "voice memo.wav", 22050, &[sine(220.0, 0.5, 0.5, 22050)]);

    let report = analyzer::analyze_file(&path, &AnalyzerConfig::default()).unwrap();

    assert_eq!(report.title, "voice memo");
    assert_eq!(report.filename, "voice memo.wav");
    assert_eq!(report.channel_count, 1);
    assert_eq!(report.channels[1].label, "Mono");
    assert!((report.mono_ratio - 1.0).abs() < 1e-9);
}

#[test]
fn test_waveform_width_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dual_mono(dir.path(), "dual.wav");
    let config = AnalyzerConfig {
        waveform_width: Some(24),
        ..Default::default()
    };

    let report = analyzer::analyze_file(&path, &config).unwrap();

    for channel in &report.channels {
        assert!(!channel.waveform.is_empty());
        assert!(channel.waveform.len() <= 24);
    }
}

#[test]
fn test_corrupt_file_fails_whole_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, b"fake").unwrap();

    let err = analyzer::analyze_file(&path, &AnalyzerConfig::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to analyze"));
}

#[test]
fn test_analyze_directory_keeps_filename_order() {
    let dir = tempfile::tempdir().unwrap();
    write_inverted(dir.path(), "02-inverted.wav");
    write_dual_mono(dir.path(), "01-dual.wav");
    std::fs::write(dir.path().join("cover.jpg"), b"fake").unwrap();

    let result = analyzer::analyze_directory(dir.path(), 2, &AnalyzerConfig::default()).unwrap();

    assert_eq!(result.files.len(), 2);
    assert_eq!(result.files[0].filename, "01-dual.wav");
    assert_eq!(result.files[1].filename, "02-inverted.wav");
    assert_eq!(result.warnings, 1);
}

#[test]
fn test_analyze_directory_without_audio_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"fake").unwrap();

    let err = analyzer::analyze_directory(dir.path(), 2, &AnalyzerConfig::default()).unwrap_err();
    assert!(err.to_string().contains("No audio files found"));
}

#[test]
fn test_scan_audio_files() {
    let dir = tempfile::tempdir().unwrap();

    std::fs::write(dir.path().join("track.flac"), b"fake").unwrap();
    std::fs::write(dir.path().join("track.mp3"), b"fake").unwrap();
    std::fs::write(dir.path().join("cover.jpg"), b"fake").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"fake").unwrap();

    let files = analyzer::scan_audio_files(dir.path());
    assert_eq!(files.len(), 2);
    assert!(files[0].extension().unwrap() == "flac");
    assert!(files[1].extension().unwrap() == "mp3");
}

#[test]
fn test_batch_table_and_text_report() {
    let dir = tempfile::tempdir().unwrap();
    write_inverted(dir.path(), "inverted.wav");
    let result = analyzer::analyze_directory(dir.path(), 1, &AnalyzerConfig::default()).unwrap();

    let table = format::format_table(&result);
    cache::save_text_report(dir.path(), &table).unwrap();

    let txt = std::fs::read_to_string(dir.path().join("phase_report.txt")).unwrap();
    assert!(txt.contains("PHASE CANCELLATION"));
    assert!(txt.contains("Phase warnings:   1"));
}

// --- CLI ---

#[test]
fn test_cli_single_file_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_inverted(dir.path(), "inverted.wav");

    let output = cargo_bin_cmd!("phasescope")
        .args([path.to_str().unwrap(), "--json", "--waveform", "16"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: FileReport = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report.phase_warning);
    assert_eq!(report.channels.len(), 3);
    assert!(report.channels.iter().all(|c| c.waveform.len() <= 16));
}

#[test]
fn test_cli_single_file_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_inverted(dir.path(), "inverted.wav");

    cargo_bin_cmd!("phasescope")
        .arg(path.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicates::str::contains("Downmix"))
        .stdout(predicates::str::contains("PHASE CANCELLATION"));
}

#[test]
fn test_cli_threshold_changes_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dual_mono(dir.path(), "dual.wav");

    cargo_bin_cmd!("phasescope")
        .args([path.to_str().unwrap(), "--threshold", "1.5"])
        .assert()
        .success()
        .stdout(predicates::str::contains("PHASE CANCELLATION"));
}

#[test]
fn test_cli_rejects_negative_threshold() {
    cargo_bin_cmd!("phasescope")
        .args([".", "--threshold=-1"])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "--threshold must be a non-negative number",
        ));
}

#[test]
fn test_cli_rejects_zero_waveform() {
    cargo_bin_cmd!("phasescope")
        .args([".", "--waveform", "0"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("--waveform must be at least 1"));
}

#[test]
fn test_cli_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.wav");

    cargo_bin_cmd!("phasescope")
        .arg(missing.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicates::str::contains("is not a file or directory"));
}

#[test]
fn test_cli_stdin_requires_format() {
    cargo_bin_cmd!("phasescope")
        .arg("-")
        .assert()
        .failure()
        .stderr(predicates::str::contains("--format is required"));
}

#[test]
fn test_cli_stdin_with_format() {
    let wave = sine(440.0, 0.8, 0.5, 44100);
    let bytes = wav_bytes(44100, &[wave.clone(), negate(&wave)]);

    let output = cargo_bin_cmd!("phasescope")
        .args(["-", "--format", "wav", "--json"])
        .write_stdin(bytes)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: FileReport = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report.title, "STDIN");
    assert!(report.phase_warning);
}

#[test]
fn test_cli_directory_writes_and_reuses_cache() {
    let dir = tempfile::tempdir().unwrap();
    write_inverted(dir.path(), "01-inverted.wav");
    write_dual_mono(dir.path(), "02-dual.wav");

    cargo_bin_cmd!("phasescope")
        .args([dir.path().to_str().unwrap(), "--txt"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Number of files:  2"));

    let json = std::fs::read_to_string(dir.path().join("phase_report.json")).unwrap();
    let parsed: BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.files.len(), 2);
    assert_eq!(parsed.warnings, 1);
    assert!(dir.path().join("phase_report.txt").exists());

    cargo_bin_cmd!("phasescope")
        .arg(dir.path().to_str().unwrap())
        .assert()
        .success()
        .stderr(predicates::str::contains("(loaded from cached report)"));

    cargo_bin_cmd!("phasescope")
        .args([dir.path().to_str().unwrap(), "--regenerate"])
        .assert()
        .success()
        .stderr(predicates::str::contains("Processed 2 files"));
}

#[test]
fn test_cli_directory_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_inverted(dir.path(), "inverted.wav");

    cargo_bin_cmd!("phasescope")
        .args([dir.path().to_str().unwrap(), "--csv"])
        .assert()
        .success()
        .stdout(predicates::str::starts_with(
            "Mono ratio,Channels,Duration,Phase warning,File\n",
        ))
        .stdout(predicates::str::contains(",2,0:01,true,inverted.wav"));
}

#[test]
fn test_cli_cache_is_rebuilt_when_threshold_changes() {
    let dir = tempfile::tempdir().unwrap();
    write_dual_mono(dir.path(), "dual.wav");

    cargo_bin_cmd!("phasescope")
        .arg(dir.path().to_str().unwrap())
        .assert()
        .success();

    let output = cargo_bin_cmd!("phasescope")
        .args([dir.path().to_str().unwrap(), "--threshold", "1.5", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("(loaded from cached report)"));

    let report: BatchReport = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report.warnings, 1);
    assert_eq!(report.phase_threshold, 1.5);

    // The rebuilt cache now serves the new threshold
    let json = std::fs::read_to_string(dir.path().join("phase_report.json")).unwrap();
    let cached: BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(cached.phase_threshold, 1.5);
    assert_eq!(cached.warnings, 1);
}

#[test]
fn test_cli_cache_is_rebuilt_when_waveform_requested() {
    let dir = tempfile::tempdir().unwrap();
    write_inverted(dir.path(), "inverted.wav");

    cargo_bin_cmd!("phasescope")
        .arg(dir.path().to_str().unwrap())
        .assert()
        .success();

    let output = cargo_bin_cmd!("phasescope")
        .args([dir.path().to_str().unwrap(), "--waveform", "8", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: BatchReport = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report.waveform_width, Some(8));
    assert!(report.files[0].channels.iter().all(|c| !c.waveform.is_empty()));
}
