use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::warn;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use walkdir::WalkDir;

use crate::RevMixError;

/// One probed audio file: base name plus duration in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct WavInfo {
    pub filename: String,
    pub duration: f64,
}

/// Progress notifications emitted while a folder of audio files is probed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanProgress {
    /// Scanning starts; `total` files were found.
    Start { total: usize },
    /// Another file has been probed.
    Advance { completed: usize },
    /// Scanning finished.
    Finish,
}

/// Duration in seconds of a single audio file.
///
/// Uses the container-advertised frame count when available and falls back to
/// decoding the whole stream, counting frames and skipping over recoverable
/// decode errors.
pub fn wav_duration(path: &Path) -> Result<f64, RevMixError> {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| RevMixError::MissingDefaultTrack(path.to_path_buf()))?;
    if track.codec_params.codec == CODEC_TYPE_NULL {
        return Err(RevMixError::UnsupportedCodec(path.to_path_buf()));
    }

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| RevMixError::MissingSampleRate(path.to_path_buf()))? as u64;

    if let Some(n_frames) = track.codec_params.n_frames {
        return Ok(n_frames as f64 / sample_rate as f64);
    }

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut decoder = get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut total_frames: u64 = 0;
    while let Ok(packet) = reader.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => total_frames += decoded.frames() as u64,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => return Err(RevMixError::from(err)),
        }
    }

    Ok(total_frames as f64 / sample_rate as f64)
}

/// Probe every wav file directly inside `dir`.
///
/// The listing is non-recursive and sorted by file name so the resulting
/// manifest is deterministic. An empty or wav-free directory yields an empty
/// listing.
pub fn scan_durations(dir: &Path) -> Result<Vec<WavInfo>, RevMixError> {
    scan_durations_with_progress(dir, |_| {})
}

/// Like [`scan_durations`], reporting progress through `on_progress`.
pub fn scan_durations_with_progress<F>(
    dir: &Path,
    mut on_progress: F,
) -> Result<Vec<WavInfo>, RevMixError>
where
    F: FnMut(ScanProgress),
{
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_wav_extension(&path) {
            files.push(path);
        }
    }
    files.sort();

    on_progress(ScanProgress::Start { total: files.len() });

    let mut infos = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let duration = wav_duration(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        infos.push(WavInfo { filename, duration });
        on_progress(ScanProgress::Advance {
            completed: index + 1,
        });
    }

    on_progress(ScanProgress::Finish);
    Ok(infos)
}

/// List the isolated-event wav files stored below the subdirectories of `root`.
///
/// Each mixture's separated sources live in their own subdirectory; the
/// returned paths are relative to `root` and sorted. Files directly inside
/// `root` are not part of any mixture and are ignored; non-wav files below a
/// mixture directory are skipped with a warning.
pub fn list_isolated_wavs(root: &Path) -> Result<Vec<PathBuf>, RevMixError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut files = Vec::new();
    for dir in dirs {
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if has_wav_extension(path) {
                let relative = path.strip_prefix(root).unwrap_or(path);
                files.push(relative.to_path_buf());
            } else {
                warn!(
                    "skipping non-wav file in isolated source folder: {}",
                    path.display()
                );
            }
        }
    }

    files.sort();
    Ok(files)
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}
