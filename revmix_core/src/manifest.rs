use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::scan::{self, WavInfo};
use crate::RevMixError;

/// Header line of a durations manifest.
pub const DURATIONS_HEADER: &str = "filename\tduration";

/// Header line of a source-list manifest.
pub const SOURCE_LIST_HEADER: &str = "filename";

/// Write a durations manifest: one `filename<TAB>duration` row per file,
/// durations rendered with one decimal place. Parent directories are created.
pub fn write_durations_tsv(path: &Path, entries: &[WavInfo]) -> Result<(), RevMixError> {
    create_parent(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{DURATIONS_HEADER}")?;
    for entry in entries {
        writeln!(out, "{}\t{:.1}", entry.filename, entry.duration)?;
    }
    out.flush()?;
    Ok(())
}

/// Read a durations manifest written by [`write_durations_tsv`].
pub fn read_durations_tsv(path: &Path) -> Result<Vec<WavInfo>, RevMixError> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        if number == 1 {
            if line != DURATIONS_HEADER {
                return Err(format_error(path, number, "expected 'filename\\tduration' header"));
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let filename = fields.next().unwrap_or_default();
        let duration = match (fields.next(), fields.next()) {
            (Some(value), None) => value,
            _ => return Err(format_error(path, number, "expected exactly two fields")),
        };
        if filename.is_empty() {
            return Err(format_error(path, number, "empty filename"));
        }
        let duration: f64 = duration
            .parse()
            .map_err(|_| format_error(path, number, "duration is not a number"))?;

        entries.push(WavInfo {
            filename: filename.to_owned(),
            duration,
        });
    }

    Ok(entries)
}

/// Write a source-list manifest: a `filename` header and one path per row.
pub fn write_source_list_tsv(path: &Path, files: &[PathBuf]) -> Result<(), RevMixError> {
    create_parent(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{SOURCE_LIST_HEADER}")?;
    for file in files {
        writeln!(out, "{}", file.display())?;
    }
    out.flush()?;
    Ok(())
}

/// Read a source-list manifest written by [`write_source_list_tsv`].
pub fn read_source_list_tsv(path: &Path) -> Result<Vec<PathBuf>, RevMixError> {
    let reader = BufReader::new(File::open(path)?);
    let mut files = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        if number == 1 {
            if line != SOURCE_LIST_HEADER {
                return Err(format_error(path, number, "expected 'filename' header"));
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        files.push(PathBuf::from(line));
    }

    Ok(files)
}

/// Path of the cached durations manifest that belongs to a metadata file:
/// `X.tsv` becomes `X_durations.tsv`.
pub fn durations_cache_path(meta_tsv: &Path) -> PathBuf {
    let stem = meta_tsv
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match meta_tsv.extension() {
        Some(ext) => format!("{stem}_durations.{}", ext.to_string_lossy()),
        None => format!("{stem}_durations"),
    };
    meta_tsv.with_file_name(name)
}

/// Durations for the audio referenced by a metadata file, probing at most once.
///
/// If the cached manifest next to `meta_tsv` exists it is read back verbatim;
/// otherwise the audio directory (given, or derived through
/// [`metadata_to_audio_dir`]) is probed and the cache written.
pub fn cached_durations(
    meta_tsv: &Path,
    audio_dir: Option<&Path>,
) -> Result<Vec<WavInfo>, RevMixError> {
    let cache = durations_cache_path(meta_tsv);
    if cache.exists() {
        return read_durations_tsv(&cache);
    }

    let audio_dir = match audio_dir {
        Some(dir) => dir.to_path_buf(),
        None => metadata_to_audio_dir(meta_tsv),
    };
    let entries = scan::scan_durations(&audio_dir)?;
    write_durations_tsv(&cache, &entries)?;
    Ok(entries)
}

/// Map a metadata file to its audio directory by the dataset layout
/// convention: swap the `metadata` path component for `audio` and drop the
/// extension. `dataset/metadata/train/synthetic.tsv` becomes
/// `dataset/audio/train/synthetic`.
pub fn metadata_to_audio_dir(meta_tsv: &Path) -> PathBuf {
    swap_component(meta_tsv, "metadata", "audio").with_extension("")
}

/// Inverse of [`metadata_to_audio_dir`].
pub fn audio_dir_to_metadata(audio_dir: &Path) -> PathBuf {
    swap_component(audio_dir, "audio", "metadata").with_extension("tsv")
}

fn swap_component(path: &Path, from: &str, to: &str) -> PathBuf {
    path.iter()
        .map(|part| {
            if part == OsStr::new(from) {
                OsStr::new(to)
            } else {
                part
            }
        })
        .collect()
}

fn create_parent(path: &Path) -> Result<(), RevMixError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn format_error(path: &Path, line: usize, message: &str) -> RevMixError {
    RevMixError::ManifestFormat {
        path: path.to_path_buf(),
        line,
        message: message.to_owned(),
    }
}
