use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

/// Generate a small single-channel WAV file for testing.
///
/// The fixtures are produced on the fly by emitting a PCM RIFF header followed
/// by procedurally generated sine-wave samples. This keeps the repository free
/// from committed binary assets while still exercising the probing pipeline
/// end-to-end.
fn write_test_tone<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    duration_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let total_samples = (sample_rate as u64 * duration_ms + 999) / 1_000;
    let mut samples = Vec::with_capacity(total_samples as usize * 2);

    for n in 0..total_samples {
        let theta = (n as f32 / sample_rate as f32) * 2.0 * std::f32::consts::PI * 440.0;
        let sample = (theta.sin() * i16::MAX as f32) as i16;
        samples.extend_from_slice(&sample.to_le_bytes());
    }

    let mut file = File::create(path)?;
    let data_len = samples.len() as u32;
    let chunk_size = 36u32 + data_len;
    file.write_all(b"RIFF")?;
    file.write_all(&chunk_size.to_le_bytes())?;
    file.write_all(b"WAVE")?;
    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?; // PCM header size
    file.write_all(&1u16.to_le_bytes())?; // audio format = PCM
    file.write_all(&1u16.to_le_bytes())?; // channels
    file.write_all(&sample_rate.to_le_bytes())?;
    let byte_rate = sample_rate * 2;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&2u16.to_le_bytes())?; // block align
    file.write_all(&16u16.to_le_bytes())?; // bits per sample
    file.write_all(b"data")?;
    file.write_all(&data_len.to_le_bytes())?;
    file.write_all(&samples)?;
    Ok(())
}

#[cfg(unix)]
fn write_fake_tool(dir: &Path, name: &str, script: &str) -> Result<std::path::PathBuf, Box<dyn Error>> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, script)?;
    let mut permissions = fs::metadata(&path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions)?;
    Ok(path)
}

#[test]
fn reverberate_dry_run_prints_the_invocation() -> Result<(), Box<dyn Error>> {
    let audio = tempdir()?;
    let rirs = tempdir()?;
    let work = tempdir()?;
    let output = work.path().join("soundscapes");

    let mut cmd = Command::cargo_bin("revmix")?;
    let assert = cmd
        .args(["reverberate", "--audio-dir"])
        .arg(audio.path())
        .arg("--rir-dir")
        .arg(rirs.path())
        .args(["--subset", "eval", "--workers", "4", "--output"])
        .arg(&output)
        .arg("--dry-run")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert!(stdout.starts_with("Dry run: "));
    assert!(stdout.contains("--rir_subset eval"));
    assert!(stdout.contains("--nproc 4"));
    assert!(stdout.contains("--mix_info_file"));

    assert!(!output.exists(), "dry run should not create the output dir");

    audio.close()?;
    rirs.close()?;
    work.close()?;
    Ok(())
}

#[test]
fn reverberate_reports_missing_audio_directory() -> Result<(), Box<dyn Error>> {
    let rirs = tempdir()?;
    let work = tempdir()?;

    let mut cmd = Command::cargo_bin("revmix")?;
    cmd.args(["reverberate", "--audio-dir"])
        .arg(work.path().join("nowhere"))
        .arg("--rir-dir")
        .arg(rirs.path())
        .arg("--output")
        .arg(work.path().join("out"))
        .assert()
        .failure()
        .stderr(contains("audio directory does not exist"));

    rirs.close()?;
    work.close()?;
    Ok(())
}

#[test]
fn reverberate_rejects_a_zero_worker_count() -> Result<(), Box<dyn Error>> {
    let audio = tempdir()?;
    let rirs = tempdir()?;
    let work = tempdir()?;

    let mut cmd = Command::cargo_bin("revmix")?;
    cmd.args(["reverberate", "--audio-dir"])
        .arg(audio.path())
        .arg("--rir-dir")
        .arg(rirs.path())
        .arg("--output")
        .arg(work.path().join("out"))
        .args(["--workers", "0"])
        .assert()
        .failure()
        .stderr(contains("worker count must be at least one"));

    audio.close()?;
    rirs.close()?;
    work.close()?;
    Ok(())
}

#[cfg(unix)]
#[test]
fn reverberate_invokes_the_tool_with_the_expected_arguments() -> Result<(), Box<dyn Error>> {
    let audio = tempdir()?;
    let rirs = tempdir()?;
    let work = tempdir()?;

    let args_file = work.path().join("args.txt");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}\"\n",
        args_file.display()
    );
    let tool = write_fake_tool(work.path(), "fake-tool", &script)?;
    let output = work.path().join("out/soundscapes");

    let mut cmd = Command::cargo_bin("revmix")?;
    cmd.args(["reverberate", "--audio-dir"])
        .arg(audio.path())
        .arg("--rir-dir")
        .arg(rirs.path())
        .args(["--subset", "validation", "--workers", "2", "--output"])
        .arg(&output)
        .arg("--tool")
        .arg(&tool)
        .assert()
        .success();

    assert!(output.is_dir(), "output directory should be created");

    let recorded = fs::read_to_string(&args_file)?;
    let lines: Vec<&str> = recorded.lines().collect();
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0], "--input_dir");
    assert_eq!(lines[4], "--rir_subset");
    assert_eq!(lines[5], "validation");
    assert_eq!(lines[14], "--nproc");
    assert_eq!(lines[15], "2");

    audio.close()?;
    rirs.close()?;
    work.close()?;
    Ok(())
}

#[cfg(unix)]
#[test]
fn reverberate_propagates_the_tool_exit_status() -> Result<(), Box<dyn Error>> {
    let audio = tempdir()?;
    let rirs = tempdir()?;
    let work = tempdir()?;

    let tool = write_fake_tool(work.path(), "fake-tool", "#!/bin/sh\nexit 7\n")?;

    let mut cmd = Command::cargo_bin("revmix")?;
    cmd.args(["reverberate", "--audio-dir"])
        .arg(audio.path())
        .arg("--rir-dir")
        .arg(rirs.path())
        .arg("--output")
        .arg(work.path().join("out"))
        .arg("--tool")
        .arg(&tool)
        .assert()
        .failure()
        .stderr(contains("failed to reverberate"))
        .stderr(contains("exit status: 7"));

    audio.close()?;
    rirs.close()?;
    work.close()?;
    Ok(())
}

#[test]
fn durations_prints_a_manifest_to_stdout() -> Result<(), Box<dyn Error>> {
    let audio = tempdir()?;
    write_test_tone(audio.path().join("b.wav"), 8_000, 500)?;
    write_test_tone(audio.path().join("a.wav"), 8_000, 1_100)?;

    let mut cmd = Command::cargo_bin("revmix")?;
    let assert = cmd.arg("durations").arg(audio.path()).assert().success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert_eq!(stdout, "filename\tduration\na.wav\t1.1\nb.wav\t0.5\n");

    audio.close()?;
    Ok(())
}

#[test]
fn durations_writes_a_manifest_file() -> Result<(), Box<dyn Error>> {
    let audio = tempdir()?;
    let work = tempdir()?;
    write_test_tone(audio.path().join("clip.wav"), 8_000, 500)?;
    let out = work.path().join("meta/synthetic_durations.tsv");

    let mut cmd = Command::cargo_bin("revmix")?;
    cmd.arg("durations")
        .arg(audio.path())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Wrote 1 duration(s)"));

    assert_eq!(
        fs::read_to_string(&out)?,
        "filename\tduration\nclip.wav\t0.5\n"
    );

    audio.close()?;
    work.close()?;
    Ok(())
}

#[test]
fn durations_reports_a_missing_folder() -> Result<(), Box<dyn Error>> {
    let work = tempdir()?;

    let mut cmd = Command::cargo_bin("revmix")?;
    cmd.arg("durations")
        .arg(work.path().join("nowhere"))
        .assert()
        .failure()
        .stderr(contains("failed to probe durations"));

    work.close()?;
    Ok(())
}

#[test]
fn sources_lists_isolated_wavs_relative_to_the_root() -> Result<(), Box<dyn Error>> {
    let root = tempdir()?;
    fs::create_dir_all(root.path().join("mix1/sub"))?;
    fs::create_dir_all(root.path().join("mix2"))?;
    fs::write(root.path().join("mix1/a.wav"), b"")?;
    fs::write(root.path().join("mix1/sub/b.wav"), b"")?;
    fs::write(root.path().join("mix2/c.wav"), b"")?;
    fs::write(root.path().join("mix2/notes.txt"), b"")?;

    let mut cmd = Command::cargo_bin("revmix")?;
    let assert = cmd.arg("sources").arg(root.path()).assert().success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert_eq!(
        stdout,
        "filename\nmix1/a.wav\nmix1/sub/b.wav\nmix2/c.wav\n"
    );

    root.close()?;
    Ok(())
}
