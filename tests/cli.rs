use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

fn chunktar_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chunktar"));
    cmd.env_remove("CHUNKTAR_KEY");
    cmd
}

fn run_in(dir: &Path, args: &[&str]) -> Result<Output, Box<dyn Error>> {
    Ok(chunktar_command().current_dir(dir).args(args).output()?)
}

#[test]
fn split_then_join_in_working_directory() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let data: Vec<u8> = (0..10_000).map(|i| (i * 17 % 256) as u8).collect();
    fs::write(dir.path().join("archive.tar.gz"), &data)?;

    let split = run_in(dir.path(), &["split", "archive.tar.gz", "-s", "4K", "-e", KEY_HEX])?;
    assert!(
        split.status.success(),
        "split failed: {}",
        String::from_utf8_lossy(&split.stderr)
    );
    let stdout = String::from_utf8(split.stdout)?;
    assert!(stdout.contains("Wrote 3 chunk(s)"), "unexpected output: {}", stdout);
    assert!(stdout.contains("Done."));

    for index in 0..3 {
        assert!(dir.path().join(format!("archive.tar.gz.{:02}", index)).exists());
    }

    let join = run_in(dir.path(), &["join", "archive.tar.gz", "-e", KEY_HEX])?;
    assert!(
        join.status.success(),
        "join failed: {}",
        String::from_utf8_lossy(&join.stderr)
    );

    let joined = fs::read(dir.path().join("joined_archive.tar.gz"))?;
    assert_eq!(joined, data, "joined output must match the source file");

    Ok(())
}

#[test]
fn join_with_wrong_key_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("data.bin"), b"some payload bytes")?;

    let split = run_in(dir.path(), &["split", "-q", "data.bin", "-e", KEY_HEX])?;
    assert!(split.status.success());

    let other_key = "ff".repeat(32);
    let join = run_in(
        dir.path(),
        &["join", "-q", "data.bin", "-e", &other_key, "-o", "out.bin"],
    )?;
    assert!(!join.status.success(), "join with the wrong key must fail");
    let stderr = String::from_utf8_lossy(&join.stderr);
    assert!(stderr.contains("key mismatch"), "unexpected stderr: {}", stderr);

    Ok(())
}

#[test]
fn key_can_come_from_environment() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("env.bin"), b"keyed through the environment")?;

    let split = chunktar_command()
        .current_dir(dir.path())
        .env("CHUNKTAR_KEY", KEY_HEX)
        .args(["split", "-q", "env.bin"])
        .output()?;
    assert!(split.status.success());
    // Encrypted chunk carries the 20-byte frame header
    assert_eq!(fs::metadata(dir.path().join("env.bin.00"))?.len(), 29 + 20);

    let join = chunktar_command()
        .current_dir(dir.path())
        .env("CHUNKTAR_KEY", KEY_HEX)
        .args(["join", "-q", "env.bin"])
        .output()?;
    assert!(join.status.success());
    assert_eq!(
        fs::read(dir.path().join("joined_env.bin"))?,
        b"keyed through the environment"
    );

    Ok(())
}

#[test]
fn invalid_key_is_rejected_before_splitting() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.bin"), b"abc")?;

    // 15 bytes
    let short_key = "00".repeat(15);
    let split = run_in(dir.path(), &["split", "input.bin", "-e", &short_key])?;
    assert!(!split.status.success());
    assert!(!dir.path().join("input.bin.00").exists());

    Ok(())
}

#[test]
fn invalid_split_size_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("input.bin"), b"abc")?;

    let split = run_in(dir.path(), &["split", "input.bin", "-s", "12Q"])?;
    assert!(!split.status.success());
    assert!(!dir.path().join("input.bin.00").exists());

    Ok(())
}

#[test]
fn info_lists_chunk_set() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("photo.raw"), vec![0u8; 2500])?;

    let split = run_in(dir.path(), &["split", "-q", "photo.raw", "-s", "1000"])?;
    assert!(split.status.success());

    let info = run_in(dir.path(), &["info", "photo.raw"])?;
    assert!(info.status.success());
    let stdout = String::from_utf8(info.stdout)?;
    assert!(stdout.contains("Chunks: 3"), "unexpected info: {}", stdout);

    Ok(())
}

#[test]
fn join_without_chunks_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let join = run_in(dir.path(), &["join", "-q", "ghost.bin"])?;
    assert!(!join.status.success());
    assert!(!dir.path().join("joined_ghost.bin").exists());

    Ok(())
}

#[test]
fn version_flag_prints_build_information() -> Result<(), Box<dyn Error>> {
    let output = chunktar_command().arg("--version").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("chunktar "), "unexpected version line: {}", stdout);

    Ok(())
}

#[test]
fn running_without_subcommand_displays_help() -> Result<(), Box<dyn Error>> {
    let output = chunktar_command().output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: chunktar"), "help output missing usage: {}", stdout);
    assert!(stdout.contains("Commands:"));

    Ok(())
}
