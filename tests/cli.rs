use std::io::Cursor;
use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use image::{ImageFormat, Rgb, RgbImage};
use predicates::prelude::*;
use rstest::*;

macro_rules! cargo_run {
    ($cmd:expr, $($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin($cmd)?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

fn png(seed: u8) -> Vec<u8> {
    let image = RgbImage::from_fn(12, 9, |x, y| Rgb([seed, (x * 20) as u8, (y * 25) as u8]));
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

/// a.png 与 b.png 内容相同，c.png 不同，另有一个不会被扫描的文本文件
#[fixture]
fn dataset() -> assert_fs::TempDir {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("a.png").write_binary(&png(1)).unwrap();
    dir.child("b.png").write_binary(&png(1)).unwrap();
    dir.child("c.png").write_binary(&png(2)).unwrap();
    dir.child("notes.txt").write_str("not an image").unwrap();
    dir
}

#[rstest]
fn add_dedup(dataset: assert_fs::TempDir) -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;

    cargo_run!("imembed", "-c", conf_dir.path(), "add", dataset.path(), "--jobs", "1")
        .success()
        .stdout(predicate::str::contains("a.png"))
        .stdout(predicate::str::contains("notes.txt").not());

    cargo_run!("imembed", "-c", conf_dir.path(), "list", "--output-format", "json")
        .success()
        .stdout(predicate::str::diff("[1,2]\n"));

    // 再次添加不会产生新记录
    cargo_run!("imembed", "-c", conf_dir.path(), "add", dataset.path(), "--jobs", "1").success();
    cargo_run!("imembed", "-c", conf_dir.path(), "list")
        .success()
        .stdout(predicate::str::diff("1\n2\n"));

    Ok(())
}

#[rstest]
fn show_record(dataset: assert_fs::TempDir) -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;

    cargo_run!("imembed", "-c", conf_dir.path(), "add", dataset.child("c.png").path()).success();

    cargo_run!("imembed", "-c", conf_dir.path(), "show", "1")
        .success()
        .stdout(predicate::str::contains("\"id\": 1"))
        .stdout(predicate::str::contains("c.png"))
        .stdout(predicate::str::contains("\"dimension\": 256"))
        .stdout(predicate::str::contains("\"embedding\"").not());

    cargo_run!("imembed", "-c", conf_dir.path(), "show", "1", "--embedding")
        .success()
        .stdout(predicate::str::contains("\"embedding\""));

    cargo_run!("imembed", "-c", conf_dir.path(), "show", "42").failure();

    Ok(())
}

#[rstest]
fn clear_then_add(dataset: assert_fs::TempDir) -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;

    cargo_run!("imembed", "-c", conf_dir.path(), "add", dataset.path(), "--jobs", "1").success();

    cargo_run!("imembed", "-c", conf_dir.path(), "clear", "--yes")
        .success()
        .stdout(predicate::str::diff("committed\n"));

    cargo_run!("imembed", "-c", conf_dir.path(), "list", "--output-format", "json")
        .success()
        .stdout(predicate::str::diff("[]\n"));

    // ID 不会复用
    cargo_run!("imembed", "-c", conf_dir.path(), "add", dataset.child("a.png").path()).success();
    cargo_run!("imembed", "-c", conf_dir.path(), "list")
        .success()
        .stdout(predicate::str::diff("3\n"));

    Ok(())
}

#[test]
fn digest_is_pinned() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let image = conf_dir.child("a.png");
    image.write_binary(&png(5))?;

    cargo_run!("imembed", "-c", conf_dir.path(), "add", "-H", "blake3", image.path()).success();
    cargo_run!("imembed", "-c", conf_dir.path(), "add", "-H", "sha256", image.path()).failure();
    cargo_run!("imembed", "-c", conf_dir.path(), "add", image.path()).success();

    Ok(())
}

#[test]
fn read_only_commands_leave_digest_unset() -> Result<()> {
    let conf_dir = assert_fs::TempDir::new()?;
    let image = conf_dir.child("a.png");
    image.write_binary(&png(6))?;

    cargo_run!("imembed", "-c", conf_dir.path(), "list").success();
    cargo_run!("imembed", "-c", conf_dir.path(), "show", "1").failure();
    cargo_run!("imembed", "-c", conf_dir.path(), "clear", "--yes").success();

    cargo_run!("imembed", "-c", conf_dir.path(), "add", "-H", "blake3", image.path()).success();
    cargo_run!("imembed", "-c", conf_dir.path(), "add", "-H", "sha256", image.path()).failure();

    Ok(())
}
