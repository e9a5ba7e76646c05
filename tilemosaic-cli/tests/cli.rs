//! End-to-end tests for the `tilemosaic` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn write_config(dir: &Path) -> PathBuf {
    let lut = dir.join("geo_tile_node_LUT.xml");
    let config = format!(
        "[domain]\n\
         area_id = geo\n\
         projection = lonlat\n\
         extent = -10, 40, 10, 60\n\
         xscale = 0.1\n\
         yscale = 0.1\n\
         \n\
         [tiles]\n\
         rows = 1\n\
         cols = 2\n\
         \n\
         [lut]\n\
         path = {}\n",
        lut.display()
    );
    let path = dir.join("config.ini");
    fs::write(&path, config).unwrap();
    path
}

fn tilemosaic(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tilemosaic"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_tiles_lists_regular_split() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = tilemosaic(&config, &["tiles"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("geo_r0c0"));
    assert!(out.contains("geo_r0c1"));
    assert!(out.contains("0,100"));
    assert!(out.contains("2 tiles"));
}

#[test]
fn test_partition_then_show_and_invalidate() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());
    let lut_path = temp.path().join("geo_tile_node_LUT.xml");

    let output = tilemosaic(
        &config,
        &[
            "partition",
            "--source",
            "west,-5,50,0,100000",
            "--source",
            "middle,0,50,0,200000",
            "--source",
            "far,120,0,0,100000",
        ],
    );
    assert!(output.status.success(), "{:?}", output);
    let out = stdout(&output);
    assert!(out.contains("geo_r0c0: middle, west") || out.contains("geo_r0c0: west, middle"));
    assert!(out.contains("geo_r0c1: middle"));
    assert!(out.contains("outside: far"));
    assert!(out.contains("3 classified, 0 from table"));
    assert!(lut_path.exists());

    let xml = fs::read_to_string(&lut_path).unwrap();
    assert!(xml.contains("geo_r0c0"));

    // Second run is served from the table
    let output = tilemosaic(&config, &["partition", "--source", "west,-5,50,0,100000"]);
    assert!(stdout(&output).contains("0 classified, 1 from table"));

    let output = tilemosaic(&config, &["lut", "show"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("outside: far"));
    assert!(out.contains("3 classified sources"));

    let output = tilemosaic(&config, &["lut", "invalidate", "far"]);
    assert!(output.status.success());
    let output = tilemosaic(&config, &["lut", "show"]);
    assert!(stdout(&output).contains("outside: none"));
}

#[test]
fn test_invalidate_unknown_source_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path());

    let output = tilemosaic(&config, &["lut", "invalidate", "nowhere"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nowhere"));
}

#[test]
fn test_misaligned_tiles_are_rejected() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.ini");
    fs::write(
        &config,
        "[domain]\n\
         area_id = geo\n\
         extent = 0, 0, 100, 100\n\
         xscale = 1\n\
         yscale = 1\n\
         \n\
         [tile.A]\n\
         extent = 0, 0, 50.5, 100\n\
         \n\
         [tile.B]\n\
         extent = 50.5, 0, 100, 100\n",
    )
    .unwrap();

    let output = tilemosaic(&config, &["tiles"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid tile grid"));
}

#[test]
fn test_scale_in_wrong_units_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.ini");
    fs::write(
        &config,
        "[domain]\n\
         area_id = gemNA\n\
         projection = merc\n\
         extent = 0, 0, 8000000, 6000000\n\
         xscale = 0.0001\n\
         yscale = 0.0001\n\
         \n\
         [tiles]\n\
         rows = 1\n\
         cols = 1\n",
    )
    .unwrap();

    let output = tilemosaic(&config, &["tiles"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid tile grid"));
}
