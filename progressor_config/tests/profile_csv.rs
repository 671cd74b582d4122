use std::fs;
use std::io::Write;

use progressor_config::{ProfileRow, load_weight_profile_csv};
use tempfile::tempdir;

fn write_csv(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("profile.csv");
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn loads_ordered_profile() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "t_ms,kg\n0,0.0\n500, 12.5\n500,13.0\n1500,4.25\n");
    let rows = load_weight_profile_csv(&path).expect("valid profile");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], ProfileRow { t_ms: 500, kg: 12.5 });
    assert_eq!(rows[3].kg, 4.25);
}

#[test]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "time,weight\n0,1.0\n");
    let err = load_weight_profile_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("must have headers 't_ms,kg'"));
}

#[test]
fn rejects_time_going_backwards() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "t_ms,kg\n100,1.0\n50,2.0\n");
    let err = load_weight_profile_csv(&path).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("row 3"), "{msg}");
    assert!(msg.contains("backwards"), "{msg}");
}

#[test]
fn rejects_empty_profile() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "t_ms,kg\n");
    assert!(load_weight_profile_csv(&path).is_err());
}

#[test]
fn rejects_garbage_row() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "t_ms,kg\n0,abc\n");
    let err = load_weight_profile_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("invalid CSV row 2"));
}
