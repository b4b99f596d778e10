use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_vidsum")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "vidsum.exe"
            } else {
                "vidsum"
            });
            p
        })
}

#[test]
fn cli_subjects_lists_filtered_subjects() {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/objects.mp4.json");
    let out = std::process::Command::new(exe())
        .args(["subjects", "--annotations"])
        .arg(&fixture)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["000 cat 91% 10 fr."]);
    assert!(String::from_utf8_lossy(&out.stderr).contains("1 of 3 subjects kept"));
}

#[test]
fn cli_subjects_honors_config_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"filter":{"min_confidence":0.0,"min_frame_count":1}}"#,
    )
    .unwrap();
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/objects.mp4.json");

    let out = std::process::Command::new(exe())
        .args(["subjects", "--annotations"])
        .arg(&fixture)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8(out.stdout).unwrap().lines().count(), 3);
}

#[test]
fn cli_summary_rejects_a_missing_annotation_file() {
    let dir = tempfile::tempdir().unwrap();
    let status = std::process::Command::new(exe())
        .args(["summary", "--annotations"])
        .arg(dir.path().join("absent.mp4.json"))
        .status()
        .unwrap();
    assert!(!status.success());
}
