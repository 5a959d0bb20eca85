use std::fs;
use std::path::Path;

use label_triage::{
    canonicalize_or_current, infer_project_name, parse_filter, parse_offset, sha256_file,
};
use sha2::{Digest, Sha256};
use tempfile::tempdir;
use triage_core::services::filter::FilterMode;

#[test]
fn canonicalize_or_current_resolves_existing_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result = canonicalize_or_current(subdir.to_str().expect("utf8")).expect("canonicalize");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_absolute() {
    let result = canonicalize_or_current("does-not-exist-yet").expect("canonicalize");
    assert!(result.is_absolute());
    assert!(result.ends_with("does-not-exist-yet"));
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/tmp/sample-triage")), "sample-triage");
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

#[test]
fn sha256_file_matches_digest() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("matches.json");
    fs::write(&path, b"[]").expect("write");

    let mut hasher = Sha256::new();
    hasher.update(b"[]");
    assert_eq!(sha256_file(&path).expect("hash"), format!("{:x}", hasher.finalize()));
    assert!(sha256_file(&tmp.path().join("missing")).is_err());
}

#[test]
fn offsets_accept_hex_and_decimal() {
    assert_eq!(parse_offset("0x401000"), Ok(0x401000));
    assert_eq!(parse_offset("0XFF"), Ok(255));
    assert_eq!(parse_offset(" 4096 "), Ok(4096));
    assert!(parse_offset("0xzz").is_err());
    assert!(parse_offset("-1").is_err());
}

#[test]
fn filter_parser_reports_accepted_values() {
    assert_eq!(parse_filter("Conflicted"), Ok(FilterMode::Conflicted));
    let err = parse_filter("everything").expect_err("unknown filter");
    assert!(err.contains("applicable"));
}
