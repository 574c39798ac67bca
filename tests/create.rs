mod common;

use common::{MANIFEST_NAME, lines, manifest_names, overwrite_manifest, run_ok, sumtree_cmd};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

#[test]
fn create_records_every_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();

    let stdout = run_ok(temp.path(), "create", &[]);

    assert_eq!(lines(&stdout), vec!["+ ./a.txt", "+ ./b.txt"]);
    assert_eq!(manifest_names(temp.path()), vec!["a.txt", "b.txt"]);
}

#[test]
fn create_writes_sha256sum_compatible_lines() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("hello.txt"), "hello").unwrap();

    run_ok(temp.path(), "create", &[]);

    let content = fs::read_to_string(temp.path().join(MANIFEST_NAME)).unwrap();
    assert_eq!(content, format!("{HELLO_SHA256}  hello.txt\n"));
}

#[test]
fn second_create_is_silent() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("sub/b.txt"), "b").unwrap();

    run_ok(temp.path(), "create", &[]);
    let before = fs::read_to_string(temp.path().join(MANIFEST_NAME)).unwrap();

    let stdout = run_ok(temp.path(), "create", &[]);

    assert!(stdout.is_empty());
    assert_eq!(
        fs::read_to_string(temp.path().join(MANIFEST_NAME)).unwrap(),
        before
    );
}

#[test]
fn create_keeps_existing_digest_of_changed_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "hello").unwrap();
    run_ok(temp.path(), "create", &[]);

    fs::write(temp.path().join("a.txt"), "changed").unwrap();
    let stdout = run_ok(temp.path(), "create", &[]);

    assert!(stdout.is_empty());
    let content = fs::read_to_string(temp.path().join(MANIFEST_NAME)).unwrap();
    assert!(content.contains(HELLO_SHA256));
}

#[test]
fn create_adds_new_files_and_drops_removed_ones() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();
    run_ok(temp.path(), "create", &[]);

    fs::remove_file(temp.path().join("a.txt")).unwrap();
    fs::write(temp.path().join("c.txt"), "c").unwrap();
    let stdout = run_ok(temp.path(), "create", &[]);

    assert_eq!(lines(&stdout), vec!["+ ./c.txt"]);
    assert_eq!(manifest_names(temp.path()), vec!["b.txt", "c.txt"]);
}

#[test]
fn create_writes_one_file_per_directory() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("one/two")).unwrap();
    fs::write(temp.path().join("one/x.txt"), "x").unwrap();
    fs::write(temp.path().join("one/two/y.txt"), "y").unwrap();

    let stdout = run_ok(temp.path(), "create", &["one"]);

    assert_eq!(lines(&stdout), vec!["+ one/two/y.txt", "+ one/x.txt"]);
    assert_eq!(manifest_names(&temp.path().join("one")), vec!["x.txt"]);
    assert_eq!(manifest_names(&temp.path().join("one/two")), vec!["y.txt"]);
    assert!(!temp.path().join(MANIFEST_NAME).exists());
}

#[test]
fn create_skips_directory_with_sentinel() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".nochecksums"), "").unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::create_dir(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("sub/b.txt"), "b").unwrap();

    let stdout = run_ok(temp.path(), "create", &[]);

    assert_eq!(lines(&stdout), vec!["+ ./sub/b.txt"]);
    assert!(!temp.path().join(MANIFEST_NAME).exists());
}

#[test]
fn create_skips_default_and_extra_exclusions() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("keep.txt"), "k").unwrap();
    fs::write(root.join("Thumbs.db"), "t").unwrap();
    fs::write(root.join("release.sha256"), "").unwrap();
    fs::write(root.join("scratch.tmp"), "s").unwrap();
    fs::create_dir(root.join("System Volume Information")).unwrap();
    fs::write(root.join("System Volume Information/tracking.log"), "x").unwrap();
    fs::create_dir_all(root.join("cache/nested")).unwrap();
    fs::write(root.join("cache/blob"), "x").unwrap();
    fs::write(root.join("cache/nested/kept"), "x").unwrap();

    let stdout = run_ok(
        root,
        "create",
        &["--exclude-file", "*.tmp", "--exclude-dir", "cache"],
    );

    assert_eq!(lines(&stdout), vec!["+ ./cache/nested/kept", "+ ./keep.txt"]);
    assert_eq!(manifest_names(root), vec!["keep.txt"]);
    assert!(!root.join("cache").join(MANIFEST_NAME).exists());
    assert!(!root.join("System Volume Information").join(MANIFEST_NAME).exists());
    assert_eq!(manifest_names(&root.join("cache/nested")), vec!["kept"]);
}

#[test]
fn create_leaves_directory_with_malformed_checksum_file_untouched() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    let malformed = format!("{}  a.txt\n", &HELLO_SHA256[..63]);
    overwrite_manifest(temp.path(), &malformed);

    sumtree_cmd(temp.path())
        .arg("create")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("! ./{MANIFEST_NAME}\n")))
        .stderr(predicate::str::contains("Not updating"));

    assert_eq!(
        fs::read_to_string(temp.path().join(MANIFEST_NAME)).unwrap(),
        malformed
    );
}

#[test]
fn create_reads_gnu_and_bsd_lines() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "hello").unwrap();
    fs::write(temp.path().join("b.txt"), "hello").unwrap();
    overwrite_manifest(
        temp.path(),
        &format!(
            "# comment\n\n{HELLO_SHA256} *a.txt\nSHA256 (b.txt) = {HELLO_SHA256}\n"
        ),
    );

    let stdout = run_ok(temp.path(), "create", &[]);

    assert!(stdout.is_empty());
}

#[cfg(unix)]
#[test]
fn unstorable_file_names_do_not_corrupt_checksum_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    fs::write(temp.path().join("evil\nname"), "x").unwrap();
    fs::write(temp.path().join("padded.txt "), "x").unwrap();

    sumtree_cmd(temp.path())
        .arg("create")
        .assert()
        .success()
        .stdout(predicate::str::diff("+ ./a.txt\n"))
        .stderr(predicate::str::contains("cannot be stored in a checksum file"));

    for command in ["create", "refresh", "reset", "create"] {
        let output = sumtree_cmd(temp.path()).arg(command).output().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            !stdout.contains('!'),
            "{command} distrusted the checksum file: {stdout}"
        );
        if command != "reset" {
            assert!(stdout.is_empty(), "{command} reported changes: {stdout}");
        }
    }

    assert_eq!(manifest_names(temp.path()), vec!["a.txt"]);
}

#[test]
fn empty_directory_gets_no_checksum_file() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("empty")).unwrap();

    let stdout = run_ok(temp.path(), "create", &[]);

    assert!(stdout.is_empty());
    assert!(!temp.path().join("empty").join(MANIFEST_NAME).exists());
    assert!(!temp.path().join(MANIFEST_NAME).exists());
}

#[test]
fn dry_run_reports_without_writing() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();

    sumtree_cmd(temp.path())
        .arg("-v")
        .arg("create")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::diff("+ ./a.txt\n"))
        .stderr(predicate::str::contains("DRY RUN"));

    assert!(!temp.path().join(MANIFEST_NAME).exists());
}

#[cfg(unix)]
#[test]
fn written_checksum_file_is_read_only_unless_disabled() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("protected")).unwrap();
    fs::create_dir(temp.path().join("plain")).unwrap();
    fs::write(temp.path().join("protected/a.txt"), "a").unwrap();
    fs::write(temp.path().join("plain/a.txt"), "a").unwrap();

    run_ok(temp.path(), "create", &["protected"]);
    run_ok(temp.path(), "create", &["--no-protect", "plain"]);

    let permissions =
        |dir: &str| fs::metadata(temp.path().join(dir).join(MANIFEST_NAME)).unwrap().permissions();
    assert!(permissions("protected").readonly());
    assert!(!permissions("plain").readonly());
}

#[cfg(unix)]
#[test]
fn protected_checksum_file_can_be_updated() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();
    run_ok(temp.path(), "create", &[]);

    fs::write(temp.path().join("b.txt"), "b").unwrap();
    let stdout = run_ok(temp.path(), "create", &[]);

    assert_eq!(lines(&stdout), vec!["+ ./b.txt"]);
    assert_eq!(manifest_names(temp.path()), vec!["a.txt", "b.txt"]);
    let permissions = fs::metadata(temp.path().join(MANIFEST_NAME))
        .unwrap()
        .permissions();
    assert!(permissions.readonly());
}

#[test]
fn missing_root_fails() {
    let temp = TempDir::new().unwrap();

    sumtree_cmd(temp.path())
        .arg("create")
        .arg("missing")
        .assert()
        .code(255)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn invalid_exclusion_pattern_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "a").unwrap();

    sumtree_cmd(temp.path())
        .arg("create")
        .arg("--exclude-file")
        .arg("[oops")
        .assert()
        .code(255)
        .stderr(predicate::str::contains("[oops"));

    assert!(!temp.path().join(MANIFEST_NAME).exists());
}
