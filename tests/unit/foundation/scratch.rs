use super::*;

#[test]
fn drop_removes_backing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, b"x").unwrap();
    {
        let guard = ScratchFile::new(&path);
        assert!(guard.exists());
    }
    assert!(!path.exists());
}

#[test]
fn drop_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let guard = ScratchFile::new(dir.path().join("never-written"));
    assert!(!guard.exists());
    drop(guard);
}

#[test]
fn persist_replaces_destination_and_disarms() {
    let dir = tempfile::tempdir().unwrap();
    let tmp = dir.path().join(".out.partial");
    let dest = dir.path().join("out.mp4");
    std::fs::write(&dest, b"old").unwrap();
    std::fs::write(&tmp, b"new").unwrap();

    ScratchFile::new(&tmp).persist(&dest).unwrap();
    assert!(!tmp.exists());
    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("c.txt");
    ensure_parent_dir(&path).unwrap();
    assert!(dir.path().join("a").join("b").is_dir());
}
