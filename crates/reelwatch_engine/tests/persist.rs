use std::fs;

use reelwatch_engine::{ensure_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_state_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn write_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("settings.ron", b"one").unwrap();
    assert_eq!(first.file_name().unwrap(), "settings.ron");
    assert_eq!(fs::read_to_string(&first).unwrap(), "one");

    let second = writer.write("settings.ron", b"two").unwrap();
    assert_eq!(first, second);
    assert_eq!(writer.read_to_string("settings.ron").unwrap().as_deref(), Some("two"));
}

#[test]
fn missing_files_read_as_none_and_remove_quietly() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    assert_eq!(writer.read_to_string("absent").unwrap(), None);
    assert!(!writer.remove("absent").unwrap());

    writer.write("present", b"x").unwrap();
    assert!(writer.remove("present").unwrap());
    assert_eq!(writer.read_to_string("present").unwrap(), None);
}

#[test]
fn state_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("active_task", b"t1").is_err());
    assert!(!file_path.with_file_name("active_task").exists());
}

#[test]
fn uncommitted_stage_leaves_no_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    {
        let mut staged = writer.stage().unwrap();
        staged.write_chunk(b"partial").unwrap();
        assert_eq!(staged.written(), 7);
    }
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn replaced_file_never_goes_missing() {
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    writer.write("active_task", b"task0").unwrap();

    let target = writer.path("active_task");
    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut missing = 0;
            while !stop.load(Ordering::Relaxed) {
                if let Err(err) = fs::read(&target) {
                    if err.kind() == io::ErrorKind::NotFound {
                        missing += 1;
                    }
                }
            }
            missing
        })
    };

    for round in 0..500 {
        writer
            .write("active_task", format!("task{round}").as_bytes())
            .unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    assert_eq!(reader.join().unwrap(), 0);
    assert_eq!(
        writer.read_to_string("active_task").unwrap().as_deref(),
        Some("task499")
    );
}
