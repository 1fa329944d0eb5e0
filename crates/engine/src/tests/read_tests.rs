use crate::Engine;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn miss_on_fresh_database() -> Result<()> {
    let dir = tempdir()?;
    let db = Engine::open(dir.path())?;
    assert!(db.get(b"anything")?.is_none());
    Ok(())
}

#[test]
fn read_your_writes_many_keys() -> Result<()> {
    let dir = tempdir()?;
    let mut db = Engine::open(dir.path())?;

    for i in 0..500u32 {
        db.put(
            format!("key{:04}", i).as_bytes(),
            format!("val{}", i).as_bytes(),
        )?;
    }
    for i in 0..500u32 {
        assert_eq!(
            db.get(format!("key{:04}", i).as_bytes())?.unwrap(),
            format!("val{}", i).into_bytes()
        );
    }
    assert!(db.get(b"key0500")?.is_none());
    Ok(())
}

#[test]
fn persists_across_close_and_reopen() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut db = Engine::open(dir.path())?;
        db.put(b"a", b"1")?;
        db.put(b"b", b"2")?;
        db.put(b"a", b"3")?;
        db.close();
    }

    let db = Engine::open(dir.path())?;
    assert_eq!(db.get(b"a")?.unwrap(), b"3");
    assert_eq!(db.get(b"b")?.unwrap(), b"2");
    Ok(())
}

#[test]
fn stray_files_in_directory_are_ignored() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("notes.txt"), b"hello")?;
    fs::write(dir.path().join("x.log"), b"not a segment")?;
    fs::write(dir.path().join("9x.log"), b"not a segment either")?;

    let mut db = Engine::open(dir.path())?;
    assert_eq!(db.sealed_count(), 0);
    db.put(b"k", b"v")?;
    assert_eq!(db.get(b"k")?.unwrap(), b"v");
    Ok(())
}

#[test]
fn value_is_an_owned_buffer() -> Result<()> {
    let dir = tempdir()?;
    let mut db = Engine::open(dir.path())?;
    db.put(b"k", b"first")?;

    let held = db.get(b"k")?.unwrap();
    db.put(b"k", b"second")?;

    // the buffer handed out earlier is unaffected by later writes
    assert_eq!(held, b"first");
    assert_eq!(db.get(b"k")?.unwrap(), b"second");
    Ok(())
}
