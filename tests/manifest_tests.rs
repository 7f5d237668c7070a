mod common;

use anyhow::Result;
use common::{TestTree, relative, set_mtime, touch};
use docsync::manifest::ChangeIndex;
use docsync::pattern::PatternSet;
use docsync::scanner::ListingPolicy;
use docsync::utils::serialization;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn empty_index() -> ChangeIndex {
    ChangeIndex::new(PatternSet::default(), PatternSet::default())
}

#[test]
fn test_first_scan_reports_everything_sorted() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("b.txt", "b")?;
    tree.write("a/z.txt", "z")?;
    tree.write("a/b/c.txt", "c")?;

    let mut index = empty_index();
    let changed = index.update(tree.path())?;
    assert_eq!(
        relative(tree.path(), &changed),
        vec!["a/b/c.txt", "a/z.txt", "b.txt"]
    );

    assert!(index.update(tree.path())?.is_empty());
    Ok(())
}

#[test]
fn test_modified_and_new_files_reported() -> Result<()> {
    let tree = TestTree::new()?;
    let kept = tree.write("kept.txt", "same")?;
    let edited = tree.write("edited.txt", "before")?;
    set_mtime(&kept, 1_000_000)?;
    set_mtime(&edited, 1_000_000)?;

    let mut index = empty_index();
    index.update(tree.path())?;

    std::fs::write(&edited, "after")?;
    set_mtime(&edited, 2_000_000)?;
    tree.write("new.txt", "fresh")?;

    let changed = index.update(tree.path())?;
    assert_eq!(relative(tree.path(), &changed), vec!["edited.txt", "new.txt"]);
    Ok(())
}

#[test]
fn test_touch_is_reported_even_with_same_content() -> Result<()> {
    let tree = TestTree::new()?;
    let file = tree.write("doc.txt", "unchanged")?;

    let mut index = empty_index();
    index.update(tree.path())?;
    let before = *index.entry(&file).unwrap();

    touch(&file)?;
    assert_eq!(index.update(tree.path())?, vec![file.clone()]);

    let after = index.entry(&file).unwrap();
    assert_eq!(after.hash, before.hash);
    assert_ne!(after.mod_time, before.mod_time);
    Ok(())
}

#[test]
fn test_exclude_wins_over_include() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "a")?;
    tree.write("skip.txt", "s")?;
    tree.write("b.log", "b")?;
    tree.write("nested/c.txt", "c")?;

    let include = PatternSet::new([r"\.txt$"])?;
    let exclude = PatternSet::new(["^skip"])?;
    let mut index = ChangeIndex::new(include, exclude);

    let changed = index.update(tree.path())?;
    assert_eq!(relative(tree.path(), &changed), vec!["a.txt", "nested/c.txt"]);
    Ok(())
}

#[test]
fn test_filter_matches_base_name_only() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("reports/summary.txt", "x")?;

    let include = PatternSet::new(["^reports"])?;
    let mut index = ChangeIndex::new(include, PatternSet::default());
    assert!(index.update(tree.path())?.is_empty());
    Ok(())
}

#[test]
fn test_save_restore_resumes() -> Result<()> {
    let tree = TestTree::new()?;
    let docs = tree.dir("docs")?;
    tree.write("docs/a.pdf", "a")?;
    tree.write("docs/b.txt", "b")?;
    let manifest = tree.path().join("state/manifest.bin");

    let include = PatternSet::new([r"\.pdf$"])?;
    let mut index = ChangeIndex::new(include, PatternSet::default());
    assert_eq!(index.update(&docs)?.len(), 1);
    index.save(&manifest)?;

    // The filter travels with the index
    let mut restored = empty_index();
    restored.restore(&manifest)?;
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.filter().include.as_strings(), [r"\.pdf$"]);
    assert!(restored.update(&docs)?.is_empty());
    Ok(())
}

#[derive(Serialize)]
struct RawFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

#[derive(Serialize)]
struct RawIndex {
    entries: BTreeMap<PathBuf, ()>,
    filter: RawFilter,
}

#[test]
fn test_load_rejects_uncompilable_pattern() -> Result<()> {
    let raw = RawIndex {
        entries: BTreeMap::new(),
        filter: RawFilter {
            include: vec!["(unclosed".to_string()],
            exclude: Vec::new(),
        },
    };
    let data = serialization::serialize(&raw)?;

    let tree = TestTree::new()?;
    tree.write("a.txt", "a")?;
    let mut index = empty_index();
    index.update(tree.path())?;

    assert!(index.load(data.as_slice()).is_err());
    assert_eq!(index.len(), 1);
    assert!(index.filter().include.is_empty());
    Ok(())
}

#[test]
fn test_raw_index_with_valid_patterns_loads() -> Result<()> {
    let raw = RawIndex {
        entries: BTreeMap::new(),
        filter: RawFilter {
            include: vec![r"\.pdf$".to_string()],
            exclude: vec!["^~".to_string()],
        },
    };
    let data = serialization::serialize(&raw)?;

    let mut index = empty_index();
    index.load(data.as_slice())?;
    assert!(index.is_empty());
    assert_eq!(index.filter().exclude.as_strings(), ["^~"]);
    Ok(())
}

#[test]
fn test_missing_root_policies() -> Result<()> {
    let tree = TestTree::new()?;
    let missing = tree.path().join("missing");

    let mut index = empty_index();
    assert!(index.update(&missing).is_err());

    let mut index = empty_index().with_listing_policy(ListingPolicy::SkipRoot);
    assert!(index.update(&missing)?.is_empty());
    Ok(())
}

#[test]
fn test_deleted_entries_kept_until_reset() -> Result<()> {
    let tree = TestTree::new()?;
    let file = tree.write("gone.txt", "x")?;

    let mut index = empty_index();
    index.update(tree.path())?;
    std::fs::remove_file(&file)?;

    assert!(index.update(tree.path())?.is_empty());
    assert!(index.entry(&file).is_some());

    index.reset();
    assert!(index.is_empty());
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_tracked_and_persisted() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tree = TestTree::new()?;
    let file = tree.path().join(OsStr::from_bytes(b"caf\xff.txt"));
    std::fs::write(&file, "menu")?;

    let mut index = empty_index();
    assert_eq!(index.update(tree.path())?, vec![file.clone()]);

    let mut data = Vec::new();
    index.dump(&mut data)?;
    let mut loaded = empty_index();
    loaded.load(data.as_slice())?;
    assert!(loaded.entry(&file).is_some());
    assert!(loaded.update(tree.path())?.is_empty());
    Ok(())
}
