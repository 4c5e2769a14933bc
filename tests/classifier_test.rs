use modelpacker::classify::{classify_files, enumerate_files, Category, Classifier};
use modelpacker::config::PackMode;
use std::fs;
use tempfile::tempdir;

fn write(dir: &std::path::Path, rel: &str, contents: &[u8]) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_enumeration_skips_locks_and_cache() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.safetensors", b"w");
    write(dir.path(), "README.md", b"docs");
    write(dir.path(), "model.lock", b"transient");
    write(dir.path(), ".cache/huggingface/blob", b"transient");
    write(dir.path(), "sub/tokenizer.json", b"{}");

    let records = enumerate_files(dir.path()).unwrap();
    let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "a.safetensors", "sub/tokenizer.json"]);
}

#[test]
fn test_enumeration_order_is_stable() {
    let dir = tempdir().unwrap();
    write(dir.path(), "b.bin", b"22");
    write(dir.path(), "a.bin", b"1");
    write(dir.path(), "Z.txt", b"upper sorts before lower in byte order");

    let first = enumerate_files(dir.path()).unwrap();
    let second = enumerate_files(dir.path()).unwrap();
    assert_eq!(first, second);
    let paths: Vec<&str> = first.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["Z.txt", "a.bin", "b.bin"]);
}

#[test]
fn test_mixed_tree_classification() {
    let dir = tempdir().unwrap();
    write(dir.path(), "model.safetensors", b"wwww");
    write(dir.path(), "README.md", b"# model");
    write(dir.path(), "LICENSE", b"mit");
    write(dir.path(), "config.json", b"{}");
    write(dir.path(), "scripts/serve.py", b"print()");
    write(dir.path(), "data/train.jsonl", b"{}");

    let records = enumerate_files(dir.path()).unwrap();
    let classified = classify_files(&records);

    assert_eq!(classified.weights, vec!["model.safetensors"]);
    assert_eq!(classified.docs, vec!["LICENSE", "README.md"]);
    assert_eq!(classified.config, vec!["config.json"]);
    assert_eq!(classified.code, vec!["scripts/serve.py"]);
    assert_eq!(classified.dataset, vec!["data/train.jsonl"]);
    assert_eq!(classified.total_files(), records.len());
}

#[test]
fn test_large_unknown_file_is_weights() {
    let dir = tempdir().unwrap();
    // sparse 15 MiB file with an unknown extension
    let path = dir.path().join("unknown.dat");
    let file = fs::File::create(&path).unwrap();
    file.set_len(15 * 1024 * 1024).unwrap();

    let records = enumerate_files(dir.path()).unwrap();
    let classified = classify_files(&records);
    assert_eq!(classified.weights, vec!["unknown.dat"]);
    assert_eq!(classified.sizes["unknown.dat"], 15 * 1024 * 1024);

    // archive mode still tars weights one-per-file
    assert_eq!(classified.expected_layer_count(PackMode::Tar), 1);
}

#[test]
fn test_layer_count_invariants() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.safetensors", b"1");
    write(dir.path(), "b.safetensors", b"2");
    write(dir.path(), "README.md", b"3");
    write(dir.path(), "USAGE.md", b"4");
    write(dir.path(), "config.json", b"5");

    let records = enumerate_files(dir.path()).unwrap();
    let classified = classify_files(&records);

    // raw: layer count equals file count
    assert_eq!(classified.expected_layer_count(PackMode::Raw), records.len());
    // archive modes: weights per-file, docs and config aggregated
    for mode in [PackMode::Tar, PackMode::TarGzip, PackMode::TarZstd] {
        let layers = classified.expected_layer_count(mode);
        assert_eq!(layers, 4);
        assert!(layers <= records.len());
    }
}

#[test]
fn test_every_enumerated_file_lands_in_one_category() {
    let dir = tempdir().unwrap();
    for (i, name) in ["x.bin", "y", "z.unknownext", "notes.md", "v.npz"].iter().enumerate() {
        write(dir.path(), name, vec![b'x'; i + 1].as_slice());
    }

    let records = enumerate_files(dir.path()).unwrap();
    let classified = classify_files(&records);

    let mut seen: Vec<&str> = Category::ALL
        .iter()
        .flat_map(|c| classified.category(*c).iter().map(String::as_str))
        .collect();
    seen.sort_unstable();
    let mut expected: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);

    let classifier = Classifier::new();
    for record in &records {
        // classify is total: no panic, one category
        let _ = classifier.classify(&record.path, record.size);
    }
}
