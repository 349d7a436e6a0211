//! Tests for reading manifests from disk.

use meta4fetch::manifest;
use meta4fetch::ManifestError;

mod common;
use common::helpers::*;

#[test]
fn test_every_file_entry_yields_one_item() {
    let temp_dir = create_temp_dir();
    let files: Vec<ManifestFile> = (0..5)
        .map(|i| {
            let name = format!("granule_{}.h5", i);
            let urls = vec![
                format!("https://mirror-1.example.com/{}", name),
                format!("https://mirror-2.example.com/{}", name),
            ];
            ManifestFile::verified(&name, name.as_bytes(), &urls)
        })
        .collect();
    let path = write_manifest(temp_dir.path(), &files);

    let items = manifest::parse(&path).unwrap();

    assert_eq!(items.len(), 5);
    for (item, file) in items.iter().zip(&files) {
        assert_eq!(item.name(), file.name);
        assert_eq!(item.mirrors().len(), 2);
        assert_eq!(
            item.checksum().map(|c| c.to_string()),
            file.sha256.clone()
        );
    }
}

#[test]
fn test_entry_without_url_rejects_the_manifest() {
    let temp_dir = create_temp_dir();
    let files = vec![
        ManifestFile::new("a.tif", &["https://mirror.example.com/a.tif".to_string()]),
        ManifestFile::new("b.tif", &[]),
    ];
    let path = write_manifest(temp_dir.path(), &files);

    match manifest::parse(&path) {
        Err(ManifestError::NoMirrors { name }) => assert_eq!(name, "b.tif"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_missing_manifest_is_a_read_error() {
    let temp_dir = create_temp_dir();
    let result = manifest::parse(temp_dir.path().join("absent.meta4"));
    assert!(matches!(result, Err(ManifestError::Read { .. })));
}
