//! End-to-end scenarios through the public API.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sift::{AddOptions, Config, FieldKind, GetOptions, SearchIndex, SearchOptions};

fn engine(temp: &TempDir) -> SearchIndex {
    let config = Config {
        db_path: temp.path().join("idx"),
        ..Config::default()
    };
    SearchIndex::open(config).unwrap()
}

fn counting() -> SearchOptions {
    SearchOptions {
        count: true,
        ..SearchOptions::default()
    }
}

fn write_doc(dir: &Path, name: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn accent_insensitive_heading_match() {
    // S1: accented title found by unaccented query, accents preserved.
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    index
        .add_buffer(
            "# Viaje al Mediterráneo\n\nCrónica de un verano.\n".as_bytes(),
            &AddOptions::default(),
        )
        .unwrap();

    let response = index.search("mediterraneo", &counting()).unwrap();
    assert_eq!(response.total_count, Some(1));

    let snippet = &response.results[0];
    assert_eq!(snippet.field, FieldKind::Title);
    assert!(snippet.text.contains("Mediterráneo"));
}

#[test]
fn smart_skip_avoids_rewrites() {
    // S2: the second add of an unchanged file performs no writes.
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    let file = temp.path().join("doc.md");
    fs::write(&file, "# Doc\n\ncontenido estable.\n").unwrap();

    let first = index.add(&file, &AddOptions::default()).unwrap();
    assert_eq!(first.indexed, 1);

    let second = index.add(&file, &AddOptions::default()).unwrap();
    assert_eq!(second.indexed, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(index.stats(None).unwrap().documents, 1);
}

#[test]
fn heading_hierarchy_navigation() {
    // S3: navigate from a heading match through the tree.
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    index
        .add_buffer(
            "# A\n\n## B\n\n### C\n\n### D\n\n## E\n".as_bytes(),
            &AddOptions::default(),
        )
        .unwrap();

    let response = index.search("C", &SearchOptions::default()).unwrap();
    let snippet = response
        .results
        .iter()
        .find(|s| s.heading.as_ref().is_some_and(|h| h.text == "C"))
        .expect("heading snippet for C");

    let parent = snippet.parent(&index).unwrap().unwrap();
    assert_eq!(parent.text, "B");

    assert!(snippet.children(&index).unwrap().is_empty());

    let siblings = snippet.siblings(&index).unwrap();
    assert_eq!(siblings.len(), 1);
    assert_eq!(siblings[0].text, "D");

    let root = snippet.ancestor_at_depth(&index, 1).unwrap().unwrap();
    assert_eq!(root.text, "A");

    assert_eq!(snippet.breadcrumbs_text(&index, None).unwrap(), "A > B > C");
}

#[test]
fn boolean_with_field_restriction() {
    // S4: title:alpha matches only the document titled alpha.
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    let dir = temp.path().join("corpus");
    write_doc(&dir, "d1.md", "# Uno\n\nalpha beta\n");
    write_doc(&dir, "d2.md", "# alpha\n\ngamma\n");
    index.add(&dir, &AddOptions::default()).unwrap();

    let response = index.search("title:alpha", &counting()).unwrap();
    assert_eq!(response.total_count, Some(1));
    assert!(
        response
            .results
            .iter()
            .all(|s| s.document_path.ends_with("d2.md"))
    );
}

#[test]
fn range_mode_extended_text() {
    // S5: length 50 at offset -20 slices exactly 50 bytes, 20 back.
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);

    // The match sits in a fenced code block; code is not attached as
    // section content by default, so extended text takes the range path.
    let mut body = String::from("# T\n\n```\n");
    for i in 0..120 {
        body.push_str(&format!("word{i:03} "));
    }
    body.push_str("needle ");
    for i in 0..120 {
        body.push_str(&format!("cola{i:03} "));
    }
    body.push_str("\n```\n");
    let path = index
        .add_buffer(body.as_bytes(), &AddOptions::default())
        .unwrap();

    let response = index.search("needle", &SearchOptions::default()).unwrap();
    let snippet = response
        .results
        .iter()
        .find(|s| s.field == FieldKind::Body)
        .expect("body snippet");

    let record = index.get(&path, &GetOptions::default()).unwrap().unwrap();
    let p = snippet.position;
    assert_eq!(&record.body()[p..p + 6], "needle");

    let text = index
        .snippet_text(
            snippet,
            sift::ExtendOptions {
                length: 50,
                offset: -20,
            },
        )
        .unwrap();
    assert_eq!(text, &record.body()[p - 20..p + 30]);
}

#[test]
fn tag_filter_keeps_untagged_documents() {
    // S6: tags=["x"] returns untagged U and tagged-x A, never tagged-y B.
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);

    index
        .add_buffer("# U\n\npalabra comun\n".as_bytes(), &AddOptions::default())
        .unwrap();
    index
        .add_buffer(
            "# A\n\npalabra comun\n".as_bytes(),
            &AddOptions {
                tags: vec!["x".into()],
                ..AddOptions::default()
            },
        )
        .unwrap();
    index
        .add_buffer(
            "# B\n\npalabra comun\n".as_bytes(),
            &AddOptions {
                tags: vec!["y".into()],
                ..AddOptions::default()
            },
        )
        .unwrap();

    let response = index
        .search(
            "comun",
            &SearchOptions {
                tags: vec!["x".into()],
                count: true,
                ..SearchOptions::default()
            },
        )
        .unwrap();

    assert_eq!(response.total_count, Some(2));
    let mut titles: Vec<&str> = response
        .results
        .iter()
        .map(|s| s.document_title.as_str())
        .collect();
    titles.sort_unstable();
    titles.dedup();
    assert_eq!(titles, vec!["A", "U"]);
}

#[test]
fn empty_index_searches_cleanly() {
    let temp = TempDir::new().unwrap();
    let index = engine(&temp);

    let response = index.search("anything at all", &counting()).unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.total_count, Some(0));
    assert_eq!(response.total_snippets, 0);

    assert!(
        index
            .get("/unknown.md", &GetOptions::default())
            .unwrap()
            .is_none()
    );
    assert!(!index.has_document("/unknown.md").unwrap());
}

#[test]
fn snippets_count_against_per_doc_limit() {
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    index
        .add_buffer(
            "# tema\n\ntema uno. tema dos. tema tres. tema cuatro.\n".as_bytes(),
            &AddOptions::default(),
        )
        .unwrap();

    let response = index
        .search(
            "tema",
            &SearchOptions {
                snippets_per_doc: 2,
                ..SearchOptions::default()
            },
        )
        .unwrap();
    assert_eq!(response.results.len(), 2);
    assert_eq!(response.total_snippets, 2);
}

#[test]
fn reindex_after_modification_updates_record() {
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    let file = temp.path().join("doc.md");
    fs::write(&file, "# Antes\n\nuno.\n").unwrap();
    index.add(&file, &AddOptions::default()).unwrap();

    fs::write(&file, "# Despues\n\ndos.\n").unwrap();
    index
        .add(
            &file,
            &AddOptions {
                update: true,
                ..AddOptions::default()
            },
        )
        .unwrap();

    let response = index.search("despues", &counting()).unwrap();
    assert_eq!(response.total_count, Some(1));
    let gone = index.search("antes", &counting()).unwrap();
    assert_eq!(gone.total_count, Some(0));
}

#[test]
fn section_mode_text_from_search_hit() {
    let temp = TempDir::new().unwrap();
    let mut index = engine(&temp);
    index
        .add_buffer(
            "# Doc\n\n## Receta\n\nPrimero hierve agua.\n\nLuego sirve.\n".as_bytes(),
            &AddOptions::default(),
        )
        .unwrap();

    let response = index.search("receta", &SearchOptions::default()).unwrap();
    let snippet = response
        .results
        .iter()
        .find(|s| s.field == FieldKind::H2)
        .expect("h2 snippet");

    let text = index
        .snippet_text(snippet, sift::ExtendOptions::default())
        .unwrap();
    assert_eq!(text, "## Receta\n\nPrimero hierve agua.\n\nLuego sirve.");
}
