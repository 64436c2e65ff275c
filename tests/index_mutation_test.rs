//! Integration tests for fields, document mutation and dropping an index.

use quarry::config::{AddOptions, IndexOptions};
use quarry::document::{Document, FieldValue, SortValue};
use quarry::error::{QuarryError, Result};
use quarry::index::IndexSpec;
use quarry::schema::{FieldOptions, FieldTypes};

fn index() -> IndexSpec {
    let index = IndexSpec::create("idx", IndexOptions::new()).unwrap();
    index
        .create_field("title", FieldTypes::FULLTEXT, FieldOptions::empty())
        .unwrap();
    index
        .create_field("price", FieldTypes::NUMERIC, FieldOptions::SORTABLE)
        .unwrap();
    index
}

fn doc(key: &str, title: &str, price: f64) -> Document {
    let mut doc = Document::new(key, 1.0, None);
    doc.add_field_string("title", title, FieldTypes::empty());
    doc.add_field_number("price", price, FieldTypes::empty());
    doc
}

fn keys(index: &IndexSpec, query: &str) -> Vec<String> {
    let mut results = index.iterate_query(query).unwrap();
    let mut keys = Vec::new();
    while let Some(key) = results.advance().unwrap() {
        keys.push(String::from_utf8_lossy(key).into_owned());
    }
    keys
}

#[test]
fn test_duplicate_key_is_rejected() -> Result<()> {
    let index = index();
    index.add_document(doc("a", "red shoes", 10.0), AddOptions::default())?;

    let err = index
        .add_document(doc("a", "blue hat", 20.0), AddOptions::default())
        .unwrap_err();
    assert!(matches!(err, QuarryError::DocumentExists));
    assert!(err.is_user_error());

    assert_eq!(index.num_docs(), 1);
    assert_eq!(keys(&index, "red"), vec!["a"]);
    assert!(keys(&index, "hat").is_empty());
    Ok(())
}

#[test]
fn test_replace_resolves_to_new_content() -> Result<()> {
    let index = index();
    let first = index.add_document(doc("a", "red shoes", 10.0), AddOptions::default())?;
    let second = index.add_document(doc("a", "blue hat", 20.0), AddOptions::replace())?;

    assert_ne!(first, second);
    assert_eq!(index.num_docs(), 1);
    assert!(keys(&index, "red").is_empty());
    assert_eq!(keys(&index, "hat"), vec!["a"]);
    assert!(keys(&index, "@price:[5 15]").is_empty());
    assert_eq!(keys(&index, "@price:[15 25]"), vec!["a"]);

    // replacing an absent key is a plain add
    index.add_document(doc("b", "green socks", 5.0), AddOptions::replace())?;
    assert_eq!(index.num_docs(), 2);
    Ok(())
}

#[test]
fn test_delete_counts() -> Result<()> {
    let index = index();
    for (key, title) in [("a", "red"), ("b", "red blue"), ("c", "blue")] {
        index.add_document(doc(key, title, 1.0), AddOptions::default())?;
    }
    assert_eq!(index.num_docs(), 3);

    index.delete_document("b")?;
    assert_eq!(index.num_docs(), 2);
    assert_eq!(keys(&index, "red"), vec!["a"]);
    assert_eq!(keys(&index, "blue"), vec!["c"]);

    assert!(matches!(
        index.delete_document("b"),
        Err(QuarryError::DocumentNotFound)
    ));
    assert!(matches!(
        index.delete_document("missing"),
        Err(QuarryError::DocumentNotFound)
    ));
    assert_eq!(index.num_docs(), 2);

    // the key can be reused once deleted
    index.add_document(doc("b", "green", 1.0), AddOptions::default())?;
    assert_eq!(keys(&index, "green"), vec!["b"]);
    Ok(())
}

#[test]
fn test_garbage_collection_keeps_results() -> Result<()> {
    let index = index();
    for (key, title) in [("a", "red"), ("b", "red"), ("c", "red")] {
        index.add_document(doc(key, title, 1.0), AddOptions::default())?;
    }
    index.delete_document("a")?;
    index.delete_document("c")?;
    let before = index.stats();

    let report = index.collect_garbage();
    assert_eq!(report.docs_reclaimed, 2);
    assert_eq!(report.records_removed, 2);
    assert_eq!(report.numeric_removed, 2);

    let after = index.stats();
    assert_eq!(after.num_documents, before.num_documents);
    assert_eq!(after.num_records, before.num_records - 2);
    assert_eq!(keys(&index, "red"), vec!["b"]);
    Ok(())
}

#[test]
fn test_add_errors() {
    let index = index();

    let mut bad_number = doc("a", "red", 1.0);
    bad_number.add_field_string("price", "cheap", FieldTypes::empty());
    let err = index
        .add_document(bad_number, AddOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("price"));

    let bad_language = Document::new("b", 1.0, Some("klingon"));
    assert!(matches!(
        index.add_document(bad_language, AddOptions::default()),
        Err(QuarryError::Document(_))
    ));

    let bad_score = Document::new("c", 2.0, None);
    assert!(index.add_document(bad_score, AddOptions::default()).is_err());

    assert_eq!(index.num_docs(), 0);
}

#[test]
fn test_unknown_fields_are_ignored() -> Result<()> {
    let index = index();
    let mut doc = doc("a", "red", 1.0);
    doc.add_field_string("unknown", "blue", FieldTypes::empty());
    index.add_document(doc, AddOptions::default())?;

    assert_eq!(keys(&index, "red"), vec!["a"]);
    assert!(keys(&index, "blue").is_empty());
    Ok(())
}

#[test]
fn test_sortable_values_and_flags() -> Result<()> {
    let index = index();
    index.add_document(doc("a", "red", 42.0), AddOptions::default())?;

    let mut results = index.iterate_query("red")?;
    results.advance()?;
    let metadata = results.current_metadata().unwrap();
    assert_eq!(metadata.sort_vector, vec![Some(SortValue::Number(42.0))]);
    assert_eq!(metadata.language, "english");
    Ok(())
}

#[test]
fn test_not_indexable_fields() -> Result<()> {
    let index = IndexSpec::create("idx", IndexOptions::new())?;
    index.create_field("title", FieldTypes::FULLTEXT, FieldOptions::empty())?;
    index.create_field(
        "notes",
        FieldTypes::FULLTEXT,
        FieldOptions::NOT_INDEXABLE | FieldOptions::SORTABLE,
    )?;

    let mut doc = Document::new("a", 1.0, None);
    doc.add_field_string("title", "red", FieldTypes::empty());
    doc.add_field_string("notes", "secret", FieldTypes::empty());
    index.add_document(doc, AddOptions::default())?;

    assert!(keys(&index, "secret").is_empty());
    // a node restricted to a never-indexed field matches nothing
    assert_eq!(index.create_token_node(Some("notes"), "red").field_mask(), 0);
    assert!(keys(&index, "@notes:red").is_empty());
    assert_eq!(keys(&index, "@title:red"), vec!["a"]);

    let mut results = index.iterate_query("red")?;
    results.advance()?;
    assert_eq!(
        results.current_metadata().unwrap().sort_vector,
        vec![Some(SortValue::Text("secret".to_string()))]
    );
    Ok(())
}

#[test]
fn test_dynamic_field() -> Result<()> {
    let index = IndexSpec::create("idx", IndexOptions::new())?;
    index.create_field("labels", FieldTypes::FULLTEXT | FieldTypes::TAG, FieldOptions::empty())?;

    let mut doc = Document::new("a", 1.0, None);
    doc.add_field_string("labels", "summer sale", FieldTypes::empty());
    index.add_document(doc, AddOptions::default())?;

    assert_eq!(keys(&index, "sale"), vec!["a"]);
    assert_eq!(keys(&index, "@labels:{summer sale}"), vec!["a"]);

    // a type hint narrows how the value is indexed
    let mut doc = Document::new("b", 1.0, None);
    doc.add_field("labels", FieldValue::from("winter"), FieldTypes::TAG);
    index.add_document(doc, AddOptions::default())?;
    assert!(keys(&index, "winter").is_empty());
    assert_eq!(keys(&index, "@labels:{winter}"), vec!["b"]);
    Ok(())
}

#[test]
fn test_drop_index_releases_keys() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let index = index();
    index.keys_mut().insert("a", Counted(Arc::clone(&drops)));
    index.keys_mut().insert("b", Counted(Arc::clone(&drops)));
    index
        .add_document(doc("a", "red", 1.0), AddOptions::default())
        .unwrap();

    index.drop_index();
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}
