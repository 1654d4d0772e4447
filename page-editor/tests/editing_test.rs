//! Patch application through the editor actor.

mod support;

use page_editor::actors::page_editor::{EditorError, EditorEvent};
use serde_json::json;
use shared_types::{FieldPatch, PatchError};
use support::{blank_seed, spawn_editor};

#[tokio::test(start_paused = true)]
async fn test_patches_bump_revision_and_mark_dirty() {
    let editor = spawn_editor(blank_seed()).await;
    assert!(!editor.handle.snapshot().await.unwrap().dirty);

    let first = editor
        .handle
        .apply_patch(FieldPatch::new("hero.headline", json!("One")))
        .await
        .unwrap();
    let second = editor
        .handle
        .apply_patch(FieldPatch::new("cta.buttonText", json!("Order now")))
        .await
        .unwrap();
    assert_eq!((first, second), (1, 2));

    let snapshot = editor.handle.snapshot().await.unwrap();
    assert!(snapshot.dirty);
    assert_eq!(snapshot.phase, "dirty");
    assert_eq!(snapshot.content.hero_headline(), "One");
    // Untouched defaults survive.
    assert_eq!(
        snapshot.content.get("hero.ctaText").and_then(|n| n.as_str()),
        Some("Get Started")
    );
}

#[tokio::test(start_paused = true)]
async fn test_business_name_edit_announces_title() {
    let mut editor = spawn_editor(blank_seed()).await;
    editor
        .handle
        .apply_patch(FieldPatch::new("business.name", json!("Crumb & Co")))
        .await
        .unwrap();
    editor
        .handle
        .apply_patch(FieldPatch::new("hero.headline", json!("Unrelated")))
        .await
        .unwrap();

    let titles: Vec<EditorEvent> = editor
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, EditorEvent::TitleUpdated { .. }))
        .collect();
    assert_eq!(
        titles,
        vec![EditorEvent::TitleUpdated {
            title: "Crumb & Co".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalid_patch_changes_nothing() {
    let editor = spawn_editor(blank_seed()).await;

    let err = editor
        .handle
        .apply_patch(FieldPatch::new("hero.headline.text", json!("x")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EditorError::InvalidPatch(PatchError::NotAnObject { .. })
    ));

    let err = editor
        .handle
        .apply_patch(FieldPatch::new("", json!("x")))
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidPatch(PatchError::InvalidPath(_))));

    let snapshot = editor.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.revision, 0);
    assert!(!snapshot.dirty);
}

#[tokio::test(start_paused = true)]
async fn test_batch_is_all_or_nothing() {
    let editor = spawn_editor(blank_seed()).await;
    let err = editor
        .handle
        .apply_patches(vec![
            FieldPatch::new("hero.headline", json!("Applied?")),
            FieldPatch::new("hero.headline.deeper", json!("no")),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidPatch(_)));

    let snapshot = editor.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.content.hero_headline(), "");

    let revision = editor
        .handle
        .apply_patches(vec![
            FieldPatch::new("hero.headline", json!("Both")),
            FieldPatch::new("hero.subheadline", json!("applied")),
        ])
        .await
        .unwrap();
    assert_eq!(revision, 1);
}

#[tokio::test(start_paused = true)]
async fn test_list_edits_replace_whole_array() {
    let editor = spawn_editor(blank_seed()).await;
    editor
        .handle
        .apply_patch(FieldPatch::new(
            "faq.items",
            json!([{"question": "Gluten free?", "answer": "Some loaves"}]),
        ))
        .await
        .unwrap();

    let snapshot = editor.handle.snapshot().await.unwrap();
    let items = snapshot.content.get("faq.items").and_then(|n| n.as_array()).unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_style_patch_is_validated() {
    let editor = spawn_editor(blank_seed()).await;

    let err = editor
        .handle
        .apply_style_patch(FieldPatch::new("accentColor", json!("teal")))
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidStyle(_)));

    editor
        .handle
        .apply_style_patch(FieldPatch::new("accentColor", json!("#0EA5E9")))
        .await
        .unwrap();
    editor
        .handle
        .apply_style_patch(FieldPatch::new("fontFamily", json!("Inter")))
        .await
        .unwrap();

    let snapshot = editor.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.style.accent_color.as_str(), "#0ea5e9");
    assert_eq!(snapshot.style.extra["fontFamily"], "Inter");
    assert_eq!(snapshot.revision, 2);
}
