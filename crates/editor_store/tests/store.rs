use editor_store::{
    EditorConfig, EditorStore, ElementKind, ElementPatch, MemoryPersistence, OfflinePersistence,
    PersistenceCall, Section, SectionKind, SectionPatch,
};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

fn setup() -> (EditorStore, Arc<MemoryPersistence>) {
    editor_store::init_tracing();
    let backend = Arc::new(MemoryPersistence::new());
    let store = EditorStore::new(EditorConfig::new(Uuid::new_v4()), backend.clone());
    (store, backend)
}

fn height(h: u32) -> SectionPatch {
    SectionPatch {
        min_height: Some(h),
        ..SectionPatch::default()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(600)).await;
}

#[tokio::test(start_paused = true)]
async fn undo_and_redo_restore_section_states() {
    let (store, _) = setup();
    let id = store.add_section(SectionKind::Text, None).await;
    let original = store.section(id).unwrap();

    assert!(store.update_section(id, height(999)));
    assert_eq!(store.section(id).unwrap().min_height, 999);

    assert!(store.undo());
    assert_eq!(store.section(id).unwrap(), original);

    assert!(store.redo());
    assert_eq!(store.section(id).unwrap().min_height, 999);

    // over-undo is a no-op
    assert!(store.undo());
    for _ in 0..5 {
        assert!(!store.undo());
    }
    assert_eq!(store.sections().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn history_keeps_the_newest_fifty() {
    let (store, _) = setup();
    let id = store.add_section(SectionKind::Hero, None).await;

    for h in 1..=60 {
        assert!(store.update_section(id, height(h)));
    }
    assert_eq!(store.history_depth(), (50, 0));

    let mut undone = 0;
    while store.undo() {
        undone += 1;
    }
    assert_eq!(undone, 50);
    // snapshots taken before edits 1..=10 were evicted
    assert_eq!(store.section(id).unwrap().min_height, 10);
}

#[tokio::test(start_paused = true)]
async fn new_edit_invalidates_redo() {
    let (store, _) = setup();
    let id = store.add_section(SectionKind::Text, None).await;
    store.update_section(id, height(1));
    store.undo();
    assert!(store.can_redo());

    store.update_section(id, height(2));
    assert!(!store.can_redo());
    assert!(!store.redo());
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_collapse_into_one_write() {
    let (store, backend) = setup();
    let id = store.add_section(SectionKind::Text, None).await;
    backend.take_calls();

    for h in [100, 200, 300, 400] {
        store.update_section(id, height(h));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(store.pending_writes(), 1);

    settle().await;
    let calls = backend.take_calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        PersistenceCall::UpdateSection(got, patch) => {
            assert_eq!(*got, id);
            assert_eq!(patch.min_height, Some(400));
        }
        other => panic!("unexpected call {other:?}"),
    }
    assert_eq!(backend.sections()[0].min_height, 400);
}

#[tokio::test(start_paused = true)]
async fn edits_to_different_sections_are_not_coalesced() {
    let (store, backend) = setup();
    let a = store.add_section(SectionKind::Text, None).await;
    let b = store.add_section(SectionKind::Cta, None).await;
    backend.take_calls();

    store.update_section(a, height(11));
    store.update_section(b, height(22));
    assert_eq!(store.pending_writes(), 2);

    settle().await;
    let mut written: Vec<Uuid> = backend
        .take_calls()
        .into_iter()
        .filter_map(|c| match c {
            PersistenceCall::UpdateSection(id, _) => Some(id),
            _ => None,
        })
        .collect();
    written.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(written, expected);
}

#[tokio::test(start_paused = true)]
async fn failed_writes_keep_local_state() {
    let (store, backend) = setup();
    backend.set_fail_writes(true);

    let id = store.add_section(SectionKind::Gallery, None).await;
    assert_eq!(store.selected_section(), Some(id));
    assert!(backend.sections().is_empty());

    store.update_section(id, height(123));
    settle().await;
    assert_eq!(store.section(id).unwrap().min_height, 123);
    assert!(backend
        .calls()
        .iter()
        .any(|c| matches!(c, PersistenceCall::UpdateSection(got, _) if *got == id)));
}

#[tokio::test(start_paused = true)]
async fn offline_store_uses_local_ids() {
    let store = EditorStore::new(EditorConfig::new(Uuid::new_v4()), Arc::new(OfflinePersistence));
    let id = store.add_section(SectionKind::Custom, None).await;
    assert!(store.section(id).is_some());

    let el = store.add_element(id, ElementKind::Text, 0.0, 0.0).await.unwrap();
    assert_eq!(store.element(el).unwrap().section_id, id);
}

#[tokio::test(start_paused = true)]
async fn server_ids_replace_local_ids() {
    let backend = Arc::new(MemoryPersistence::new().assign_ids(true));
    let store = EditorStore::new(EditorConfig::new(Uuid::new_v4()), backend.clone());

    let id = store.add_section(SectionKind::Hero, None).await;
    assert_eq!(backend.sections()[0].id, id);
    assert_eq!(store.sections()[0].id, id);
    assert_eq!(store.selected_section(), Some(id));

    let el = store.add_element(id, ElementKind::Image, 0.0, 0.0).await.unwrap();
    assert_eq!(backend.sections()[0].elements[0].id, el);
    assert_eq!(store.selected_element(), Some(el));
}

#[tokio::test(start_paused = true)]
async fn insert_and_reorder_keep_order_contiguous() {
    let (store, backend) = setup();
    let a = store.add_section(SectionKind::Hero, None).await;
    let b = store.add_section(SectionKind::Text, None).await;
    let c = store.add_section(SectionKind::Cta, Some(0)).await;

    let ids: Vec<Uuid> = store.sections().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![c, a, b]);
    assert_eq!(backend.calls().last(), Some(&PersistenceCall::ReorderSections(vec![c, a, b])));

    assert!(store.reorder_sections(0, 2).await);
    let sections = store.sections();
    let ids: Vec<Uuid> = sections.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, b, c]);
    for (i, s) in sections.iter().enumerate() {
        assert_eq!(s.order_index, i as u32);
    }
    assert_eq!(backend.calls().last(), Some(&PersistenceCall::ReorderSections(vec![a, b, c])));

    assert!(!store.reorder_sections(0, 7).await);
    assert!(!store.reorder_sections(1, 1).await);
}

#[tokio::test(start_paused = true)]
async fn removing_selected_section_clears_selection() {
    let (store, backend) = setup();
    let a = store.add_section(SectionKind::Hero, None).await;
    let b = store.add_section(SectionKind::Text, None).await;
    assert_eq!(store.selected_section(), Some(b));

    assert!(store.select_section(Some(a)));
    assert!(store.remove_section(a).await);
    assert_eq!(store.selected_section(), None);
    assert_eq!(store.sections()[0].id, b);
    assert_eq!(store.sections()[0].order_index, 0);
    assert!(backend.calls().contains(&PersistenceCall::DeleteSection(a)));

    assert!(!store.remove_section(a).await);
    assert!(!store.update_section(a, height(1)));
}

#[tokio::test(start_paused = true)]
async fn elements_snap_to_grid_and_stack() {
    let (store, _) = setup();
    let s = store.add_section(SectionKind::Custom, None).await;

    let first = store.add_element(s, ElementKind::Button, 13.0, 3.0).await.unwrap();
    let second = store.add_element(s, ElementKind::Shape, 40.0, 40.0).await.unwrap();

    let e = store.element(first).unwrap();
    assert_eq!((e.x, e.y, e.z_index), (16.0, 0.0, 0));
    assert_eq!(store.element(second).unwrap().z_index, 1);
    assert_eq!(store.selected_element(), Some(second));

    assert!(store.move_element(first, 21.0, 30.0));
    let e = store.element(first).unwrap();
    assert_eq!((e.x, e.y), (24.0, 32.0));
    assert!(!store.move_element(first, 23.0, 33.0));

    assert!(store.resize_element(first, 1.0, 99.0));
    let e = store.element(first).unwrap();
    assert_eq!((e.width, e.height), (8.0, 96.0));

    assert!(store.bring_element_to_front(first));
    assert_eq!(store.element(first).unwrap().z_index, 1);
    assert_eq!(store.element(second).unwrap().z_index, 0);
    assert!(!store.bring_element_to_front(first));
}

#[tokio::test(start_paused = true)]
async fn element_edits_are_undoable() {
    let (store, _) = setup();
    let s = store.add_section(SectionKind::Custom, None).await;
    let el = store.add_element(s, ElementKind::Text, 0.0, 0.0).await.unwrap();
    let original = store.element(el).unwrap();

    assert!(store.move_element(el, 40.0, 40.0));
    assert!(store.undo());
    let e = store.element(el).unwrap();
    assert_eq!((e.x, e.y), (0.0, 0.0));
    assert!(store.redo());
    let e = store.element(el).unwrap();
    assert_eq!((e.x, e.y), (40.0, 40.0));

    assert!(store.resize_element(el, 96.0, 64.0));
    assert_eq!(store.element(el).unwrap().width, 96.0);
    assert!(store.undo());
    let e = store.element(el).unwrap();
    assert_eq!((e.width, e.height), (original.width, original.height));
    assert_eq!((e.x, e.y), (40.0, 40.0));

    assert!(store.update_element(
        el,
        ElementPatch {
            content: Some(serde_json::json!({ "text": "edited" })),
            ..ElementPatch::default()
        },
    ));
    assert!(!store.can_redo());
    assert_eq!(store.element(el).unwrap().content["text"], "edited");
    assert!(store.undo());
    assert_eq!(store.element(el).unwrap().content, original.content);

    assert!(store.undo());
    assert_eq!(store.element(el).unwrap(), original);
}

#[tokio::test(start_paused = true)]
async fn position_and_size_writes_are_independent() {
    let (store, backend) = setup();
    let s = store.add_section(SectionKind::Custom, None).await;
    let el = store.add_element(s, ElementKind::Text, 0.0, 0.0).await.unwrap();
    backend.take_calls();

    store.move_element(el, 16.0, 16.0);
    store.move_element(el, 32.0, 32.0);
    store.resize_element(el, 64.0, 64.0);
    store.update_element(
        el,
        ElementPatch {
            content: Some(serde_json::json!({ "text": "hello" })),
            ..ElementPatch::default()
        },
    );
    assert_eq!(store.pending_writes(), 3);

    settle().await;
    let calls = backend.take_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.contains(&PersistenceCall::UpdateElement(el, ElementPatch::position(32.0, 32.0))));
    assert!(calls.contains(&PersistenceCall::UpdateElement(el, ElementPatch::size(64.0, 64.0))));

    let stored = &backend.sections()[0].elements[0];
    assert_eq!((stored.x, stored.width), (32.0, 64.0));
    assert_eq!(stored.content["text"], "hello");
}

#[tokio::test(start_paused = true)]
async fn removing_element_restacks_siblings() {
    let (store, backend) = setup();
    let s = store.add_section(SectionKind::Custom, None).await;
    let a = store.add_element(s, ElementKind::Text, 0.0, 0.0).await.unwrap();
    let b = store.add_element(s, ElementKind::Text, 0.0, 0.0).await.unwrap();
    let c = store.add_element(s, ElementKind::Text, 0.0, 0.0).await.unwrap();

    assert!(store.select_element(Some(a)));
    assert!(store.remove_element(a).await);
    assert_eq!(store.selected_element(), None);
    assert_eq!(store.element(b).unwrap().z_index, 0);
    assert_eq!(store.element(c).unwrap().z_index, 1);

    settle().await;
    let stored = &backend.sections()[0].elements;
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|e| e.z_index < 2));
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_pending_writes() {
    let (store, backend) = setup();
    let id = store.add_section(SectionKind::Text, None).await;
    backend.take_calls();

    store.update_section(id, height(5));
    assert_eq!(store.shutdown(), 1);

    settle().await;
    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn load_replaces_state_in_order() {
    let page = Uuid::new_v4();
    let section = |order: u32| Section {
        id: Uuid::new_v4(),
        page_id: page,
        kind: SectionKind::Text,
        order_index: order,
        config: serde_json::Value::Null,
        background: serde_json::Value::Null,
        min_height: 100 + order,
        elements: vec![],
    };
    let rows = vec![section(5), section(1), section(3)];
    let backend = Arc::new(MemoryPersistence::with_sections(rows));
    let store = EditorStore::new(EditorConfig::new(page), backend);

    assert_eq!(store.load().await.unwrap(), 3);
    let heights: Vec<u32> = store.sections().iter().map(|s| s.min_height).collect();
    assert_eq!(heights, vec![101, 103, 105]);
    assert!(store.sections().iter().enumerate().all(|(i, s)| s.order_index == i as u32));
    assert!(!store.can_undo());
}
