//! Subscription surface and draft persistence.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use banter_core::draft::{DraftStore, MemoryDraftStore, draft_key};
use support::{MockApi, RecordingSession, page, raw_comment, store_with, store_with_drafts};

#[tokio::test]
async fn subscribers_are_notified_per_committed_change() {
    let api = MockApi::new();
    api.push_list(Ok(page(vec![raw_comment("c1", "hello")], false)));
    let store = store_with(Arc::clone(&api), RecordingSession::signed_in());

    let fired = Arc::new(AtomicUsize::new(0));
    let _sub = store.subscribe("thread-1", {
        let fired = Arc::clone(&fired);
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    });

    // One commit entering Loading, one committing the page.
    store.fetch_comments("thread-1").await;
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    // Other threads never wake this subscriber.
    store.set_draft("thread-2", "elsewhere");
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dropping_the_subscription_unregisters_it() {
    let api = MockApi::new();
    let store = store_with(Arc::clone(&api), RecordingSession::signed_in());

    let fired = Arc::new(AtomicUsize::new(0));
    let sub = store.subscribe("thread-1", {
        let fired = Arc::clone(&fired);
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    });

    store.set_draft("thread-1", "a");
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    drop(sub);
    store.set_draft("thread-1", "ab");
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn two_subscribers_on_one_thread_both_fire() {
    let api = MockApi::new();
    let store = store_with(Arc::clone(&api), RecordingSession::signed_in());

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let _a = store.subscribe("thread-1", {
        let first = Arc::clone(&first);
        move || {
            first.fetch_add(1, Ordering::SeqCst);
        }
    });
    let _b = store.subscribe("thread-1", {
        let second = Arc::clone(&second);
        move || {
            second.fetch_add(1, Ordering::SeqCst);
        }
    });

    store.set_draft("thread-1", "x");
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn draft_round_trips_through_the_store() {
    let api = MockApi::new();
    let store = store_with(Arc::clone(&api), RecordingSession::signed_in());

    store.set_draft("thread-1", "half-written thought");
    assert_eq!(store.thread_view("thread-1").draft, "half-written thought");

    store.set_draft("thread-1", "");
    assert_eq!(store.thread_view("thread-1").draft, "");
}

#[tokio::test]
async fn draft_survives_an_engine_restart() {
    let api = MockApi::new();
    let drafts: Arc<MemoryDraftStore> = Arc::new(MemoryDraftStore::new());

    let store = store_with_drafts(
        Arc::clone(&api),
        RecordingSession::signed_in(),
        Arc::clone(&drafts),
    );
    store.set_draft("thread-1", "persisted");
    drop(store);

    let revived = store_with_drafts(
        MockApi::new(),
        RecordingSession::signed_in(),
        Arc::clone(&drafts),
    );
    assert_eq!(revived.thread_view("thread-1").draft, "persisted");
}

#[tokio::test]
async fn confirmed_post_clears_the_persisted_draft() {
    let api = MockApi::new();
    api.push_create(Ok(raw_comment("c-srv", "shipped")));
    let drafts: Arc<MemoryDraftStore> = Arc::new(MemoryDraftStore::new());
    let store = store_with_drafts(
        Arc::clone(&api),
        RecordingSession::signed_in(),
        Arc::clone(&drafts),
    );

    store.set_draft("thread-1", "shipped");
    assert!(drafts.get(&draft_key("thread-1")).is_some());

    store
        .add_comment("thread-1", "shipped", None)
        .await
        .expect("create succeeds");

    assert!(
        drafts.get(&draft_key("thread-1")).is_none(),
        "persisted draft removed after confirmation"
    );
}
