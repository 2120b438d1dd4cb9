// Unit tests for the persisted session identifier

use crate::session::{SESSION_ID_KEY, SessionStore, session_id};
use crate::storage::Storage;

#[test]
fn given_empty_storage_when_get_then_returns_none() {
    let mut storage = Storage::new();

    assert_eq!(SessionStore::new(&mut storage).get(), None);
}

/// **VALUE**: Verifies the first identifier wins.
///
/// **WHY THIS MATTERS**: The server correlates every event with this identifier. If a
/// later assignment replaced it, state held by the server for this client would be orphaned.
#[test]
fn given_session_id_set_when_set_again_with_different_value_then_first_value_is_kept() {
    // GIVEN: A stored identifier
    let mut storage = Storage::new();
    let mut store = SessionStore::new(&mut storage);
    assert!(store.set("first"));

    // WHEN: A different identifier is assigned
    let written = store.set("second");

    // THEN: The second call is ignored
    assert!(!written);
    assert_eq!(store.get(), Some("first"));
    assert_eq!(storage.get(SESSION_ID_KEY), Some("first"));
}

#[test]
fn given_empty_id_when_set_then_nothing_is_stored() {
    let mut storage = Storage::new();

    let written = SessionStore::new(&mut storage).set("");

    assert!(!written);
    assert!(storage.is_empty());
}

#[test]
fn given_storage_cleared_externally_when_set_then_new_id_is_accepted() {
    // GIVEN: An identifier that was then wiped with the whole scope
    let mut storage = Storage::new();
    SessionStore::new(&mut storage).set("old");
    storage.replace_all(Default::default());

    // WHEN: A new identifier arrives
    SessionStore::new(&mut storage).set("new");

    // THEN: It is stored
    assert_eq!(session_id(&storage), Some("new"));
}
