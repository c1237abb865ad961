//! Save and update through the orchestrator.

use helios_crud::crud::Subject;
use helios_crud::error::{ResourceError, StorageError};

use crate::common::*;

// ============================================================================
// Save / update
// ============================================================================

#[test]
fn test_save_assigns_sequential_keys() {
    let crud = create_crud();
    let saved = seed(&crud);
    let ids: Vec<_> = saved.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
}

#[test]
fn test_save_duplicate_key_fails() {
    let crud = create_crud();
    let saved = crud.save(Person::named("Steve")).unwrap();
    let err = crud.save(saved).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Resource(ResourceError::AlreadyExists { .. })
    ));
}

#[test]
fn test_update_replaces_stored_entity() {
    let crud = create_crud();
    let mut steve = crud.save(Person::named("Steve").aged(41)).unwrap();
    steve.age = Some(42);
    crud.update(steve.clone()).unwrap();

    let found = crud.find(&Person::named("Steve")).unwrap();
    assert_eq!(found, Some(steve));
}

#[test]
fn test_update_missing_entity_fails() {
    let crud = create_crud();
    let mut ghost = Person::named("Ghost");
    ghost.id = Some(99);
    let err = crud.update(ghost).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Resource(ResourceError::NotFound { .. })
    ));
}

#[test]
fn test_blocking_save_matches_callback_value() {
    // Two fresh stores hand out the same sequential key.
    let blocking = create_crud();
    let via_callback = create_crud();
    let person = Person::named("Steve").aged(41).living_in("Boston");

    let saved = blocking.save(person.clone()).unwrap();

    let mut recorder: Recorder<Vec<Person>> = Recorder::new();
    via_callback.save_with(Subject::one(person), &mut recorder);

    assert_eq!(recorder.events.len(), 1);
    assert_eq!(saved.id, Some(1));
    assert_eq!(recorder.successes(), vec![&vec![saved]]);
}
