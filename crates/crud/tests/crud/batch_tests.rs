//! Batch dispatch tests: native vs simulated, fail-fast, progress.

use helios_crud::backends::memory::MemoryBackendConfig;
use helios_crud::core::BackendCapability;
use helios_crud::crud::{Crud, CrudConfig, Subject};
use helios_crud::error::{BackendError, StorageError};

use crate::common::*;

fn create_flaky_crud(fail_on: usize) -> Crud<FlakyBackend> {
    init_tracing();
    Crud::new(FlakyBackend::new(MemoryBackendConfig::minimal(), fail_on))
}

// ============================================================================
// Native batches
// ============================================================================

#[test]
fn test_native_save_batch_is_one_call() {
    let crud = create_crud();
    let mut recorder: Recorder<Vec<Person>> = Recorder::new();

    crud.save_with(Subject::many(create_people()), &mut recorder);

    let stats = crud.backend().stats();
    assert_eq!(stats.save_batch, 1);
    assert_eq!(stats.save, 0);
    assert_eq!(recorder.events.len(), 1);
    assert_eq!(recorder.successes()[0].len(), 5);
    assert_eq!(recorder.progress(), vec![None]);
}

#[test]
fn test_native_save_batch_preserves_order_and_assigns_keys() {
    let crud = create_crud();
    let saved = crud.save_all(create_people()).unwrap();
    assert_eq!(names(&saved), vec!["Steve", "Sam", "Alice", "Bob", "Carol"]);
    assert!(saved.iter().all(|p| p.id.is_some()));
}

#[test]
fn test_force_simulated_batch() {
    let crud = create_crud_with(
        MemoryBackendConfig::new(),
        CrudConfig::new().with_force_simulated_batch(true),
    );
    let saved = crud.save_all(create_people()).unwrap();

    assert_eq!(saved.len(), 5);
    let stats = crud.backend().stats();
    assert_eq!(stats.save, 5);
    assert_eq!(stats.save_batch, 0);
}

#[test]
fn test_simulated_when_capability_missing() {
    let crud = create_crud_with(
        MemoryBackendConfig::new().without(BackendCapability::NativeUpdateBatch),
        CrudConfig::default(),
    );
    let mut saved = crud.save_all(create_people()).unwrap();
    for person in &mut saved {
        person.age = person.age.map(|a| a + 1);
    }
    let updated = crud.update_all(saved).unwrap();

    let stats = crud.backend().stats();
    assert_eq!(stats.save_batch, 1);
    assert_eq!(stats.update_batch, 0);
    assert_eq!(stats.update, 5);
    assert_eq!(updated[0].age, Some(42));
}

// ============================================================================
// Simulated batches
// ============================================================================

#[test]
fn test_simulated_batch_notifies_per_item_with_progress() {
    let crud = create_minimal_crud();
    let mut recorder: Recorder<Vec<Person>> = Recorder::new();

    crud.save_with(Subject::many(create_people()), &mut recorder);

    assert_eq!(recorder.events.len(), 5);
    assert!(recorder.failures().is_empty());
    assert_eq!(
        recorder.progress(),
        vec![
            Some((1, 5)),
            Some((2, 5)),
            Some((3, 5)),
            Some((4, 5)),
            Some((5, 5))
        ]
    );
    for event in &recorder.events {
        match event {
            Event::Success { value, message, .. } => {
                assert_eq!(value.len(), 1);
                assert_eq!(message, "saved Person");
            }
            Event::Failure { .. } => panic!("unexpected failure"),
        }
    }
}

#[test]
fn test_simulated_batch_stops_at_first_failure() {
    let crud = create_flaky_crud(3);
    let mut recorder: Recorder<Vec<Person>> = Recorder::new();

    crud.save_with(Subject::many(create_people()), &mut recorder);

    // Two successes, one failure, nothing after it.
    assert_eq!(recorder.successes().len(), 2);
    assert_eq!(recorder.failures().len(), 1);
    assert!(matches!(
        recorder.events.last(),
        Some(Event::Failure { .. })
    ));
    assert!(matches!(
        recorder.failures()[0],
        StorageError::Backend(BackendError::OperationFailed { .. })
    ));

    assert_eq!(crud.backend().writes(), 3);
    assert_eq!(crud.backend().inner().len_of::<Person>(), 2);
}

#[test]
fn test_failure_notification_has_empty_message() {
    let crud = create_flaky_crud(1);
    let mut recorder: Recorder<Vec<Person>> = Recorder::new();

    crud.save_with(Subject::many(create_people()), &mut recorder);

    assert_eq!(recorder.events.len(), 1);
    match &recorder.events[0] {
        Event::Failure { message, .. } => assert!(message.is_empty()),
        Event::Success { .. } => panic!("expected failure"),
    }
    assert_eq!(crud.backend().writes(), 1);
}

#[test]
fn test_blocking_batch_returns_first_error_and_keeps_prefix() {
    let crud = create_flaky_crud(4);
    let result = crud.save_all(create_people());

    assert!(result.is_err());
    assert_eq!(crud.backend().inner().len_of::<Person>(), 3);
}

#[test]
fn test_single_element_collection_has_no_batch_progress() {
    let crud = create_minimal_crud();
    let mut recorder: Recorder<Vec<Person>> = Recorder::new();

    crud.save_with(Subject::many(vec![Person::named("Solo")]), &mut recorder);

    assert_eq!(recorder.events.len(), 1);
    assert_eq!(recorder.progress(), vec![None]);
}

#[test]
fn test_simulated_delete_batch_counts() {
    let crud = create_minimal_crud();
    let saved = seed(&crud);

    let removed = crud.delete(Subject::many(saved[..3].to_vec())).unwrap();

    assert_eq!(removed, 3);
    assert_eq!(crud.backend().stats().delete, 3);
    assert_eq!(crud.backend().len_of::<Person>(), 2);
}

// ============================================================================
// Empty collections
// ============================================================================

#[test]
fn test_empty_collection_notifies_once() {
    for crud in [create_crud(), create_minimal_crud()] {
        let mut saves: Recorder<Vec<Person>> = Recorder::new();
        crud.save_with(Subject::many(Vec::new()), &mut saves);
        assert_eq!(saves.events.len(), 1);
        assert!(saves.successes()[0].is_empty());

        let mut deletes: Recorder<usize> = Recorder::new();
        crud.delete_with(Subject::<Person>::many(Vec::new()), &mut deletes);
        assert_eq!(deletes.successes(), vec![&0]);

        let stats = crud.backend().stats();
        assert_eq!(stats.save + stats.save_batch, 0);
        assert_eq!(stats.delete + stats.delete_batch, 0);
    }
}

#[test]
fn test_empty_collection_blocking_forms() {
    let crud = create_minimal_crud();
    assert!(crud.save_all(Vec::<Person>::new()).unwrap().is_empty());
    assert!(crud.update_all(Vec::<Person>::new()).unwrap().is_empty());
    assert_eq!(crud.delete(Subject::<Person>::many(Vec::new())).unwrap(), 0);
}
