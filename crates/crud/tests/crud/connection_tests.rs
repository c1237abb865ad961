//! Closed-connection behavior of every verb.

use helios_crud::core::Capture;
use helios_crud::crud::Subject;
use helios_crud::error::{ConnectionError, StorageError};

use crate::common::*;

// ============================================================================
// Connection
// ============================================================================

#[test]
fn test_closed_connection_fails_every_verb() {
    let crud = create_crud();
    let saved = seed(&crud);
    crud.backend().disconnect();

    let is_closed = |err: StorageError| {
        matches!(err, StorageError::Connection(ConnectionError::Closed { .. }))
    };
    assert!(is_closed(crud.save(Person::named("X")).unwrap_err()));
    assert!(is_closed(crud.update(saved[0].clone()).unwrap_err()));
    assert!(is_closed(crud.find(&Person::named("Steve")).unwrap_err()));
    assert!(is_closed(crud.list(Subject::one(Person::template())).unwrap_err()));
    assert!(is_closed(crud.count(Subject::<Person>::of_type()).unwrap_err()));
    assert!(is_closed(crud.delete(Subject::<Person>::of_type()).unwrap_err()));
    assert_eq!(crud.backend().stats().save, 5);
}

#[test]
fn test_closed_connection_notifies_once() {
    let crud = create_crud();
    crud.backend().disconnect();

    let mut recorder: Recorder<Vec<Person>> = Recorder::new();
    crud.save_with(Subject::many(create_people()), &mut recorder);
    assert_eq!(recorder.events.len(), 1);
    assert_eq!(recorder.failures().len(), 1);

    crud.backend().connect();
    let mut capture: Capture<Vec<Person>> = Capture::new();
    crud.save_with(Subject::many(create_people()), &mut capture);
    assert_eq!(capture.into_result("save").unwrap().len(), 5);
}
