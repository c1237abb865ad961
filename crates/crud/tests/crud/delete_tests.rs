//! Delete routing: single, by query, by type, and the list-then-delete path.

use helios_crud::backends::memory::MemoryBackendConfig;
use helios_crud::core::BackendCapability;
use helios_crud::crud::{Crud, CrudConfig, Subject};
use helios_crud::error::{BackendError, StorageError};
use helios_crud::types::{Expression, Operator, Predicate, QueryModel};

use crate::common::*;

// ============================================================================
// Delete
// ============================================================================

#[test]
fn test_delete_single() {
    let crud = create_crud();
    let saved = seed(&crud);
    assert_eq!(crud.delete(Subject::one(saved[0].clone())).unwrap(), 1);
    assert_eq!(crud.delete(Subject::one(saved[0].clone())).unwrap(), 0);
    assert_eq!(crud.count(Subject::<Person>::of_type()).unwrap(), 4);
}

#[test]
fn test_delete_by_query_native() {
    let crud = create_crud();
    seed(&crud);
    let query = QueryModel::for_entity::<Person>()
        .with_filter(Predicate::new("age", Operator::GreaterThan, 40).into());

    assert_eq!(crud.delete(Subject::<Person>::query(query)).unwrap(), 2);
    assert_eq!(crud.backend().stats().delete_query, 1);
    assert_eq!(crud.backend().stats().list, 0);
}

#[test]
fn test_delete_by_type_composite() {
    let crud = create_minimal_crud();
    seed(&crud);

    let mut recorder: Recorder<usize> = Recorder::new();
    crud.delete_with(Subject::<Person>::of_type(), &mut recorder);

    // Listed once, then deleted element by element.
    let stats = crud.backend().stats();
    assert_eq!(stats.delete_query, 0);
    assert_eq!(stats.list, 1);
    assert_eq!(stats.delete, 5);
    assert_eq!(recorder.successes(), vec![&1, &1, &1, &1, &1]);
    assert_eq!(recorder.progress().last(), Some(&Some((5, 5))));
    assert_eq!(crud.backend().len_of::<Person>(), 0);
}

#[test]
fn test_delete_by_query_composite_blocking() {
    let crud = create_minimal_crud();
    seed(&crud);
    let filter = Expression::or(vec![
        Predicate::new("name", Operator::Like, "S%").into(),
        Predicate::is_null("address").into(),
    ])
    .unwrap();
    let query = QueryModel::for_entity::<Person>().with_filter(filter);

    assert_eq!(crud.delete(Subject::<Person>::query(query)).unwrap(), 3);
    let left = crud.list(Subject::one(Person::template())).unwrap();
    assert_eq!(sorted(names(&left)), vec!["Bob", "Carol"]);
}

#[test]
fn test_composite_delete_without_matches_reports_zero() {
    let crud = create_minimal_crud();
    seed(&crud);
    let query = QueryModel::for_entity::<Person>()
        .with_filter(Predicate::new("age", Operator::GreaterThan, 100).into());

    let mut recorder: Recorder<usize> = Recorder::new();
    crud.delete_with(Subject::<Person>::query(query), &mut recorder);

    assert_eq!(recorder.successes(), vec![&0]);
    assert_eq!(crud.backend().stats().delete, 0);
}

#[test]
fn test_composite_delete_with_native_batch() {
    let crud = create_crud_with(
        MemoryBackendConfig::new().without(BackendCapability::QueryDelete),
        CrudConfig::default(),
    );
    seed(&crud);

    assert_eq!(crud.delete(Subject::<Person>::of_type()).unwrap(), 5);
    let stats = crud.backend().stats();
    assert_eq!(stats.list, 1);
    assert_eq!(stats.delete_batch, 1);
}

#[test]
fn test_composite_delete_stops_at_first_failure() {
    init_tracing();
    // Five seeding saves, then the third delete fails.
    let crud = Crud::new(FlakyBackend::new(MemoryBackendConfig::minimal(), 8));
    seed(&crud);
    let query = QueryModel::for_entity::<Person>()
        .with_filter(Predicate::new("age", Operator::GreaterThan, 0).into());

    let mut recorder: Recorder<usize> = Recorder::new();
    crud.delete_with(Subject::<Person>::query(query), &mut recorder);

    assert_eq!(recorder.successes(), vec![&1, &1]);
    assert_eq!(recorder.failures().len(), 1);
    assert!(matches!(
        recorder.failures()[0],
        StorageError::Backend(BackendError::OperationFailed { .. })
    ));
    assert_eq!(crud.backend().writes(), 8);
    assert_eq!(crud.backend().inner().len_of::<Person>(), 3);
}
