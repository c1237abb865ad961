//! Query-by-example tests through the orchestrator.

use helios_crud::error::{StorageError, ValidationError};
use helios_crud::filter::{FieldOperators, FilterCompiler};
use helios_crud::types::Operator;

use crate::common::*;

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_compile_only_populated_fields() {
    let filter = FilterCompiler::new()
        .compile(&Person::named("Steve").aged(41))
        .unwrap();
    assert_eq!(filter.to_string(), "(name = \"Steve\" AND age = 41)");
}

#[test]
fn test_compile_nested_single_leaf() {
    let filter = FilterCompiler::new()
        .compile(&Person::template().living_in("Boston"))
        .unwrap();
    assert_eq!(filter.to_string(), "address.city = \"Boston\"");
}

#[test]
fn test_compile_empty_template_matches_all() {
    assert!(FilterCompiler::new().compile(&Person::template()).is_none());
}

#[test]
fn test_compile_skips_multi_valued_fields() {
    let filter = FilterCompiler::new().compile(&Person::template().tagged(&["admin"]));
    assert!(filter.is_none());
}

// ============================================================================
// Operator overrides
// ============================================================================

#[test]
fn test_greater_than_override() {
    let crud = create_crud();
    seed(&crud);
    let compiler = FilterCompiler::new().with_operator("age", Operator::GreaterThan);

    let people = crud
        .query_by_example(&Person::template().aged(30), &compiler)
        .unwrap();
    assert_eq!(sorted(names(&people)), vec!["Alice", "Bob", "Steve"]);
}

#[test]
fn test_like_override() {
    let crud = create_crud();
    seed(&crud);
    let compiler = FilterCompiler::new().with_operator("name", Operator::Like);

    let people = crud
        .query_by_example(&Person::named("S%"), &compiler)
        .unwrap();
    assert_eq!(sorted(names(&people)), vec!["Sam", "Steve"]);
}

#[test]
fn test_null_check_override_on_unset_composite() {
    let crud = create_crud();
    seed(&crud);
    let compiler = FilterCompiler::new().with_operator("address", Operator::IsNull);

    let people = crud
        .query_by_example(&Person::template(), &compiler)
        .unwrap();
    assert_eq!(names(&people), vec!["Alice"]);
}

#[test]
fn test_nested_path_override() {
    let crud = create_crud();
    seed(&crud);
    let operators = FieldOperators::from([
        ("address.city".to_string(), Operator::NotEqualTo),
        ("age".to_string(), Operator::LessThan),
    ]);
    let compiler = FilterCompiler::new().with_operators(operators);

    // Alice has no address, so the nested comparison excludes her.
    let template = Person::template().aged(45).living_in("Boston");
    let people = crud.query_by_example(&template, &compiler).unwrap();
    assert_eq!(names(&people), vec!["Carol"]);
}

#[test]
fn test_field_filter_excludes_paths() {
    let crud = create_crud();
    seed(&crud);
    let compiler = FilterCompiler::new().with_field_filter(|path| path != "age");

    let people = crud
        .query_by_example(&Person::named("Steve").aged(99), &compiler)
        .unwrap();
    assert_eq!(names(&people), vec!["Steve"]);
}

// ============================================================================
// Filtering by bare type
// ============================================================================

#[test]
fn test_query_by_type_with_null_checks() {
    let crud = create_crud();
    seed(&crud);
    let compiler = FilterCompiler::new().with_operator("address", Operator::IsNotNull);

    let people = crud.query_by_type::<Person>(&compiler).unwrap();
    assert_eq!(people.len(), 4);
    assert!(people.iter().all(|p| p.address.is_some()));
}

#[test]
fn test_query_by_type_without_overrides_lists_all() {
    let crud = create_crud();
    seed(&crud);
    let people = crud.query_by_type::<Person>(&FilterCompiler::new()).unwrap();
    assert_eq!(people.len(), 5);
}

#[test]
fn test_query_by_type_rejects_value_operators() {
    let crud = create_crud();
    let compiler = FilterCompiler::new()
        .with_operator("address", Operator::IsNull)
        .with_operator("age", Operator::GreaterThan);

    let err = crud.query_by_type::<Person>(&compiler).unwrap_err();
    match err {
        StorageError::Validation(ValidationError::InvalidOperator {
            entity_type,
            path,
            operator,
        }) => {
            assert_eq!(entity_type, "Person");
            assert_eq!(path, "age");
            assert_eq!(operator, Operator::GreaterThan);
        }
        other => panic!("expected InvalidOperator, got {other:?}"),
    }
}
