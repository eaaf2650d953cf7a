extern crate include_dir;
extern crate leo;
extern crate rstest;

use std::thread;

use include_dir::{include_dir, Dir, File};
use rstest::rstest;

use leo::fixture::{run_fixture, Expectation, FixtureHeader, FixtureOutcome};
use leo::frontend::error::FrontendErrorKind;
use leo::frontend::ast::Type;
use leo::frontend::{check_program, clean_comments, parse_program, process_code, CheckResult};


static FIXTURES: Dir = include_dir!("$CARGO_MANIFEST_DIR/tests/compiler");

fn fixture_files() -> Vec<&'static File<'static>> {
    let mut files: Vec<_> = FIXTURES.dirs()
        .flat_map(|dir| dir.files())
        .filter(|file| file.path().extension().map_or(false, |ext| ext == "leo"))
        .collect();
    files.sort_by_key(|file| file.path());
    files
}

fn run(file: &File) -> FixtureOutcome {
    let name = file.path().to_str().unwrap();
    let source = file.contents_utf8().unwrap();
    match run_fixture(name, source) {
        Ok(outcome) => outcome,
        Err(e) => panic!("{}: {}", name, e),
    }
}

fn kinds(result: CheckResult) -> Vec<FrontendErrorKind> {
    match result {
        Ok(()) => vec![],
        Err(errors) => errors.into_iter().map(|e| e.item).collect(),
    }
}

fn source_of(path: &str) -> &'static str {
    FIXTURES.get_file(path).unwrap().contents_utf8().unwrap()
}

#[test]
fn every_fixture_meets_its_expectation() {
    let files = fixture_files();
    assert!(!files.is_empty());
    let failed_cases: Vec<_> = files.iter()
        .map(|file| run(file))
        .inspect(|outcome| println!("{}", outcome))
        .filter(|outcome| !outcome.passed())
        .map(|outcome| outcome.name)
        .collect();
    assert_eq!(failed_cases.len(), 0usize, "{:?}", failed_cases);
}

#[test]
fn fixture_directories_match_expectations() {
    for file in fixture_files() {
        let source = file.contents_utf8().unwrap();
        let header = FixtureHeader::parse(source).unwrap().unwrap();
        let expected = if file.path().starts_with("pass") { Expectation::Pass } else { Expectation::Fail };
        assert_eq!(header.expectation, expected, "{:?}", file.path());
    }
}

#[rstest]
#[case("fail/mapping_set_undeclared.leo", "UnresolvedIdentifier")]
#[case("fail/duplicate_declaration.leo", "DuplicateDeclaration")]
#[case("fail/record_field_mismatch.leo", "RecordFieldMismatch")]
#[case("fail/not_a_mapping.leo", "NotAMapping")]
#[case("fail/finalize_not_scheduled.leo", "FinalizeError")]
#[case("fail/syntax_error.leo", "ParseError")]
#[case("fail/record_without_owner.leo", "RecordFieldMismatch")]
#[case("fail/get_key_mismatch.leo", "KeyTypeMismatch")]
#[case("fail/literal_out_of_range.leo", "ArgumentError")]
#[case("fail/mapping_outside_finalize.leo", "FinalizeError")]
fn fail_fixture_reports_kind(#[case] path: &str, #[case] kind: &str) {
    let errors = process_code(path, source_of(path)).unwrap_err();
    assert!(
        errors.iter().any(|e| e.item.to_string().starts_with(kind)),
        "{} has no {} diagnostic: {:?}", path, kind, errors
    );
}

#[test]
fn undeclared_mapping_scenario_reports_every_violation() {
    let path = "fail/mapping_set_undeclared.leo";
    let errors = process_code(path, source_of(path)).unwrap_err();
    let located: Vec<_> = errors.iter()
        .map(|e| (e.get_meta().clone(), e.item.clone()))
        .collect();
    let foo = FrontendErrorKind::UnresolvedIdentifier { ident: String::from("foo") };
    assert_eq!(located, vec![
        (format!("{}:20:22", path), foo.clone()),
        (format!("{}:21:9", path), foo),
        (format!("{}:22:21", path), FrontendErrorKind::KeyTypeMismatch {
            mapping: String::from("amounts"),
            expected: Type::Address,
            actual: Type::U8,
        }),
        (format!("{}:23:27", path), FrontendErrorKind::ValueTypeMismatch {
            mapping: String::from("amounts"),
            expected: Type::U128,
            actual: Type::U8,
        }),
    ]);
}

#[test]
fn checking_is_idempotent_for_all_fixtures() {
    for file in fixture_files() {
        let source = file.contents_utf8().unwrap();
        let first = process_code("fixture.leo", source).map(|_| ());
        let second = process_code("fixture.leo", source).map(|_| ());
        assert_eq!(first, second, "{:?}", file.path());
    }
}

#[test]
fn reordering_declarations_keeps_the_result() {
    let path = "fail/mapping_set_undeclared.leo";
    let (clean_code, _) = clean_comments(source_of(path));
    let mut program = parse_program(&clean_code).unwrap_or_else(|e| panic!("{:?}", e));
    let original = kinds(check_program(&program));
    program.items.rotate_left(2);
    assert_eq!(kinds(check_program(&program)), original);
    program.items.reverse();
    assert_eq!(kinds(check_program(&program)), original);
}

#[test]
fn independent_violations_are_all_reported() {
    let source = r#"
    program test.aleo {
        mapping a: address => u8;
        transition t(public addr: address) { return then finalize(addr); }
        finalize t(public addr: address) {
            a.set(1u8, 1u8);
            missing.set(addr, 1u8);
            a.set(addr, true);
            let x: u8 = 300u8;
        }
    }
    "#;
    let errors = process_code("violations.leo", source).unwrap_err();
    assert_eq!(errors.len(), 4, "{:?}", errors);
}

#[test]
fn parallel_checking_matches_sequential_checking() {
    let files = fixture_files();
    let sequential: Vec<_> = files.iter().map(|file| run(file).errors).collect();
    let parallel: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = files.iter()
            .map(|file| scope.spawn(move || run(file).errors))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    assert_eq!(parallel, sequential);
}
