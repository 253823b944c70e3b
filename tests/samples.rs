use cppfier::harness::{self, Failure};
use cppfier::Severity;
use std::path::Path;

fn samples(dir: &str) -> harness::Report {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join(dir);
    harness::check_dir(&dir).unwrap()
}

fn assert_matches(report: &harness::Report) {
    let failures: Vec<String> = report.failures.iter().map(Failure::to_string).collect();
    assert!(failures.is_empty(), "\n{}", failures.join("\n"));
}

#[test]
fn test_samples() {
    let report = samples("samples");
    assert_matches(&report);
    assert_eq!(report.checked.len(), 7);

    // Only the placeholders for shapes without a template are errors.
    let reports: Vec<&str> = report
        .generation
        .reports
        .iter()
        .map(|report| report.name.as_str())
        .collect();
    assert_eq!(reports, ["unsupported.h"]);
    let severities: Vec<Severity> = report
        .generation
        .diagnostics()
        .map(|diagnostic| diagnostic.severity)
        .collect();
    assert_eq!(severities, [Severity::Error, Severity::Error]);
}

#[test]
fn test_samples_global() {
    let report = samples("samples_global");
    assert_matches(&report);
    assert!(report.generation.is_clean());
    let paths: Vec<&str> = report
        .generation
        .files
        .iter()
        .map(|file| file.path.as_str())
        .collect();
    assert_eq!(paths, ["rect.hpp", "video.hpp"]);
}

#[test]
fn test_sample_enum_values() {
    let report = samples("samples");
    let file = |path: &str| {
        report
            .generation
            .files
            .iter()
            .find(|file| file.path == path)
            .unwrap()
    };
    let values: Vec<_> = file("enums.hpp")
        .constants
        .iter()
        .map(|konst| (konst.name.as_str(), konst.value))
        .collect();
    assert_eq!(
        values,
        [
            ("ENUM_VALUE0", Some(0)),
            ("ENUM_VALUE1", Some(123)),
            ("ENUM_VALUE_N", Some(9999)),
            ("FLASH_CANCEL", Some(0)),
            ("FLASH_BRIEFLY", Some(1)),
            ("FLASH_UNTIL_FOCUSED", Some(4)),
        ],
    );

    let base = &file("enums.hpp").constants;
    for aliased in &file("aliased_enums.hpp").constants {
        let original = base.iter().find(|konst| konst.source == aliased.source);
        match original {
            Some(original) => assert_eq!(aliased.value, original.value, "{}", aliased.name),
            // Constants declared against the alias resolve through it.
            None => assert!(aliased.value.is_some(), "{}", aliased.name),
        }
    }
}

#[test]
fn test_edited_fixture_is_reported_by_name() {
    let report = samples("samples");
    let file = report
        .generation
        .files
        .iter()
        .find(|file| file.path == "resources.hpp")
        .unwrap();
    let edited = file.content.replace(
        "inline bool Window::SetTitle(const char* title)",
        "inline bool Window::SetTitle(const char* newTitle)",
    );
    let mismatch = harness::compare(&edited, &file.content).unwrap_err();
    assert_eq!(mismatch.name, "name::Window::SetTitle");
}
