//! Golden tests: full documents in, exact documents out.

use surgical_edit::{EditResult, EditStage, Occurrence, Recipe, TargetSpec};

const WORKFLOW: &str = include_str!("fixtures/ci.yml");
const WORKFLOW_EXPECTED: &str = include_str!("fixtures/ci.expected.yml");

fn bump(text: &str, target: &TargetSpec) -> EditResult {
    Recipe::DependencyVersionBump
        .editor()
        .expect("editor")
        .apply_text(text, target)
}

fn replace_param(text: &str, target: &TargetSpec) -> EditResult {
    Recipe::ActionParameterReplace
        .editor()
        .expect("editor")
        .apply_text(text, target)
}

fn applied(result: EditResult) -> String {
    match result {
        EditResult::Applied { text, .. } => text,
        other => panic!("expected Applied, got {other:?}"),
    }
}

#[test]
fn scenario_a_bumps_dependency() {
    let doc = "[tool.poetry.dependencies]\npytest = \"7.*\"\n";
    let target = TargetSpec::poetry_dependency("pytest", None, "8.*");

    let out = applied(bump(doc, &target));
    assert_eq!(out, "[tool.poetry.dependencies]\npytest = \"8.*\"\n");
}

#[test]
fn scenario_b_current_value_is_already_patched() {
    let doc = "[tool.poetry.dependencies]\npytest = \"7.*\"\n";
    let target = TargetSpec::poetry_dependency("pytest", None, "7.*");

    assert!(matches!(bump(doc, &target), EditResult::AlreadyPatched));
}

#[test]
fn scenario_c_missing_table_is_not_applicable() {
    let doc = "[tool.poetry]\nname = \"demo\"\n\n[build-system]\nrequires = [\"poetry-core\"]\n";
    let target = TargetSpec::poetry_dependency("pytest", None, "8.*");

    match bump(doc, &target) {
        EditResult::NotApplicable { stage, .. } => assert_eq!(stage, EditStage::Selected),
        other => panic!("expected NotApplicable, got {other:?}"),
    }
}

#[test]
fn scenario_d_replaces_action_parameter() {
    let doc = "steps:\n  - uses: actions-rs/toolchain@v1\n    with:\n      profile: minimal # small\n      toolchain: x\n";
    let target = TargetSpec::new("actions-rs/toolchain@v1", "profile", "default")
        .with_current_value("minimal");

    let out = applied(replace_param(doc, &target));
    assert_eq!(
        out,
        "steps:\n  - uses: actions-rs/toolchain@v1\n    with:\n      profile: default # small\n      toolchain: x\n"
    );
}

#[test]
fn scenario_e_group_path_disambiguates_tables() {
    let doc = "[tool.poetry.dependencies]\npython = \"^3.11\"\npytest = \"7.*\"\n\n[tool.poetry.group.test.dependencies]\npytest = \"7.*\"\n";

    let grouped = TargetSpec::poetry_dependency("pytest", Some("test"), "8.*");
    assert_eq!(
        applied(bump(doc, &grouped)),
        "[tool.poetry.dependencies]\npython = \"^3.11\"\npytest = \"7.*\"\n\n[tool.poetry.group.test.dependencies]\npytest = \"8.*\"\n"
    );

    let main = TargetSpec::poetry_dependency("pytest", None, "8.*");
    assert_eq!(
        applied(bump(doc, &main)),
        "[tool.poetry.dependencies]\npython = \"^3.11\"\npytest = \"8.*\"\n\n[tool.poetry.group.test.dependencies]\npytest = \"7.*\"\n"
    );
}

#[test]
fn workflow_fixture_all_occurrences() {
    let target = TargetSpec::new("actions-rs/toolchain@v1", "profile", "default")
        .with_current_value("minimal")
        .with_occurrence(Occurrence::All);

    match replace_param(WORKFLOW, &target) {
        EditResult::Applied { text, edits } => {
            assert_eq!(text, WORKFLOW_EXPECTED);
            assert_eq!(edits.len(), 2);
        }
        other => panic!("expected Applied, got {other:?}"),
    }

    assert!(matches!(
        replace_param(WORKFLOW_EXPECTED, &target),
        EditResult::AlreadyPatched
    ));
}

#[test]
fn workflow_fixture_first_occurrence_only() {
    let target = TargetSpec::new("actions-rs/toolchain@v1", "profile", "default");
    let out = applied(replace_param(WORKFLOW, &target));

    let changed: Vec<_> = WORKFLOW
        .lines()
        .zip(out.lines())
        .filter(|(before, after)| before != after)
        .collect();
    assert_eq!(
        changed,
        vec![(
            "          profile: minimal # keep installs small",
            "          profile: default # keep installs small"
        )]
    );
}

#[test]
fn workflow_step_without_with_block_is_skipped() {
    let target = TargetSpec::new("actions/checkout@v4", "fetch-depth", "0");
    assert!(matches!(
        replace_param(WORKFLOW, &target),
        EditResult::NotApplicable { .. }
    ));
}

#[test]
fn value_filter_mismatch_is_not_applicable() {
    let target = TargetSpec::new("actions-rs/cargo@v1", "command", "build")
        .with_current_value("check");
    match replace_param(WORKFLOW, &target) {
        EditResult::NotApplicable { stage, .. } => assert_eq!(stage, EditStage::Refined),
        other => panic!("expected NotApplicable, got {other:?}"),
    }
}

#[test]
fn yaml_quoted_value_keeps_quotes() {
    let doc = "- uses: actions/setup-python@v5\n  with:\n    python-version: \"3.11\"\n";
    let target = TargetSpec::new("actions/setup-python@v5", "python-version", "3.12");
    assert_eq!(
        applied(replace_param(doc, &target)),
        "- uses: actions/setup-python@v5\n  with:\n    python-version: \"3.12\"\n"
    );

    let same = TargetSpec::new("actions/setup-python@v5", "python-version", "3.11");
    assert!(matches!(
        replace_param(doc, &same),
        EditResult::AlreadyPatched
    ));
}

#[test]
fn toml_literal_string_keeps_style() {
    let doc = "[tool.poetry.dependencies]\npydantic = '^1.10'   # v2 migration pending\n";
    let target = TargetSpec::poetry_dependency("pydantic", None, "^2");
    assert_eq!(
        applied(bump(doc, &target)),
        "[tool.poetry.dependencies]\npydantic = '^2'   # v2 migration pending\n"
    );
}

#[test]
fn crlf_and_missing_final_newline_are_preserved() {
    let doc = "# deps\r\n[tool.poetry.dependencies]\r\npytest = \"7.*\"\r\nblack = \"^23\"";
    let target = TargetSpec::poetry_dependency("black", None, "^24");
    assert_eq!(
        applied(bump(doc, &target)),
        "# deps\r\n[tool.poetry.dependencies]\r\npytest = \"7.*\"\r\nblack = \"^24\""
    );
}

#[test]
fn major_bump_never_downgrades() {
    let doc = "[tool.poetry.group.lint.dependencies]\nblack = \"^23.1\"\n";
    let editor = Recipe::DependencyMajorBump.editor().expect("editor");

    let down = TargetSpec::poetry_dependency("black", Some("lint"), "^22");
    assert!(matches!(
        editor.apply_text(doc, &down),
        EditResult::AlreadyPatched
    ));

    let up = TargetSpec::poetry_dependency("black", Some("lint"), "^24");
    assert_eq!(
        editor.apply_text(doc, &up).text(),
        Some("[tool.poetry.group.lint.dependencies]\nblack = \"^24\"\n")
    );
}

#[test]
fn recoverable_syntax_errors_elsewhere_do_not_block_edits() {
    let doc = "[tool.poetry.dependencies]\npytest = \"7.*\"\n\n[broken\nx = 1\n";
    let target = TargetSpec::poetry_dependency("pytest", None, "8.*");
    assert_eq!(
        applied(bump(doc, &target)),
        "[tool.poetry.dependencies]\npytest = \"8.*\"\n\n[broken\nx = 1\n"
    );
}

#[test]
fn comment_after_uses_does_not_hide_step() {
    let doc = "steps:\n  - uses: actions-rs/toolchain@v1 # pin\n    with:\n      profile: minimal\n";
    let target = TargetSpec::new("actions-rs/toolchain@v1", "profile", "default");
    assert_eq!(
        applied(replace_param(doc, &target)),
        "steps:\n  - uses: actions-rs/toolchain@v1 # pin\n    with:\n      profile: default\n"
    );
}

#[test]
fn yaml_replacements_that_cannot_be_plain_are_quoted() {
    let doc = "- uses: a@v1\n  with:\n    profile: minimal\n";
    for (replacement, line) in [
        ("x #y", "    profile: \"x #y\"\n"),
        ("", "    profile: \"\"\n"),
        ("*star", "    profile: \"*star\"\n"),
        ("key: value", "    profile: \"key: value\"\n"),
        (" padded", "    profile: \" padded\"\n"),
    ] {
        let target = TargetSpec::new("a@v1", "profile", replacement);
        let once = applied(replace_param(doc, &target));
        assert_eq!(once, format!("- uses: a@v1\n  with:\n{line}"));
        assert!(
            matches!(replace_param(&once, &target), EditResult::AlreadyPatched),
            "second run of {replacement:?} was not a no-op"
        );
    }
}
