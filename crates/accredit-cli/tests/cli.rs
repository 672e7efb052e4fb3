use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

const DRAFT_FILE: &str = "accreditation-request-draft.json";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn accredit(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("accredit").unwrap();
    cmd.arg("--data-dir")
        .arg(data_dir.path())
        .env_remove("ACCREDIT_API_URL")
        .env_remove("ACCREDIT_TOKEN")
        .env_remove("ACCREDIT_SERVICE_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn run_first_step(data_dir: &TempDir) {
    accredit(data_dir)
        .arg("wizard")
        .arg("--spec")
        .arg(fixture("accreditation_wizard.json"))
        .write_stdin("Aline Uwase\naline@gs.rw\n\n:quit\n")
        .assert()
        .success();
}

#[test]
fn schema_describes_wizard_steps() {
    let data_dir = TempDir::new().unwrap();
    accredit(&data_dir)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("WizardSpec").and(predicate::str::contains("steps")));
}

#[test]
fn valid_answers_pass() {
    let data_dir = TempDir::new().unwrap();
    accredit(&data_dir)
        .arg("validate")
        .arg("--spec")
        .arg(fixture("accreditation_wizard.json"))
        .arg("--answers")
        .arg(fixture("valid_answers.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation result: valid"));
}

#[test]
fn invalid_answers_report_every_field() {
    let data_dir = TempDir::new().unwrap();
    accredit(&data_dir)
        .arg("validate")
        .arg("--spec")
        .arg(fixture("accreditation_wizard.json"))
        .arg("--answers")
        .arg(fixture("invalid_answers.json"))
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("Validation result: invalid")
                .and(predicate::str::contains(
                    "applicant_name - Must be at least 3 characters",
                ))
                .and(predicate::str::contains(
                    "applicant_email - This field is required",
                ))
                .and(predicate::str::contains(
                    "school_code - Must be a whole number",
                ))
                .and(predicate::str::contains("students - Must be at most 5000"))
                .and(predicate::str::contains("Unknown answer fields: nickname")),
        );
}

#[test]
fn single_step_validation_ignores_other_steps() {
    let data_dir = TempDir::new().unwrap();
    accredit(&data_dir)
        .arg("validate")
        .arg("--spec")
        .arg(fixture("accreditation_wizard.json"))
        .arg("--answers")
        .arg(fixture("invalid_answers.json"))
        .arg("--step")
        .arg("1")
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("school_code - Must be a whole number")
                .and(predicate::str::contains("applicant_name").not()),
        );
}

#[test]
fn wizard_saves_completed_step_as_draft() {
    let data_dir = TempDir::new().unwrap();
    run_first_step(&data_dir);

    data_dir
        .child(DRAFT_FILE)
        .assert(predicate::str::contains("Aline Uwase"));
}

#[test]
fn wizard_blocks_on_missing_required_fields() {
    let data_dir = TempDir::new().unwrap();
    accredit(&data_dir)
        .arg("wizard")
        .arg("--spec")
        .arg(fixture("accreditation_wizard.json"))
        .write_stdin("\n\n\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("This field is required"));

    data_dir.child(DRAFT_FILE).assert(predicate::path::missing());
}

#[test]
fn draft_show_and_clear() {
    let data_dir = TempDir::new().unwrap();
    run_first_step(&data_dir);

    accredit(&data_dir)
        .args(["draft", "show", "--spec"])
        .arg(fixture("accreditation_wizard.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("applicant_name = Aline Uwase"));

    accredit(&data_dir)
        .args(["draft", "clear", "--spec"])
        .arg(fixture("accreditation_wizard.json"))
        .assert()
        .success();
    data_dir.child(DRAFT_FILE).assert(predicate::path::missing());

    accredit(&data_dir)
        .args(["draft", "show", "--spec"])
        .arg(fixture("accreditation_wizard.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved draft"));
}

#[test]
fn submit_without_api_keeps_draft() {
    let data_dir = TempDir::new().unwrap();
    run_first_step(&data_dir);

    accredit(&data_dir)
        .arg("submit")
        .arg("--spec")
        .arg(fixture("accreditation_wizard.json"))
        .arg("--school")
        .arg("SCH-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));

    data_dir.child(DRAFT_FILE).assert(predicate::path::exists());
}

#[test]
fn login_and_logout_manage_session_file() {
    let data_dir = TempDir::new().unwrap();
    accredit(&data_dir)
        .args(["login", "--token", "tok-1", "--user", "Inspector", "--school", "SCH-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as Inspector."));
    data_dir
        .child("session.json")
        .assert(predicate::str::contains("SCH-1"));

    accredit(&data_dir).arg("logout").assert().success();
    data_dir.child("session.json").assert(predicate::path::missing());
}
