//! Command-line behaviour of the `mosaic` binary.

mod common;

use common::TestProject;
use mosaic_report::config::Configuration;
use mosaic_report::patch::section_names;
use mosaic_report::payload::ReportData;
use predicates::prelude::*;

#[test]
fn test_setup_lists_builtins() {
    let project = TestProject::new();
    project
        .mosaic()
        .args(["setup", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("case_overview"))
        .stdout(predicate::str::contains("sample_params_helper"))
        .stdout(predicate::str::contains("treatment_options_merger"));
}

#[test]
fn test_setup_writes_template() {
    let project = TestProject::new();
    project
        .mosaic()
        .args(["setup", "--components", "case_overview,sample_params_helper", "--out", "template.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote configuration template"));

    let template = Configuration::load(&project.path().join("template.toml")).unwrap();
    assert_eq!(template.get("core", "donor"), Some("REQUIRED"));
    assert_eq!(template.get("sample_params_helper", "oncotree_code"), Some("REQUIRED"));
    assert_eq!(template.get("sample_params_helper", "sample_type"), Some("NA"));
}

#[test]
fn test_unknown_component_suggests_alternatives() {
    let project = TestProject::new();
    project
        .mosaic()
        .args(["setup", "--components", "findigns"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("findigns"))
        .stderr(predicate::str::contains("findings"));
}

#[test]
fn test_report_writes_documents_and_data() {
    let project = TestProject::with_sample_config();
    project
        .mosaic()
        .args(["report", "report.toml", "--out-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report"))
        .stdout(predicate::str::contains("PANX_1249-v1"));

    let clinical = project.read_out("PANX_1249-v1_clinical.html");
    assert!(section_names(&clinical).unwrap().contains(&"findings".to_string()));
    assert!(project.out_dir().join("PANX_1249-v1_research.html").exists());

    let data = ReportData::load(&project.out_dir().join("PANX_1249-v1_data.json")).unwrap();
    assert_eq!(data.html_cache.len(), 2);
}

#[test]
fn test_phases_run_separately() {
    let project = TestProject::with_sample_config();
    project
        .mosaic()
        .args(["extract", "report.toml", "--out", "data.json", "--work-dir", "work"])
        .assert()
        .success();
    assert!(project.path().join("work/sample_params_helper/sample_params.json").exists());

    project.mosaic().args(["render", "data.json", "--out-dir", "out"]).assert().success();
    let data = ReportData::load(&project.path().join("data.json")).unwrap();
    assert!(data.html_cache.contains_key("clinical"));

    let before = project.read_out("PANX_1249-v1_clinical.html");
    project
        .mosaic()
        .args(["update", "data.json", "--component", "findings", "--out-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated findings"));
    assert_eq!(project.read_out("PANX_1249-v1_clinical.html"), before);
}

#[test]
fn test_update_unknown_section_fails() {
    let project = TestProject::with_sample_config();
    project.mosaic().args(["report", "report.toml", "--out-dir", "out"]).assert().success();

    project
        .mosaic()
        .args(["update", "out/PANX_1249-v1_data.json", "--component", "nonexistent", "--out-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent"));
}

#[test]
fn test_configure_reports_missing_key() {
    let project = TestProject::new();
    project.write_config("[core]\ndonor = \"PANX_1249\"\n");
    project
        .mosaic()
        .args(["configure", "report.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project"));
}

#[test]
fn test_log_file() {
    let project = TestProject::with_sample_config();
    project
        .mosaic()
        .args(["--verbose", "--log-path", "run.log", "configure", "report.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[findings]"));

    let log = std::fs::read_to_string(project.path().join("run.log")).unwrap();
    assert!(log.contains("Configured"));
}
