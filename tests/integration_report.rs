//! End-to-end runs of the built-in components through the library API.

mod common;

use common::TestProject;
use mosaic_report::config::{Configuration, Settings};
use mosaic_report::core::{MosaicError, Phase};
use mosaic_report::merge::{GeneInformationMerger, TreatmentOptionsMerger};
use mosaic_report::orchestrator::Orchestrator;
use mosaic_report::patch::{codec, section_names};
use mosaic_report::payload::ReportData;
use mosaic_report::registry::ComponentRegistry;
use mosaic_report::test_utils::init_test_logging;
use mosaic_report::workspace::Workspace;

fn orchestrator(project: &TestProject) -> Orchestrator {
    init_test_logging(None);
    Orchestrator::new(ComponentRegistry::with_builtins().unwrap(), Settings::default())
        .with_workspace(Workspace::create(&project.path().join("work")).unwrap())
}

fn raw_config(project: &TestProject) -> Configuration {
    Configuration::load(&project.config_path()).unwrap()
}

#[test]
fn test_full_report_documents() {
    let project = TestProject::with_sample_config();
    let (data, rendered) = orchestrator(&project).report(&raw_config(&project)).unwrap();

    assert_eq!(data.core.report_id, "PANX_1249-v1");
    assert_eq!(data.core.author, "Test Author");
    assert_eq!(rendered.documents.len(), 2);

    let clinical = section_names(&rendered.documents["clinical"]).unwrap();
    assert_eq!(
        clinical,
        vec!["case_overview", "findings", GeneInformationMerger::IDENTIFIER, TreatmentOptionsMerger::IDENTIFIER]
    );
    let research = section_names(&rendered.documents["research"]).unwrap();
    assert_eq!(research, vec!["case_overview"]);

    let overview = &rendered.fragments["case_overview"];
    assert!(overview.contains("<td>paad</td>"));
    assert!(overview.contains("<td>0.62</td>"));
}

#[test]
fn test_mergers_deduplicate_and_sort() {
    let project = TestProject::with_sample_config();
    let (_, rendered) = orchestrator(&project).report(&raw_config(&project)).unwrap();

    let genes = &rendered.fragments[GeneInformationMerger::IDENTIFIER];
    assert_eq!(genes.matches("<tr><td>").count(), 2);
    let kras = genes.find("<i>KRAS</i></a>").unwrap();
    let tp53 = genes.find("<i>TP53</i></a>").unwrap();
    assert!(kras < tp53);

    let treatments = &rendered.fragments[TreatmentOptionsMerger::IDENTIFIER];
    let approved = treatments.find("Approved Therapies").unwrap();
    let investigational = treatments.find("Investigational Therapies").unwrap();
    assert!(approved < investigational);
    assert!(treatments.contains("<td>3A</td>"));
}

#[test]
fn test_helper_output_shared_through_workspace() {
    let project = TestProject::with_sample_config();
    orchestrator(&project).extract(&raw_config(&project)).unwrap();

    let params = project.path().join("work").join("sample_params_helper").join("sample_params.json");
    let text = std::fs::read_to_string(params).unwrap();
    assert!(text.contains("PANX_1249-PAAD"));
}

#[test]
fn test_missing_required_key_aborts_before_extract() {
    let project = TestProject::with_sample_config();
    let mut raw = raw_config(&project);
    raw.section_mut("sample_params_helper").unwrap().remove("oncotree_code");

    let err = orchestrator(&project).report(&raw).unwrap_err();
    assert!(matches!(
        err.root(),
        MosaicError::MissingConfigKey { section, key } if section == "sample_params_helper" && key == "oncotree_code"
    ));
    assert!(!project.path().join("work").join("sample_params_helper").exists());
}

#[test]
fn test_extract_dependency_out_of_order() {
    let project = TestProject::with_sample_config();
    let mut raw = raw_config(&project);
    raw.set("sample_params_helper", "extract_priority", "900");

    let err = orchestrator(&project).extract(&raw).unwrap_err();
    assert!(matches!(
        err.root(),
        MosaicError::DependencyOrder { identifier, phase: Phase::Extract, .. } if identifier == "case_overview"
    ));
}

#[test]
fn test_stored_report_can_be_updated() {
    let project = TestProject::with_sample_config();
    let orchestrator = orchestrator(&project);
    let (data, rendered) = orchestrator.report(&raw_config(&project)).unwrap();

    let path = project.path().join("data.json");
    data.save(&path).unwrap();
    let mut stored = ReportData::load(&path).unwrap();

    let documents = orchestrator.update(&mut stored, &["findings".to_string()]).unwrap();
    assert_eq!(documents, rendered.documents);
    assert_eq!(codec::decode(&stored.html_cache["clinical"]).unwrap(), rendered.documents["clinical"]);
}

#[test]
fn test_update_of_changed_findings_touches_only_that_section() {
    let project = TestProject::with_sample_config();
    let orchestrator = orchestrator(&project);
    let (mut data, rendered) = orchestrator.report(&raw_config(&project)).unwrap();

    let payload = data.plugins.get_mut("findings").unwrap();
    payload.results["alterations"].as_array_mut().unwrap().truncate(1);
    let documents = orchestrator.update(&mut data, &["findings".to_string()]).unwrap();

    let before = &rendered.documents["clinical"];
    let after = &documents["clinical"];
    assert_ne!(before, after);
    assert!(!after.contains("R273H"));
    assert!(after.contains("is a tumor suppressor."));
    assert_eq!(documents["research"], rendered.documents["research"]);
}
