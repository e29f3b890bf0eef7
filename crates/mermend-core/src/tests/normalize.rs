use crate::*;
use std::borrow::Cow;

const FLOWCHART: &str = "flowchart TD\n    A[User (View/Controller)] --> B[Service: core]\n    B --> C[(Database)]\n";
const ER: &str = "erDiagram\n    USER ||--o{ VOICE_MODEL : owns\n    VOICE_MODEL {\n        string id PK\n        email string UNIQUE \"primary login\"\n    }\n";
const GANTT: &str = "gantt\n    dateFormat YYYY-MM-DD\n    section Plan\n    Requirements :req, 2024-01-01, 2d\n    Design :des, after req, after spec, 3d, crit\n";

#[test]
fn empty_input_yields_empty_output() {
    assert_eq!(normalize(""), "");
    let outcome = Normalizer::new().normalize_with_report("");
    assert_eq!(outcome.code, "");
    assert!(outcome.applied.is_empty());
}

#[test]
fn flowchart_labels_are_quoted() {
    assert_eq!(
        normalize(FLOWCHART),
        "flowchart TD\n    A[\"User (View/Controller)\"] --> B[\"Service: core\"]\n    B --> C[(Database)]\n"
    );
}

#[test]
fn er_source_is_repaired() {
    assert_eq!(
        normalize(ER),
        "erDiagram\n    USER ||--o{ VoiceModel : owns\n    VoiceModel {\n        string id PK\n        email string UNIQUE\n    }\n"
    );
}

#[test]
fn gantt_source_is_repaired() {
    assert_eq!(
        normalize(GANTT),
        "gantt\n    dateFormat YYYY-MM-DD\n    section Plan\n    Requirements :req, 2024-01-01, 2d\n    Design :crit, des, after req, 3d\n"
    );
}

#[test]
fn normalize_is_idempotent_on_every_kind() {
    for text in [FLOWCHART, ER, GANTT] {
        let once = normalize(text);
        assert_eq!(normalize(&once), once, "{text:?}");
    }
}

#[test]
fn kind_specific_passes_do_not_fire_on_other_kinds() {
    // ER- and gantt-shaped lines inside a flowchart are left exactly as written.
    let text = "flowchart TD\n    VOICE_MODEL --> USER_ACCOUNT\n    email string UNIQUE \"login\"\n    Design :des, after a, after b, 3d, crit\n";
    assert_eq!(normalize(text), text);

    let sequence = "sequenceDiagram\n    A->>B: task :x, 3d, crit\n";
    assert_eq!(normalize(sequence), sequence);
}

#[test]
fn kind_keyword_in_a_label_does_not_enable_a_pass() {
    let text = "flowchart TD\n    A[erDiagram] --> VOICE_MODEL\n";
    assert_eq!(normalize(text), text);
}

#[test]
fn report_lists_applied_passes_in_order() {
    let text = "erDiagram\n    VOICE_MODEL[Voice/Model] {\n        string id PK \"key\"\n    }\n";
    let outcome = Normalizer::new().normalize_with_report(text);
    assert_eq!(outcome.applied, vec!["labelQuoting", "er"]);
    assert_eq!(
        outcome.code,
        "erDiagram\n    VoiceModel[\"Voice/Model\"] {\n        string id PK\n    }\n"
    );

    let clean = Normalizer::new().normalize_with_report("graph LR\n  A --> B\n");
    assert!(clean.applied.is_empty());
}

#[test]
fn config_disables_passes() {
    let cfg = NormalizeConfig::from_json_str(r#"{"passes": {"labelQuoting": false, "gantt": false}}"#)
        .unwrap();
    let normalizer = Normalizer::new().with_config(&cfg);
    assert_eq!(normalizer.normalize(FLOWCHART), FLOWCHART);
    assert_eq!(normalizer.normalize(GANTT), GANTT);
    assert_ne!(normalizer.normalize(ER), ER);
}

#[test]
fn with_config_overlays_previous_settings() {
    let mut first = NormalizeConfig::default();
    first.disable_pass("er");
    let second = NormalizeConfig::from_json_str(r#"{"er": {"stripComments": false}}"#).unwrap();

    let normalizer = Normalizer::new().with_config(&first).with_config(&second);
    assert!(!normalizer.config().is_enabled("passes.er"));
    assert!(!normalizer.config().is_enabled("er.stripComments"));
}

#[test]
fn config_mut_changes_the_next_run() {
    let mut normalizer = Normalizer::new();
    assert_ne!(normalizer.normalize(FLOWCHART), FLOWCHART);

    normalizer.config_mut().disable_pass("labelQuoting");
    assert_eq!(normalizer.normalize(FLOWCHART), FLOWCHART);

    normalizer
        .config_mut()
        .set_value("passes.labelQuoting", serde_json::Value::Bool(true));
    assert_ne!(normalizer.normalize(FLOWCHART), FLOWCHART);
}

fn shout_titles<'a>(text: &'a str, _config: &NormalizeConfig) -> Cow<'a, str> {
    if text.contains("title ") {
        Cow::Owned(text.replace("title ", "TITLE "))
    } else {
        Cow::Borrowed(text)
    }
}

#[test]
fn custom_passes_run_after_the_defaults() {
    let mut normalizer = Normalizer::new();
    normalizer
        .registry_mut()
        .add_fn("shoutTitles", Some(DiagramKind::Pie), shout_titles);

    let outcome = normalizer.normalize_with_report("pie title Pets\n  \"Dogs\" : 3\n");
    assert_eq!(outcome.code, "pie TITLE Pets\n  \"Dogs\" : 3\n");
    assert_eq!(outcome.applied, vec!["shoutTitles"]);

    assert_eq!(normalizer.normalize("gantt\n    title x\n"), "gantt\n    title x\n");
}

#[test]
fn empty_registry_returns_input() {
    let normalizer = Normalizer::with_registry(RepairRegistry::new());
    assert!(normalizer.registry().passes().is_empty());
    assert_eq!(normalizer.normalize(FLOWCHART), FLOWCHART);
}

#[test]
fn default_registry_order() {
    let ids: Vec<&str> = RepairRegistry::default_passes()
        .passes()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["labelQuoting", "er", "gantt"]);
    assert_eq!(
        RepairRegistry::default_passes().get("gantt").and_then(|p| p.kind),
        Some(DiagramKind::Gantt)
    );
}

#[test]
fn normalizer_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Normalizer>();
}
