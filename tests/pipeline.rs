use rx_core::core::candidates::CandidateGenerator;
use rx_core::core::corrector::numeric_tokens;
use rx_core::core::dictionary::DrugDictionary;
use rx_core::core::resolver::resolve;
use rx_core::core::types::{CorrectedDrugRecord, RawDrugRecord, SearchMethod};
use rx_core::lookup::{CatalogLookup, DrugInfo, DrugLookup};
use rx_core::{CancelFlag, EngineConfig, RxEngine};
use serde_json::json;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn engine_with(names: &[&str]) -> RxEngine {
    let config = EngineConfig::default();
    let dictionary = DrugDictionary::from_names(names.iter().copied(), &config);
    RxEngine::new(Arc::new(dictionary), config).unwrap()
}

#[test]
fn one_symbol_typo_is_corrected_with_dosage_intact() {
    let engine = engine_with(&["Tylenol 500mg", "Aspirin 200mg"]);
    let record = engine.correct(RawDrugRecord::named("Tylenoll 500mg"));
    assert_eq!(record.corrected_name, "Tylenol 500mg");
    assert_eq!(record.correction_distance, 1);
    assert!(record.was_corrected);
    assert_eq!(
        numeric_tokens(&record.corrected_name).into_iter().collect::<Vec<_>>(),
        vec!["500"]
    );
}

#[test]
fn dosage_changing_correction_is_refused() {
    let engine = engine_with(&["Aspirin 200mg"]);
    let record = engine.correct(RawDrugRecord::named("Aspirin 100mg"));
    assert_eq!(record.corrected_name, "Aspirin 100mg");
    assert!(!record.was_corrected);
}

#[test]
fn relaxed_query_resolves_on_third_attempt() {
    let engine = engine_with(&["DrugX(extended release) 50mg"]);
    let calls = Mutex::new(Vec::new());
    let lookup = |q: &str| {
        calls.lock().unwrap().push(q.to_string());
        (q == "DrugX 50mg").then(|| json!({"ITEM_NAME": "DrugX 50mg"}))
    };

    let entry = engine.process_entry(RawDrugRecord::named("DrugX(extended release) 50mg"), &lookup);
    assert_eq!(
        calls.into_inner().unwrap(),
        vec!["DrugX(extended release) 50mg", "DrugX(extended release)", "DrugX 50mg"]
    );
    assert!(entry.resolution.matched);
    assert_eq!(entry.resolution.method, Some(SearchMethod::ParenStripped));
    assert_eq!(entry.resolution.attempts, 3);
}

#[test]
fn missing_dictionary_passes_everything_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.dictionary_path = dir.path().join("drug_db.csv");
    let engine = RxEngine::from_config(config).unwrap();
    assert!(engine.dictionary().is_empty());

    let calls = AtomicUsize::new(0);
    let lookup = |_: &str| -> Option<()> {
        calls.fetch_add(1, Ordering::SeqCst);
        None
    };
    let records = vec![
        RawDrugRecord::named("타이레놀정500밀리그램(아세트아미노펜)"),
        RawDrugRecord::named("DrugX(extended release) 50mg"),
    ];
    let outcome = engine.process_batch(records, &lookup, &CancelFlag::new());

    for entry in &outcome.entries {
        assert!(!entry.record.was_corrected);
        assert_eq!(entry.candidates.len(), 1);
        assert_eq!(entry.candidates[0].query, entry.record.original_name);
        assert_eq!(entry.resolution.attempts, 1);
        assert!(!entry.resolution.matched);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.report.corrected_count, 0);
}

#[test]
fn ocr_reply_to_drug_info_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("drug_db.csv");
    fs::write(
        &csv,
        "drug_name,entp_name\n타이레놀정500밀리그램(아세트아미노펜),한국얀센\n게보린정,삼진제약\n부루펜정200밀리그램(이부프로펜),삼일제약\n",
    )
    .unwrap();
    let mut config = EngineConfig::default();
    config.dictionary_path = csv;
    config.concurrency = 2;
    let engine = RxEngine::from_config(config).unwrap();

    let reply = r#"결과:
    [
      {"medicine_name": "타이레놀전500mg", "dosage": "1", "frequency": 3, "days": 5, "usage": "식후"},
      {"medicine_name": "게보린졍", "dosage": "1", "frequency": "2", "days": "3"},
      {"medicine_name": "모르는약"}
    ]"#;
    let records = rx_core::ocr::parse_records(reply).unwrap();

    let catalog = CatalogLookup::new(vec![
        json!({"ITEM_NAME": "타이레놀정500밀리그램(아세트아미노펜)", "ENTP_NAME": "한국얀센", "EE_DOC_DATA": "<DOC><P>해열 &amp; 진통</P></DOC>"}),
        json!({"ITEM_NAME": "게보린정", "ENTP_NAME": "삼진제약"}),
    ]);
    let outcome = engine.process_batch(records, &catalog, &CancelFlag::new());
    assert_eq!(outcome.entries.len(), 3);

    let tylenol = &outcome.entries[0];
    assert_eq!(tylenol.record.corrected_name, "타이레놀정500밀리그램(아세트아미노펜)");
    assert_eq!(tylenol.record.raw.days.as_deref(), Some("5"));
    assert_eq!(tylenol.resolution.method, Some(SearchMethod::Full));
    let info = DrugInfo::from_item(tylenol.resolution.matched_record.as_ref().unwrap());
    assert_eq!(info.company.as_deref(), Some("한국얀센"));
    assert_eq!(info.efficacy, "해열 & 진통");

    assert_eq!(outcome.entries[1].record.corrected_name, "게보린정");
    assert!(outcome.entries[1].resolution.matched);

    let unknown = &outcome.entries[2];
    assert!(!unknown.record.was_corrected);
    assert!(!unknown.resolution.matched);
    assert_eq!(unknown.resolution.attempts, unknown.candidates.len());

    assert_eq!(outcome.report.corrected_count, 2);
    assert_eq!(outcome.report.total_edits, 2);
}

#[test]
fn lookup_is_never_called_more_than_candidate_count() {
    let generator = CandidateGenerator::default();
    let names = [
        "DrugX(extended release) 50mg",
        "타이레놀정500밀리그램(아세트아미노펜)",
        "게보린정",
        "a",
        "",
    ];
    for name in names {
        let record = CorrectedDrugRecord::unchanged(RawDrugRecord::named(name));
        let candidates = generator.candidates(&record);
        let calls = AtomicUsize::new(0);
        let miss = |_: &str| -> Option<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        };
        let result = resolve(&candidates, &miss);
        assert_eq!(calls.load(Ordering::SeqCst), candidates.len());
        assert_eq!(result.attempts, candidates.len());
    }
}

#[test]
fn shared_index_serves_concurrent_readers() {
    let config = EngineConfig::default();
    let dictionary = Arc::new(DrugDictionary::from_names(
        ["게보린정", "타이레놀정500밀리그램", "부루펜정200밀리그램"],
        &config,
    ));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = RxEngine::new(Arc::clone(&dictionary), config.clone()).unwrap();
            std::thread::spawn(move || {
                let lookup = |q: &str| Some(q.len());
                let entry = engine.process_entry(RawDrugRecord::named("게보린졍"), &lookup);
                (entry.record.corrected_name, DrugLookup::lookup(&lookup, "x"))
            })
        })
        .collect();
    for handle in handles {
        let (name, probe) = handle.join().unwrap();
        assert_eq!(name, "게보린정");
        assert_eq!(probe, Some(1));
    }
}

#[test]
fn configured_rules_flag_interactions_after_correction() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("drug_db.csv");
    fs::write(&csv, "drug_name\n아스피린프로텍트정100밀리그램\n와파린정5밀리그램\n").unwrap();
    let rules = dir.path().join("drug_rules.json");
    fs::write(
        &rules,
        r#"[{"keywords": ["아스피린"], "original_content": "출혈 위험"},
            {"keywords": ["와파린"], "original_content": "항응고 작용 증가"}]"#,
    )
    .unwrap();

    let mut config = EngineConfig::default();
    config.dictionary_path = csv;
    config.rules_path = Some(rules);
    let engine = RxEngine::from_config(config).unwrap();

    let records = vec![
        RawDrugRecord::named("아스피란프로텍트정100mg"),
        RawDrugRecord::named("와파린졍5mg"),
        RawDrugRecord::named("아스피린프로텍트정100mg"),
    ];
    let miss = |_: &str| -> Option<()> { None };
    let outcome = engine.process_batch(records, &miss, &CancelFlag::new());

    let keywords: Vec<&str> = outcome.warnings.iter().map(|w| w.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["아스피린", "와파린"]);
}
