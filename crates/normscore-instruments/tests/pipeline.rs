mod common;

use common::assert_close;
use normscore_core::models::demographics::{Demographics, Sex};
use normscore_core::models::response::{ResponseValue, Responses};
use normscore_instruments::definition::InstrumentDefinition;
use normscore_instruments::error::{ErrorCategory, InstrumentError};
use normscore_instruments::{Instrument, all_instruments, get_instrument, pipeline};

const MOOD_SCREEN: &str = r#"{
    "id": "mood-screen",
    "name": "Mood screen",
    "questions": [
        {"id": "m1", "position": 1, "item_type": "likert", "scale_id": "freq"},
        {"id": "m2", "position": 2, "item_type": "likert", "scale_id": "freq"},
        {"id": "m3", "position": 3, "item_type": "likert", "scale_id": "freq", "inverted": true},
        {"id": "m4", "position": 4, "item_type": "likert", "scale_id": "freq"},
        {"id": "m5", "position": 5, "item_type": "likert", "scale_id": "freq"},
        {"id": "m6", "position": 6, "item_type": "likert", "scale_id": "freq"}
    ],
    "scales": [
        {"id": "freq", "options": [
            {"label": "Never", "value": 0},
            {"label": "Sometimes", "value": 1},
            {"label": "Often", "value": 2},
            {"label": "Always", "value": 3}
        ]}
    ],
    "rule": {
        "type": "sectioned_sum",
        "bounds": {"min": 0, "max": 18},
        "sections": [
            {"name": "somatic", "start": 1, "end": 3},
            {"name": "affective", "start": 4, "end": 6}
        ]
    },
    "norms": [
        {
            "id": "overall",
            "name": "Adult reference sample",
            "default_bin": "adults",
            "bins": [
                {"id": "adults", "age_min": 18, "age_max": 64, "sex": "both",
                 "reference": {"kind": "mean_sd", "mean": 8, "sd": 2}},
                {"id": "adult-women", "age_min": 18, "age_max": 64, "sex": "F",
                 "reference": {"kind": "mean_sd", "mean": 10, "sd": 4}}
            ]
        },
        {
            "id": "somatic",
            "name": "Somatic subscale",
            "section": "somatic",
            "bins": [
                {"id": "all", "age_min": 0, "age_max": 120, "sex": "both",
                 "reference": {"kind": "percentile_table", "points": [
                     {"raw": 0, "percentile": 5},
                     {"raw": 3, "percentile": 40},
                     {"raw": 6, "percentile": 85}
                 ]}}
            ]
        }
    ],
    "classification": {
        "basis": "t_score",
        "bands": [
            {"label": "Average", "min": 0, "max": 60},
            {"label": "Elevated", "min": 60, "max": 70},
            {"label": "Clinical", "min": 70, "max": 200}
        ]
    },
    "section_classifications": {
        "affective": {
            "basis": "raw",
            "bands": [
                {"label": "Low", "min": 0, "max": 5},
                {"label": "High", "min": 5, "max": 18}
            ]
        }
    }
}"#;

fn mood_screen() -> InstrumentDefinition {
    InstrumentDefinition::from_json(MOOD_SCREEN).unwrap()
}

fn responses(pairs: &[(&str, ResponseValue)]) -> Responses {
    pairs
        .iter()
        .map(|(id, value)| (id.to_string(), value.clone()))
        .collect()
}

fn all_often() -> Responses {
    responses(&[
        ("m1", "Often".into()),
        ("m2", "Often".into()),
        ("m3", "Often".into()),
        ("m4", 2.into()),
        ("m5", 2.into()),
        ("m6", 2.into()),
    ])
}

#[test]
fn sectioned_instrument_scores_end_to_end() {
    let definition = mood_screen();
    let profile = Demographics::new(30, Sex::Female);

    let outcome = definition.score(&all_often(), Some(&profile)).unwrap();
    assert_eq!(outcome.instrument_id, "mood-screen");

    // m3 is inverted: 3 - 2 = 1.
    assert_eq!(outcome.raw.sections["somatic"], 5.0);
    assert_eq!(outcome.raw.sections["affective"], 6.0);
    assert_eq!(outcome.raw.total, 11.0);

    let overall = &outcome.overall;
    assert_eq!(overall.matched_bin_id.as_deref(), Some("adult-women"));
    assert_eq!(overall.z_score, Some(0.25));
    assert_eq!(overall.t_score, Some(52.5));
    assert_close(overall.percentile.unwrap(), 59.87, 0.01);
    assert_eq!(overall.classification.as_deref(), Some("Average"));
    assert!(!overall.fallback);

    let somatic = &outcome.sections["somatic"];
    assert_eq!(somatic.percentile, Some(40.0));
    assert_eq!(somatic.z_score, None);
    assert_eq!(somatic.classification, None);

    let affective = &outcome.sections["affective"];
    assert_eq!(affective.raw_score, 6.0);
    assert_eq!(affective.percentile, None);
    assert_eq!(affective.classification.as_deref(), Some("High"));
}

#[test]
fn sex_selects_a_different_reference_population() {
    let definition = mood_screen();
    let profile = Demographics::new(30, Sex::Male);

    let outcome = pipeline::score(&definition, &all_often(), Some(&profile)).unwrap();
    assert_eq!(outcome.overall.matched_bin_id.as_deref(), Some("adults"));
    assert_eq!(outcome.overall.z_score, Some(1.5));
    assert_eq!(outcome.overall.t_score, Some(65.0));
    assert_eq!(outcome.overall.classification.as_deref(), Some("Elevated"));
}

#[test]
fn unmatched_respondent_is_scored_against_the_default_bin() {
    let definition = mood_screen();
    let profile = Demographics::new(70, Sex::Male);

    let outcome = definition.score(&all_often(), Some(&profile)).unwrap();
    assert_eq!(outcome.overall.matched_bin_id.as_deref(), Some("adults"));
    assert!(outcome.overall.fallback);
    assert!(!outcome.sections["somatic"].fallback);
}

#[test]
fn normed_instrument_requires_demographics() {
    let definition = mood_screen();

    let err = definition.score(&all_often(), None).unwrap_err();
    assert!(matches!(err, InstrumentError::MissingDemographics(ref id) if id == "mood-screen"));
    assert_eq!(err.category(), ErrorCategory::Input);
}

#[test]
fn incomplete_responses_block_scoring() {
    let definition = mood_screen();
    let profile = Demographics::new(30, Sex::Female);
    let mut partial = all_often();
    partial.remove("m5");
    partial.insert("m2".to_string(), "Rarely".into());

    let err = definition.score(&partial, Some(&profile)).unwrap_err();
    let InstrumentError::IncompleteResponses(issues) = err else {
        panic!("expected incomplete responses");
    };
    assert_eq!(issues.missing().collect::<Vec<_>>(), ["m5"]);
    assert_eq!(issues.invalid().collect::<Vec<_>>(), ["m2"]);

    assert!(definition.validate_responses(&partial).is_err());
    assert!(definition.validate_responses(&all_often()).is_ok());
}

#[test]
fn scoring_is_repeatable() {
    let definition = mood_screen();
    let profile = Demographics::new(45, Sex::Female).with_education("Higher");
    let answers = all_often();

    let first = definition.score(&answers, Some(&profile)).unwrap();
    let second = definition.score(&answers, Some(&profile)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn outcome_serializes_for_storage() {
    let outcome = mood_screen()
        .score(&all_often(), Some(&Demographics::new(30, Sex::Female)))
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["instrument_id"], "mood-screen");
    assert_eq!(json["overall"]["matched_bin_id"], "adult-women");
    assert_eq!(json["sections"]["somatic"]["percentile"], 40.0);
    assert!(json["sections"]["affective"]["z_score"].is_null());
}

#[test]
fn definitions_survive_a_serialization_round_trip() {
    let definition = mood_screen();
    let json = serde_json::to_string(&definition).unwrap();
    let reloaded = InstrumentDefinition::from_json(&json).unwrap();
    assert_eq!(reloaded.form.question_count(), 6);
    assert_eq!(reloaded.norms.len(), 2);
}

#[test]
fn definitions_referencing_unknown_sections_are_rejected() {
    let bad_table = MOOD_SCREEN.replace(r#""section": "somatic""#, r#""section": "cognitive""#);
    let err = InstrumentDefinition::from_json(&bad_table).unwrap_err();
    assert!(matches!(err, InstrumentError::InvalidDefinition(_)));
    assert!(err.is_blocking());

    let bad_labels = MOOD_SCREEN.replace(r#""affective": {"#, r#""cognitive": {"#);
    assert!(InstrumentDefinition::from_json(&bad_labels).is_err());

    let err = InstrumentDefinition::from_json("{\"id\": 1}").unwrap_err();
    assert!(matches!(err, InstrumentError::Serialization(_)));
}

#[test]
fn classifications_the_norms_cannot_feed_are_rejected_at_load() {
    let mut unnormed: serde_json::Value = serde_json::from_str(MOOD_SCREEN).unwrap();
    unnormed["norms"] = serde_json::json!([]);
    unnormed["classification"]["basis"] = serde_json::json!("percentile");
    let err = InstrumentDefinition::from_json(&unnormed.to_string()).unwrap_err();
    assert!(matches!(err, InstrumentError::InvalidDefinition(_)));
    assert_eq!(err.category(), ErrorCategory::Configuration);

    // The somatic table only carries percentiles, so no T-score exists for it.
    let mut percentile_only: serde_json::Value = serde_json::from_str(MOOD_SCREEN).unwrap();
    percentile_only["section_classifications"]["somatic"] = serde_json::json!({
        "basis": "t_score",
        "bands": [{"label": "Any", "min": 0, "max": 100}]
    });
    let err = InstrumentDefinition::from_json(&percentile_only.to_string()).unwrap_err();
    assert!(err.to_string().contains("only has percentiles"), "{err}");

    let somatic = &mut percentile_only["section_classifications"]["somatic"];
    somatic["basis"] = serde_json::json!("percentile");
    assert!(InstrumentDefinition::from_json(&percentile_only.to_string()).is_ok());
}

#[test]
fn builtin_instruments_are_registered() {
    let ids: Vec<String> = all_instruments()
        .iter()
        .map(|i| i.id().to_string())
        .collect();
    assert_eq!(ids, ["phq9", "gad7"]);

    for instrument in all_instruments() {
        assert!(instrument.definition().validate().is_ok(), "{}", instrument.id());
    }
    assert!(get_instrument("bdi").is_none());
}

fn answered(instrument: &dyn Instrument, value: impl Into<ResponseValue> + Clone) -> Responses {
    instrument
        .definition()
        .form
        .questions
        .iter()
        .map(|q| (q.id.clone(), value.clone().into()))
        .collect()
}

#[test]
fn phq9_severity_bands() {
    let phq9 = get_instrument("phq9").unwrap();
    assert_eq!(phq9.name(), "PHQ-9");

    let outcome = phq9.score(&answered(phq9.as_ref(), 2), None).unwrap();
    assert_eq!(outcome.raw.total, 18.0);
    assert_eq!(outcome.overall.classification.as_deref(), Some("Moderately severe"));
    assert_eq!(outcome.overall.percentile, None);

    let outcome = phq9
        .score(&answered(phq9.as_ref(), "Nearly every day"), None)
        .unwrap();
    assert_eq!(outcome.raw.total, 27.0);
    assert_eq!(outcome.overall.classification.as_deref(), Some("Severe"));

    let outcome = phq9.score(&answered(phq9.as_ref(), 0), None).unwrap();
    assert_eq!(outcome.overall.classification.as_deref(), Some("Minimal"));
}

#[test]
fn gad7_severity_bands() {
    let gad7 = get_instrument("gad7").unwrap();

    let outcome = gad7.score(&answered(gad7.as_ref(), 1), None).unwrap();
    assert_eq!(outcome.raw.total, 7.0);
    assert_eq!(outcome.overall.classification.as_deref(), Some("Mild"));

    let mut answers = answered(gad7.as_ref(), 3);
    answers.insert("gad7_01".to_string(), "Not at all".into());
    let outcome = gad7.score(&answers, None).unwrap();
    assert_eq!(outcome.raw.total, 18.0);
    assert_eq!(outcome.overall.classification.as_deref(), Some("Severe"));
}
