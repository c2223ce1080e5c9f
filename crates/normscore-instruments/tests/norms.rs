mod common;

use common::{mean_sd_bin, percentile_bin, table};
use normscore_core::models::demographics::{Demographics, Sex};
use normscore_instruments::error::{ErrorCategory, InstrumentError};
use normscore_instruments::norms::{match_bin, ReferenceStatistics, SexFilter};

#[test]
fn explicit_sex_outranks_both() {
    let table = table(vec![
        mean_sd_bin("18-30-both", (18, 30), SexFilter::Both, 12.0, 4.0),
        mean_sd_bin("18-30-F", (18, 30), SexFilter::Female, 15.0, 5.0),
    ]);

    let matched = match_bin(&table, &Demographics::new(25, Sex::Female)).unwrap();
    assert_eq!(matched.bin.id, "18-30-F");
    assert!(!matched.fallback);
    assert_eq!(
        matched.bin.reference,
        ReferenceStatistics::MeanSd {
            mean: 15.0,
            sd: 5.0
        }
    );

    let matched = match_bin(&table, &Demographics::new(25, Sex::Male)).unwrap();
    assert_eq!(matched.bin.id, "18-30-both");
}

#[test]
fn age_bounds_are_inclusive() {
    let table = table(vec![
        mean_sd_bin("young", (18, 30), SexFilter::Both, 12.0, 4.0),
        mean_sd_bin("middle", (31, 50), SexFilter::Both, 14.0, 4.0),
    ]);

    for (age, expected) in [(18, "young"), (30, "young"), (31, "middle"), (50, "middle")] {
        let matched = match_bin(&table, &Demographics::new(age, Sex::Male)).unwrap();
        assert_eq!(matched.bin.id, expected, "age {age}");
    }
}

#[test]
fn education_constraint_outranks_none() {
    let mut college = mean_sd_bin("college", (18, 60), SexFilter::Both, 20.0, 3.0);
    college.education = Some("Higher".to_string());
    let table = table(vec![
        mean_sd_bin("general", (18, 60), SexFilter::Both, 15.0, 5.0),
        college,
    ]);

    let graduate = Demographics::new(40, Sex::Male).with_education(" higher ");
    assert_eq!(match_bin(&table, &graduate).unwrap().bin.id, "college");

    let unknown = Demographics::new(40, Sex::Male);
    assert_eq!(match_bin(&table, &unknown).unwrap().bin.id, "general");

    let primary = Demographics::new(40, Sex::Male).with_education("Primary");
    assert_eq!(match_bin(&table, &primary).unwrap().bin.id, "general");
}

#[test]
fn sex_match_weighs_more_than_education_match() {
    let mut educated_both = mean_sd_bin("edu-both", (18, 60), SexFilter::Both, 20.0, 3.0);
    educated_both.education = Some("Higher".to_string());
    let table = table(vec![
        educated_both,
        mean_sd_bin("female", (18, 60), SexFilter::Female, 15.0, 5.0),
    ]);

    let profile = Demographics::new(40, Sex::Female).with_education("Higher");
    assert_eq!(match_bin(&table, &profile).unwrap().bin.id, "female");
}

#[test]
fn equally_specific_overlapping_bins_are_ambiguous() {
    let table = table(vec![
        mean_sd_bin("a", (18, 30), SexFilter::Female, 15.0, 5.0),
        mean_sd_bin("b", (25, 40), SexFilter::Female, 16.0, 5.0),
    ]);

    let err = match_bin(&table, &Demographics::new(27, Sex::Female)).unwrap_err();
    match &err {
        InstrumentError::AmbiguousBinMatch {
            table_id,
            candidates,
        } => {
            assert_eq!(table_id, "adult");
            assert_eq!(candidates, &vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.category(), ErrorCategory::Configuration);

    // Outside the overlap each bin is unambiguous.
    let matched = match_bin(&table, &Demographics::new(20, Sex::Female)).unwrap();
    assert_eq!(matched.bin.id, "a");
}

#[test]
fn no_match_uses_the_default_bin_and_flags_it() {
    let mut table = table(vec![
        mean_sd_bin("adults", (18, 64), SexFilter::Both, 12.0, 4.0),
        mean_sd_bin("seniors", (65, 90), SexFilter::Both, 14.0, 4.0),
    ]);
    table.default_bin = Some("adults".to_string());

    let matched = match_bin(&table, &Demographics::new(12, Sex::Male)).unwrap();
    assert_eq!(matched.bin.id, "adults");
    assert!(matched.fallback);
}

#[test]
fn no_match_without_default_is_an_error() {
    let table = table(vec![mean_sd_bin("adults", (18, 64), SexFilter::Female, 12.0, 4.0)]);

    let err = match_bin(&table, &Demographics::new(30, Sex::Male)).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::NoMatchingBin {
            age: 30,
            sex: Sex::Male,
            ..
        }
    ));
}

#[test]
fn matching_is_idempotent() {
    let table = table(vec![
        mean_sd_bin("18-30-both", (18, 30), SexFilter::Both, 12.0, 4.0),
        mean_sd_bin("18-30-F", (18, 30), SexFilter::Female, 15.0, 5.0),
    ]);
    let profile = Demographics::new(22, Sex::Female);

    let first = match_bin(&table, &profile).unwrap().bin.id.clone();
    for _ in 0..5 {
        assert_eq!(match_bin(&table, &profile).unwrap().bin.id, first);
    }
}

#[test]
fn table_validation_catches_authoring_errors() {
    let zero_sd = table(vec![mean_sd_bin("flat", (18, 30), SexFilter::Both, 12.0, 0.0)]);
    assert!(matches!(
        zero_sd.validate(),
        Err(InstrumentError::ZeroStandardDeviation { ref bin_id }) if bin_id == "flat"
    ));

    let inverted_ages = table(vec![mean_sd_bin("x", (40, 30), SexFilter::Both, 12.0, 4.0)]);
    assert!(inverted_ages.validate().is_err());

    let unsorted = table(vec![percentile_bin("p", &[(10.0, 20.0), (5.0, 10.0)])]);
    assert!(unsorted.validate().is_err());

    let out_of_range = table(vec![percentile_bin("p", &[(10.0, 120.0)])]);
    assert!(out_of_range.validate().is_err());

    let mut dangling_default = table(vec![percentile_bin("p", &[(10.0, 20.0)])]);
    dangling_default.default_bin = Some("missing".to_string());
    assert!(dangling_default.validate().is_err());

    let duplicate = table(vec![
        percentile_bin("p", &[(10.0, 20.0)]),
        percentile_bin("p", &[(10.0, 20.0)]),
    ]);
    assert!(duplicate.validate().is_err());

    let fine = table(vec![percentile_bin("p", &[(10.0, 20.0), (20.0, 60.0)])]);
    assert!(fine.validate().is_ok());
}

#[test]
fn tables_deserialize_from_json() {
    let table: normscore_instruments::norms::NormativeTable = serde_json::from_str(
        r#"{
            "id": "br-adult",
            "name": "Adults",
            "default_bin": "all",
            "bins": [
                {"id": "all", "age_min": 18, "age_max": 99, "sex": "both",
                 "reference": {"kind": "mean_sd", "mean": 10.0, "sd": 2.5}},
                {"id": "f", "age_min": 18, "age_max": 99, "sex": "F", "education": "Higher",
                 "reference": {"kind": "percentile_table", "points": [
                     {"raw": 30, "percentile": 20},
                     {"raw": 40, "percentile": 50}
                 ]}}
            ]
        }"#,
    )
    .unwrap();

    assert!(table.validate().is_ok());
    assert_eq!(table.bins[1].sex, SexFilter::Female);
    assert_eq!(table.bins[1].education.as_deref(), Some("Higher"));
}
