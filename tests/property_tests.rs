//! Property-based tests for the regret-minimizing ensemble.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated expert forecasts.

use anofox_ensemble::core::ForecastTable;
use anofox_ensemble::ensembles::{
    ExpertLoss, ExponentialWeights, ForecastingEnsemble, LossType, MLewa, MixtureConfig,
    TrimState, UpdateRule,
};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

/// Build an in-sample table for one series from actuals and per-expert forecasts.
fn make_table(actual: &[f64], experts: &[Vec<f64>]) -> ForecastTable {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let n = actual.len();
    let mut builder = ForecastTable::builder()
        .unique_id(vec!["s".to_string(); n])
        .ds((0..n).map(|i| base + Duration::hours(i as i64)).collect())
        .target(actual.to_vec());
    for (i, fc) in experts.iter().enumerate() {
        builder = builder.model(format!("m{i}"), fc.clone());
    }
    builder.build().unwrap()
}

/// Strategy for actuals plus `k` expert forecast columns of the same length.
fn panel_strategy(
    min_len: usize,
    max_len: usize,
    min_experts: usize,
    max_experts: usize,
) -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>)> {
    (min_len..max_len, min_experts..max_experts).prop_flat_map(|(len, k)| {
        (
            prop::collection::vec(1.0..100.0_f64, len),
            prop::collection::vec(prop::collection::vec(1.0..100.0_f64, len), k),
        )
    })
}

fn loss_strategy() -> impl Strategy<Value = LossType> {
    prop_oneof![
        Just(LossType::Square),
        Just(LossType::Absolute),
        Just(LossType::Percentage),
        Just(LossType::Log),
        (0.05..0.95_f64).prop_map(|tau| LossType::Pinball { tau }),
    ]
}

// =============================================================================
// Property: every round's weights are a convex combination
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn round_weights_are_convex(
        (actual, experts) in panel_strategy(1, 40, 1, 6),
        loss_type in loss_strategy(),
        gradient in any::<bool>(),
    ) {
        let rule = ExponentialWeights;
        let loss = ExpertLoss::new(loss_type, gradient).unwrap();
        let mut state = rule.initialize_state(actual.len(), experts.len()).unwrap();

        for (t, &y) in actual.iter().enumerate() {
            let fc: Vec<f64> = experts.iter().map(|e| e[t]).collect();
            rule.update_mixture(&mut state, &fc, y, &loss).unwrap();
        }

        for w in &state.weights {
            prop_assert!(w.iter().all(|&x| x >= 0.0 && x.is_finite()));
            prop_assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn single_expert_weight_is_one(
        (actual, experts) in panel_strategy(1, 30, 1, 2),
        loss_type in loss_strategy(),
        gradient in any::<bool>(),
        weight_by_uid in any::<bool>(),
    ) {
        let table = make_table(&actual, &experts);
        let config = MixtureConfig::new(loss_type, gradient).with_weight_by_uid(weight_by_uid);
        let mut ensemble = MLewa::new(config).unwrap();
        ensemble.fit(&table).unwrap();

        prop_assert_eq!(ensemble.weights("s").unwrap(), &[1.0]);
        prop_assert_eq!(ensemble.fitted_values("s").unwrap(), experts[0].as_slice());
    }
}

// =============================================================================
// Property: a uniformly better expert leads in regret and weight
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn exact_expert_accumulates_largest_regret(
        (actual, experts) in panel_strategy(1, 40, 1, 5),
        gradient in any::<bool>(),
    ) {
        // Expert 0 reproduces the actuals; the others are off by at least 1.
        let mut all = vec![actual.clone()];
        all.extend(experts.iter().map(|e| {
            e.iter()
                .zip(actual.iter())
                .map(|(x, y)| y + 1.0 + (x - y).abs())
                .collect::<Vec<f64>>()
        }));

        let rule = ExponentialWeights;
        let loss = ExpertLoss::new(LossType::Absolute, gradient).unwrap();
        let mut state = rule.initialize_state(actual.len(), all.len()).unwrap();
        for (t, &y) in actual.iter().enumerate() {
            let fc: Vec<f64> = all.iter().map(|e| e[t]).collect();
            rule.update_mixture(&mut state, &fc, y, &loss).unwrap();

            // The mixture never beats the exact expert.
            prop_assert!(state.regret[0] >= 0.0);
            for r in &state.regret[1..] {
                prop_assert!(state.regret[0] >= *r);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn exact_expert_gets_largest_final_weight(
        (actual, experts) in panel_strategy(1, 40, 1, 5),
        loss_type in prop_oneof![Just(LossType::Square), Just(LossType::Absolute)],
        weight_by_uid in any::<bool>(),
    ) {
        let mut all = vec![actual.clone()];
        all.extend(experts.iter().map(|e| {
            e.iter()
                .zip(actual.iter())
                .map(|(x, y)| y + 1.0 + (x - y).abs())
                .collect::<Vec<f64>>()
        }));

        let table = make_table(&actual, &all);
        let config = MixtureConfig::new(loss_type, false).with_weight_by_uid(weight_by_uid);
        let mut ensemble = MLewa::new(config).unwrap();
        ensemble.fit(&table).unwrap();

        let w = ensemble.weights("s").unwrap();
        let best_other = w[1..].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(w[0] >= best_other - 1e-12, "weights: {:?}", w);
    }
}

// =============================================================================
// Property: trimming keeps exactly max(1, round(r * n)) members
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn trimmed_weights_keep_n_models(
        (actual, experts) in panel_strategy(2, 20, 1, 8),
        trim_ratio in 0.05..1.0_f64,
    ) {
        let table = make_table(&actual, &experts);
        let config = MixtureConfig::new(LossType::Absolute, true)
            .with_trim_ratio(trim_ratio)
            .with_weight_by_uid(true);
        let mut ensemble = MLewa::new(config).unwrap();
        ensemble.fit(&table).unwrap();

        let expected = TrimState::new(trim_ratio, experts.len()).n_models;
        prop_assert_eq!(expected, ((trim_ratio * experts.len() as f64).round() as usize).max(1));

        let trimmed = ensemble.weights_by_uid(&ensemble.weight_table().unwrap()).unwrap();
        let w = trimmed.get("s").unwrap();
        prop_assert_eq!(w.iter().filter(|&&x| x > 0.0).count(), expected);
        prop_assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn predict_is_pure(
        (actual, experts) in panel_strategy(2, 20, 2, 6),
        trim_ratio in 0.1..=1.0_f64,
    ) {
        let table = make_table(&actual, &experts);
        let config = MixtureConfig::default().with_trim_ratio(trim_ratio);
        let mut ensemble = MLewa::new(config).unwrap();
        ensemble.fit(&table).unwrap();

        let first = ensemble.predict(&table).unwrap();
        let second = ensemble.predict(&table).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), table.len());
        prop_assert!(first.values().iter().all(|v| v.is_finite()));
    }
}
