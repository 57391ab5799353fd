//! Integration tests for the local scheduler driving the calculation service.

mod common;

use pvsystem_service::service::{
    CalculationSettings, POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY, PREDICT_SOLAR_POWER,
    PvSystemService,
};
use pvsystem_service::sim::engine::Engine;
use pvsystem_service::sim::kpi::RunSummary;
use pvsystem_service::sim::types::{SimConfig, StepOutcome};
use pvsystem_service::{EntityId, Error};

use common::FixedSource;

/// Engine over the reference run for the reference installation only.
fn build_reference_engine(
    instant: CalculationSettings,
    horizon: CalculationSettings,
    source: FixedSource,
) -> Engine<FixedSource> {
    Engine::new(
        common::reference_config(),
        common::initialized_service(instant, horizon),
        source,
        vec![common::reference_id()],
    )
}

/// Engine ticking the reference installation followed by an asset without
/// physical parameters.
fn build_mixed_engine(settings: CalculationSettings) -> Engine<FixedSource> {
    let ids = vec![common::reference_id(), EntityId::from("e-connection")];
    let mut service = PvSystemService::new(settings.clone(), settings);
    service
        .init_calculation_service(&ids, &common::reference_model())
        .unwrap();
    Engine::new(common::reference_config(), service, FixedSource::reference(), ids)
}

#[test]
fn reference_run_ticks_each_calculation_once() {
    let mut engine = build_reference_engine(
        CalculationSettings::default(),
        CalculationSettings::default(),
        FixedSource::reference(),
    );
    let results = engine.run().unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].calculation, PREDICT_SOLAR_POWER);
    assert_eq!(results[1].calculation, POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY);

    let expected = common::expected_power(&common::REFERENCE_IRRADIANCE);
    for r in &results {
        assert_eq!(r.time.to_rfc3339(), "2024-01-01T00:15:00+00:00");
        assert_eq!((r.step, r.total_steps), (1, 1));
        assert_eq!(r.outcome, StepOutcome::Published);
        assert_eq!(r.power_w, expected);
        assert_eq!(r.irradiance_wm2.len(), 49);
    }
}

#[test]
fn ticks_are_ordered_by_time_then_declaration() {
    let horizon = CalculationSettings {
        period_secs: 3600,
        ..CalculationSettings::default()
    };
    let mut engine = Engine::new(
        SimConfig::new(common::start_time(), 3600),
        common::initialized_service(CalculationSettings::default(), horizon),
        FixedSource::reference(),
        vec![common::reference_id()],
    );

    let schedule: Vec<(u64, usize)> = engine
        .schedule()
        .iter()
        .map(|t| (t.elapsed_secs, t.calculation))
        .collect();
    assert_eq!(schedule, vec![(900, 0), (1800, 0), (2700, 0), (3600, 0), (3600, 1)]);

    let results = engine.run().unwrap();
    let steps: Vec<(usize, usize)> = results.iter().map(|r| (r.step, r.total_steps)).collect();
    assert_eq!(steps, vec![(1, 4), (2, 4), (3, 4), (4, 4), (1, 1)]);
}

#[test]
fn offset_shifts_the_first_tick() {
    let instant = CalculationSettings {
        offset_secs: 60,
        ..CalculationSettings::default()
    };
    let horizon = CalculationSettings {
        offset_secs: 61,
        ..CalculationSettings::default()
    };
    let engine = build_reference_engine(instant, horizon, FixedSource::reference());
    let ticks = engine.schedule();
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].elapsed_secs, 960);
}

#[test]
fn empty_horizon_is_published_as_empty() {
    let source = FixedSource {
        current: vec![25.0],
        horizon: Vec::new(),
    };
    let mut engine = build_reference_engine(
        CalculationSettings::default(),
        CalculationSettings::default(),
        source,
    );
    let results = engine.run().unwrap();
    assert_eq!(results[0].power_w, vec![70.0]);
    assert_eq!(results[1].outcome, StepOutcome::Published);
    assert!(results[1].power_w.is_empty());
}

#[test]
fn compute_only_returns_nothing_for_publication() {
    let settings = CalculationSettings {
        publish: false,
        ..CalculationSettings::default()
    };
    let mut engine = build_reference_engine(settings.clone(), settings, FixedSource::reference());
    let results = engine.run().unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.outcome == StepOutcome::ComputeOnly));
    assert!(results.iter().all(|r| r.power_w.is_empty()));

    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.results_compute_only, 2);
    assert_eq!(summary.results_published, 0);
}

#[test]
fn terminate_on_error_aborts_the_run() {
    let mut engine = build_mixed_engine(CalculationSettings::default());
    let err = engine.run().unwrap_err();
    match err {
        Error::InvalidParameter {
            entity_id, name, ..
        } => {
            assert_eq!(entity_id.as_str(), "e-connection");
            assert_eq!(name, "surface_area");
        }
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}

#[test]
fn failures_are_recorded_when_not_terminating() {
    let settings = CalculationSettings {
        terminate_on_error: false,
        ..CalculationSettings::default()
    };
    let mut engine = build_mixed_engine(settings);
    let results = engine.run().unwrap();

    // two calculations x two entities
    assert_eq!(results.len(), 4);
    let outcomes: Vec<bool> = results
        .iter()
        .map(|r| matches!(r.outcome, StepOutcome::Failed(_)))
        .collect();
    assert_eq!(outcomes, vec![false, true, false, true]);

    let summary = RunSummary::from_results(&results);
    assert_eq!(summary.ticks_failed, 2);
    assert_eq!(summary.results_published, 2);
}

#[test]
fn summary_energy_for_reference_run() {
    let mut engine = build_reference_engine(
        CalculationSettings::default(),
        CalculationSettings::default(),
        FixedSource::reference(),
    );
    let results = engine.run().unwrap();
    let summary = RunSummary::from_results(&results);

    let expected = common::expected_power(&common::REFERENCE_IRRADIANCE);
    let mean = expected.iter().sum::<f64>() / expected.len() as f64;
    let wh = summary.energy_wh[&common::reference_id()];
    assert!((wh - mean * 0.25).abs() < 1e-9);

    let peak = expected.iter().copied().fold(0.0, f64::max);
    assert_eq!(summary.peak_power_w, peak);
}

#[test]
fn uninitialized_service_fails_first_tick() {
    let mut engine = Engine::new(
        common::reference_config(),
        PvSystemService::default(),
        FixedSource::reference(),
        vec![common::reference_id()],
    );
    assert!(matches!(engine.run(), Err(Error::NotInitialized)));
}
