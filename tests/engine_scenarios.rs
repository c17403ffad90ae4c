//! End-to-end allocation and learning scenarios

use attention_budget::neural::learner::OnlineLearner;
use attention_budget::{
    cosine_similarity, AttentionEngine, AttentionState, ComponentDescriptor, ComponentId,
    ContextUpdate, EngineConfig, FeatureVector, FileSnapshotStore, InteractionAction,
    ManualClock, Urgency, UserState,
};
use chrono::{Duration, Local, TimeZone};

fn new_engine() -> (AttentionEngine, ManualClock) {
    let clock = ManualClock::new(Local.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap());
    let mut engine = AttentionEngine::new(EngineConfig::default()).with_clock(clock.clone());
    engine.update(ContextUpdate::pools(100.0, 10.0, 3.0));
    (engine, clock)
}

fn incoming_call() -> ComponentDescriptor {
    ComponentDescriptor::new("incoming-call")
        .with_urgency(Urgency::Critical)
        .with_weight(100.0)
        .deferrable(true)
        .with_needs(10.0, 2.0, 0.5)
}

fn id(s: &str) -> ComponentId {
    ComponentId::new(s)
}

#[test]
fn critical_component_in_calm_context() {
    let (mut engine, _) = new_engine();
    engine.register(incoming_call());

    assert_eq!(engine.score_of(&id("incoming-call")), Some(200.0));
    assert_eq!(engine.state_of(&id("incoming-call")), Some(AttentionState::Allocated));
    let pools = &engine.context().attention_pools;
    assert_eq!(pools.used_screen_space, 10.0);
    assert_eq!(pools.used_audio_time, 2.0);
    assert_eq!(pools.used_cognitive_load, 0.5);
}

#[test]
fn busy_user_discounts_but_keeps_critical_component() {
    let (mut engine, _) = new_engine();
    engine.register(incoming_call());
    let calm = engine.score_of(&id("incoming-call")).unwrap();

    engine.update(ContextUpdate::user(UserState { is_busy: true, ..Default::default() }));

    let busy = engine.score_of(&id("incoming-call")).unwrap();
    assert!((busy - 60.0).abs() < 1e-9);
    assert!((busy - calm * 0.3).abs() < 1e-9);
    assert_eq!(engine.state_of(&id("incoming-call")), Some(AttentionState::Allocated));
}

#[test]
fn combined_needs_over_capacity_defers_lower_score() {
    let (mut engine, _) = new_engine();
    engine.register(ComponentDescriptor::new("map").with_weight(40.0).with_needs(60.0, 0.0, 0.0));
    engine.register(ComponentDescriptor::new("video").with_weight(80.0).with_needs(60.0, 0.0, 0.0));

    assert_eq!(engine.state_of(&id("video")), Some(AttentionState::Allocated));
    assert_eq!(engine.state_of(&id("map")), Some(AttentionState::Deferred));
    assert_eq!(engine.context().attention_pools.used_screen_space, 60.0);
}

#[test]
fn dismissals_at_same_hour_give_negative_time_signal() {
    let (mut engine, clock) = new_engine();
    engine.register(ComponentDescriptor::new("promo").with_weight(30.0));

    for _ in 0..5 {
        engine.record_interaction(&id("promo"), InteractionAction::Dismiss).unwrap();
        clock.advance(Duration::minutes(3));
    }
    engine.record_interaction(&id("promo"), InteractionAction::Ignore).unwrap();

    let hour = 14.0 / 24.0;
    assert_eq!(engine.learner().find_time_pattern(hour), -1.0);
}

#[test]
fn repeated_pass_changes_nothing() {
    let (mut engine, _) = new_engine();
    engine.register(incoming_call());
    engine.register(
        ComponentDescriptor::new("weather")
            .with_weight(20.0)
            .with_needs(50.0, 0.0, 1.0),
    );
    engine.register(
        ComponentDescriptor::new("feed")
            .with_weight(60.0)
            .with_needs(50.0, 1.0, 2.0),
    );

    let first = engine.allocate().clone();
    let second = engine.allocate().clone();
    assert_eq!(first.entries, second.entries);
    assert_eq!(first.usage, second.usage);
    assert_eq!(second.pass, first.pass + 1);
}

#[test]
fn allocated_needs_never_exceed_caps() {
    let (mut engine, _) = new_engine();
    for i in 0..12 {
        let weight = 15.0 + i as f64 * 7.0;
        let screen = 5.0 + (i % 4) as f64 * 15.0;
        let audio = (i % 3) as f64 * 1.5;
        let cognitive = 0.25 + (i % 5) as f64 * 0.4;
        engine.register(
            ComponentDescriptor::new(format!("c{}", i))
                .with_weight(weight)
                .with_needs(screen, audio, cognitive),
        );
    }

    let report = engine.allocate().clone();
    let allocated: Vec<&ComponentDescriptor> = engine
        .components()
        .filter(|c| engine.state_of(&c.id) == Some(AttentionState::Allocated))
        .collect();
    let screen: f64 = allocated.iter().map(|c| c.needs.screen).sum();
    let audio: f64 = allocated.iter().map(|c| c.needs.audio).sum();
    let cognitive: f64 = allocated.iter().map(|c| c.needs.cognitive).sum();

    assert!(screen <= 100.0 + 1e-9);
    assert!(audio <= 10.0 + 1e-9);
    assert!(cognitive <= 3.0 + 1e-9);
    assert!(report.count(AttentionState::Deferred) > 0);
    assert!(report
        .entries
        .iter()
        .all(|e| matches!(e.state, AttentionState::Allocated | AttentionState::Deferred)));
}

#[test]
fn no_adjustment_before_warmup() {
    let (mut engine, _) = new_engine();
    engine.register(incoming_call());
    for _ in 0..49 {
        engine.record_interaction(&id("incoming-call"), InteractionAction::Activate).unwrap();
    }

    assert!(!engine.adjustments_active());
    let features = engine
        .learner()
        .features(&incoming_call(), engine.context(), Local::now());
    assert_eq!(engine.learner().adjustment(&features), 0.0);
    assert_eq!(engine.allocate().entry(&id("incoming-call")).map(|e| e.score), Some(200.0));

    engine.record_interaction(&id("incoming-call"), InteractionAction::Activate).unwrap();
    assert!(engine.adjustments_active());
    let score = engine.allocate().entry(&id("incoming-call")).map(|e| e.score).unwrap();
    assert!(score <= 100.0);
}

#[test]
fn cosine_similarity_boundaries() {
    let v: FeatureVector = [("urgency", 0.75), ("noise", 0.2), ("busy", 1.0)].into_iter().collect();
    let zero: FeatureVector = [("urgency", 0.0), ("noise", 0.0)].into_iter().collect();

    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
    assert_eq!(cosine_similarity(&v, &zero), 0.0);
    assert_eq!(cosine_similarity(&zero, &zero), 0.0);
}

#[test]
fn learning_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());

    let (mut engine, _) = new_engine();
    engine.register(incoming_call());
    let actions = [
        InteractionAction::Activate,
        InteractionAction::Dismiss,
        InteractionAction::Inspect,
    ];
    for action in actions {
        engine.record_interaction(&id("incoming-call"), action).unwrap();
    }
    engine.persist_learning(&store).unwrap();

    let (mut restarted, _) = new_engine();
    assert!(restarted.restore_learning(&store));
    assert_eq!(restarted.learner().ledger().len(), 3);
    assert_eq!(restarted.learner().weights(), engine.learner().weights());
}

#[test]
fn corrupt_snapshot_starts_cold() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    std::fs::write(store.path(), "{\"interaction_history\": [").unwrap();

    let (mut engine, _) = new_engine();
    assert!(!engine.restore_learning(&store));
    assert!(engine.learner().ledger().is_empty());
    assert_eq!(engine.learner().weights(), OnlineLearner::new(&EngineConfig::default()).weights());
}
