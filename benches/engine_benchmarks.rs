use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use samc::engine::SamcEngine;
use samc::models::TrainingSession;

/// Benchmarks for the per-day engine entry points and the parallel backtest
/// over histories of increasing length.

fn create_lifting_payload() -> Value {
    json!({
        "exercises": [
            { "exercise_id": "back_squat", "sets": 5, "reps": 5, "weight_kg": 120.0, "rpe": 8.0 },
            { "exercise_id": "bench_press", "sets": 4, "reps": 8, "weight_kg": 80.0, "rpe": 7.5 },
            { "exercise_id": "deadlift", "sets": 3, "reps": 3, "weight_kg": 160.0, "rpe": 9.0 }
        ]
    })
}

fn create_history(engine: &SamcEngine, end: NaiveDate, days: u64) -> Vec<TrainingSession> {
    let lifting = create_lifting_payload();
    let commute = json!({ "distance_km": 8.0, "duration_min": 25, "rpe": 4, "elevation_gain_m": 60.0 });

    let mut sessions = Vec::new();
    for offset in 0..days {
        let date = end - Days::new(offset);
        let morning = Utc.from_utc_datetime(&date.and_hms_opt(8, 0, 0).unwrap());
        sessions.push(engine.build_session(morning, "bicycle_commuting", &commute, None).unwrap());
        if offset % 3 == 0 {
            let evening = Utc.from_utc_datetime(&date.and_hms_opt(18, 0, 0).unwrap());
            sessions.push(engine.build_session(evening, "weight_lifting", &lifting, None).unwrap());
        }
    }
    sessions
}

fn bench_session_load(c: &mut Criterion) {
    let engine = SamcEngine::new();
    let payload = create_lifting_payload();

    c.bench_function("compute_session_load", |b| {
        b.iter(|| engine.compute_session_load(black_box("weight_lifting"), black_box(&payload)))
    });
}

fn bench_daily_evaluation(c: &mut Criterion) {
    let engine = SamcEngine::new();
    let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let as_of: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 7, 1, 7, 0, 0).unwrap();

    let mut group = c.benchmark_group("Daily Evaluation");

    for &days in &[28u64, 90, 365] {
        let history = create_history(&engine, end, days);

        group.throughput(Throughput::Elements(history.len() as u64));
        group.bench_with_input(BenchmarkId::new("compute_acwr", days), &history, |b, history| {
            b.iter(|| engine.compute_acwr(black_box(history), as_of.date_naive()))
        });
        group.bench_with_input(
            BenchmarkId::new("compute_domain_readiness", days),
            &history,
            |b, history| b.iter(|| engine.compute_domain_readiness(black_box(history), as_of)),
        );
        group.bench_with_input(BenchmarkId::new("evaluate_day", days), &history, |b, history| {
            b.iter(|| engine.evaluate_day(black_box(history), as_of))
        });
    }

    group.finish();
}

fn bench_backtest(c: &mut Criterion) {
    let engine = SamcEngine::new();
    let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let history = create_history(&engine, end, 365);
    let time = NaiveTime::from_hms_opt(7, 0, 0).unwrap();

    let mut group = c.benchmark_group("Backtest");
    group.sample_size(20);

    for &days in &[30u64, 180] {
        let start = end - Days::new(days - 1);
        group.throughput(Throughput::Elements(days));
        group.bench_with_input(BenchmarkId::new("backtest_range", days), &start, |b, start| {
            b.iter(|| engine.backtest_range(black_box(&history), *start, end, time))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_session_load, bench_daily_evaluation, bench_backtest);
criterion_main!(benches);
