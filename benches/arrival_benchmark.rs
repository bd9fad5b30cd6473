use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use route_tracker::models::{Coordinates, Ping, Stop, StopRecord, VisitState};
use route_tracker::services::{arrival, progress, proximity};
use route_tracker::time_utils::fixed_offset;

/// A course of `n` stops roughly 500 m apart heading north, the first half
/// already visited.
fn course(n: usize) -> Vec<Stop> {
    (0..n)
        .map(|i| Stop {
            id: i as u64 + 1,
            project_id: 1,
            record: StopRecord {
                course_name: "A".to_string(),
                sequence: (i + 1).to_string(),
                scheduled_arrival: Some(format!("{:02}:{:02}", 8 + i / 60, i % 60)),
                stop_name: format!("Stop {}", i + 1),
                coordinates: Some(Coordinates::new(35.0 + i as f64 * 0.0045, 139.0)),
                ..Default::default()
            },
            visit: if i < n / 2 {
                VisitState::Arrived {
                    arrived_at: "08:00".parse().expect("valid time"),
                    departed_at: None,
                }
            } else {
                VisitState::Unvisited
            },
        })
        .collect()
}

fn ping_near(stop: &Stop) -> Ping {
    let at = stop.coordinates().expect("stop has coordinates");
    Ping {
        latitude: at.latitude + 0.0002,
        longitude: at.longitude,
        timestamp: DateTime::parse_from_rfc3339("2025-12-02T00:30:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc),
        accuracy: Some(8.0),
        speed: Some(9.5),
        bearing: Some(0.0),
        battery_level: Some(80),
    }
}

fn benchmark_ping_evaluation(c: &mut Criterion) {
    let offset = fixed_offset(540).expect("valid offset");
    let stops = course(200);
    let ping = ping_near(&stops[100]);

    let mut group = c.benchmark_group("ping_evaluation");

    group.bench_function("arrival_evaluate_200_stops", |b| {
        b.iter(|| arrival::evaluate(black_box(&ping), black_box(&stops), 100.0, offset))
    });

    group.bench_function("progress_estimate_200_stops", |b| {
        b.iter(|| progress::estimate(black_box(&ping), black_box(&stops)))
    });

    group.bench_function("proximity_estimate_last_stop", |b| {
        b.iter(|| proximity::estimate(black_box(&stops), black_box(200)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_ping_evaluation);
criterion_main!(benches);
