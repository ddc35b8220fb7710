//! FlightSurety Performance Benchmarks
//!
//! Critical paths through the facade:
//! - Oracle index assignment
//! - Status fetch and quorum round
//! - Policy purchase

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flightsurety_app::{FlightSuretyApp, SuretyConfig};
use flightsurety_common::{
    Address, CallContext, FlightKey, FlightStatus, InMemoryPayments, Wei, MIN_FUNDING, ORACLE_FEE,
};
use flightsurety_oracle::{IndexAssigner, OracleConfig};

const T0: i64 = 1_700_000_000;

fn app_with_flights(flights: usize) -> (FlightSuretyApp, Vec<FlightKey>) {
    let config = SuretyConfig {
        oracle: OracleConfig {
            entropy_seed: Some("07".repeat(32)),
            request_ttl_secs: None,
            ..OracleConfig::default()
        },
        ..SuretyConfig::default()
    };
    let owner = Address::derive("owner");
    let airline = Address::derive("airline");
    let app = FlightSuretyApp::new(owner, &config, Arc::new(InMemoryPayments::new())).unwrap();
    app.register_first_airline(&CallContext::new(owner, T0), airline).unwrap();
    app.add_funding(&CallContext::new(airline, T0).with_value(MIN_FUNDING)).unwrap();

    let keys = (0..flights)
        .map(|n| {
            app.register_flight(&CallContext::new(airline, T0), &format!("FS{}", n), T0 + 3600)
                .unwrap()
        })
        .collect();
    (app, keys)
}

// ============ ORACLE BENCHMARKS ============

fn bench_index_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_assignment");
    let caller = Address::derive("oracle");

    for count in [1usize, 3, 5].iter() {
        group.bench_with_input(BenchmarkId::new("indexes", count), count, |b, &count| {
            let mut assigner = IndexAssigner::with_key([9u8; 32], 10);
            b.iter(|| black_box(assigner.assign(black_box(&caller), T0, count)));
        });
    }

    group.finish();
}

fn bench_quorum_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("quorum_round");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_and_resolve", |b| {
        b.iter_with_setup(
            || {
                let (app, keys) = app_with_flights(1);
                let oracles: Vec<(Address, Vec<u8>)> = (0..30)
                    .map(|n| {
                        let oracle = Address::derive(&format!("oracle-{}", n));
                        let indexes = app
                            .register_oracle(&CallContext::new(oracle, T0).with_value(ORACLE_FEE))
                            .unwrap();
                        (oracle, indexes)
                    })
                    .collect();
                (app, keys, oracles)
            },
            |(app, keys, oracles)| {
                let flight = &keys[0];
                let requester = CallContext::new(Address::derive("passenger"), T0);
                let fetch = app
                    .fetch_flight_status(&requester, flight.airline, &flight.code, flight.timestamp)
                    .unwrap();
                for (oracle, indexes) in &oracles {
                    if !indexes.contains(&fetch.key.index) {
                        continue;
                    }
                    let _ = app.submit_oracle_response(
                        &CallContext::new(*oracle, T0),
                        fetch.key.index,
                        flight.airline,
                        &flight.code,
                        flight.timestamp,
                        FlightStatus::LateAirline,
                    );
                }
                black_box(app.flight(flight))
            },
        );
    });

    group.finish();
}

// ============ INSURANCE BENCHMARKS ============

fn bench_policy_purchase(c: &mut Criterion) {
    let mut group = c.benchmark_group("insurance");
    let (app, keys) = app_with_flights(1);
    let flight = keys[0].clone();
    let mut n = 0u64;

    group.bench_function("buy", |b| {
        b.iter(|| {
            n += 1;
            let holder = Address::derive(&format!("passenger-{}", n));
            let ctx = CallContext::new(holder, T0).with_value(Wei::ether(1));
            black_box(app.buy(&ctx, &flight).unwrap())
        });
    });

    group.finish();
}

criterion_group!(oracle_benches, bench_index_assignment, bench_quorum_round);
criterion_group!(insurance_benches, bench_policy_purchase);
criterion_main!(oracle_benches, insurance_benches);
