use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use signal_runtime::{
    AttributeKind, DeviceKeys, DeviceSession, FingerprintVector, KeyAgreementAlgorithm,
    ManualClock, SessionGrant, SignalRuntime,
};

const T0: u64 = 1_700_000_000_000;

fn fingerprint() -> FingerprintVector {
    FingerprintVector::from_attributes([
        (AttributeKind::MachineId, "bench-machine"),
        (AttributeKind::BoardSerial, "bench-board"),
        (AttributeKind::CpuModel, "bench-cpu"),
        (AttributeKind::CpuCores, "8"),
        (AttributeKind::Architecture, "x86_64"),
    ])
}

fn setup_session() -> (SignalRuntime, ManualClock, SessionGrant, DeviceSession) {
    let clock = ManualClock::new(T0);
    let mut config = signal_runtime::RuntimeConfig::default();
    config.anomaly.burst_limit = u32::MAX;
    let runtime = SignalRuntime::builder()
        .with_config(config)
        .with_clock(clock.clone())
        .build()
        .unwrap();
    let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber768).unwrap();
    let grant = runtime.issue("bench", keys.public_key(), &fingerprint()).unwrap();
    let device = DeviceSession::establish(&keys, &grant, &fingerprint()).unwrap();
    (runtime, clock, grant, device)
}

fn benchmark_issuance(c: &mut Criterion) {
    let mut group = c.benchmark_group("issuance");
    group.measurement_time(Duration::from_secs(10));

    for algorithm in KeyAgreementAlgorithm::ALL {
        let runtime = SignalRuntime::builder()
            .with_key_agreement(algorithm)
            .build()
            .unwrap();
        let keys = DeviceKeys::generate(algorithm).unwrap();
        let fingerprint = fingerprint();

        group.bench_with_input(BenchmarkId::new("issue", algorithm), &algorithm, |b, _| {
            b.iter(|| black_box(runtime.issue("bench", keys.public_key(), &fingerprint).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("signals");

    let (_, _, _, device) = setup_session();
    let mut sequence = 0u64;
    group.bench_function("generate", |b| {
        b.iter(|| {
            sequence += 1;
            black_box(device.signal_at(0, sequence, T0))
        });
    });

    let (runtime, _clock, grant, device) = setup_session();
    let mut sequence = 0u64;
    group.bench_function("validate", |b| {
        b.iter_with_setup(
            || {
                sequence += 1;
                device.signal_at(0, sequence, T0)
            },
            |signal| {
                let verdict = runtime.validate(&grant.session_id, &signal);
                debug_assert!(verdict.is_accept());
                black_box(verdict)
            },
        );
    });

    let (runtime, _clock, grant, mut device) = setup_session();
    let observed = fingerprint();
    group.bench_function("validate_observed", |b| {
        b.iter_with_setup(
            || device.next_signal(T0),
            |signal| black_box(runtime.validate_observed(&grant.session_id, &signal, &observed)),
        );
    });

    let (runtime, _clock, _, _) = setup_session();
    let forged = signal_runtime::Signal {
        epoch: 0,
        sequence: 1,
        digest: signal_runtime::SignalDigest::from_bytes([0u8; 32]),
        issued_at_ms: T0,
    };
    group.bench_function("reject_unknown_session", |b| {
        let stranger = signal_runtime::SessionId::generate();
        b.iter(|| black_box(runtime.validate(&stranger, &forged)));
    });

    group.finish();
}

fn benchmark_registry_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.sample_size(20);

    for sessions in [1_000usize, 10_000] {
        let clock = ManualClock::new(T0);
        let mut config = signal_runtime::RuntimeConfig::lenient();
        config.crypto = signal_runtime::CryptoConfig::lightweight();
        config.anomaly.burst_limit = u32::MAX;
        let runtime = SignalRuntime::builder()
            .with_config(config)
            .with_clock(clock)
            .build()
            .unwrap();
        let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber512).unwrap();
        let mut devices: Vec<(SessionGrant, DeviceSession)> = (0..sessions)
            .map(|_| {
                let grant = runtime.issue("bench", keys.public_key(), &fingerprint()).unwrap();
                let device = DeviceSession::establish(&keys, &grant, &fingerprint()).unwrap();
                (grant, device)
            })
            .collect();

        let mut next = 0usize;
        group.bench_with_input(BenchmarkId::new("validate", sessions), &sessions, |b, _| {
            b.iter_with_setup(
                || {
                    next = (next + 1) % devices.len();
                    let (grant, device) = &mut devices[next];
                    (grant.session_id, device.next_signal(T0))
                },
                |(id, signal)| black_box(runtime.validate(&id, &signal)),
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_issuance,
    benchmark_signals,
    benchmark_registry_scale
);
criterion_main!(benches);
