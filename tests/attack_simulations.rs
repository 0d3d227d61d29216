// Adversarial scenarios against a running runtime
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use signal_runtime::{
    AttributeKind, AuthError, DeviceKeys, DeviceSession, Error, FingerprintVector,
    KeyAgreementAlgorithm, ManualClock, RejectReason, Result, RevocationReason, RuntimeConfig,
    SessionGrant, SessionState, Signal, SignalDigest, SignalRuntime, Verdict,
};

const T0: u64 = 1_700_000_000_000;

fn laptop() -> FingerprintVector {
    FingerprintVector::from_attributes([
        (AttributeKind::MachineId, "a0b1c2d3e4f5"),
        (AttributeKind::BoardSerial, "NXHQEED001"),
        (AttributeKind::CpuModel, "AMD Ryzen 5 5600U"),
        (AttributeKind::CpuCores, "12"),
        (AttributeKind::TpmEndorsement, "present"),
        (AttributeKind::OsFamily, "windows"),
    ])
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(config: RuntimeConfig) -> (SignalRuntime, ManualClock, SessionGrant, DeviceSession) {
    init_logging();
    let clock = ManualClock::new(T0);
    let runtime = SignalRuntime::builder()
        .with_config(config)
        .with_clock(clock.clone())
        .build()
        .unwrap();
    let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber768).unwrap();
    let grant = runtime.issue("victim", keys.public_key(), &laptop()).unwrap();
    let device = DeviceSession::establish(&keys, &grant, &laptop()).unwrap();
    (runtime, clock, grant, device)
}

fn replay_only_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.anomaly.threshold = 100.0;
    config
}

// ----- replay -----

#[test]
fn test_captured_signal_replayed() {
    let (runtime, _clock, grant, mut device) = setup(replay_only_config());
    let captured = device.next_signal(T0);
    assert!(runtime.validate(&grant.session_id, &captured).is_accept());

    let limit = runtime.config().max_replay_violations;
    for _ in 0..limit {
        assert_eq!(
            runtime.validate(&grant.session_id, &captured),
            Verdict::Reject(RejectReason::ReplayRejected)
        );
    }

    let record = runtime.export(&grant.session_id).unwrap();
    assert_eq!(record.state, SessionState::Revoked);
    assert_eq!(record.revocation_reason.as_deref(), Some("replay_violations"));
    assert_eq!(
        runtime.validate(&grant.session_id, &device.next_signal(T0)),
        Verdict::Reject(RejectReason::SessionRevoked)
    );
}

#[test]
fn test_replay_of_older_sequence() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    let old = device.next_signal(T0);
    let newer = device.next_signal(T0);

    assert!(runtime.validate(&grant.session_id, &newer).is_accept());
    // strict mode: anything at or behind the watermark is a replay
    assert_eq!(
        runtime.validate(&grant.session_id, &old),
        Verdict::Reject(RejectReason::ReplayRejected)
    );
}

#[test]
fn test_reorder_tolerance_admits_each_once() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::lenient());
    let signals: Vec<Signal> = (0..4).map(|_| device.next_signal(T0)).collect();

    assert!(runtime.validate(&grant.session_id, &signals[3]).is_accept());
    assert!(runtime.validate(&grant.session_id, &signals[1]).is_accept());
    assert!(runtime.validate(&grant.session_id, &signals[0]).is_accept());
    assert_eq!(
        runtime.validate(&grant.session_id, &signals[1]),
        Verdict::Reject(RejectReason::ReplayRejected)
    );
}

#[test]
fn test_replay_across_sessions() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber768).unwrap();
    let other = runtime.issue("victim", keys.public_key(), &laptop()).unwrap();

    let signal = device.next_signal(T0);
    assert_eq!(
        runtime.validate(&other.session_id, &signal),
        Verdict::Reject(RejectReason::SignatureMismatch)
    );
    assert!(runtime.validate(&grant.session_id, &signal).is_accept());
}

// ----- time manipulation -----

#[test]
fn test_device_clock_far_ahead() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    let future = device.next_signal(T0 + 60 * 60 * 1_000);
    assert_eq!(
        runtime.validate(&grant.session_id, &future),
        Verdict::Reject(RejectReason::EpochOutOfRange)
    );
}

#[test]
fn test_held_back_signal_goes_stale() {
    let (runtime, clock, grant, mut device) = setup(RuntimeConfig::default());
    let held = device.next_signal(T0);

    clock.advance(Duration::from_secs(15));
    assert_eq!(
        runtime.validate(&grant.session_id, &held),
        Verdict::Reject(RejectReason::EpochOutOfRange)
    );
}

#[test]
fn test_forged_timestamp_is_scored() {
    let (runtime, _clock, grant, device) = setup(RuntimeConfig::default());
    // right epoch, but the claimed generation time is a minute off
    let signal = device.signal_at(0, 0, T0 + 60_000);

    let verdict = runtime.validate(&grant.session_id, &signal);
    let acceptance = verdict.acceptance().copied().unwrap();
    assert_eq!(acceptance.anomaly_score, 0.5);
}

#[test]
fn test_server_clock_rollback_is_harmless() {
    let (runtime, clock, grant, mut device) = setup(RuntimeConfig::default());
    clock.advance(Duration::from_secs(30));
    let signal = device.next_signal(runtime.now_ms());
    assert!(runtime.validate(&grant.session_id, &signal).is_accept());

    clock.set(T0 - 60_000);
    let signal = device.next_signal(T0);
    assert_eq!(
        runtime.validate(&grant.session_id, &signal),
        Verdict::Reject(RejectReason::ReplayRejected)
    );
    assert_eq!(runtime.state(&grant.session_id), Some(SessionState::Active));
}

// ----- hardware spoofing -----

#[test]
fn test_grant_on_other_hardware() {
    let clock = ManualClock::new(T0);
    let runtime = SignalRuntime::builder().with_clock(clock).build().unwrap();
    let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber768).unwrap();
    let grant = runtime.issue("victim", keys.public_key(), &laptop()).unwrap();

    let mut clone = laptop();
    clone.set(AttributeKind::BoardSerial, "CLONED-BOARD");
    assert!(matches!(
        DeviceSession::establish(&keys, &grant, &clone),
        Err(Error::Authentication(AuthError::BindingMismatch))
    ));
}

#[test]
fn test_spoofed_observation_revokes() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    let mut spoofed = FingerprintVector::new();
    spoofed.set(AttributeKind::MachineId, "emulator");
    spoofed.set(AttributeKind::OsFamily, "linux");

    let mut verdicts = Vec::new();
    for _ in 0..4 {
        verdicts.push(runtime.validate_observed(&grant.session_id, &device.next_signal(T0), &spoofed));
    }
    assert!(verdicts.contains(&Verdict::Reject(RejectReason::AnomalyThresholdBreached)));
    assert_eq!(verdicts.last(), Some(&Verdict::Reject(RejectReason::SessionRevoked)));
}

#[test]
fn test_refresh_from_foreign_hardware() {
    let (runtime, _clock, grant, _device) = setup(RuntimeConfig::default());
    let foreign = FingerprintVector::from_attributes([
        (AttributeKind::MachineId, "ffff"),
        (AttributeKind::BoardSerial, "X"),
        (AttributeKind::CpuModel, "Y"),
        (AttributeKind::CpuCores, "2"),
        (AttributeKind::TpmEndorsement, "absent"),
        (AttributeKind::OsFamily, "linux"),
    ]);

    // full drift scores 4.0, the second observation crosses 5.0
    runtime.refresh_observed(&grant.session_id, &foreign).unwrap();
    assert!(matches!(
        runtime.refresh_observed(&grant.session_id, &foreign),
        Err(Error::SessionRevoked)
    ));
    assert_eq!(runtime.state(&grant.session_id), Some(SessionState::Revoked));
}

#[test]
fn test_minor_drift_tolerated() -> Result<()> {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    // one low-weight attribute changed, below the drift tolerance
    let mut reconfigured = laptop();
    reconfigured.set(AttributeKind::CpuCores, "10");

    for _ in 0..50 {
        let signal = device.next_signal(T0);
        assert!(runtime.validate_observed(&grant.session_id, &signal, &reconfigured).is_accept());
    }
    runtime.refresh_observed(&grant.session_id, &reconfigured)?;
    Ok(())
}

// ----- forging -----

#[test]
fn test_bit_flipped_digest() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    let genuine = device.next_signal(T0);

    let mut bytes = *genuine.digest.as_bytes();
    bytes[31] ^= 0x01;
    let forged = Signal {
        digest: SignalDigest::from_bytes(bytes),
        ..genuine
    };
    assert_eq!(
        runtime.validate(&grant.session_id, &forged),
        Verdict::Reject(RejectReason::SignatureMismatch)
    );
    assert!(runtime.validate(&grant.session_id, &genuine).is_accept());
}

#[test]
fn test_digest_moved_to_other_coordinates() {
    let (runtime, _clock, grant, mut device) = setup(RuntimeConfig::default());
    let genuine = device.next_signal(T0);

    for (epoch, sequence) in [(0, 1), (1, 0), (0, u64::MAX)] {
        let moved = Signal {
            epoch,
            sequence,
            ..genuine
        };
        assert_eq!(
            runtime.validate(&grant.session_id, &moved),
            Verdict::Reject(RejectReason::SignatureMismatch)
        );
    }
}

#[test]
fn test_brute_force_revokes() {
    let (runtime, _clock, grant, _device) = setup(RuntimeConfig::default());
    let mut verdicts = Vec::new();
    for sequence in 0..8 {
        let guess = Signal {
            epoch: 0,
            sequence,
            digest: SignalDigest::from_bytes(rand::random()),
            issued_at_ms: T0,
        };
        verdicts.push(runtime.validate(&grant.session_id, &guess));
    }

    assert_eq!(
        &verdicts[..4],
        &[Verdict::Reject(RejectReason::SignatureMismatch); 4]
    );
    assert_eq!(verdicts[4], Verdict::Reject(RejectReason::AnomalyThresholdBreached));
    assert!(
        verdicts[5..]
            .iter()
            .all(|v| *v == Verdict::Reject(RejectReason::SessionRevoked))
    );
}

#[test]
fn test_tampered_binding_record() {
    let clock = ManualClock::new(T0);
    let runtime = SignalRuntime::builder().with_clock(clock).build().unwrap();
    let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber768).unwrap();
    let mut grant = runtime.issue("victim", keys.public_key(), &laptop()).unwrap();

    grant.binding.window.not_after_ms += 365 * 24 * 60 * 60 * 1_000;
    assert!(matches!(
        DeviceSession::establish(&keys, &grant, &laptop()),
        Err(Error::Authentication(AuthError::SignatureVerificationFailed))
    ));
}

// ----- state corruption -----

fn hammer_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.replay_tolerance_count = 64;
    config.max_replay_violations = u32::MAX;
    config.anomaly.threshold = 1e9;
    config.anomaly.ceiling = 1e9;
    config.anomaly.burst_limit = u32::MAX;
    config
}

#[test]
fn test_refresh_mid_validation_retires_old_key() {
    let (runtime, _clock, grant, mut device) = setup(hammer_config());
    let signals: Vec<Signal> = (0..2_000).map(|_| device.next_signal(T0)).collect();
    let refreshed = Arc::new(AtomicBool::new(false));

    let worker = {
        let runtime = runtime.clone();
        let refreshed = Arc::clone(&refreshed);
        let id = grant.session_id;
        thread::spawn(move || {
            let mut accepted = 0u64;
            let mut stale_accepts = 0u64;
            for signal in &signals {
                let after_refresh = refreshed.load(Ordering::SeqCst);
                if runtime.validate(&id, signal).is_accept() {
                    accepted += 1;
                    if after_refresh {
                        stale_accepts += 1;
                    }
                }
            }
            (accepted, stale_accepts)
        })
    };

    thread::sleep(Duration::from_millis(1));
    let refresh = runtime.refresh(&grant.session_id).unwrap();
    refreshed.store(true, Ordering::SeqCst);

    let (accepted, stale_accepts) = worker.join().unwrap();
    assert_eq!(stale_accepts, 0);

    let record = runtime.export(&grant.session_id).unwrap();
    assert_eq!(record.state, SessionState::Active);
    assert_eq!(record.generation, 1);
    assert_eq!(record.accepted_signals, accepted);
    assert_eq!(runtime.stats().accepted, accepted);

    device.apply_refresh(&refresh).unwrap();
    assert!(runtime.validate(&grant.session_id, &device.next_signal(T0)).is_accept());
}

#[test]
fn test_revoke_races_refresh() {
    let (runtime, _clock, grant, _device) = setup(hammer_config());
    let revoked = Arc::new(AtomicBool::new(false));

    let refreshers: Vec<_> = (0..4)
        .map(|_| {
            let runtime = runtime.clone();
            let revoked = Arc::clone(&revoked);
            let id = grant.session_id;
            thread::spawn(move || {
                let mut late_refreshes = 0;
                for _ in 0..200 {
                    let after_revoke = revoked.load(Ordering::SeqCst);
                    match runtime.refresh(&id) {
                        Ok(_) if after_revoke => late_refreshes += 1,
                        Ok(_) => {}
                        Err(Error::SessionRevoked) => {}
                        Err(e) => panic!("unexpected refresh error: {}", e),
                    }
                }
                late_refreshes
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(1));
    assert!(runtime.revoke(&grant.session_id, RevocationReason::Compromised).unwrap());
    revoked.store(true, Ordering::SeqCst);

    let late: i32 = refreshers.into_iter().map(|r| r.join().unwrap()).sum();
    assert_eq!(late, 0);

    // the tombstone stays revoked whatever is tried next
    assert!(!runtime.revoke(&grant.session_id, RevocationReason::Logout).unwrap());
    assert!(matches!(runtime.refresh(&grant.session_id), Err(Error::SessionRevoked)));
    let record = runtime.export(&grant.session_id).unwrap();
    assert_eq!(record.state, SessionState::Revoked);
    assert_eq!(record.revocation_reason.as_deref(), Some("compromised"));
    assert_eq!(runtime.stats().revoked, 1);
}
