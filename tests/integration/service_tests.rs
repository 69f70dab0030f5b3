//! Integration tests for the PowerService → FaultSupervisor → switch
//! pipeline, including configuration arriving over the pack transport.

use lumen::app::commands::{CONFIG_PATH, OUTPUT_PATH, install_default_handlers};
use lumen::app::events::AppEvent;
use lumen::app::ports::ClockPort;
use lumen::app::runner::{StopToken, run_supervisor};
use lumen::app::service::PowerService;
use lumen::config::{
    IDLE_TIMEOUT_MS, PowerConfig, RECOVERY_DELAY_MS, SharedConfig, TICK_PERIOD_MS,
};
use lumen::error::SensorError;
use lumen::pack::PackReceiver;
use lumen::supervisor::{FaultMonitor, Measurement};

use crate::mock_hw::{
    ManualClock, MockPower, NOMINAL, OVERCURRENT, OVERVOLTAGE, RecordingSink, pack,
};

fn shared(cfg: PowerConfig) -> &'static SharedConfig {
    Box::leak(Box::new(SharedConfig::new(cfg)))
}

fn monitor() -> &'static FaultMonitor {
    Box::leak(Box::new(FaultMonitor::new()))
}

fn make_service(cfg: PowerConfig) -> (PowerService<'static>, &'static SharedConfig, MockPower, RecordingSink) {
    let config = shared(cfg);
    (
        PowerService::new(config, monitor()),
        config,
        MockPower::new(),
        RecordingSink::new(),
    )
}

// ── Boot & edge-triggered writes ──────────────────────────────

#[test]
fn first_tick_turns_output_on_once() {
    let (mut svc, _, mut hw, mut sink) = make_service(PowerConfig::default());

    for i in 0..20 {
        svc.tick(&mut hw, i * TICK_PERIOD_MS, &mut sink);
    }

    assert_eq!(hw.writes, vec![true]);
    assert!(svc.output_on());
    assert_eq!(sink.events, vec![AppEvent::OutputChanged { on: true }]);
}

// ── Latch & recovery ──────────────────────────────────────────

#[test]
fn overcurrent_latches_and_recovers_at_delay_boundary() {
    let config = shared(PowerConfig {
        overcurrent_threshold_ma: 500,
        ..PowerConfig::default()
    });
    let mon = monitor();
    let mut svc = PowerService::new(config, mon);
    let mut hw = MockPower::new();
    let mut sink = RecordingSink::new();

    hw.measurement = Measurement {
        current_ma: 600.0,
        ..NOMINAL
    };
    svc.tick(&mut hw, 0, &mut sink);
    assert!(!hw.output_on());
    assert!(svc.is_latched());
    assert!(mon.has_fault() && mon.has_overcurrent() && !mon.has_overvoltage());

    hw.measurement = Measurement {
        current_ma: 100.0,
        ..NOMINAL
    };
    for t in (100..RECOVERY_DELAY_MS).step_by(TICK_PERIOD_MS as usize) {
        svc.tick(&mut hw, t, &mut sink);
        assert!(!hw.output_on(), "t={t}");
        assert!(mon.has_fault(), "t={t}");
        assert!(!mon.has_overcurrent(), "t={t}");
    }

    svc.tick(&mut hw, RECOVERY_DELAY_MS, &mut sink);
    assert!(hw.output_on());
    assert!(!svc.is_latched());
    assert!(!mon.has_fault() && !mon.has_overcurrent());
    assert_eq!(hw.writes, vec![true]);

    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::FaultLatched {
                overcurrent: true,
                overvoltage: false
            }
        )),
        1
    );
    assert_eq!(sink.count(|e| *e == AppEvent::FaultRecovered), 1);
}

#[test]
fn persistent_fault_holds_output_off() {
    let (mut svc, _, mut hw, mut sink) = make_service(PowerConfig::default());
    hw.measurement = OVERVOLTAGE;

    for i in 0..200 {
        svc.tick(&mut hw, i * TICK_PERIOD_MS, &mut sink);
    }

    assert!(hw.writes.is_empty(), "output never turned on");
    assert!(svc.is_latched());
}

#[test]
fn without_auto_recovery_latch_is_sticky() {
    let cfg = PowerConfig {
        auto_recovery_enabled: false,
        ..PowerConfig::default()
    };
    let (mut svc, _, mut hw, mut sink) = make_service(cfg);
    svc.tick(&mut hw, 0, &mut sink);

    hw.measurement = OVERCURRENT;
    svc.tick(&mut hw, 50, &mut sink);
    hw.measurement = NOMINAL;
    for t in (100..60_000).step_by(500) {
        svc.tick(&mut hw, t, &mut sink);
    }

    assert_eq!(hw.writes, vec![true, false]);
    assert!(svc.is_latched());
}

#[test]
fn flapping_fault_keeps_original_onset() {
    let (mut svc, _, mut hw, mut sink) = make_service(PowerConfig::default());
    hw.measurement = OVERCURRENT;
    svc.tick(&mut hw, 0, &mut sink);

    hw.measurement = NOMINAL;
    svc.tick(&mut hw, 1_000, &mut sink);
    hw.measurement = OVERCURRENT;
    svc.tick(&mut hw, 2_000, &mut sink);
    hw.measurement = NOMINAL;
    svc.tick(&mut hw, 2_500, &mut sink);
    assert!(!hw.output_on());

    svc.tick(&mut hw, RECOVERY_DELAY_MS, &mut sink);
    assert!(hw.output_on());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FaultLatched { .. })), 1);
}

#[test]
fn disabled_alerts_ignore_both_conditions() {
    let cfg = PowerConfig {
        overcurrent_alert_enabled: false,
        overvoltage_alert_enabled: false,
        ..PowerConfig::default()
    };
    let (mut svc, _, mut hw, mut sink) = make_service(cfg);
    hw.measurement = Measurement {
        current_ma: 10_000.0,
        voltage_mv: 20_000.0,
    };
    svc.tick(&mut hw, 0, &mut sink);
    assert!(hw.output_on());
    assert!(!svc.is_latched());
}

// ── Override ──────────────────────────────────────────────────

#[test]
fn override_wins_over_everything_and_clears_flags() {
    let config = shared(PowerConfig::default());
    let mon = monitor();
    let mut svc = PowerService::new(config, mon);
    let mut hw = MockPower::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, 0, &mut sink);
    hw.measurement = OVERCURRENT;
    svc.tick(&mut hw, 50, &mut sink);
    assert!(mon.has_overcurrent() && mon.has_fault());

    config.update(|c| c.force_output_off = true);
    let reads = hw.reads;
    svc.tick(&mut hw, 100, &mut sink);
    assert_eq!(hw.reads, reads, "no measurement while overridden");
    assert!(!mon.has_overcurrent() && !mon.has_overvoltage() && !mon.has_fault());
    assert!(svc.is_latched(), "override leaves the latch alone");

    // Released after the delay with the fault gone: the latch resumes and
    // recovers on the same tick.
    hw.measurement = NOMINAL;
    config.update(|c| c.force_output_off = false);
    svc.tick(&mut hw, 50 + RECOVERY_DELAY_MS, &mut sink);
    assert!(hw.output_on());

    assert_eq!(sink.count(|e| *e == AppEvent::OverrideEngaged), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::OverrideReleased), 1);
}

#[test]
fn override_turns_healthy_output_off() {
    let (mut svc, config, mut hw, mut sink) = make_service(PowerConfig::default());
    svc.tick(&mut hw, 0, &mut sink);
    config.update(|c| c.force_output_off = true);
    svc.tick(&mut hw, 50, &mut sink);
    svc.tick(&mut hw, 100, &mut sink);
    assert_eq!(hw.writes, vec![true, false]);
    assert!(!svc.is_latched());
}

// ── Port failures ─────────────────────────────────────────────

#[test]
fn measurement_failure_is_reported_once_and_evaluates_zero() {
    let (mut svc, _, mut hw, mut sink) = make_service(PowerConfig::default());
    hw.fail_reads = true;
    for i in 0..5 {
        svc.tick(&mut hw, i * TICK_PERIOD_MS, &mut sink);
    }
    assert!(hw.output_on());
    assert_eq!(
        sink.count(|e| *e == AppEvent::MeasurementFailed(SensorError::BusError)),
        1
    );

    hw.fail_reads = false;
    svc.tick(&mut hw, 500, &mut sink);
    svc.tick(&mut hw, 550, &mut sink);
    assert_eq!(sink.count(|e| *e == AppEvent::MeasurementRestored), 1);
}

#[test]
fn failed_switch_write_is_retried() {
    let (mut svc, _, mut hw, mut sink) = make_service(PowerConfig::default());
    hw.failing_writes = 2;

    svc.tick(&mut hw, 0, &mut sink);
    svc.tick(&mut hw, 50, &mut sink);
    assert!(!svc.output_on());
    assert!(hw.writes.is_empty());

    svc.tick(&mut hw, 100, &mut sink);
    assert!(svc.output_on());
    assert_eq!(hw.writes, vec![true]);
}

// ── Config over the wire ──────────────────────────────────────

#[test]
fn config_pack_changes_threshold_for_next_tick() {
    let config = shared(PowerConfig::default());
    let mut svc = PowerService::new(config, monitor());
    let mut hw = MockPower::new();
    let mut sink = RecordingSink::new();

    let mut rx: PackReceiver = PackReceiver::new();
    install_default_handlers(rx.registry_mut(), config).unwrap();

    svc.tick(&mut hw, 0, &mut sink);
    assert!(hw.output_on());

    let lowered = PowerConfig {
        overcurrent_threshold_ma: 200,
        ..PowerConfig::default()
    };
    let body = postcard::to_allocvec(&lowered).unwrap();
    rx.feed(&pack(CONFIG_PATH, &body), 10, &mut sink);
    assert_eq!(config.snapshot(), lowered);

    svc.tick(&mut hw, 50, &mut sink);
    assert!(!hw.output_on(), "250 mA now exceeds the 200 mA threshold");
}

#[test]
fn output_pack_engages_and_releases_override() {
    let config = shared(PowerConfig::default());
    let mut svc = PowerService::new(config, monitor());
    let mut hw = MockPower::new();
    let mut sink = RecordingSink::new();
    let mut rx: PackReceiver = PackReceiver::new();
    install_default_handlers(rx.registry_mut(), config).unwrap();

    svc.tick(&mut hw, 0, &mut sink);
    rx.feed(&pack(OUTPUT_PATH, &[0]), 10, &mut sink);
    svc.tick(&mut hw, 50, &mut sink);
    assert!(!hw.output_on());

    rx.feed(&pack(OUTPUT_PATH, &[1]), 60, &mut sink);
    svc.tick(&mut hw, 100, &mut sink);
    assert!(hw.output_on());
    assert_eq!(hw.writes, vec![true, false, true]);
}

#[test]
fn stalled_command_packs_do_not_poison_the_next_one() {
    let config = shared(PowerConfig::default());
    let mut rx: PackReceiver = PackReceiver::new();
    install_default_handlers(rx.registry_mut(), config).unwrap();
    let mut sink = RecordingSink::new();

    // Oversized config: the first 2048-byte chunk overflows the staging
    // buffer, then the sender goes quiet.
    let oversized = pack(CONFIG_PATH, &[0xEE; 3_000]);
    rx.feed(&oversized[..2_100], 0, &mut sink);
    assert!(rx.poll_idle(IDLE_TIMEOUT_MS + 1, &mut sink));

    let update = PowerConfig {
        overcurrent_threshold_ma: 700,
        ..PowerConfig::default()
    };
    let body = postcard::to_allocvec(&update).unwrap();
    rx.feed(&pack(CONFIG_PATH, &body), IDLE_TIMEOUT_MS + 10, &mut sink);
    assert_eq!(config.snapshot().overcurrent_threshold_ma, 700);

    // Same for `output`: a stalled multi-byte pack, then a valid one.
    let stalled = pack(OUTPUT_PATH, &[0; 4_000]);
    rx.feed(&stalled[..2_100], 20_000, &mut sink);
    assert!(rx.poll_idle(20_001 + IDLE_TIMEOUT_MS, &mut sink));
    rx.feed(&pack(OUTPUT_PATH, &[0]), 30_000, &mut sink);
    assert!(config.snapshot().force_output_off);

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::PackTimedOut { .. })),
        2
    );
}

// ── Supervisor loop ───────────────────────────────────────────

#[test]
fn supervisor_loop_ticks_on_schedule() {
    let config = shared(PowerConfig::default());
    let mut svc = PowerService::new(config, monitor());
    let stop = StopToken::new();
    let mut hw = MockPower::new();
    hw.script = [NOMINAL, OVERCURRENT].into_iter().collect();
    hw.stop_after = Some((80, stop.clone()));
    let clock = ManualClock::new(1_000);
    let mut sink = RecordingSink::new();

    run_supervisor(&mut svc, &mut hw, &clock, &stop, &mut sink);

    assert_eq!(svc.tick_count(), 80);
    assert_eq!(clock.now_ms(), 1_000 + 80 * TICK_PERIOD_MS);
    // on at tick 1, latched at tick 2, recovered RECOVERY_DELAY_MS later
    assert_eq!(hw.writes, vec![true, false, true]);
    assert_eq!(sink.events[0], AppEvent::Started("efuse"));
}
