use super::*;

#[test]
fn fake_clock_advances_epoch_and_instant() {
    let clock = FakeClock::new();
    let before = clock.now();
    let before_ms = clock.epoch_ms();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.now() - before, Duration::from_secs(5));
    assert_eq!(clock.epoch_ms() - before_ms, 5_000);
}

#[test]
fn fake_clock_set_epoch_ms_is_absolute() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn system_clock_epoch_ms_is_plausible() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 1_700_000_000_000);
}
