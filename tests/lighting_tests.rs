//! Integration tests for the servo light switches

use wallpanel::hal::MockServo;
use wallpanel::{ActuatorTiming, LightActuator, LightChange, LightId, LightPair, ServoAngles};

const KITCHEN: ServoAngles = ServoAngles::new(120, 90, 60);
const LOUNGE: ServoAngles = ServoAngles::new(115, 90, 65);

fn pair() -> LightPair<MockServo> {
    let timing = ActuatorTiming::default();
    LightPair::new(
        LightActuator::new(MockServo::new(), KITCHEN, timing),
        LightActuator::new(MockServo::new(), LOUNGE, timing),
    )
}

/// Refresh every 10 ms over `[from, to]`, collecting `(time, change)`.
fn run(lights: &mut LightPair<MockServo>, from: u32, to: u32) -> Vec<(u32, LightChange)> {
    let mut log = Vec::new();
    for t in (from..=to).step_by(10) {
        for change in lights.refresh(t).unwrap() {
            log.push((t, change));
        }
    }
    log
}

#[test]
fn init_parks_both_servos_at_idle() {
    let mut lights = pair();
    lights.init(0).unwrap();

    for id in LightId::ALL {
        assert_eq!(lights.light(id).angle(), Some(90));
        assert!(!lights.get(id));
    }
    assert!(lights.is_busy(0));
    assert!(!lights.is_busy(500));
}

#[test]
fn requests_wait_for_power_up_window() {
    let mut lights = pair();
    lights.init(0).unwrap();
    lights.request(LightId::Lounge, true);

    let log = run(&mut lights, 10, 600);
    assert_eq!(
        log,
        vec![(500, LightChange { light: LightId::Lounge, on: true })]
    );
}

#[test]
fn both_requests_are_serialised_kitchen_first() {
    let mut lights = pair();
    lights.init(0).unwrap();
    lights.request(LightId::Lounge, true);
    lights.request(LightId::Kitchen, true);

    let log = run(&mut lights, 0, 2000);
    assert_eq!(
        log,
        vec![
            (500, LightChange { light: LightId::Kitchen, on: true }),
            (1000, LightChange { light: LightId::Lounge, on: true }),
        ]
    );
}

#[test]
fn servos_never_swing_together() {
    let mut lights = pair();
    lights.init(0).unwrap();
    lights.request_toggle();

    for t in (0..=2000).step_by(10) {
        lights.refresh(t).unwrap();
        let kitchen_swinging = matches!(lights.light(LightId::Kitchen).angle(), Some(a) if a != 90);
        let lounge_swinging = matches!(lights.light(LightId::Lounge).angle(), Some(a) if a != 90);
        assert!(!(kitchen_swinging && lounge_swinging), "both moving at {} ms", t);
    }
    assert!(lights.get(LightId::Kitchen));
    assert!(lights.get(LightId::Lounge));
}

#[test]
fn full_servo_timeline() {
    let mut lights = pair();
    lights.init(0).unwrap();
    lights.request(LightId::Kitchen, true);
    run(&mut lights, 0, 1500);

    // idle, on, back to idle, then detached
    let kitchen = lights.light(LightId::Kitchen).servo();
    assert_eq!(kitchen.history, vec![90, 60, 90]);
    assert!(!kitchen.attached);
    assert_eq!(kitchen.detaches, 2);

    lights.request(LightId::Kitchen, false);
    run(&mut lights, 1510, 2500);
    let kitchen = lights.light(LightId::Kitchen).servo();
    assert_eq!(kitchen.history, vec![90, 60, 90, 120, 90]);
    assert!(!lights.get(LightId::Kitchen));
}

#[test]
fn toggle_off_when_both_on() {
    let mut lights = pair();
    lights.init(0).unwrap();
    lights.request_toggle();
    run(&mut lights, 0, 1500);
    assert!(lights.get(LightId::Kitchen) && lights.get(LightId::Lounge));

    lights.request_toggle();
    let log = run(&mut lights, 1510, 3000);
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|(_, c)| !c.on));
}

#[test]
fn servo_failure_propagates() {
    let timing = ActuatorTiming::default();
    let mut lights = LightPair::new(
        LightActuator::new(MockServo::failing(), KITCHEN, timing),
        LightActuator::new(MockServo::new(), LOUNGE, timing),
    );
    assert!(lights.init(0).is_err());

    lights.request(LightId::Kitchen, true);
    assert!(lights.refresh(1000).is_err());
    assert_eq!(lights.pending(LightId::Kitchen), Some(true));
}

#[test]
fn custom_timing_shortens_busy_window() {
    let timing = ActuatorTiming::new(100, 50);
    let mut lights = LightPair::new(
        LightActuator::new(MockServo::new(), KITCHEN, timing),
        LightActuator::new(MockServo::new(), LOUNGE, timing),
    );
    lights.request(LightId::Kitchen, true);
    lights.request(LightId::Lounge, false);

    let log = run(&mut lights, 0, 300);
    assert_eq!(log[0].0, 0);
    assert_eq!(log[1].0, 150);
}
