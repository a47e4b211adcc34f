use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use vizij_ease_core::{
    target, Animatable, AnimationFrames, ClockSource, Destination, Ease, EaseConfig, EaseError,
    EaseOptions, EntryEventKind, EntryState, GoalSpec, ManagerEventKind, Observable, PropertyMap,
    PursuitOptions, SharedTicker, Target,
};

fn manual_ease() -> Ease {
    Ease::new(
        EaseConfig::default()
            .without_clock_source()
            .with_max_frame(f64::INFINITY),
    )
    .unwrap()
}

fn linear(duration: f64) -> EaseOptions {
    EaseOptions::default()
        .with_duration(duration)
        .with_curve("linear")
}

fn point(x: f64, y: f64) -> Rc<RefCell<PropertyMap>> {
    PropertyMap::new().with("x", x).with("y", y).shared()
}

/// it should start with the documented defaults
#[test]
fn default_options() {
    let ease = Ease::default();
    assert_eq!(ease.duration(), 1000.0);
    assert_eq!(ease.curve().name(), Some("easeInOutSine"));
    assert_eq!(ease.max_frame(), 1000.0 / 60.0);
    assert!(ease.config().use_clock_source);
    assert!(!ease.is_ticking());
    ease.destroy();
}

/// it should reject invalid manager configuration
#[test]
fn invalid_config() {
    let err = Ease::new(EaseConfig::default().with_max_frame(-1.0)).unwrap_err();
    assert!(matches!(err, EaseError::InvalidConfig { .. }));
}

/// it should count entries and clear them with remove_all
#[test]
fn count_and_remove_all() {
    let ease = manual_ease();
    let object = PropertyMap::new()
        .with("x", 0.0)
        .with("y", 0.0)
        .with("rotation", 0.0)
        .shared();
    let a = ease.add(&object, &GoalSpec::new().number("x", 10.0), &EaseOptions::default()).unwrap();
    ease.add(&object, &GoalSpec::new().number("y", 10.0), &EaseOptions::default()).unwrap();
    ease.add(&object, &GoalSpec::new().number("rotation", PI), &EaseOptions::default()).unwrap();
    assert_eq!(ease.count(), 3);

    let removed = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(0));
    let r = removed.clone();
    a.on(EntryEventKind::Remove, move |_| r.set(r.get() + 1));
    let c = completed.clone();
    a.on(EntryEventKind::Complete, move |_| c.set(c.get() + 1));

    ease.remove_all();
    assert_eq!(ease.count(), 0);
    assert_eq!(removed.get(), 1);
    assert_eq!(completed.get(), 0);
    assert_eq!(a.state(), Some(EntryState::Removed));
}

/// it should exclude waiting entries from count_running
#[test]
fn count_running_excludes_waiting() {
    let ease = manual_ease();
    let object = point(0.0, 0.0);
    ease.add(&object, &GoalSpec::new().number("x", 1.0), &linear(100.0)).unwrap();
    ease.add(&object, &GoalSpec::new().number("y", 1.0), &linear(100.0).with_wait(50.0)).unwrap();
    assert_eq!(ease.count(), 2);
    assert_eq!(ease.count_running(), 1);
    ease.update(60.0).unwrap();
    assert_eq!(ease.count_running(), 2);
}

/// it should animate several objects from one add, each from its own start
#[test]
fn multiple_objects() {
    let ease = manual_ease();
    let a = point(0.0, 0.0);
    let b = point(10.0, 10.0);
    let targets: Vec<Target> = vec![a.clone(), b.clone()];
    let easing = ease
        .add(&targets, &GoalSpec::new().position(20.0, 30.0), &linear(1000.0))
        .unwrap();
    assert_eq!(easing.ids().len(), 2);
    assert_eq!(easing.count(), 4);

    let completes = Rc::new(Cell::new(0));
    let c = completes.clone();
    easing.on(EntryEventKind::Complete, move |_| c.set(c.get() + 1));

    ease.update(250.0).unwrap();
    assert_eq!(easing.elapsed(), Some(250.0));
    assert_abs_diff_eq!(a.borrow().value("x").unwrap(), 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(a.borrow().value("y").unwrap(), 7.5, epsilon = 1e-9);
    assert_abs_diff_eq!(b.borrow().value("x").unwrap(), 12.5, epsilon = 1e-9);
    assert_abs_diff_eq!(b.borrow().value("y").unwrap(), 15.0, epsilon = 1e-9);

    ease.update(750.0).unwrap();
    assert_eq!(completes.get(), 2);
    assert!(easing.is_finished());
}

/// it should do nothing for an empty target set
#[test]
fn empty_targets_are_a_no_op() {
    let ease = manual_ease();
    let none: Vec<Target> = Vec::new();
    let easing = ease.add(none, &GoalSpec::new().number("x", 1.0), &EaseOptions::default()).unwrap();
    assert!(easing.is_empty());
    assert_eq!(easing.count(), 0);
    assert_eq!(ease.count(), 0);
}

/// it should remove a field from every entry when no target is given
#[test]
fn remove_ease_without_target() {
    let ease = manual_ease();
    let a = point(0.0, 0.0);
    let b = point(10.0, 10.0);
    let e1 = ease.add(&a, &GoalSpec::new().number("x", 20.0).number("y", 20.0), &linear(100.0)).unwrap();
    let e2 = ease.add(&b, &GoalSpec::new().number("x", 20.0).number("y", 20.0), &linear(100.0)).unwrap();
    ease.remove_ease(None, ["x"]);
    assert_eq!(e1.count(), 1);
    assert_eq!(e2.count(), 1);

    ease.update(50.0).unwrap();
    assert_eq!(a.borrow().value("x"), Some(0.0));
    assert_abs_diff_eq!(a.borrow().value("y").unwrap(), 10.0, epsilon = 1e-9);
}

/// it should remove every entry of one object when no fields are given
#[test]
fn remove_ease_whole_object() {
    let ease = manual_ease();
    let a = point(0.0, 0.0);
    let b = point(0.0, 0.0);
    let (ha, hb): (Target, Target) = (a.clone(), b.clone());
    ease.add(&a, &GoalSpec::new().number("x", 5.0), &EaseOptions::default()).unwrap();
    ease.add(&a, &GoalSpec::new().number("y", 5.0), &EaseOptions::default()).unwrap();
    ease.add(&b, &GoalSpec::new().number("y", 5.0), &EaseOptions::default()).unwrap();
    ease.remove_ease(Some(&ha), vizij_ease_core::FieldFilter::All);
    assert_eq!(ease.count(), 1);
    ease.remove_ease(Some(&hb), vizij_ease_core::FieldFilter::All);
    assert_eq!(ease.count(), 0);
}

/// it should remove a composite field by alias or by accessor path
#[test]
fn remove_by_alias_or_path() {
    let ease = manual_ease();
    let object = PropertyMap::new().with("scale.x", 1.0).with("scale.y", 1.0).shared();
    let handle: Target = object.clone();
    let easing = ease.add(&object, &GoalSpec::new().number("scale", 2.0), &linear(100.0)).unwrap();
    ease.remove_ease(Some(&handle), "scale.y");
    assert_eq!(easing.paths(), vec!["scale.x".to_string()]);
    ease.remove_ease(Some(&handle), "scale");
    assert!(easing.is_finished());
}

/// it should drop entries whose target was destroyed, emitting remove only
#[test]
fn destroyed_target() {
    let ease = manual_ease();
    let object = PropertyMap::new().with("x", 0.0).shared();
    let easing = ease.add(&object, &GoalSpec::new().number("x", 10.0), &linear(1000.0)).unwrap();
    let kinds = Rc::new(RefCell::new(Vec::new()));
    for kind in [EntryEventKind::Remove, EntryEventKind::Complete] {
        let k = kinds.clone();
        easing.on(kind, move |event| k.borrow_mut().push(event.kind));
    }

    ease.update(16.0).unwrap();
    object.borrow_mut().destroy();
    ease.update(16.0).unwrap();
    assert_eq!(ease.count_running(), 0);
    assert_eq!(*kinds.borrow(), vec![EntryEventKind::Remove]);
}

/// it should drop entries whose target was dropped by its owner
#[test]
fn dropped_target() {
    let ease = manual_ease();
    let object: Target = target(PropertyMap::new().with("x", 0.0));
    ease.add(&object, &GoalSpec::new().number("x", 10.0), &linear(1000.0)).unwrap();
    drop(object);
    ease.update(16.0).unwrap();
    assert_eq!(ease.count(), 0);
}

/// it should interpolate a timed face goal toward the live heading
#[test]
fn face_goal_via_add() {
    let ease = Ease::new(
        EaseConfig::default()
            .without_clock_source()
            .with_max_frame(f64::INFINITY)
            .with_curve("linear"),
    )
    .unwrap();
    let object = PropertyMap::new().with("x", 0.0).with("y", 0.0).with("rotation", 0.0).shared();
    let other = point(20.0, 20.0);
    let other_handle: Target = other.clone();
    let easing = ease
        .add(&object, &GoalSpec::new().face(&other_handle), &EaseOptions::default())
        .unwrap();
    let heading = PI / 4.0;
    for step in 1..=4 {
        ease.update(250.0).unwrap();
        let p = step as f64 * 0.25;
        assert_abs_diff_eq!(object.borrow().value("rotation").unwrap(), heading * p, epsilon = 1e-9);
    }
    assert!(easing.is_finished());
}

/// it should move toward a destination at the given speed
#[test]
fn target_moves_at_speed() {
    let ease = Ease::new(EaseConfig::default().without_clock_source()).unwrap();
    let object = point(0.0, 0.0);
    let handle: Target = object.clone();
    let goal = point(100.0, 100.0);
    let goal_handle: Target = goal.clone();
    let easing = ease
        .target(&handle, &goal_handle, 1.0, &PursuitOptions::default())
        .unwrap();
    assert_eq!(easing.duration(), None);

    let frame = 1000.0 / 60.0;
    ease.update(frame).unwrap();
    let step = frame / 2f64.sqrt();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), step, epsilon = 1e-9);
    assert_abs_diff_eq!(object.borrow().value("y").unwrap(), step, epsilon = 1e-9);

    // The destination is followed live.
    goal.borrow_mut().set("y", 0.0);
    ease.update(frame).unwrap();
    assert!(object.borrow().value("y").unwrap() < step);

    // Keep-alive entries never complete on their own.
    for _ in 0..1000 {
        ease.update(frame).unwrap();
    }
    assert_eq!(object.borrow().value("x"), Some(100.0));
    assert_eq!(object.borrow().value("y"), Some(0.0));
    assert!(!easing.is_finished());
    easing.cancel();
    assert_eq!(ease.count(), 0);
}

/// it should complete a pursuit on arrival when keep_alive is off
#[test]
fn target_completes_on_arrival() {
    let ease = manual_ease();
    let object = point(0.0, 0.0);
    let handle: Target = object.clone();
    let options = PursuitOptions {
        keep_alive: false,
        ..PursuitOptions::default()
    };
    let easing = ease.target(&handle, Destination::point(3.0, 4.0), 0.01, &options).unwrap();
    let completes = Rc::new(Cell::new(0));
    let c = completes.clone();
    easing.on(EntryEventKind::Complete, move |_| c.set(c.get() + 1));

    ease.update(250.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(object.borrow().value("y").unwrap(), 2.0, epsilon = 1e-9);
    ease.update(250.0).unwrap();
    ease.update(250.0).unwrap();
    assert_eq!(completes.get(), 1);
    assert_eq!(object.borrow().value("x"), Some(3.0));
    assert_eq!(object.borrow().value("y"), Some(4.0));
}

/// it should turn toward a destination at a bounded rate
#[test]
fn face_turns_at_rate() {
    let ease = Ease::new(EaseConfig::default().without_clock_source()).unwrap();
    let object = PropertyMap::new().with("x", 0.0).with("y", 0.0).with("rotation", 0.0).shared();
    let handle: Target = object.clone();
    ease.face(&handle, (100.0, 100.0), 0.01, &PursuitOptions::default()).unwrap();

    let seen = Rc::new(Cell::new(f64::NAN));
    let (s, o) = (seen.clone(), object.clone());
    ease.once(ManagerEventKind::Each, move |_| {
        s.set(o.borrow().value("rotation").unwrap())
    });
    ease.update(1000.0 / 60.0).unwrap();
    assert_abs_diff_eq!(seen.get(), 0.01 * 1000.0 / 60.0, epsilon = 1e-9);

    for _ in 0..100 {
        ease.update(1000.0 / 60.0).unwrap();
    }
    assert_abs_diff_eq!(object.borrow().value("rotation").unwrap(), PI / 4.0, epsilon = 1e-9);
    assert_eq!(ease.count(), 1);
}

/// it should turn through the shortest arc
#[test]
fn face_takes_shortest_arc() {
    let ease = manual_ease();
    let object = PropertyMap::new()
        .with("x", 0.0)
        .with("y", 0.0)
        .with("rotation", PI - 0.1)
        .shared();
    let handle: Target = object.clone();
    ease.face(&handle, (-10.0, -0.5), 0.001, &PursuitOptions::default()).unwrap();
    ease.update(10.0).unwrap();
    // Heading is just past -PI; turning positive crosses the seam.
    assert!(object.borrow().value("rotation").unwrap() > PI - 0.1);
}

/// it should apply manager defaults only to entries created afterwards
#[test]
fn defaults_not_retroactive() {
    let ease = manual_ease();
    ease.set_curve("linear");
    ease.set_duration(500.0);
    let object = point(0.0, 0.0);
    let first = ease.add(&object, &GoalSpec::new().number("x", 10.0), &EaseOptions::default()).unwrap();
    ease.set_duration(5000.0);
    ease.set_curve("easeInQuad");
    let second = ease.add(&object, &GoalSpec::new().number("y", 10.0), &EaseOptions::default()).unwrap();
    assert_eq!(first.duration(), Some(500.0));
    assert_eq!(second.duration(), Some(5000.0));

    ease.update(250.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 5.0, epsilon = 1e-9);
    let p: f64 = 250.0 / 5000.0;
    assert_abs_diff_eq!(object.borrow().value("y").unwrap(), 10.0 * p * p, epsilon = 1e-9);
}

/// it should fall back to linear for unknown curve names and accept custom curves
#[test]
fn curves_by_name() {
    let ease = manual_ease();
    let object = point(0.0, 0.0);
    ease.add(
        &object,
        &GoalSpec::new().number("x", 10.0),
        &EaseOptions::default().with_duration(100.0).with_curve("easeSideways"),
    )
    .unwrap();
    ease.register_curve("halfway", |_| 0.5);
    assert!(ease.curve_names().contains(&"halfway".to_string()));
    ease.add(
        &object,
        &GoalSpec::new().number("y", 10.0),
        &EaseOptions::default().with_duration(100.0).with_curve("halfway"),
    )
    .unwrap();
    ease.update(25.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 2.5, epsilon = 1e-9);
    assert_abs_diff_eq!(object.borrow().value("y").unwrap(), 5.0, epsilon = 1e-9);
}

/// it should clamp tick deltas to max_frame
#[test]
fn deltas_are_clamped() {
    let ease = Ease::new(
        EaseConfig::default()
            .without_clock_source()
            .with_max_frame(20.0)
            .with_curve("linear"),
    )
    .unwrap();
    let object = point(0.0, 0.0);
    ease.add(&object, &GoalSpec::new().number("x", 100.0), &linear(100.0)).unwrap();
    ease.update(5000.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 20.0, epsilon = 1e-9);
    ease.update(-40.0).unwrap();
    ease.update(f64::NAN).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 20.0, epsilon = 1e-9);
    ease.set_max_frame(0.0);
    assert_eq!(ease.max_frame(), 20.0);
}

/// it should let listeners add and remove entries during a tick
#[test]
fn reentrant_mutation_from_listeners() {
    let ease = manual_ease();
    let a = point(0.0, 0.0);
    let b = point(0.0, 0.0);
    let hb: Target = b.clone();

    let first = ease.add(&a, &GoalSpec::new().number("x", 10.0), &linear(100.0)).unwrap();
    let second = ease.add(&b, &GoalSpec::new().number("x", 10.0), &linear(100.0)).unwrap();

    // The first entry's each listener removes the second entry (not yet
    // processed this tick) and chains a new entry on the first object.
    let chained = Rc::new(RefCell::new(None));
    let (ease2, hb2, a2, chained2) = (ease.clone(), hb.clone(), a.clone(), chained.clone());
    first.once(EntryEventKind::Each, move |_| {
        ease2.remove_ease(Some(&hb2), "x");
        let next = ease2
            .add(&a2, &GoalSpec::new().number("y", 10.0), &linear(100.0))
            .unwrap();
        *chained2.borrow_mut() = Some(next);
    });

    ease.update(50.0).unwrap();
    assert_eq!(b.borrow().value("x"), Some(0.0), "removed entry must be skipped");
    assert!(second.is_finished());
    assert_eq!(a.borrow().value("y"), Some(0.0), "new entry starts next tick");
    assert_eq!(ease.count(), 2);

    ease.update(50.0).unwrap();
    assert_abs_diff_eq!(a.borrow().value("y").unwrap(), 5.0, epsilon = 1e-9);
    let chained = chained.borrow_mut().take().unwrap();
    assert_eq!(chained.state(), Some(EntryState::Running));
}

/// it should allow chaining from a complete listener
#[test]
fn chain_on_complete() {
    let ease = manual_ease();
    let object = point(0.0, 0.0);
    let first = ease.add(&object, &GoalSpec::new().number("x", 10.0), &linear(100.0)).unwrap();
    let (ease2, o2) = (ease.clone(), object.clone());
    first.on(EntryEventKind::Complete, move |_| {
        ease2
            .add(&o2, &GoalSpec::new().number("x", 0.0), &linear(100.0))
            .unwrap();
    });
    ease.update(100.0).unwrap();
    assert_eq!(ease.count(), 1);
    ease.update(50.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 5.0, epsilon = 1e-9);
}

/// it should parse goals from JSON
#[test]
fn json_goal() {
    let ease = manual_ease();
    let object = PropertyMap::new()
        .with("x", 0.0)
        .with("y", 0.0)
        .with("scale.x", 1.0)
        .with("scale.y", 1.0)
        .shared();
    let goal = GoalSpec::from_json(r#"{ "position": { "x": 4, "y": 8 }, "scale": { "x": 2, "y": 3 } }"#)
        .unwrap();
    ease.add(&object, &goal, &linear(100.0)).unwrap();
    ease.update(100.0).unwrap();
    let o = object.borrow();
    assert_eq!(
        (o.value("x"), o.value("y"), o.value("scale.x"), o.value("scale.y")),
        (Some(4.0), Some(8.0), Some(2.0), Some(3.0))
    );
}

struct Stubborn {
    x: f64,
}

impl Animatable for Stubborn {
    fn get(&self, path: &str) -> Option<f64> {
        (path == "x").then_some(self.x)
    }

    fn set(&mut self, _path: &str, _value: f64) -> bool {
        false
    }
}

/// it should surface accessor failures to the caller
#[test]
fn accessor_failures_propagate() {
    let ease = manual_ease();
    let object: Target = target(Stubborn { x: 0.0 });

    let err = ease
        .add(&object, &GoalSpec::new().number("y", 1.0), &EaseOptions::default())
        .unwrap_err();
    assert_eq!(err, EaseError::PropertyNotFound { path: "y".into() });
    assert_eq!(ease.count(), 0);

    ease.add(&object, &GoalSpec::new().number("x", 1.0), &linear(100.0)).unwrap();
    let err = ease.update(10.0).unwrap_err();
    assert_eq!(err, EaseError::PropertyWriteRejected { path: "x".into() });
}

/// it should tick from a shared ticker and unsubscribe when idle
#[test]
fn ticker_clock_source() {
    let ticker = SharedTicker::new();
    let ease = Ease::with_clock(
        EaseConfig::default().with_curve("linear").with_max_frame(f64::INFINITY),
        ticker.clone(),
    )
    .unwrap();
    let object = point(0.0, 0.0);
    assert!(ticker.is_empty());

    ease.add(&object, &GoalSpec::new().number("x", 10.0), &linear(100.0)).unwrap();
    assert!(ease.is_ticking());
    assert_eq!(ticker.len(), 1);

    let idle = Rc::new(Cell::new(false));
    let i = idle.clone();
    ease.on(ManagerEventKind::Complete, move |_| i.set(true));

    ticker.tick(40.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 4.0, epsilon = 1e-9);
    ticker.tick(60.0).unwrap();
    assert_eq!(object.borrow().value("x"), Some(10.0));
    assert!(idle.get());
    assert!(!ease.is_ticking());
    assert!(ticker.is_empty());

    // Adding again resubscribes.
    ease.add(&object, &GoalSpec::new().number("x", 0.0), &linear(100.0)).unwrap();
    assert_eq!(ticker.len(), 1);
    ease.destroy();
    assert!(ticker.is_empty());
}

/// it should tick from animation frames, converting timestamps to deltas
#[test]
fn animation_frame_clock_source() {
    let frames = AnimationFrames::new();
    let ease = Ease::with_clock(
        EaseConfig::default().with_curve("linear").with_max_frame(f64::INFINITY),
        ClockSource::AnimationFrame(frames.clone()),
    )
    .unwrap();
    let object = point(0.0, 0.0);
    ease.add(&object, &GoalSpec::new().number("x", 10.0), &linear(100.0)).unwrap();
    assert_eq!(frames.pending(), 1);

    frames.run_frame(25.0).unwrap();
    assert_abs_diff_eq!(object.borrow().value("x").unwrap(), 2.5, epsilon = 1e-9);
    frames.run_frame(100.0).unwrap();
    assert_eq!(object.borrow().value("x"), Some(10.0));
    assert_eq!(frames.pending(), 0);
    assert!(!ease.is_ticking());
}

/// it should never tick on its own when the clock source is disabled
#[test]
fn no_clock_source() {
    let ticker = SharedTicker::new();
    let ease = Ease::with_clock(EaseConfig::default().without_clock_source(), ticker.clone()).unwrap();
    let object = point(5.0, 0.0);
    let easing = ease.add(&object, &GoalSpec::new().number("x", 10.0), &EaseOptions::default()).unwrap();
    let each = Rc::new(Cell::new(false));
    let e = each.clone();
    easing.on(EntryEventKind::Each, move |_| e.set(true));
    ticker.tick(16.0).unwrap();
    assert!(ticker.is_empty());
    assert!(!each.get());
    assert_eq!(object.borrow().value("x"), Some(5.0));
}

/// it should provide a process default manager with explicit teardown
#[test]
fn default_instance() {
    vizij_ease_core::destroy_default();
    let ease = vizij_ease_core::init_default(
        EaseConfig::default().without_clock_source().with_curve("linear"),
    )
    .unwrap();
    let object = point(0.0, 0.0);
    vizij_ease_core::default_ease()
        .add(&object, &GoalSpec::new().number("x", 1.0), &linear(10.0))
        .unwrap();
    ease.update(10.0).unwrap();
    assert_eq!(object.borrow().value("x"), Some(1.0));
    vizij_ease_core::destroy_default();
    assert!(ease.is_destroyed());
}

/// it should ignore an entry's listeners once its handle was cancelled
#[test]
fn cancel_emits_remove_once() {
    let ease = manual_ease();
    let object = point(0.0, 0.0);
    let easing = ease.add(&object, &GoalSpec::new().number("x", 1.0), &linear(100.0)).unwrap();
    let removes = Rc::new(Cell::new(0));
    let r = removes.clone();
    easing.on(EntryEventKind::Remove, move |_| r.set(r.get() + 1));
    easing.cancel();
    easing.cancel();
    assert_eq!(removes.get(), 1);
    assert_eq!(ease.count(), 0);
    ease.update(10.0).unwrap();
    assert_eq!(object.borrow().value("x"), Some(0.0));
}
