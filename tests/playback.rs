use midi_replay::{Error, prelude::*};
use pretty_assertions::assert_eq;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// `tests/simple_midi/simple.mid`, base64 encoded
const SIMPLE_BASE64: &str = "TVRoZAAAAAYAAAABAGBNVHJrAAAAOwD/AwVQaWFubwD/WAQEAhgIAP9RAwehIACSMHAAPHBgkUNQYJBMMYFAgjAAADwAAIFDAACQTAAA/y8A";

fn scale(clock: &ManualClock) -> Player<ManualClock> {
    let mut player = Player::with_clock(clock.clone());
    let mut events = Vec::new();
    for (i, note) in [60, 62, 64, 65].into_iter().enumerate() {
        let start = i as f64 * 250.;
        events.push(NoteEvent::note_on(0, note, start, 100).with_length(200.));
        events.push(NoteEvent::note_off(0, note, start + 200.));
    }
    player.load_events(events).unwrap();
    player
}

fn counter(player: &mut Player<ManualClock>, target: impl Into<CallbackTarget>) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    player.on(target, move |_, _| c.set(c.get() + 1));
    count
}

#[test]
fn plays_every_event_in_order() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    let heard = Rc::new(RefCell::new(Vec::new()));
    let log = heard.clone();
    let clock_view = clock.clone();
    player.on(Pattern::new(), move |trigger, _| {
        let event = trigger.event().unwrap();
        log.borrow_mut()
            .push((event.kind, event.note, clock_view.now_ms()));
    });
    let finished = counter(&mut player, Lifecycle::Finish);

    player.play();
    assert_eq!(player.run(), Poll::Finished);

    use EventType::*;
    assert_eq!(
        *heard.borrow(),
        vec![
            (NoteOn, 60, 0.),
            (NoteOff, 60, 200.),
            (NoteOn, 62, 250.),
            (NoteOff, 62, 450.),
            (NoteOn, 64, 500.),
            (NoteOff, 64, 700.),
            (NoteOn, 65, 750.),
            (NoteOff, 65, 950.),
        ]
    );
    assert_eq!(finished.get(), 1);
    assert!(!player.is_playing());
    assert_eq!(player.duration(), 950.);
}

#[test]
fn pause_is_idempotent() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    let paused = counter(&mut player, "pause");
    let played = counter(&mut player, "play");

    player.pause();
    assert_eq!(paused.get(), 0);

    player.play();
    player.play();
    assert_eq!(played.get(), 1);

    clock.advance(100.);
    player.pause();
    player.pause();
    assert_eq!(paused.get(), 1);
    assert_eq!(player.current_time(), 100.);
}

#[test]
fn pause_from_a_callback_leaves_the_event_pending() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    player.on(Pattern::new().with("note", 62).with("type", "noteOn"), |_, handle| {
        handle.pause()
    });

    player.play();
    assert_eq!(player.run(), Poll::Idle);
    assert_eq!(player.current_time(), 250.);
    assert_eq!(player.timeline().played().len(), 3);
    assert_eq!(player.timeline().next_pending().map(|e| e.timestamp), Some(450.));

    clock.advance(10_000.);
    player.play();
    assert_eq!(player.poll(), Poll::Wait(200.));
    assert_eq!(player.run(), Poll::Finished);
}

#[test]
fn finish_handler_can_loop_playback() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    let note_ons = counter(&mut player, EventType::NoteOn);
    let stops = counter(&mut player, "stop");
    let loops = Rc::new(Cell::new(0));
    let l = loops.clone();
    player.on(Lifecycle::Finish, move |_, handle| {
        if l.get() < 2 {
            l.set(l.get() + 1);
            handle.stop();
            handle.play();
        }
    });

    player.play();
    assert_eq!(player.run(), Poll::Finished);
    assert_eq!(note_ons.get(), 12);
    assert_eq!(stops.get(), 2);
    assert_eq!(clock.now_ms(), 3. * 950.);
}

#[test]
fn speed_scales_wall_clock_time() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    player.set_speed(2.).unwrap();
    player.play();
    assert_eq!(player.run(), Poll::Finished);
    assert_eq!(clock.now_ms(), 475.);

    assert!(matches!(player.set_speed(0.), Err(ValidationError::Speed(_))));
    assert!(matches!(player.set_speed(-1.), Err(ValidationError::Speed(_))));
    assert_eq!(player.speed(), 2.);
}

#[test]
fn seek_and_stop() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    let stops = counter(&mut player, "stop");

    player.seek(500.).unwrap();
    player.play();
    assert_eq!(player.poll(), Poll::Wait(200.));
    assert_eq!(player.timeline().played().len(), 5);

    player.stop();
    assert_eq!(stops.get(), 1);
    assert_eq!(player.current_time(), 0.);
    assert!(!player.is_playing());
    assert_eq!(player.timeline().pending().len(), 8);
}

#[test]
fn reset_removes_everything() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    player.play();
    clock.advance(300.);
    player.reset();
    assert!(player.all_events().is_empty());
    assert_eq!(player.duration(), 0.);
    assert_eq!(player.current_time(), 0.);
}

#[test]
fn added_events_respect_the_cursor() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    let heard = counter(&mut player, Pattern::new().with("note", 90));

    player.play();
    clock.advance(300.);
    assert_eq!(player.poll(), Poll::Wait(150.));

    // already in the past, never dispatched
    player.add_event(NoteEvent::note_on(0, 90, 100., 1)).unwrap();
    // due next
    player.add_event(NoteEvent::note_on(0, 90, 400., 1)).unwrap();
    assert!(player
        .add_event(NoteEvent::note_on(0, 90, f64::INFINITY, 1))
        .is_err());

    assert_eq!(player.poll(), Poll::Wait(100.));
    assert_eq!(player.run(), Poll::Finished);
    assert_eq!(heard.get(), 1);
    assert_eq!(player.all_events().len(), 10);
}

#[test]
fn callbacks_by_pattern_name_and_removal() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    let e_notes = counter(&mut player, Pattern::new().with("note", 64));
    let offs = counter(&mut player, "noteOff");
    let custom = counter(&mut player, "cue");
    let id = player.on("noteOn", |_, _| panic!("removed callbacks never fire"));
    assert!(player.off(id));
    assert!(!player.off(id));

    assert_eq!(player.emit("cue"), 1);
    assert_eq!(player.emit_event(&NoteEvent::note_off(0, 64, 0.)), 2);
    assert_eq!(custom.get(), 1);

    player.play();
    player.run();
    assert_eq!(e_notes.get(), 3);
    assert_eq!(offs.get(), 5);

    player.off_all();
    player.stop();
    player.play();
    player.run();
    assert_eq!(offs.get(), 5);
}

#[test]
fn range_queries_around_the_cursor() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    player.seek(450.).unwrap();
    let notes = |events: Vec<NoteEvent>| events.iter().map(|e| e.timestamp).collect::<Vec<_>>();
    assert_eq!(notes(player.events_ahead_by(250.)), vec![450., 500., 700.]);
    assert_eq!(notes(player.events_behind_by(200.)), vec![250., 450.]);
    assert_eq!(notes(player.events_in_range(0., 200.)), vec![0., 200.]);
}

#[test]
fn loads_base64_and_keeps_state_on_failure() {
    let mut player = Player::with_clock(ManualClock::new());
    let loaded = player.load_base64(SIMPLE_BASE64).unwrap();
    assert_eq!(loaded.len(), 8);
    assert_eq!(player.duration(), 2000.);

    assert!(matches!(player.load_base64("not base64!"), Err(Error::Base64(_))));
    assert!(matches!(player.load_base64("AAAA"), Err(Error::Read(_))));
    assert!(player.load_bytes(b"MThd").is_err());
    assert_eq!(player.all_events(), loaded);

    let shifted = player.load_base64_shifted(SIMPLE_BASE64, -12).unwrap();
    assert_eq!(shifted[0].note, loaded[0].note - 12);
}

#[test]
fn configured_note_shift_applies_to_loads() {
    let config = PlayerConfig {
        note_shift: 2,
        ..Default::default()
    };
    let mut player = Player::with_clock_and_config(ManualClock::new(), config).unwrap();
    let notes = player
        .load_bytes(include_bytes!("simple_midi/simple.mid"))
        .unwrap();
    assert_eq!(notes[0].note, 50);
}

#[test]
fn reverse_keeps_play_time() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    player.play();
    clock.advance(300.);
    player.reverse();
    assert_eq!(player.current_time(), 300.);
    assert!(player.is_playing());
    let all = player.all_events();
    assert_eq!(all[0].note, 65);
    assert_eq!(player.run(), Poll::Finished);
}

#[test]
fn handles_work_across_threads() {
    let clock = ManualClock::new();
    let mut player = scale(&clock);
    player.play();
    let handle = player.handle();
    std::thread::spawn(move || {
        handle.seek(700.).unwrap();
        handle.pause();
    })
    .join()
    .unwrap();
    assert_eq!(player.poll(), Poll::Idle);
    assert_eq!(player.current_time(), 700.);
    assert_eq!(player.timeline().played().len(), 5);
}

#[test]
fn far_future_events_wait_without_panicking() {
    let mut player = Player::new();
    player
        .load_events(vec![NoteEvent::note_on(0, 60, 1e300, 100)])
        .unwrap();
    player.play();
    let handle = player.handle();
    let pauser = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        handle.pause();
    });
    assert_eq!(player.run(), Poll::Idle);
    pauser.join().unwrap();
    assert_eq!(player.timeline().pending().len(), 1);
}

#[test]
fn pause_during_a_long_rest_freezes_play_time_when_called() {
    let mut player = Player::new();
    player
        .load_events(vec![
            NoteEvent::note_on(0, 60, 0., 100).with_length(100.),
            NoteEvent::note_off(0, 60, 5000.),
        ])
        .unwrap();
    player.play();
    let handle = player.handle();
    let pauser = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(1000));
        handle.pause();
    });
    assert_eq!(player.run(), Poll::Idle);
    pauser.join().unwrap();

    let paused_at = player.current_time();
    assert!((1000. ..4000.).contains(&paused_at), "paused at {paused_at}");
    assert_eq!(player.timeline().played().len(), 1);
    assert_eq!(player.timeline().pending().len(), 1);

    player.play();
    assert!(matches!(player.poll(), Poll::Wait(ms) if ms > 1000.));
    assert_eq!(player.timeline().pending().len(), 1);
}
