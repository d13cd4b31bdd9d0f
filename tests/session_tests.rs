//! Game flow tests driven through a virtual clock.
//!
//! These walk whole sessions the way the GUI does:
//! - preview, START overlay, play, time-out
//! - match and mismatch handling
//! - restart and stale timers

use std::time::Duration;

use concentration::{
    CardStatus, Deck, Effect, EndReason, FlipOutcome, GameConfig, GameSession, ImageId, Phase,
    Rejection, SessionError, TimerTarget, VirtualClock,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn start(seed: u64) -> (GameSession, VirtualClock, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (session, effects) = GameSession::new(GameConfig::default(), 1, &mut rng).unwrap();
    let mut clock = VirtualClock::new();
    assert!(clock.apply(effects).is_empty());
    (session, clock, rng)
}

/// Runs the preview and the START overlay so the board accepts flips.
fn enter_play(session: &mut GameSession, clock: &mut VirtualClock) {
    let notices = clock.advance(session, ms(3100));
    assert_eq!(notices, vec![Effect::ShowStartOverlay]);
    clock.apply(session.finish_start_overlay());
    assert_eq!(session.phase(), Phase::Playing);
}

fn indices_of(session: &GameSession, image: ImageId) -> (usize, usize) {
    let found: Vec<usize> = session
        .cards()
        .iter()
        .enumerate()
        .filter(|(_, card)| card.image == image)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(found.len(), 2, "{image} should appear exactly twice");
    (found[0], found[1])
}

fn mismatched_pair(session: &GameSession) -> (usize, usize) {
    let cards = session.cards();
    let other = cards
        .iter()
        .position(|card| card.image != cards[0].image)
        .unwrap();
    (0, other)
}

/// Test the preview timeline up to the start of play.
#[test]
fn test_preview_then_start_overlay() {
    let (mut session, mut clock, _) = start(1);
    assert_eq!(session.phase(), Phase::Preview);
    assert!(session.cards().iter().all(|c| c.status == CardStatus::Hidden));

    clock.advance(&mut session, ms(100));
    assert!(session.cards().iter().all(|c| c.is_face_up()));
    assert_eq!(session.preview_left(), 3);

    clock.advance(&mut session, ms(2000));
    assert_eq!(session.phase(), Phase::Preview);
    assert_eq!(session.preview_left(), 1);
    assert_eq!(session.flip(0).0, FlipOutcome::Rejected(Rejection::NotPlaying));

    let notices = clock.advance(&mut session, ms(1000));
    assert_eq!(notices, vec![Effect::ShowStartOverlay]);
    assert_eq!(session.phase(), Phase::Starting);
    assert!(session.is_locked());
    assert!(session.cards().iter().all(|c| c.status == CardStatus::Hidden));

    // Nothing is left running while the overlay is up.
    assert_eq!(clock.pending_count(), 0);

    clock.apply(session.finish_start_overlay());
    assert_eq!(session.phase(), Phase::Playing);
    assert!(!session.is_locked());
    assert_eq!(session.time_left(), 20);
}

/// Test that two cards sharing "img/3.jpg" match.
#[test]
fn test_matching_pair() {
    let (mut session, mut clock, _) = start(7);
    enter_play(&mut session, &mut clock);

    let config = session.config().clone();
    let image = session
        .cards()
        .iter()
        .map(|c| c.image)
        .find(|image| image.asset_path(&config) == "img/3.jpg")
        .unwrap_or(session.cards()[0].image);
    let (a, b) = indices_of(&session, image);

    assert_eq!(session.flip(a).0, FlipOutcome::Revealed);
    let (outcome, effects) = session.flip(b);
    assert_eq!(outcome, FlipOutcome::Matched { first: a, second: b });
    assert!(effects.is_empty());

    assert_eq!(session.matched_pairs(), 1);
    assert!(session.pending().is_empty());
    assert!(!session.is_locked());
    assert!(session.cards()[a].is_matched() && session.cards()[b].is_matched());
}

/// Test the fixed-deck version of the "img/3.jpg" scenario.
#[test]
fn test_matching_pair_on_fixed_deck() {
    let deck = Deck::from_images((1..=8).flat_map(|n| [ImageId::new(n), ImageId::new(n)]));
    let (mut session, effects) = GameSession::with_deck(GameConfig::default(), 1, deck).unwrap();
    let mut clock = VirtualClock::new();
    clock.apply(effects);
    enter_play(&mut session, &mut clock);

    // Image 3 sits at 4 and 5.
    assert_eq!(session.visible_face(4).as_deref(), Some("img/back.png"));
    session.flip(4);
    assert_eq!(session.visible_face(4).as_deref(), Some("img/3.jpg"));
    session.flip(5);
    assert_eq!(session.matched_pairs(), 1);
    assert!(session.pending().is_empty());
    assert!(!session.is_locked());
}

/// Test that a mismatch hides both cards after the delay.
#[test]
fn test_mismatch_reverts_after_delay() {
    let (mut session, mut clock, _) = start(11);
    enter_play(&mut session, &mut clock);
    let (a, b) = mismatched_pair(&session);

    session.flip(a);
    let (outcome, effects) = session.flip(b);
    assert_eq!(outcome, FlipOutcome::Mismatched { first: a, second: b });
    clock.apply(effects);
    assert!(session.is_locked());

    // Board stays locked while the pair is on show.
    let third = (0..16).find(|&i| i != a && i != b).unwrap();
    assert_eq!(session.flip(third).0, FlipOutcome::Rejected(Rejection::Locked));

    clock.advance(&mut session, ms(799));
    assert!(session.cards()[a].is_face_up());
    assert_eq!(session.pending(), &[a, b]);

    clock.advance(&mut session, ms(1));
    assert_eq!(session.cards()[a].status, CardStatus::Hidden);
    assert_eq!(session.cards()[b].status, CardStatus::Hidden);
    assert!(session.pending().is_empty());
    assert!(!session.is_locked());
    assert_eq!(session.matched_pairs(), 0);
}

/// Test that flipping face-up or matched cards changes nothing.
#[test]
fn test_flipping_face_up_cards_is_a_no_op() {
    let (mut session, mut clock, _) = start(5);
    enter_play(&mut session, &mut clock);
    let image = session.cards()[0].image;
    let (a, b) = indices_of(&session, image);
    session.flip(a);
    session.flip(b);

    let before = session.cards().to_vec();
    assert_eq!(session.flip(a).0, FlipOutcome::Rejected(Rejection::AlreadyFaceUp));
    assert_eq!(session.flip(b).0, FlipOutcome::Rejected(Rejection::AlreadyFaceUp));
    assert_eq!(session.cards(), before.as_slice());
    assert_eq!(session.matched_pairs(), 1);

    let (c, _) = mismatched_pair(&session);
    let c = if session.cards()[c].is_matched() {
        (0..16).find(|&i| !session.cards()[i].is_matched()).unwrap()
    } else {
        c
    };
    session.flip(c);
    let pending = session.pending().to_vec();
    assert_eq!(session.flip(c).0, FlipOutcome::Rejected(Rejection::AlreadyFaceUp));
    assert_eq!(session.pending(), pending.as_slice());
    assert!(!session.is_locked());
}

/// Test that the countdown ends the game exactly once and then stops.
#[test]
fn test_countdown_ends_once() {
    let (mut session, mut clock, _) = start(3);
    enter_play(&mut session, &mut clock);

    let notices = clock.advance(&mut session, Duration::from_secs(19));
    assert!(notices.is_empty());
    assert_eq!(session.time_left(), 1);

    let notices = clock.advance(&mut session, Duration::from_secs(1));
    assert_eq!(
        notices,
        vec![Effect::GameOver {
            matched_pairs: 0,
            reason: EndReason::TimeUp
        }]
    );
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.time_left(), 0);
    assert!(session.is_locked());

    // The countdown is gone, not just ignored.
    assert_eq!(clock.pending_count(), 0);
    assert_eq!(session.live_timers(), 0);
    let notices = clock.advance(&mut session, Duration::from_secs(30));
    assert!(notices.is_empty());
    assert_eq!(session.time_left(), 0);
    assert_eq!(session.flip(0).0, FlipOutcome::Rejected(Rejection::NotPlaying));
}

/// Test that the end of time hides a pair still waiting to revert.
#[test]
fn test_time_out_during_mismatch() {
    let (mut session, mut clock, _) = start(21);
    enter_play(&mut session, &mut clock);
    clock.advance(&mut session, ms(19_500));
    assert_eq!(session.time_left(), 1);

    let (a, b) = mismatched_pair(&session);
    session.flip(a);
    let (_, effects) = session.flip(b);
    clock.apply(effects);

    let notices = clock.advance(&mut session, ms(500));
    assert_eq!(notices.len(), 1);
    assert_eq!(session.phase(), Phase::Ended);
    assert!(session.pending().is_empty());
    assert!(!session.cards()[a].is_face_up());
    assert!(!session.cards()[b].is_face_up());

    // The late revert never unlocks the finished board.
    clock.advance(&mut session, ms(2000));
    assert!(session.is_locked());
}

/// Test that restart builds a fresh session and old timers stay dead.
#[test]
fn test_restart_after_end() {
    let (mut session, mut clock, mut rng) = start(9);
    enter_play(&mut session, &mut clock);
    let image = session.cards()[0].image;
    let (a, b) = indices_of(&session, image);
    session.flip(a);
    session.flip(b);
    clock.advance(&mut session, Duration::from_secs(20));
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.matched_pairs(), 1);

    let old_id = session.session_id();
    let effects = session.restart(&mut rng).unwrap();
    clock.apply(effects);

    assert_eq!(session.session_id(), old_id + 1);
    assert_eq!(session.phase(), Phase::Preview);
    assert_eq!(session.time_left(), 20);
    assert_eq!(session.matched_pairs(), 0);
    assert!(session.pending().is_empty());
    assert!(session.deck().is_well_formed(8));
    assert!(session.cards().iter().all(|c| c.status == CardStatus::Hidden));

    enter_play(&mut session, &mut clock);
    assert_eq!(session.time_left(), 20);
}

/// Test that restarting mid-game cancels the previous session's timers.
#[test]
fn test_restart_mid_game_cancels_timers() {
    let (mut session, mut clock, mut rng) = start(13);
    enter_play(&mut session, &mut clock);
    clock.advance(&mut session, Duration::from_secs(5));
    let (a, b) = mismatched_pair(&session);
    session.flip(a);
    let (_, effects) = session.flip(b);
    let stale = match effects.as_slice() {
        [Effect::Schedule { token, .. }] => *token,
        other => panic!("expected one scheduled revert, got {other:?}"),
    };
    clock.apply(effects);

    let effects = session.restart(&mut rng).unwrap();
    let cancelled = effects
        .iter()
        .filter(|e| matches!(e, Effect::Cancel(_)))
        .count();
    assert_eq!(cancelled, 2, "countdown and mismatch revert");
    clock.apply(effects);
    assert!(!clock.is_scheduled(stale));
    assert_eq!(clock.pending_count(), 1);

    // A host that fires the old token anyway changes nothing.
    let before = session.cards().to_vec();
    assert!(session.fire(stale).is_empty());
    assert_eq!(session.cards(), before.as_slice());
    assert_eq!(session.preview_left(), 3);
}

/// Test that the game keeps running after the last pair by default.
#[test]
fn test_all_pairs_found_keeps_clock_running() {
    let deck = Deck::from_images((1..=8).flat_map(|n| [ImageId::new(n), ImageId::new(n)]));
    let (mut session, effects) = GameSession::with_deck(GameConfig::default(), 1, deck).unwrap();
    let mut clock = VirtualClock::new();
    clock.apply(effects);
    enter_play(&mut session, &mut clock);

    for pair in 0..8 {
        session.flip(pair * 2);
        let (_, effects) = session.flip(pair * 2 + 1);
        assert!(effects.is_empty());
    }
    assert_eq!(session.matched_pairs(), 8);
    assert_eq!(session.phase(), Phase::Playing);

    let notices = clock.advance(&mut session, Duration::from_secs(20));
    assert_eq!(
        notices,
        vec![Effect::GameOver {
            matched_pairs: 8,
            reason: EndReason::TimeUp
        }]
    );
}

/// Test the opt-in early finish.
#[test]
fn test_all_pairs_found_can_end_early() {
    let config = GameConfig {
        end_on_all_matched: true,
        ..GameConfig::default()
    };
    let deck = Deck::from_images((1..=8).flat_map(|n| [ImageId::new(n), ImageId::new(n)]));
    let (mut session, effects) = GameSession::with_deck(config, 1, deck).unwrap();
    let mut clock = VirtualClock::new();
    clock.apply(effects);
    enter_play(&mut session, &mut clock);
    clock.advance(&mut session, Duration::from_secs(4));

    for pair in 0..7 {
        session.flip(pair * 2);
        session.flip(pair * 2 + 1);
    }
    assert_eq!(session.phase(), Phase::Playing);
    session.flip(14);
    let (_, effects) = session.flip(15);
    let notices = clock.apply(effects);
    assert_eq!(
        notices,
        vec![Effect::GameOver {
            matched_pairs: 8,
            reason: EndReason::AllMatched
        }]
    );
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.time_left(), 16);
    assert_eq!(clock.pending_count(), 0);
}

/// Test that settings the session cannot run are refused up front instead of
/// leaving it stuck in the preview.
#[test]
fn test_unrunnable_settings_are_refused() {
    let mut rng = StdRng::seed_from_u64(5);
    for config in [
        GameConfig {
            tick_ms: 0,
            ..GameConfig::default()
        },
        GameConfig {
            total_seconds: 0,
            ..GameConfig::default()
        },
        GameConfig {
            grid_cols: 3,
            ..GameConfig::default()
        },
    ] {
        let result = GameSession::new(config, 1, &mut rng);
        assert!(matches!(result, Err(SessionError::Config(_))));
    }
}
