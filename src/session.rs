use rand::Rng;
use thiserror::Error;

use crate::config::{ConfigError, GameConfig};
use crate::deck::{Card, CardStatus, Deck, DeckError};
use crate::timers::{EndReason, Effect, Schedule, TimerBook, TimerKind, TimerTarget, TimerToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Cards are shown face-up for memorizing; input is locked.
    Preview,
    /// The START overlay is up; input is locked.
    Starting,
    Playing,
    Ended,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid game settings: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error("the board has {expected} slots but the deck holds {found} cards")]
    DeckSize { expected: usize, found: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    NotPlaying,
    Locked,
    OutOfRange,
    AlreadyFaceUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    Rejected(Rejection),
    /// First card of a pair is showing.
    Revealed,
    Matched { first: usize, second: usize },
    /// Both cards stay up until the mismatch timer hides them.
    Mismatched { first: usize, second: usize },
}

/// One game from preview to end. Restarting replaces the whole session.
#[derive(Clone, Debug)]
pub struct GameSession {
    config: GameConfig,
    session_id: u64,
    phase: Phase,
    deck: Deck,
    time_left: u32,
    preview_left: u32,
    matched_pairs: usize,
    flipped_indices: Vec<usize>,
    lock_input: bool,
    end_reason: Option<EndReason>,
    timers: TimerBook,
    preview_timer: Option<TimerToken>,
    countdown_timer: Option<TimerToken>,
    mismatch_timer: Option<TimerToken>,
}

impl GameSession {
    pub fn new<R: Rng + ?Sized>(
        config: GameConfig,
        session_id: u64,
        rng: &mut R,
    ) -> Result<(Self, Vec<Effect>), SessionError> {
        config.validate()?;
        let deck = Deck::build(&config, rng)?;
        Self::with_deck(config, session_id, deck)
    }

    /// Starts a session on a deck laid out by the caller. The deck must fill
    /// the configured grid exactly.
    pub fn with_deck(
        config: GameConfig,
        session_id: u64,
        deck: Deck,
    ) -> Result<(Self, Vec<Effect>), SessionError> {
        config.validate()?;
        if deck.len() != config.deck_len() {
            return Err(SessionError::DeckSize {
                expected: config.deck_len(),
                found: deck.len(),
            });
        }
        let mut session = GameSession {
            time_left: config.total_seconds,
            preview_left: config.preview_seconds,
            config,
            session_id,
            phase: Phase::Preview,
            deck,
            matched_pairs: 0,
            flipped_indices: Vec::with_capacity(2),
            lock_input: true,
            end_reason: None,
            timers: TimerBook::new(session_id),
            preview_timer: None,
            countdown_timer: None,
            mismatch_timer: None,
        };
        let (token, effect) = session.timers.arm(
            TimerKind::PreviewReveal,
            Schedule::Once(session.config.preview_reveal_delay()),
        );
        session.preview_timer = Some(token);
        log::info!(
            "session {session_id}: {} cards, {}s preview, {}s to play",
            session.deck.len(),
            session.config.preview_seconds,
            session.config.total_seconds
        );
        Ok((session, vec![effect]))
    }

    /// Tears this session down and replaces it with a fresh one on a newly
    /// shuffled deck. Every timer of the old session is cancelled first.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<Effect>, SessionError> {
        let deck = Deck::build(&self.config, rng)?;
        let mut effects = self.teardown();
        let (next, start) = Self::with_deck(self.config.clone(), self.session_id + 1, deck)?;
        *self = next;
        effects.extend(start);
        Ok(effects)
    }

    /// Cancels every outstanding timer and locks the board.
    pub fn teardown(&mut self) -> Vec<Effect> {
        self.lock_input = true;
        self.preview_timer = None;
        self.countdown_timer = None;
        self.mismatch_timer = None;
        self.timers.disarm_all()
    }

    /// Reports that the START overlay has finished. Only the first report
    /// while `Starting` has any effect.
    pub fn finish_start_overlay(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Starting {
            log::debug!("session {}: start signal ignored in {:?}", self.session_id, self.phase);
            return Vec::new();
        }
        self.phase = Phase::Playing;
        self.lock_input = false;
        let (token, effect) = self
            .timers
            .arm(TimerKind::CountdownTick, Schedule::Every(self.config.tick()));
        self.countdown_timer = Some(token);
        log::debug!("session {}: playing", self.session_id);
        vec![effect]
    }

    pub fn flip(&mut self, index: usize) -> (FlipOutcome, Vec<Effect>) {
        if let Err(reason) = self.check_flip(index) {
            return (FlipOutcome::Rejected(reason), Vec::new());
        }

        self.deck.cards_mut()[index].status = CardStatus::Flipped;
        self.flipped_indices.push(index);
        if self.flipped_indices.len() < 2 {
            return (FlipOutcome::Revealed, Vec::new());
        }

        self.lock_input = true;
        let (first, second) = (self.flipped_indices[0], self.flipped_indices[1]);
        let cards = self.deck.cards();
        if cards[first].image == cards[second].image {
            let cards = self.deck.cards_mut();
            cards[first].status = CardStatus::Matched;
            cards[second].status = CardStatus::Matched;
            self.flipped_indices.clear();
            self.lock_input = false;
            self.matched_pairs += 1;
            log::debug!(
                "session {}: matched {first} and {second} ({}/{})",
                self.session_id,
                self.matched_pairs,
                self.config.pairs
            );
            let effects = if self.config.end_on_all_matched && self.deck.all_matched() {
                self.end(EndReason::AllMatched)
            } else {
                Vec::new()
            };
            (FlipOutcome::Matched { first, second }, effects)
        } else {
            let (token, effect) = self.timers.arm(
                TimerKind::MismatchRevert { first, second },
                Schedule::Once(self.config.mismatch_delay()),
            );
            self.mismatch_timer = Some(token);
            (FlipOutcome::Mismatched { first, second }, vec![effect])
        }
    }

    fn check_flip(&self, index: usize) -> Result<(), Rejection> {
        if self.phase != Phase::Playing {
            return Err(Rejection::NotPlaying);
        }
        let card = self.deck.get(index).ok_or(Rejection::OutOfRange)?;
        if self.lock_input {
            return Err(Rejection::Locked);
        }
        if card.is_face_up() {
            return Err(Rejection::AlreadyFaceUp);
        }
        Ok(())
    }

    fn reveal_preview(&mut self) -> Vec<Effect> {
        self.preview_timer = None;
        for card in self.deck.cards_mut() {
            card.status = CardStatus::Flipped;
        }
        self.preview_left = self.config.preview_seconds;
        if self.preview_left == 0 {
            return self.finish_preview();
        }
        let (token, effect) = self
            .timers
            .arm(TimerKind::PreviewTick, Schedule::Every(self.config.tick()));
        self.preview_timer = Some(token);
        vec![effect]
    }

    fn preview_tick(&mut self) -> Vec<Effect> {
        self.preview_left = self.preview_left.saturating_sub(1);
        if self.preview_left > 0 {
            return Vec::new();
        }
        let mut effects: Vec<Effect> = self
            .preview_timer
            .take()
            .and_then(|token| self.timers.disarm(token))
            .into_iter()
            .collect();
        effects.extend(self.finish_preview());
        effects
    }

    fn finish_preview(&mut self) -> Vec<Effect> {
        for card in self.deck.cards_mut() {
            card.status = CardStatus::Hidden;
        }
        self.phase = Phase::Starting;
        log::debug!("session {}: preview over", self.session_id);
        vec![Effect::ShowStartOverlay]
    }

    fn revert_mismatch(&mut self, first: usize, second: usize) -> Vec<Effect> {
        self.mismatch_timer = None;
        for index in [first, second] {
            if let Some(card) = self.deck.cards_mut().get_mut(index)
                && card.status == CardStatus::Flipped
            {
                card.status = CardStatus::Hidden;
            }
        }
        self.flipped_indices.clear();
        self.lock_input = self.phase != Phase::Playing;
        Vec::new()
    }

    fn countdown_tick(&mut self) -> Vec<Effect> {
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            return self.end(EndReason::TimeUp);
        }
        Vec::new()
    }

    fn end(&mut self, reason: EndReason) -> Vec<Effect> {
        self.phase = Phase::Ended;
        self.end_reason = Some(reason);
        for index in self.flipped_indices.drain(..) {
            if let Some(card) = self.deck.cards_mut().get_mut(index)
                && card.status == CardStatus::Flipped
            {
                card.status = CardStatus::Hidden;
            }
        }
        let mut effects = self.teardown();
        log::info!(
            "session {}: game over ({reason:?}), {} of {} pairs",
            self.session_id,
            self.matched_pairs,
            self.config.pairs
        );
        effects.push(Effect::GameOver {
            matched_pairs: self.matched_pairs,
            reason,
        });
        effects
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn preview_left(&self) -> u32 {
        self.preview_left
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    /// Cards that are face-up and waiting for a match check.
    pub fn pending(&self) -> &[usize] {
        &self.flipped_indices
    }

    pub fn is_locked(&self) -> bool {
        self.lock_input
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn cards(&self) -> &[Card] {
        self.deck.cards()
    }

    pub fn is_live(&self, token: TimerToken) -> bool {
        self.timers.is_live(token)
    }

    pub fn live_timers(&self) -> usize {
        self.timers.live_count()
    }

    /// The image a renderer should show for card `index` right now.
    pub fn visible_face(&self, index: usize) -> Option<String> {
        let card = self.deck.get(index)?;
        Some(if card.is_face_up() {
            card.image.asset_path(&self.config)
        } else {
            self.config.back_image_path()
        })
    }
}

impl TimerTarget for GameSession {
    fn fire(&mut self, token: TimerToken) -> Vec<Effect> {
        let Some(kind) = self.timers.claim(token) else {
            log::debug!(
                "session {}: dropping stale timer {}/{}",
                self.session_id,
                token.session(),
                token.id()
            );
            return Vec::new();
        };
        match kind {
            TimerKind::PreviewReveal => self.reveal_preview(),
            TimerKind::PreviewTick => self.preview_tick(),
            TimerKind::MismatchRevert { first, second } => self.revert_mismatch(first, second),
            TimerKind::CountdownTick => self.countdown_tick(),
        }
    }
}
