//! Scheduled events with cancellation tokens.
//!
//! The game core never owns a clock. Transitions hand back [`Effect`]s asking
//! the host to arm or cancel timers, and the host calls back with the
//! [`TimerToken`] when one is due. A token is only honored while it is live in
//! the [`TimerBook`] of the session that issued it, so a timer left over from
//! a previous game can never fire into the next one.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken {
    session: u64,
    id: u32,
}

impl TimerToken {
    pub fn session(self) -> u64 {
        self.session
    }

    pub fn id(self) -> u32 {
        self.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Turns every card face-up shortly after the board is laid out.
    PreviewReveal,
    PreviewTick,
    /// Hides a mismatched pair again.
    MismatchRevert { first: usize, second: usize },
    CountdownTick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    Once(Duration),
    Every(Duration),
}

impl Schedule {
    pub fn delay(self) -> Duration {
        match self {
            Schedule::Once(delay) | Schedule::Every(delay) => delay,
        }
    }

    pub fn repeats(self) -> bool {
        matches!(self, Schedule::Every(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    AllMatched,
}

/// Requests from the game core to whoever hosts it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Schedule {
        token: TimerToken,
        kind: TimerKind,
        schedule: Schedule,
    },
    Cancel(TimerToken),
    /// The preview is over; the host shows the START overlay and reports back
    /// once it has finished.
    ShowStartOverlay,
    GameOver {
        matched_pairs: usize,
        reason: EndReason,
    },
}

#[derive(Clone, Debug)]
struct ArmedTimer {
    token: TimerToken,
    kind: TimerKind,
    schedule: Schedule,
}

/// Live timers of one session.
#[derive(Clone, Debug)]
pub struct TimerBook {
    session: u64,
    next_id: u32,
    armed: Vec<ArmedTimer>,
}

impl TimerBook {
    pub fn new(session: u64) -> Self {
        TimerBook {
            session,
            next_id: 0,
            armed: Vec::new(),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn arm(&mut self, kind: TimerKind, schedule: Schedule) -> (TimerToken, Effect) {
        let token = TimerToken {
            session: self.session,
            id: self.next_id,
        };
        self.next_id = self.next_id.wrapping_add(1);
        self.armed.push(ArmedTimer {
            token,
            kind,
            schedule,
        });
        (
            token,
            Effect::Schedule {
                token,
                kind,
                schedule,
            },
        )
    }

    pub fn disarm(&mut self, token: TimerToken) -> Option<Effect> {
        let pos = self.armed.iter().position(|t| t.token == token)?;
        self.armed.remove(pos);
        Some(Effect::Cancel(token))
    }

    pub fn disarm_all(&mut self) -> Vec<Effect> {
        self.armed
            .drain(..)
            .map(|t| Effect::Cancel(t.token))
            .collect()
    }

    /// Accepts a firing timer. One-shot timers are consumed; repeating ones
    /// stay armed until disarmed.
    pub fn claim(&mut self, token: TimerToken) -> Option<TimerKind> {
        let pos = self.armed.iter().position(|t| t.token == token)?;
        let timer = &self.armed[pos];
        let kind = timer.kind;
        if !timer.schedule.repeats() {
            self.armed.remove(pos);
        }
        Some(kind)
    }

    pub fn is_live(&self, token: TimerToken) -> bool {
        self.armed.iter().any(|t| t.token == token)
    }

    pub fn live_count(&self) -> usize {
        self.armed.len()
    }
}

/// Anything that reacts to its own timers firing.
pub trait TimerTarget {
    fn fire(&mut self, token: TimerToken) -> Vec<Effect>;
}

#[derive(Clone, Debug)]
struct Pending {
    token: TimerToken,
    due: Duration,
    period: Option<Duration>,
    seq: u64,
}

/// Deterministic host that runs timers against virtual time.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arms and cancels timers as requested and hands back the effects that
    /// are not about timers.
    pub fn apply(&mut self, effects: impl IntoIterator<Item = Effect>) -> Vec<Effect> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::Schedule {
                    token, schedule, ..
                } => {
                    self.seq += 1;
                    self.pending.push(Pending {
                        token,
                        due: self.now + schedule.delay(),
                        period: schedule.repeats().then(|| schedule.delay()),
                        seq: self.seq,
                    });
                }
                Effect::Cancel(token) => self.pending.retain(|p| p.token != token),
                other => notices.push(other),
            }
        }
        notices
    }

    /// Moves time forward by `by`, firing everything that falls due on the
    /// way in due order.
    pub fn advance<T: TimerTarget>(&mut self, target: &mut T, by: Duration) -> Vec<Effect> {
        let until = self.now + by;
        let mut notices = Vec::new();
        while let Some(pos) = self.next_due(until) {
            let token = self.pending[pos].token;
            self.now = self.pending[pos].due;
            match self.pending[pos].period {
                Some(period) if !period.is_zero() => {
                    self.seq += 1;
                    let next = &mut self.pending[pos];
                    next.due += period;
                    next.seq = self.seq;
                }
                _ => {
                    self.pending.remove(pos);
                }
            }
            let effects = target.fire(token);
            notices.extend(self.apply(effects));
        }
        self.now = until;
        notices
    }

    pub fn is_scheduled(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|p| p.token == token)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn next_due(&self, until: Duration) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(pos, _)| pos)
    }
}
