//! Named one-second countdowns (seeker release, post-round reset)

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::ws::protocol::{ServerMsg, TimerName};

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Something a countdown wants the game loop to act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Fired once per second, starting with the full duration
    Tick {
        name: TimerName,
        time_left: u32,
        message: String,
    },
    /// Fired exactly once, after the zero tick
    Complete { name: TimerName },
}

impl TimerEvent {
    /// Wire message for a tick, `None` for completion
    pub fn countdown_msg(&self) -> Option<ServerMsg> {
        match self {
            TimerEvent::Tick {
                name,
                time_left,
                message,
            } => Some(ServerMsg::CountdownUpdate {
                timer_name: *name,
                time_left: *time_left,
                message: message.clone(),
            }),
            TimerEvent::Complete { .. } => None,
        }
    }
}

#[derive(Debug)]
struct Countdown {
    remaining: u32,
    carry: Duration,
    announced: bool,
    message_prefix: &'static str,
}

impl Countdown {
    fn tick_event(&self, name: TimerName) -> TimerEvent {
        TimerEvent::Tick {
            name,
            time_left: self.remaining,
            message: format!("{}{}s", self.message_prefix, self.remaining),
        }
    }
}

/// Countdowns advanced by the game loop's elapsed time
#[derive(Debug, Default)]
pub struct TimerService {
    active: BTreeMap<TimerName, Countdown>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a countdown. The first tick is emitted on the next `advance`.
    pub fn start(&mut self, name: TimerName, duration_secs: u32, message_prefix: &'static str) {
        let replaced = self
            .active
            .insert(
                name,
                Countdown {
                    remaining: duration_secs,
                    carry: Duration::ZERO,
                    announced: false,
                    message_prefix,
                },
            )
            .is_some();
        debug!(timer = ?name, duration_secs, replaced, "Timer started");
    }

    /// Cancel without completing. No-op if not running.
    pub fn stop(&mut self, name: TimerName) {
        if self.active.remove(&name).is_some() {
            debug!(timer = ?name, "Timer stopped");
        }
    }

    pub fn stop_all(&mut self) {
        if !self.active.is_empty() {
            debug!(count = self.active.len(), "All timers stopped");
        }
        self.active.clear();
    }

    pub fn time_left(&self, name: TimerName) -> Option<u32> {
        self.active.get(&name).map(|c| c.remaining)
    }

    pub fn is_running(&self, name: TimerName) -> bool {
        self.active.contains_key(&name)
    }

    /// Advance every countdown by `dt`, returning ticks and completions in order.
    /// Completed timers are removed before this returns.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        let mut finished = Vec::new();

        for (name, countdown) in self.active.iter_mut() {
            if !countdown.announced {
                countdown.announced = true;
                events.push(countdown.tick_event(*name));
            } else {
                countdown.carry += dt;
            }

            while countdown.remaining > 0 && countdown.carry >= ONE_SECOND {
                countdown.carry -= ONE_SECOND;
                countdown.remaining -= 1;
                events.push(countdown.tick_event(*name));
            }

            if countdown.remaining == 0 {
                finished.push(*name);
                events.push(TimerEvent::Complete { name: *name });
            }
        }

        for name in finished {
            self.active.remove(&name);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn run_to_completion(timers: &mut TimerService, max_steps: usize) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        for _ in 0..max_steps {
            events.extend(timers.advance(TICK));
        }
        events
    }

    #[test]
    fn ten_second_countdown() {
        let mut timers = TimerService::new();
        timers.start(TimerName::SeekerRelease, 10, "Hunt in: ");

        let events = run_to_completion(&mut timers, 120);
        let ticks: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Tick { time_left, .. } => Some(*time_left),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, (0..=10).rev().collect::<Vec<u32>>());

        let completions = events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Complete { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(
            events.last(),
            Some(&TimerEvent::Complete {
                name: TimerName::SeekerRelease
            })
        );
        assert_eq!(timers.time_left(TimerName::SeekerRelease), None);
    }

    #[test]
    fn ticks_are_one_second_apart() {
        let mut timers = TimerService::new();
        timers.start(TimerName::GameReset, 5, "New game in: ");

        assert_eq!(timers.advance(TICK).len(), 1);
        for _ in 0..9 {
            assert!(timers.advance(TICK).is_empty());
        }
        assert_eq!(timers.advance(TICK).len(), 1);
        assert_eq!(timers.time_left(TimerName::GameReset), Some(4));
    }

    #[test]
    fn tick_message_uses_prefix() {
        let mut timers = TimerService::new();
        timers.start(TimerName::GameReset, 5, "New game in: ");
        let events = timers.advance(TICK);
        match events[0].countdown_msg() {
            Some(ServerMsg::CountdownUpdate {
                timer_name,
                time_left,
                message,
            }) => {
                assert_eq!(timer_name, TimerName::GameReset);
                assert_eq!(time_left, 5);
                assert_eq!(message, "New game in: 5s");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn stop_is_idempotent() {
        let mut timers = TimerService::new();
        timers.stop(TimerName::GameReset);

        timers.start(TimerName::GameReset, 3, "");
        timers.stop(TimerName::GameReset);
        timers.stop(TimerName::GameReset);
        assert!(!timers.is_running(TimerName::GameReset));
        assert!(run_to_completion(&mut timers, 50).is_empty());
    }

    #[test]
    fn stop_all_cancels_everything() {
        let mut timers = TimerService::new();
        timers.start(TimerName::GameReset, 3, "");
        timers.start(TimerName::SeekerRelease, 3, "");
        timers.stop_all();
        timers.stop_all();
        assert!(run_to_completion(&mut timers, 50).is_empty());
    }

    #[test]
    fn restart_replaces_running_timer() {
        let mut timers = TimerService::new();
        timers.start(TimerName::SeekerRelease, 10, "");
        run_to_completion(&mut timers, 35);
        assert_eq!(timers.time_left(TimerName::SeekerRelease), Some(7));

        timers.start(TimerName::SeekerRelease, 2, "");
        assert_eq!(timers.time_left(TimerName::SeekerRelease), Some(2));
        let completions = run_to_completion(&mut timers, 100)
            .into_iter()
            .filter(|e| matches!(e, TimerEvent::Complete { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut timers = TimerService::new();
        timers.start(TimerName::GameReset, 0, "");
        let events = timers.advance(TICK);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], TimerEvent::Complete { .. }));
    }
}
