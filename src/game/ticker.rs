//! Drop timer: fires once per interval unless halted, paused or held for an animation.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last_fire: Instant,
    halted: bool,
    paused: bool,
    /// Held while the UI animates a ring clear.
    held: bool,
}

impl Ticker {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_fire: now,
            halted: false,
            paused: false,
            held: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes effect from the next period.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_running(&self) -> bool {
        !self.halted && !self.paused && !self.held
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        let was_running = self.is_running();
        self.paused = paused;
        self.restart_period_if_resumed(was_running, now);
    }

    pub fn hold(&mut self) {
        self.held = true;
    }

    pub fn release(&mut self, now: Instant) {
        let was_running = self.is_running();
        self.held = false;
        self.restart_period_if_resumed(was_running, now);
    }

    /// A suspended timer starts a full period when it resumes.
    fn restart_period_if_resumed(&mut self, was_running: bool, now: Instant) {
        if !was_running && self.is_running() {
            self.last_fire = now;
        }
    }

    /// True once per elapsed interval while running.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        if now.saturating_duration_since(self.last_fire) >= self.interval {
            self.last_fire = now;
            return true;
        }
        false
    }

    /// Time left until the next fire, if running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.is_running()
            .then(|| self.interval.saturating_sub(now.saturating_duration_since(self.last_fire)))
    }
}
