//! services/rate_limiter.rs
//! Rate limiter de ventana deslizante: lista de timestamps por key.
//! Las keys sin intentos vigentes se borran, así el mapa no crece sin límite.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct LimiterState {
    attempts: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_attempts: usize,
    window: Duration,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        RateLimiter {
            max_attempts,
            window,
            state: Arc::new(Mutex::new(LimiterState::default())),
        }
    }

    /// true si se permite el intento (y lo registra).
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Igual que `check` pero con el reloj explícito.
    /// Los intentos rechazados no se registran.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.sweep(&mut state, now);

        let timestamps = state.attempts.entry(key.to_string()).or_default();
        prune(timestamps, now, self.window);

        if timestamps.len() >= self.max_attempts {
            if timestamps.is_empty() {
                state.attempts.remove(key);
            }
            return false;
        }

        timestamps.push_back(now);
        true
    }

    // Como mucho una pasada completa por ventana
    fn sweep(&self, state: &mut LimiterState, now: Instant) {
        let due = match state.last_sweep {
            Some(last) => now.saturating_duration_since(last) >= self.window,
            None => true,
        };
        if !due {
            return;
        }

        let window = self.window;
        state.attempts.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
        state.last_sweep = Some(now);
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        match self.state.lock() {
            Ok(guard) => guard.attempts.len(),
            Err(poisoned) => poisoned.into_inner().attempts.len(),
        }
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
