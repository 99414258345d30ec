//! services/feedback_service.rs
//! Bus publish/subscribe de feedback. Lo crea main y se comparte por web::Data.
//! Hay una sola superficie montada; sin superficie los mensajes se encolan (FIFO).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::models::feedback_model::FeedbackMessage;

pub type FeedbackHandler = Arc<dyn Fn(&FeedbackMessage) + Send + Sync>;

struct Surface {
    id: u64,
    handler: FeedbackHandler,
}

#[derive(Default)]
struct BusState {
    pending: VecDeque<FeedbackMessage>,
    surface: Option<Surface>,
    next_id: u64,
    // Mientras la superficie nueva recibe el backlog, publish encola
    draining: bool,
}

#[derive(Clone, Default)]
pub struct FeedbackBus {
    state: Arc<Mutex<BusState>>,
}

/// Devuelta por `subscribe`; `unsubscribe` desmonta la superficie.
pub struct Subscription {
    id: u64,
    state: Arc<Mutex<BusState>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let mut state = lock(&self.state);
        // Solo si sigue siendo la superficie montada
        if state.surface.as_ref().map(|s| s.id) == Some(self.id) {
            state.surface = None;
        }
    }
}

impl FeedbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, message: FeedbackMessage) {
        let handler = {
            let mut state = lock(&self.state);
            let mounted = if state.draining {
                None
            } else {
                state.surface.as_ref().map(|s| s.handler.clone())
            };
            match mounted {
                Some(handler) => handler,
                None => {
                    state.pending.push_back(message);
                    return;
                }
            }
        };
        handler(&message);
    }

    /// Monta `handler` como la superficie actual (reemplaza a la anterior)
    /// y le entrega en orden lo que estaba encolado.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&FeedbackMessage) + Send + Sync + 'static,
    {
        let handler: FeedbackHandler = Arc::new(handler);
        let id = {
            let mut state = lock(&self.state);
            state.next_id += 1;
            let id = state.next_id;
            state.surface = Some(Surface {
                id,
                handler: handler.clone(),
            });
            state.draining = true;
            id
        };

        // Uno a uno, sin el lock: lo que se publique mientras tanto
        // (incluso desde el handler) va detrás en la cola.
        loop {
            let next = {
                let mut state = lock(&self.state);
                if state.surface.as_ref().map(|s| s.id) != Some(id) {
                    // Reemplazada: la nueva superficie termina de vaciar
                    if state.surface.is_none() {
                        state.draining = false;
                    }
                    break;
                }
                match state.pending.pop_front() {
                    Some(message) => message,
                    None => {
                        state.draining = false;
                        break;
                    }
                }
            };
            handler(&next);
        }

        Subscription {
            id,
            state: self.state.clone(),
        }
    }
}

fn lock(state: &Mutex<BusState>) -> std::sync::MutexGuard<'_, BusState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
