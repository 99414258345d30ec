//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (webhooks de Twilio, proxy, salud, etc.).

pub mod agent_handler;
pub mod health_handler;
pub mod proxy_handler;
pub mod responses;
pub mod twilio_handler;
