//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod feedback_model;
pub mod health_model;
pub mod recording_model;
pub mod twilio_model;
pub mod twiml_model;
