//! Route handlers, one module per resource

pub mod alerts;
pub mod dashboard;
pub mod health;
pub mod services;
pub mod simulation;
