//! Pit Boss - Casino Floor Seat Occupancy Engine
//!
//! This crate implements the rating-slip lifecycle and seat-occupancy core
//! for a live casino floor: which seat at which table is claimed by which
//! play session, and how that changes under concurrent staff actions.
//!
//! Transport, authentication, and UI concerns live outside this crate; it
//! exposes typed operations and the storage contracts an adapter must satisfy.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
