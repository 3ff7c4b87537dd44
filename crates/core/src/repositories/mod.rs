//! Repository management modules.
//!
//! This module contains services for managing stored patient records.

pub mod patients;
