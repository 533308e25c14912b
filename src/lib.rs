//! Emergency Traffic Simulation Library
//!
//! Civilian traffic and emergency responders on a rectilinear road grid,
//! runnable headless or embedded in another front end.

pub mod simulation;
