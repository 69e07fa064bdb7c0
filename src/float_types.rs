// Re-export parry for the active float size
pub use parry3d_f64 as parry3d;

// Our Real scalar type:
pub type Real = f64;

/// Distance below which a point is considered to lie on a plane, in metres.
pub const EPSILON: Real = 1e-8;

// Pi
/// Archimedes' constant (π)
pub const PI: Real = core::f64::consts::PI;

// Tau
/// The full circle constant (τ)
pub const TAU: Real = core::f64::consts::TAU;

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Unit conversion
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
/// One millimetre in model units (metres).
pub const MM: Real = 0.001;
