//! Domain entities for DynaMouse.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code:
//!
//! - Contains the core rules of the application.
//! - Has **no** imports from OS APIs, device libraries, or async runtimes.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the domain is the geometry of the monitors and the rule that picks
//! the point where the cursor lands after a handoff.

/// Display rectangles and the activation-point policy.
///
/// See [`geometry::resolve_activation_point`] for the main rule.
pub mod geometry;
