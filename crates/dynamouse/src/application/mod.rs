//! Application layer: the cursor-ownership handoff engine.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules, here in `dynamouse-core`) and the infrastructure (OS, devices,
//! files).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain objects to fulfil a user goal ("whichever mouse
//!   moved last owns the cursor").
//! - **Depends on abstractions** (the traits in [`ports`]) rather than concrete
//!   devices or displays.
//! - **Contains no OS calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`ports`** – Traits for the external collaborators: pointer devices,
//!   the device manager, the display registry, and the cursor primitive.
//!
//! - **`assignment`** – One mouse bound to one display, plus whether it owns
//!   the cursor and where the cursor was when it last gave ownership up.
//!
//! - **`assignment_table`** – The coordinator.  Rebuilds the assignments from
//!   the device → display mapping and runs the handoff protocol, one handoff
//!   at a time.

pub mod assignment;
pub mod assignment_table;
pub mod ports;
