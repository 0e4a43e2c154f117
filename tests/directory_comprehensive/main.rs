//! Directory Comprehensive Test Suite
//!
//! End-to-end behavior of `UserDirectory` over a real `Database`.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: View Properties** - round trip, uniqueness, rotation and
//!   deletion atomicity, session-only deletion, consistency fallback
//! - **Tier 2: Scenarios** - the alice/conflict/rotate walk-through under both
//!   rotation policies, the sign-in flow
//! - **Tier 3: Concurrency** - racing rotations, claims and deletions
//! - **Tier 4: Durability** - directory state across restarts
//! - **Tier 5: Generated Properties** - proptest over operation sequences
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test directory_comprehensive
//! cargo test --test directory_comprehensive rotation
//! ```

mod test_utils;

// Tier 1: View Properties
mod consistency_fallback;
mod deletion;
mod rotation;
mod round_trip;
mod uniqueness;

mod sign_in_flow;

// Tier 3: Concurrency
mod concurrent_sessions;

// Tier 4: Durability
mod restart;

// Tier 5: Generated Properties
mod generated;
