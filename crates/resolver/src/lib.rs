//! # Content Resolver
//!
//! Turns raw reference tokens into concrete content items.
//!
//! ```text
//! Reference token
//!     │
//!     ├──> Path Resolver (SELF / family.version / bare path)
//!     │      └─> target, or fallback candidate
//!     │
//!     └──> Identity Resolver (internal id / morph name)
//!            ├─> resolved / missing
//!            └─> delayed ──> GlobalTieBreak (post-scan, deterministic)
//! ```

mod delayed;
mod identity;
mod path;
mod token;

pub use delayed::{DelayedQueue, DelayedReference, GlobalTieBreak};
pub use identity::{IdentityOutcome, IdentityResolver};
pub use path::{PathResolution, PathResolver};
pub use token::ReferenceToken;
