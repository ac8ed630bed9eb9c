//! # Router Module
//!
//! Path matching for the host [`App`](crate::server::App).
//!
//! Patterns use express-style parameters (`/pets/:id`); Swagger templates are
//! converted with [`from_template`]. Each pattern owns:
//!
//! - **guards**: path-level middleware run for every method (the 405/415/406
//!   checks attached at mount time live here)
//! - **chains**: one per method, run after the guards
//!
//! Lookup walks a radix tree of path segments, trying static segments before
//! parameters. Matching honours the app's `case sensitive routing` and
//! `strict routing` settings through [`MatchOptions`].

mod core;
mod radix;

pub use self::core::{from_template, Router};
pub use radix::{MatchOptions, PathEntry};
