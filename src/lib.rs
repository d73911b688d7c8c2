//! # randexp
//!
//! Generates strings that match a regular expression.
//!
//! ```
//! use randexp::Engine;
//!
//! let engine = Engine::compile(r"(ab|cd)e", "").unwrap();
//!
//! // Free generation.
//! let generation = engine.generate(None).unwrap();
//! assert!(generation.output == "abe" || generation.output == "cde");
//!
//! // Steered toward a target: the closest string the pattern can produce.
//! let steered = engine.generate(Some("abf")).unwrap();
//! assert_eq!(steered.output, "abe");
//!
//! // Replayed from the recorded decisions.
//! let replayed = engine.generate_from_log(steered.decisions.as_slice()).unwrap();
//! assert_eq!(replayed.output, "abe");
//! ```

pub mod cache;
pub mod charset;
pub mod config;
pub mod error;
pub mod generate;
pub mod regex;

pub use cache::{RegexExt, engine_for, randexp};
pub use charset::CharRange;
pub use config::{Flags, GeneratorConfig, RandomSource, SeededRandom, ThreadRandom};
pub use error::{RandexpError, Result};
pub use generate::{DecisionLog, Engine, Generation, PatternSource};
