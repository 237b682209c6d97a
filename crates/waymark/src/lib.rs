//! Rule-driven request descriptor engine.
//!
//! Waymark turns a declarative rule set into validated, wire-ready request
//! descriptors, centralizing per-environment request policy (proxying,
//! credentials, header/parameter injection, URI rewriting) as data rather
//! than code.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  Engine (one validated RuleSet + credential file cache)   │
//! │                                                           │
//! │  Intent ─▶ validate ─▶ match rules ─▶ apply effects ─▶    │
//! │            normalize ─▶ Descriptor                        │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Triggers and actions are closed, named catalogs: serde enum renames make
//! every unknown name a parse error, so rule evaluation never misses a
//! lookup. The only state shared across builds is the read-through cache for
//! file-backed credentials; each build owns its accumulator.
//!
//! Transport lives in the companion `waymark-client` crate; this crate never
//! touches the network.

pub mod action;
pub mod builder;
pub mod credentials;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod intent;
pub mod matcher;
pub mod ruleset;
pub mod trigger;

pub use action::Action;
pub use credentials::FileCache;
pub use descriptor::{
    AgentOptions, Auth, Aws, Descriptor, OAuth, OAuthTransport, SignatureMethod,
};
pub use engine::Engine;
pub use error::{Error, Result};
pub use intent::{Intent, Method, Pair, PairValue};
pub use matcher::fired_effects;
pub use ruleset::{Condition, Effect, Rule, RuleSet};
pub use trigger::Trigger;
