//! # adaptest-algo - adaptive scoring core
//!
//! Pure-Rust scoring algorithms for a multistage (MST) English proficiency
//! test:
//!
//! - **3PL IRT Model** - three-parameter logistic response probability
//! - **EAP Estimator** - Bayesian ability estimation over a quadrature grid,
//!   with rapid-guessing detection
//! - **Stage Router** - interim-ability routing between Stage-2 tracks
//! - **Band Mapper** - ability-to-band tables (MST path and section-average
//!   path)
//!
//! The crate has no I/O and no async: every function is a total, deterministic
//! function of its inputs. Persistence, item authoring, and the HTTP surface
//! live in the consuming service.
//!
//! ## Module structure
//!
//! - [`types`] - items, response records, shared constants
//! - [`irt`] - 3PL probability model
//! - [`eap`] - Expected-A-Posteriori ability estimation
//! - [`routing`] - Stage-2 track routing
//! - [`bands`] - score-band mapping tables

pub mod bands;
pub mod eap;
pub mod irt;
pub mod routing;
pub mod types;

pub use bands::{mst_score, section_report, BandScore, SectionBands, SectionReport};
pub use eap::estimate_ability;
pub use irt::{probability, probability_with_discrimination};
pub use routing::{route, Track, ROUTE_THRESHOLD};
pub use types::{Answer, Irt3pl, Item, ItemBank, ResponseRecord, SpeechTask, TaskKind};
