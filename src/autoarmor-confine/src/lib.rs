//! Autoarmor Confine - Mandatory-access-control confinement for build
//! jobs.
//!
//! Every external command a build job launches is wrapped by an
//! AppArmor confinement wrapper, chosen once per job at setup time:
//!
//! 1. [`resolve_channel`] reads the configuration snapshot, probes the
//!    host through [`ConfinementProbe`], and produces an
//!    [`ExecutionChannel`] - either pass-through or confined - or
//!    aborts the job with a specific [`ConfineError`].
//! 2. The confined channel prepends the wrapper prefix to every launch
//!    while preserving argument order, working directory, environment,
//!    and output masking ([`transform`]).
//! 3. [`verify_confinement`] then actively disproves or confirms the
//!    confinement before the job's real commands run.
//!
//! The external profile tools (`autoarmor-wrapper`,
//! `autoarmor-genprof`) and the kernel module are opaque; this crate
//! only invokes them by name and interprets exit codes.

pub mod channel;
pub mod config;
pub mod decision;
pub mod error;
pub mod probe;
pub mod sanity;
pub mod transform;


pub use channel::{ConfinedChannel, ExecutionChannel};
pub use config::{ConfineConfig, ConfinementMode};
pub use decision::resolve_channel;
pub use error::{ConfineError, Result};
pub use probe::{ConfinementProbe, ProfileIdentity};
pub use sanity::verify_confinement;
