pub mod bgroup;
pub mod decision;
pub mod entry;
pub mod expdta;
pub mod provenance;
pub mod refprog;
pub mod remarks;
pub mod serialization;
pub mod tlsanl;
pub mod traits;
pub mod transform;
pub mod verification;

pub use decision::{RefinementDecisionEngine, RefinementOutcome};
pub use entry::{EntryCollaborators, EntryOutcome, create_bdb_entry, prepare_entry_dir};
pub use expdta::UnsupportedMethodLedger;
pub use refprog::TextNormalizer;
pub use tlsanl::TlsanlRunner;
pub use traits::{DeconvolutionRequest, DeconvolutionRun, ResidualDeconvolver};
