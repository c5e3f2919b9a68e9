//! Rewrite policies built on the transformation engine.

pub mod broken;
pub mod loose;
pub mod typedefs;
pub mod verify;

pub use broken::ExtractBrokenDeclarations;
pub use loose::WrapLooseDeclarations;
pub use typedefs::StripTypedefs;
pub use verify::{Verifier, VerifyIssue, verify};
