//! Document validation and error reporting
//!
//! A [`Validator`] walks a document against one compiled sub-schema and
//! collects every violation, in a deterministic order, into a
//! [`ValidationOutcome`]. Bytes that do not decode at all are a
//! [`SystemError`] instead.
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

pub mod error;
pub mod path;
pub mod report;
pub mod validator;

pub use error::{SystemError, ValidationError, ValidationOutcome};
pub use path::{InstancePath, PathSegment};
pub use report::{ErrorReporter, Keyword, RawViolation, ViolationKind};
pub use validator::{ValidationConfig, Validator};
