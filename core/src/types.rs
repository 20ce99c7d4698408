//! Shared primitive types used across the pipeline.

/// Identifier of a single loan application. Unique within a batch.
pub type ApplicationId = String;

/// Identifier of a customer. May repeat across applications.
pub type CustomerId = String;

/// A trailing aggregation window, in whole days.
pub type WindowDays = u32;

/// The canonical scoring batch identifier.
pub type BatchId = String;
