//! Subcommand implementations.

/// Base-versus-target comparison reports.
pub mod compare;

/// Loading the project and building coordinators.
pub mod project;

/// Provider listing command handler.
pub mod providers;

/// Commands that edit and translate entries.
pub mod sync;

/// Target listing command handler.
pub mod targets;
