//! File actions module.
//!
//! This module provides functionality for:
//! - Deletion planning with selection validation (pure, no filesystem access)
//! - Plan execution against the system trash via the `trash` crate
//!
//! # Safety
//!
//! Only validated plans reach the remover: a group's keep record can never
//! be planned for deletion and every group always retains at least one
//! survivor. Execution re-verifies each file against its discovery-time
//! record before removal.

pub mod delete;
pub mod plan;

// Re-export commonly used types
pub use delete::{execute_plan, CleanupSummary, DeleteProgress, Remover, TrashRemover};
pub use plan::{build_plan, plan_all_redundant, DeletionPlan, PlanEntry, PlanError, Selection};
