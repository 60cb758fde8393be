//! Input validation for assignment problems.
//!
//! Checks the chain invariants of producer-supplied data before a solution
//! is built. Detects:
//! - Duplicate user or task IDs
//! - Missing sentinel anchors
//! - Links to users or assignments that do not exist
//! - Branching chains (two assignments sharing a predecessor)
//! - Cycles (chains that never reach a user)
//! - Pinned assignments that are not chained, and a pinned or misplaced dummy

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::constants::{DUMMY_TASK_ID, PLANNING_USER_ID};
use super::{ChainElement, TaskAssignment, User};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A violated input invariant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationErrorKind {
    /// Two users or two tasks share the same ID.
    DuplicateId,
    /// The planning user is absent.
    MissingPlanningUser,
    /// The dummy assignment is absent.
    MissingDummyAssignment,
    /// A predecessor link points outside the solution.
    DanglingReference,
    /// Two assignments claim the same predecessor.
    BranchingChain,
    /// Following predecessor links never reaches a user.
    CyclicChain,
    /// A pinned assignment has no position to be frozen in.
    PinnedUnassigned,
    /// The dummy assignment is pinned or chained outside the pool.
    MisplacedSentinel,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates producer data for a task-assigning solution.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
/// Link-level checks run only once ids and references are sound.
pub fn validate_input(users: &[User], assignments: &[TaskAssignment]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut user_ids = HashSet::new();
    for u in users {
        if !user_ids.insert(u.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate user ID: {}", u.id),
            ));
        }
    }
    let mut task_ids = HashSet::new();
    for a in assignments {
        if !task_ids.insert(a.task.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", a.task.id),
            ));
        }
    }

    if !user_ids.contains(PLANNING_USER_ID) {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingPlanningUser,
            format!("Planning user '{PLANNING_USER_ID}' is missing"),
        ));
    }
    if !task_ids.contains(DUMMY_TASK_ID) {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingDummyAssignment,
            format!("Dummy assignment '{DUMMY_TASK_ID}' is missing"),
        ));
    }

    for a in assignments {
        let dangling = match a.previous_element {
            Some(ChainElement::User(u)) => u.0 >= users.len(),
            Some(ChainElement::Assignment(p)) => p.0 >= assignments.len(),
            None => false,
        };
        if dangling {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Assignment '{}' references unknown predecessor {}",
                    a.task.id,
                    a.previous_element.map(|p| p.to_string()).unwrap_or_default()
                ),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut claimed: HashMap<ChainElement, usize> = HashMap::new();
    for (i, a) in assignments.iter().enumerate() {
        if let Some(prev) = a.previous_element {
            if let Some(&other) = claimed.get(&prev) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::BranchingChain,
                    format!(
                        "Assignments '{}' and '{}' share predecessor {}",
                        assignments[other].task.id, a.task.id, prev
                    ),
                ));
            } else {
                claimed.insert(prev, i);
            }
        }
        if a.pinned && a.previous_element.is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::PinnedUnassigned,
                format!("Pinned assignment '{}' is not chained", a.task.id),
            ));
        }
    }

    // Walk predecessor links back to the anchoring user.
    let mut reported = HashSet::new();
    for (i, a) in assignments.iter().enumerate() {
        if a.previous_element.is_none() {
            continue;
        }
        let mut cursor = a.previous_element;
        let mut steps = 0usize;
        let anchor = loop {
            match cursor {
                Some(ChainElement::User(u)) => break Some(u),
                Some(ChainElement::Assignment(p)) => {
                    steps += 1;
                    if steps > assignments.len() {
                        break None;
                    }
                    cursor = assignments[p.0].previous_element;
                }
                None => break None,
            }
        };
        match anchor {
            None => {
                // A chain ending in an unchained node is broken too.
                if reported.insert(i) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::CyclicChain,
                        format!(
                            "Assignment '{}' does not lead back to a user",
                            a.task.id
                        ),
                    ));
                }
            }
            Some(u) => {
                if a.task.id == DUMMY_TASK_ID && users[u.0].id != PLANNING_USER_ID {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::MisplacedSentinel,
                        format!("Dummy assignment is chained to user '{}'", users[u.0].id),
                    ));
                }
            }
        }
        if a.task.id == DUMMY_TASK_ID && a.pinned {
            errors.push(ValidationError::new(
                ValidationErrorKind::MisplacedSentinel,
                "Dummy assignment must not be pinned",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
