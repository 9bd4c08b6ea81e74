//! Program assignment domain models.
//!
//! An assignment links a program to a patient user and tracks progress and
//! completion streaks at the program's cadence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ProgramCadence;

/// A program assigned to a patient.
#[derive(Debug, Clone)]
pub struct ProgramAssignment {
    pub id: Uuid,
    pub program_id: Uuid,
    pub user_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub progress: f64,
    pub current_task_index: i32,
    pub streak_count: i32,
    pub best_streak: i32,
    pub last_completion_date: Option<DateTime<Utc>>,
}

/// Request to assign a program to a patient user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignProgramRequest {
    pub user_id: Uuid,
}

/// Request to record progress on an assignment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    /// Overall progress in [0, 1].
    #[validate(range(min = 0.0, max = 1.0, message = "Progress must be between 0 and 1"))]
    pub progress: f64,

    /// Index of the task the patient is currently on.
    #[validate(range(min = 0, message = "Task index must be non-negative"))]
    pub current_task_index: i32,

    /// Set when this update completes a cadence unit (advances the streak).
    #[serde(default)]
    pub completed_unit: bool,
}

/// Assignment as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub program_id: Uuid,
    pub user_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub progress: f64,
    pub current_task_index: i32,
    pub streak_count: i32,
    pub best_streak: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completion_date: Option<DateTime<Utc>>,
}

impl From<ProgramAssignment> for AssignmentResponse {
    fn from(assignment: ProgramAssignment) -> Self {
        Self {
            id: assignment.id,
            program_id: assignment.program_id,
            user_id: assignment.user_id,
            assigned_at: assignment.assigned_at,
            completed_at: assignment.completed_at,
            is_active: assignment.is_active,
            progress: assignment.progress,
            current_task_index: assignment.current_task_index,
            streak_count: assignment.streak_count,
            best_streak: assignment.best_streak,
            last_completion_date: assignment.last_completion_date,
        }
    }
}

/// Query parameters for listing assignments.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListAssignmentsQuery {
    /// Filter by assigned user.
    pub user_id: Option<Uuid>,

    /// Restrict to active assignments.
    pub active: Option<bool>,
}

/// Outcome of applying a cadence-unit completion to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak_count: i32,
    pub best_streak: i32,
}

/// Advances a streak for a completion at `now`.
///
/// The streak increments when the previous completion happened within one
/// cadence unit (same-day repeats keep the count), and resets to 1 after a
/// gap. `best_streak` is monotone.
pub fn advance_streak(
    streak_count: i32,
    best_streak: i32,
    last_completion: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cadence: ProgramCadence,
) -> StreakUpdate {
    let unit_days = cadence.days();

    let new_count = match last_completion {
        None => 1,
        Some(last) => {
            let elapsed_days = (now.date_naive() - last.date_naive()).num_days();
            if elapsed_days <= 0 {
                // Another completion inside the same cadence unit.
                streak_count.max(1)
            } else if elapsed_days <= unit_days {
                streak_count + 1
            } else {
                1
            }
        }
    };

    StreakUpdate {
        streak_count: new_count,
        best_streak: best_streak.max(new_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_first_completion_starts_streak() {
        let update = advance_streak(0, 0, None, Utc::now(), ProgramCadence::Daily);
        assert_eq!(update.streak_count, 1);
        assert_eq!(update.best_streak, 1);
    }

    #[test]
    fn test_consecutive_day_increments() {
        let now = Utc::now();
        let update = advance_streak(
            3,
            5,
            Some(now - Duration::days(1)),
            now,
            ProgramCadence::Daily,
        );
        assert_eq!(update.streak_count, 4);
        assert_eq!(update.best_streak, 5);
    }

    #[test]
    fn test_gap_resets_streak() {
        let now = Utc::now();
        let update = advance_streak(
            6,
            6,
            Some(now - Duration::days(3)),
            now,
            ProgramCadence::Daily,
        );
        assert_eq!(update.streak_count, 1);
        assert_eq!(update.best_streak, 6, "best streak never regresses");
    }

    #[test]
    fn test_same_day_repeat_keeps_count() {
        let now = Utc::now();
        let update = advance_streak(2, 2, Some(now), now, ProgramCadence::Daily);
        assert_eq!(update.streak_count, 2);
    }

    #[test]
    fn test_weekly_cadence_allows_seven_day_gap() {
        let now = Utc::now();
        let update = advance_streak(
            1,
            1,
            Some(now - Duration::days(7)),
            now,
            ProgramCadence::Weekly,
        );
        assert_eq!(update.streak_count, 2);

        let lapsed = advance_streak(
            2,
            2,
            Some(now - Duration::days(8)),
            now,
            ProgramCadence::Weekly,
        );
        assert_eq!(lapsed.streak_count, 1);
    }

    #[test]
    fn test_best_streak_follows_new_record() {
        let now = Utc::now();
        let update = advance_streak(
            5,
            5,
            Some(now - Duration::days(1)),
            now,
            ProgramCadence::Daily,
        );
        assert_eq!(update.streak_count, 6);
        assert_eq!(update.best_streak, 6);
    }

    #[test]
    fn test_update_progress_request_validation() {
        let valid = UpdateProgressRequest {
            progress: 0.5,
            current_task_index: 2,
            completed_unit: false,
        };
        assert!(valid.validate().is_ok());

        let out_of_range = UpdateProgressRequest {
            progress: 1.5,
            current_task_index: 0,
            completed_unit: false,
        };
        assert!(out_of_range.validate().is_err());

        let negative_index = UpdateProgressRequest {
            progress: 0.0,
            current_task_index: -1,
            completed_unit: false,
        };
        assert!(negative_index.validate().is_err());
    }
}
