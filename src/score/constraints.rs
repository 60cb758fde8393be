//! Default task-assigning rule set.
//!
//! Two hard and six soft levels:
//!
//! | level  | rule |
//! |--------|------|
//! | hard 0 | assigned user is a potential owner and enabled |
//! | hard 1 | assigned user holds every required skill |
//! | soft 0 | work left in the planning user pool |
//! | soft 1 | end time of high-priority tasks |
//! | soft 2 | matched affinities (reward) |
//! | soft 3 | squared makespan per user (balances workload) |
//! | soft 4 | end time of medium-priority tasks |
//! | soft 5 | end time of low-priority tasks |
//!
//! The dummy assignment is never scored.

use rayon::prelude::*;

use super::{BendableScore, ScoreCalculator};
use crate::model::{PriorityLevel, TaskAssigningSolution, UserIdx};

pub const REQUIRED_POTENTIAL_OWNER: usize = 0;
pub const REQUIRED_SKILLS: usize = 1;

pub const PLANNING_USER_ASSIGNMENT: usize = 0;
pub const HIGH_LEVEL_PRIORITY: usize = 1;
pub const DESIRED_AFFINITIES: usize = 2;
pub const MINIMIZE_MAKESPAN: usize = 3;
pub const MEDIUM_LEVEL_PRIORITY: usize = 4;
pub const LOW_LEVEL_PRIORITY: usize = 5;

const HARD_LEVELS: usize = 2;
const SOFT_LEVELS: usize = 6;

type Levels = [i64; HARD_LEVELS + SOFT_LEVELS];

/// The built-in constraint set.
#[derive(Debug, Clone, Default)]
pub struct DefaultConstraints {
    parallel: bool,
}

impl DefaultConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores user chains in parallel with rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn score_user(solution: &TaskAssigningSolution, u: UserIdx) -> Levels {
        let mut levels: Levels = [0; HARD_LEVELS + SOFT_LEVELS];
        let soft = |level: usize| HARD_LEVELS + level;
        let user = solution.user(u);
        let is_pool = u == solution.planning_user();
        let mut makespan = 0i64;

        for a in solution.chain(u) {
            if solution.is_sentinel(a) {
                continue;
            }
            if is_pool {
                levels[soft(PLANNING_USER_ASSIGNMENT)] -= 1;
                continue;
            }
            let node = solution.assignment(a);
            let task = node.task();
            let end = node.end_time_in_minutes();

            if !user.enabled || !user.is_potential_owner(task) {
                levels[REQUIRED_POTENTIAL_OWNER] -= 1;
            }
            if !user.has_required_skills(task) {
                levels[REQUIRED_SKILLS] -= 1;
            }
            let priority_level = match task.priority_level() {
                PriorityLevel::High => HIGH_LEVEL_PRIORITY,
                PriorityLevel::Medium => MEDIUM_LEVEL_PRIORITY,
                PriorityLevel::Low => LOW_LEVEL_PRIORITY,
            };
            levels[soft(priority_level)] -= end;
            levels[soft(DESIRED_AFFINITIES)] += user.matched_affinities(task) as i64;
            makespan = makespan.max(end);
        }
        if !is_pool {
            levels[soft(MINIMIZE_MAKESPAN)] -= makespan * makespan;
        }
        levels
    }
}

fn add(mut a: Levels, b: Levels) -> Levels {
    for (x, y) in a.iter_mut().zip(b) {
        *x += y;
    }
    a
}

impl ScoreCalculator for DefaultConstraints {
    fn hard_levels(&self) -> usize {
        HARD_LEVELS
    }

    fn soft_levels(&self) -> usize {
        SOFT_LEVELS
    }

    fn calculate(&self, solution: &TaskAssigningSolution) -> BendableScore {
        let zero: Levels = [0; HARD_LEVELS + SOFT_LEVELS];
        let total = if self.parallel {
            let users: Vec<UserIdx> = solution.user_indices().collect();
            users
                .par_iter()
                .map(|&u| Self::score_user(solution, u))
                .reduce(|| zero, add)
        } else {
            solution
                .user_indices()
                .map(|u| Self::score_user(solution, u))
                .fold(zero, add)
        };
        BendableScore::of(
            total[..HARD_LEVELS].to_vec(),
            total[HARD_LEVELS..].to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::constants::{dummy_task_assignment, planning_user};
    use crate::model::{AssignmentIdx, ChainElement, Task, TaskAssignment, User};

    /// u1(HR, english) -> T0(HR) -> T1(IT, priority 0); pool -> dummy -> T2.
    fn solution() -> TaskAssigningSolution {
        let users = vec![
            planning_user(),
            User::new("u1", true)
                .with_group("HR")
                .with_skill("english")
                .with_affinity("news"),
        ];
        let assignments = vec![
            TaskAssignment::new(
                Task::new("T0")
                    .with_potential_group("HR")
                    .with_affinity("news")
                    .with_priority(8),
            )
            .with_previous(ChainElement::User(UserIdx(1))),
            TaskAssignment::new(
                Task::new("T1")
                    .with_potential_group("IT")
                    .with_required_skill("german")
                    .with_priority(0),
            )
            .with_previous(ChainElement::Assignment(AssignmentIdx(0))),
            TaskAssignment::new(Task::new("T2"))
                .with_previous(ChainElement::Assignment(AssignmentIdx(3))),
            dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0))),
        ];
        TaskAssigningSolution::new("s", users, assignments).unwrap()
    }

    #[test]
    fn test_default_levels() {
        let score = DefaultConstraints::new().calculate(&solution());
        assert_eq!(score.hard(), &[-1, -1]);
        // T1 ends at 2, T0 ends at 1, makespan 2.
        assert_eq!(score.soft(), &[-1, -2, 1, -4, 0, -1]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let s = solution();
        let seq = DefaultConstraints::new().calculate(&s);
        let par = DefaultConstraints::new().with_parallel(true).calculate(&s);
        assert_eq!(seq, par);
    }

    #[test]
    fn test_disabled_user_is_hard_violation() {
        let users = vec![planning_user(), User::new("u1", false).with_group("HR")];
        let assignments = vec![
            TaskAssignment::new(Task::new("T0").with_potential_group("HR"))
                .with_previous(ChainElement::User(UserIdx(1))),
            dummy_task_assignment(),
        ];
        let s = TaskAssigningSolution::new("s", users, assignments).unwrap();
        let score = DefaultConstraints::new().calculate(&s);
        assert_eq!(score.hard()[REQUIRED_POTENTIAL_OWNER], -1);
    }

    #[test]
    fn test_dummy_is_never_scored() {
        let s = TaskAssigningSolution::new(
            "s",
            vec![planning_user()],
            vec![dummy_task_assignment().with_previous(ChainElement::User(UserIdx(0)))],
        )
        .unwrap();
        assert_eq!(
            DefaultConstraints::new().calculate(&s),
            BendableScore::zero(2, 6)
        );
    }
}
