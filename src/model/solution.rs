//! The solution arena and its chain operations.
//!
//! Users and assignments live in two vectors addressed by [`UserIdx`] and
//! [`AssignmentIdx`]. Every chain is a singly anchored, doubly linked list:
//! a user points at its first assignment, every chained assignment points
//! back at its predecessor and forward at its successor.
//!
//! Mutators validate the whole request before touching any field, so a
//! failed call leaves the solution unchanged. A mutation may never move or
//! unlink a pinned assignment, nor change the predecessor of one.

use std::fmt;

use super::constants::{DUMMY_TASK_ID, PLANNING_USER_ID};
use super::validation::validate_input;
use super::{AssignmentIdx, ChainElement, TaskAssignment, User, UserIdx};
use crate::error::SolverError;
use crate::score::BendableScore;

/// Aggregate root: all users, all assignments and the current score.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskAssigningSolution {
    id: String,
    users: Vec<User>,
    assignments: Vec<TaskAssignment>,
    score: Option<BendableScore>,
    planning_user: UserIdx,
    dummy: AssignmentIdx,
}

/// Iterator over the assignments of one chain, head first.
pub struct ChainIter<'a> {
    solution: &'a TaskAssigningSolution,
    cursor: Option<AssignmentIdx>,
    remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = AssignmentIdx;

    fn next(&mut self) -> Option<AssignmentIdx> {
        // Bounded by the arena size so a corrupted chain cannot spin.
        if self.remaining == 0 {
            return None;
        }
        let current = self.cursor?;
        self.remaining -= 1;
        self.cursor = self.solution.assignments[current.0].next_element;
        Some(current)
    }
}

impl TaskAssigningSolution {
    /// Builds a solution from producer data.
    ///
    /// Only `previous_element` links and `pinned` flags are read from the
    /// assignments; successor links, the user cache and times are derived.
    ///
    /// # Errors
    /// [`SolverError::InvalidProblem`] listing every violated invariant.
    pub fn new(
        id: impl Into<String>,
        users: Vec<User>,
        assignments: Vec<TaskAssignment>,
    ) -> Result<Self, SolverError> {
        validate_input(&users, &assignments).map_err(SolverError::InvalidProblem)?;

        let planning_user = users
            .iter()
            .position(|u| u.id == PLANNING_USER_ID)
            .map(UserIdx)
            .ok_or_else(|| SolverError::structural("planning user missing"))?;
        let dummy = assignments
            .iter()
            .position(|a| a.task.id == DUMMY_TASK_ID)
            .map(AssignmentIdx)
            .ok_or_else(|| SolverError::structural("dummy assignment missing"))?;

        let mut solution = Self {
            id: id.into(),
            users,
            assignments,
            score: None,
            planning_user,
            dummy,
        };
        solution.derive_links();
        Ok(solution)
    }

    fn derive_links(&mut self) {
        for u in &mut self.users {
            u.next_element = None;
        }
        for a in &mut self.assignments {
            a.next_element = None;
            a.user = None;
        }
        for i in 0..self.assignments.len() {
            if let Some(prev) = self.assignments[i].previous_element {
                self.set_next(prev, Some(AssignmentIdx(i)));
            }
        }
        for u in 0..self.users.len() {
            self.refresh_chain(UserIdx(u));
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn assignments(&self) -> &[TaskAssignment] {
        &self.assignments
    }

    pub fn user(&self, idx: UserIdx) -> &User {
        &self.users[idx.0]
    }

    pub fn assignment(&self, idx: AssignmentIdx) -> &TaskAssignment {
        &self.assignments[idx.0]
    }

    pub fn score(&self) -> Option<&BendableScore> {
        self.score.as_ref()
    }

    pub(crate) fn set_score(&mut self, score: BendableScore) {
        self.score = Some(score);
    }

    /// The unassigned-pool user.
    pub fn planning_user(&self) -> UserIdx {
        self.planning_user
    }

    /// The placeholder assignment.
    pub fn dummy_assignment(&self) -> AssignmentIdx {
        self.dummy
    }

    pub fn is_sentinel(&self, a: AssignmentIdx) -> bool {
        a == self.dummy
    }

    /// Whether local search may move the assignment.
    pub fn is_movable(&self, a: AssignmentIdx) -> bool {
        !self.assignments[a.0].pinned && !self.is_sentinel(a)
    }

    pub fn find_user(&self, id: &str) -> Option<UserIdx> {
        self.users.iter().position(|u| u.id == id).map(UserIdx)
    }

    pub fn find_task(&self, id: &str) -> Option<AssignmentIdx> {
        self.assignments
            .iter()
            .position(|a| a.task.id == id)
            .map(AssignmentIdx)
    }

    pub fn user_indices(&self) -> impl Iterator<Item = UserIdx> {
        (0..self.users.len()).map(UserIdx)
    }

    pub fn assignment_indices(&self) -> impl Iterator<Item = AssignmentIdx> {
        (0..self.assignments.len()).map(AssignmentIdx)
    }

    /// Assignments local search may move, in arena order.
    pub fn movable_assignments(&self) -> Vec<AssignmentIdx> {
        self.assignment_indices()
            .filter(|&a| self.is_movable(a))
            .collect()
    }

    /// Number of unchained assignments, the dummy excluded.
    pub fn uninitialized_count(&self) -> usize {
        self.assignment_indices()
            .filter(|&a| !self.is_sentinel(a) && !self.assignments[a.0].is_initialized())
            .count()
    }

    // ---- navigation ----

    pub fn head_of(&self, user: UserIdx) -> Option<AssignmentIdx> {
        self.users[user.0].next_element
    }

    pub fn next(&self, a: AssignmentIdx) -> Option<AssignmentIdx> {
        self.assignments[a.0].next_element
    }

    pub fn previous(&self, a: AssignmentIdx) -> Option<ChainElement> {
        self.assignments[a.0].previous_element
    }

    pub fn user_of(&self, a: AssignmentIdx) -> Option<UserIdx> {
        self.assignments[a.0].user
    }

    /// Successor of any chain element.
    pub fn next_of(&self, element: ChainElement) -> Option<AssignmentIdx> {
        match element {
            ChainElement::User(u) => self.users[u.0].next_element,
            ChainElement::Assignment(a) => self.assignments[a.0].next_element,
        }
    }

    /// User anchoring the chain the element belongs to.
    pub fn anchor_of(&self, element: ChainElement) -> Option<UserIdx> {
        match element {
            ChainElement::User(u) => Some(u),
            ChainElement::Assignment(a) => self.assignments[a.0].user,
        }
    }

    /// Assignments of a user's chain, head first.
    pub fn chain(&self, user: UserIdx) -> ChainIter<'_> {
        ChainIter {
            solution: self,
            cursor: self.users[user.0].next_element,
            remaining: self.assignments.len(),
        }
    }

    pub fn chain_len(&self, user: UserIdx) -> usize {
        self.chain(user).count()
    }

    /// Whether `a` precedes `b` in the same chain.
    pub fn is_chained_before(&self, a: AssignmentIdx, b: AssignmentIdx) -> bool {
        if a == b || self.assignments[a.0].user.is_none() {
            return false;
        }
        let mut cursor = self.assignments[a.0].next_element;
        let mut steps = 0;
        while let Some(c) = cursor {
            if c == b {
                return true;
            }
            steps += 1;
            if steps > self.assignments.len() {
                break;
            }
            cursor = self.assignments[c.0].next_element;
        }
        false
    }

    /// Contiguous segment `first..=last`, or `None` if `last` does not
    /// follow `first` in the same chain.
    pub fn segment(&self, first: AssignmentIdx, last: AssignmentIdx) -> Option<Vec<AssignmentIdx>> {
        if !self.assignments[first.0].is_initialized() {
            return None;
        }
        let mut nodes = vec![first];
        let mut cursor = first;
        while cursor != last {
            cursor = self.assignments[cursor.0].next_element?;
            nodes.push(cursor);
            if nodes.len() > self.assignments.len() {
                return None;
            }
        }
        Some(nodes)
    }

    /// Whether every chain is acyclic and every chained assignment is
    /// reachable from exactly one user head with consistent back links.
    pub fn check_integrity(&self) -> Result<(), SolverError> {
        let mut seen = vec![false; self.assignments.len()];
        for u in self.user_indices() {
            let mut expected_prev = ChainElement::User(u);
            let mut cursor = self.head_of(u);
            while let Some(a) = cursor {
                if seen[a.0] {
                    return Err(SolverError::structural(format!(
                        "assignment {a} reached twice"
                    )));
                }
                seen[a.0] = true;
                let node = &self.assignments[a.0];
                if node.previous_element != Some(expected_prev) {
                    return Err(SolverError::structural(format!(
                        "assignment {a} has inconsistent back link"
                    )));
                }
                if node.user != Some(u) {
                    return Err(SolverError::structural(format!(
                        "assignment {a} has stale user cache"
                    )));
                }
                expected_prev = ChainElement::Assignment(a);
                cursor = node.next_element;
            }
        }
        for (i, a) in self.assignments.iter().enumerate() {
            if a.is_initialized() != seen[i] {
                return Err(SolverError::structural(format!(
                    "assignment {} is detached from every chain",
                    AssignmentIdx(i)
                )));
            }
        }
        Ok(())
    }

    // ---- validation helpers ----

    fn check_index(&self, a: AssignmentIdx) -> Result<(), SolverError> {
        if a.0 >= self.assignments.len() {
            return Err(SolverError::structural(format!("unknown assignment {a}")));
        }
        Ok(())
    }

    fn check_anchor(&self, element: ChainElement) -> Result<UserIdx, SolverError> {
        match element {
            ChainElement::User(u) => {
                if u.0 >= self.users.len() {
                    return Err(SolverError::structural(format!("unknown user {u}")));
                }
                Ok(u)
            }
            ChainElement::Assignment(a) => {
                self.check_index(a)?;
                self.assignments[a.0].user.ok_or_else(|| {
                    SolverError::structural(format!("anchor {a} is not chained"))
                })
            }
        }
    }

    fn check_predecessor_changeable(&self, a: Option<AssignmentIdx>) -> Result<(), SolverError> {
        match a {
            Some(a) if self.assignments[a.0].pinned => Err(SolverError::structural(format!(
                "predecessor of pinned assignment {a} would change"
            ))),
            _ => Ok(()),
        }
    }

    fn check_free(&self, a: AssignmentIdx) -> Result<(), SolverError> {
        if self.assignments[a.0].pinned {
            return Err(SolverError::structural(format!(
                "pinned assignment {a} cannot move"
            )));
        }
        Ok(())
    }

    fn check_sentinel_target(&self, a: AssignmentIdx, user: UserIdx) -> Result<(), SolverError> {
        if self.is_sentinel(a) && user != self.planning_user {
            return Err(SolverError::structural(
                "dummy assignment must stay in the planning user chain",
            ));
        }
        Ok(())
    }

    // ---- mutators ----

    /// Chains an unchained assignment directly after `after`.
    pub fn insert(&mut self, a: AssignmentIdx, after: ChainElement) -> Result<(), SolverError> {
        self.check_index(a)?;
        self.check_free(a)?;
        if self.assignments[a.0].is_initialized() {
            return Err(SolverError::structural(format!("{a} is already chained")));
        }
        if after == ChainElement::Assignment(a) {
            return Err(SolverError::structural(format!("{a} cannot follow itself")));
        }
        let user = self.check_anchor(after)?;
        self.check_sentinel_target(a, user)?;
        self.check_predecessor_changeable(self.next_of(after))?;

        self.attach(a, a, after);
        self.refresh_chain(user);
        Ok(())
    }

    /// Unchains an assignment, relinking its neighbours.
    pub fn remove(&mut self, a: AssignmentIdx) -> Result<(), SolverError> {
        self.check_index(a)?;
        self.check_free(a)?;
        if self.is_sentinel(a) {
            return Err(SolverError::structural("dummy assignment cannot be unchained"));
        }
        let user = self.assignments[a.0]
            .user
            .ok_or_else(|| SolverError::structural(format!("{a} is not chained")))?;
        self.check_predecessor_changeable(self.assignments[a.0].next_element)?;

        self.detach(a, a);
        self.assignments[a.0].user = None;
        self.assignments[a.0].start_time_in_minutes = 0;
        self.assignments[a.0].end_time_in_minutes = 0;
        self.refresh_chain(user);
        Ok(())
    }

    /// Moves the contiguous segment `first..=last` so that it follows
    /// `new_previous`, keeping its internal order.
    pub fn move_subchain(
        &mut self,
        first: AssignmentIdx,
        last: AssignmentIdx,
        new_previous: ChainElement,
    ) -> Result<(), SolverError> {
        self.check_index(first)?;
        self.check_index(last)?;
        let segment = self.segment(first, last).ok_or_else(|| {
            SolverError::structural(format!("{first}..{last} is not a chained segment"))
        })?;
        let target_user = self.check_anchor(new_previous)?;
        for &s in &segment {
            self.check_free(s)?;
            self.check_sentinel_target(s, target_user)?;
            if new_previous == ChainElement::Assignment(s) {
                return Err(SolverError::structural(format!(
                    "{s} cannot follow its own segment"
                )));
            }
        }
        if self.assignments[first.0].previous_element == Some(new_previous) {
            return Ok(());
        }
        self.check_predecessor_changeable(self.assignments[last.0].next_element)?;
        self.check_predecessor_changeable(self.next_of(new_previous))?;

        let source_user = self.assignments[first.0].user;
        self.detach(first, last);
        self.attach(first, last, new_previous);
        if let Some(u) = source_user {
            self.refresh_chain(u);
        }
        if source_user != Some(target_user) {
            self.refresh_chain(target_user);
        }
        Ok(())
    }

    /// Exchanges the chain positions of two assignments.
    pub fn swap(&mut self, a: AssignmentIdx, b: AssignmentIdx) -> Result<(), SolverError> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Err(SolverError::structural(format!("cannot swap {a} with itself")));
        }
        for x in [a, b] {
            self.check_free(x)?;
            if self.is_sentinel(x) {
                return Err(SolverError::structural("dummy assignment cannot be swapped"));
            }
        }
        let user_a = self.assignments[a.0]
            .user
            .ok_or_else(|| SolverError::structural(format!("{a} is not chained")))?;
        let user_b = self.assignments[b.0]
            .user
            .ok_or_else(|| SolverError::structural(format!("{b} is not chained")))?;

        if self.assignments[a.0].next_element == Some(b) {
            return self.move_subchain(a, a, ChainElement::Assignment(b));
        }
        if self.assignments[b.0].next_element == Some(a) {
            return self.move_subchain(b, b, ChainElement::Assignment(a));
        }

        let prev_a = self.assignments[a.0].previous_element;
        let prev_b = self.assignments[b.0].previous_element;
        let (Some(prev_a), Some(prev_b)) = (prev_a, prev_b) else {
            return Err(SolverError::structural("swap requires chained assignments"));
        };
        let next_a = self.assignments[a.0].next_element;
        let next_b = self.assignments[b.0].next_element;
        self.check_predecessor_changeable(next_a)?;
        self.check_predecessor_changeable(next_b)?;

        self.assignments[a.0].previous_element = Some(prev_b);
        self.assignments[a.0].next_element = next_b;
        self.assignments[b.0].previous_element = Some(prev_a);
        self.assignments[b.0].next_element = next_a;
        self.set_next(prev_a, Some(b));
        self.set_next(prev_b, Some(a));
        if let Some(n) = next_a {
            self.assignments[n.0].previous_element = Some(ChainElement::Assignment(b));
        }
        if let Some(n) = next_b {
            self.assignments[n.0].previous_element = Some(ChainElement::Assignment(a));
        }

        self.refresh_chain(user_a);
        if user_a != user_b {
            self.refresh_chain(user_b);
        }
        Ok(())
    }

    /// Reverses the order of the contiguous segment `first..=last`.
    pub fn reverse(&mut self, first: AssignmentIdx, last: AssignmentIdx) -> Result<(), SolverError> {
        self.check_index(first)?;
        self.check_index(last)?;
        if first == last {
            return Err(SolverError::structural("reversal needs at least two assignments"));
        }
        let segment = self.segment(first, last).ok_or_else(|| {
            SolverError::structural(format!("{first}..{last} is not a chained segment"))
        })?;
        for &s in &segment {
            self.check_free(s)?;
            if self.is_sentinel(s) {
                return Err(SolverError::structural("dummy assignment cannot be reversed"));
            }
        }
        let after = self.assignments[last.0].next_element;
        self.check_predecessor_changeable(after)?;
        let Some(before) = self.assignments[first.0].previous_element else {
            return Err(SolverError::structural(format!("{first} is not chained")));
        };
        let user = self.assignments[first.0].user;

        let mut prev = before;
        for &s in segment.iter().rev() {
            self.set_next(prev, Some(s));
            self.assignments[s.0].previous_element = Some(prev);
            prev = ChainElement::Assignment(s);
        }
        self.assignments[first.0].next_element = after;
        if let Some(n) = after {
            self.assignments[n.0].previous_element = Some(ChainElement::Assignment(first));
        }
        if let Some(u) = user {
            self.refresh_chain(u);
        }
        Ok(())
    }

    // ---- producer-side changes (pin rules do not apply) ----

    pub(crate) fn push_user(&mut self, user: User) -> UserIdx {
        let mut user = user;
        user.next_element = None;
        self.users.push(user);
        UserIdx(self.users.len() - 1)
    }

    pub(crate) fn user_mut(&mut self, idx: UserIdx) -> &mut User {
        &mut self.users[idx.0]
    }

    pub(crate) fn push_assignment(&mut self, assignment: TaskAssignment) -> AssignmentIdx {
        let mut assignment = assignment;
        assignment.previous_element = None;
        assignment.next_element = None;
        assignment.user = None;
        assignment.pinned = false;
        self.assignments.push(assignment);
        AssignmentIdx(self.assignments.len() - 1)
    }

    pub(crate) fn set_pinned(&mut self, a: AssignmentIdx, pinned: bool) {
        self.assignments[a.0].pinned = pinned;
    }

    /// Unchains an assignment regardless of pins.
    pub(crate) fn force_unlink(&mut self, a: AssignmentIdx) {
        let Some(user) = self.assignments[a.0].user else {
            return;
        };
        self.detach(a, a);
        self.assignments[a.0].user = None;
        self.assignments[a.0].start_time_in_minutes = 0;
        self.assignments[a.0].end_time_in_minutes = 0;
        self.refresh_chain(user);
    }

    /// Deletes an unchained assignment, shifting higher indices down.
    pub(crate) fn delete_unchained(&mut self, a: AssignmentIdx) {
        debug_assert!(!self.assignments[a.0].is_initialized());
        self.assignments.remove(a.0);
        let shift = |x: AssignmentIdx| if x.0 > a.0 { AssignmentIdx(x.0 - 1) } else { x };
        for u in &mut self.users {
            u.next_element = u.next_element.map(shift);
        }
        for node in &mut self.assignments {
            node.next_element = node.next_element.map(shift);
            if let Some(ChainElement::Assignment(p)) = node.previous_element {
                node.previous_element = Some(ChainElement::Assignment(shift(p)));
            }
        }
        self.dummy = shift(self.dummy);
    }

    // ---- raw link primitives ----

    fn set_next(&mut self, element: ChainElement, next: Option<AssignmentIdx>) {
        match element {
            ChainElement::User(u) => self.users[u.0].next_element = next,
            ChainElement::Assignment(a) => self.assignments[a.0].next_element = next,
        }
    }

    /// Cuts `first..=last` out of its chain and closes the gap.
    fn detach(&mut self, first: AssignmentIdx, last: AssignmentIdx) {
        let prev = self.assignments[first.0].previous_element;
        let next = self.assignments[last.0].next_element;
        if let Some(p) = prev {
            self.set_next(p, next);
        }
        if let Some(n) = next {
            self.assignments[n.0].previous_element = prev;
        }
        self.assignments[first.0].previous_element = None;
        self.assignments[last.0].next_element = None;
    }

    /// Links a detached `first..=last` right after `after`.
    fn attach(&mut self, first: AssignmentIdx, last: AssignmentIdx, after: ChainElement) {
        let next = self.next_of(after);
        self.set_next(after, Some(first));
        self.assignments[first.0].previous_element = Some(after);
        self.assignments[last.0].next_element = next;
        if let Some(n) = next {
            self.assignments[n.0].previous_element = Some(ChainElement::Assignment(last));
        }
    }

    /// Rewrites the user cache and times along a chain.
    fn refresh_chain(&mut self, user: UserIdx) {
        let mut time = 0i64;
        let mut cursor = self.users[user.0].next_element;
        let mut steps = 0;
        while let Some(a) = cursor {
            let node = &mut self.assignments[a.0];
            node.user = Some(user);
            node.start_time_in_minutes = time;
            time += node.task.duration_minutes;
            node.end_time_in_minutes = time;
            cursor = node.next_element;
            steps += 1;
            if steps > self.assignments.len() {
                break;
            }
        }
    }
}

impl fmt::Display for TaskAssigningSolution {
    /// One line per non-empty chain: `user -> task -> task`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for u in self.user_indices() {
            write!(f, "{}", self.users[u.0].id)?;
            for a in self.chain(u) {
                let node = &self.assignments[a.0];
                write!(f, " -> {}", node.task.id)?;
                if node.pinned {
                    f.write_str("(pinned)")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::constants::{dummy_task_assignment, planning_user};
    use crate::model::Task;

    const POOL: UserIdx = UserIdx(0);
    const U1: UserIdx = UserIdx(1);
    const U2: UserIdx = UserIdx(2);

    /// u1 -> T0 -> T1 -> T2, u2 -> T3, pool -> dummy(a4), T5 free.
    fn fixture() -> TaskAssigningSolution {
        let users = vec![
            planning_user(),
            User::new("u1", true),
            User::new("u2", true),
        ];
        let assignments = vec![
            TaskAssignment::new(Task::new("T0")).with_previous(ChainElement::User(U1)),
            TaskAssignment::new(Task::new("T1").with_duration_minutes(2))
                .with_previous(ChainElement::Assignment(AssignmentIdx(0))),
            TaskAssignment::new(Task::new("T2"))
                .with_previous(ChainElement::Assignment(AssignmentIdx(1))),
            TaskAssignment::new(Task::new("T3")).with_previous(ChainElement::User(U2)),
            dummy_task_assignment().with_previous(ChainElement::User(POOL)),
            TaskAssignment::new(Task::new("T5")),
        ];
        TaskAssigningSolution::new("s", users, assignments).unwrap()
    }

    fn ids(s: &TaskAssigningSolution, u: UserIdx) -> Vec<String> {
        s.chain(u).map(|a| s.assignment(a).task().id.clone()).collect()
    }

    #[test]
    fn test_derived_links_and_times() {
        let s = fixture();
        assert_eq!(ids(&s, U1), vec!["T0", "T1", "T2"]);
        assert_eq!(s.head_of(U2), Some(AssignmentIdx(3)));
        assert_eq!(s.user_of(AssignmentIdx(2)), Some(U1));
        assert_eq!(s.assignment(AssignmentIdx(1)).start_time_in_minutes(), 1);
        assert_eq!(s.assignment(AssignmentIdx(2)).start_time_in_minutes(), 3);
        assert_eq!(s.assignment(AssignmentIdx(2)).end_time_in_minutes(), 4);
        assert_eq!(s.uninitialized_count(), 1);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_is_chained_before() {
        let s = fixture();
        assert!(s.is_chained_before(AssignmentIdx(0), AssignmentIdx(2)));
        assert!(!s.is_chained_before(AssignmentIdx(2), AssignmentIdx(0)));
        assert!(!s.is_chained_before(AssignmentIdx(0), AssignmentIdx(3)));
        assert!(!s.is_chained_before(AssignmentIdx(1), AssignmentIdx(1)));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut s = fixture();
        s.insert(AssignmentIdx(5), ChainElement::Assignment(AssignmentIdx(0)))
            .unwrap();
        assert_eq!(ids(&s, U1), vec!["T0", "T5", "T1", "T2"]);
        assert_eq!(s.user_of(AssignmentIdx(5)), Some(U1));
        s.check_integrity().unwrap();

        s.remove(AssignmentIdx(5)).unwrap();
        assert_eq!(ids(&s, U1), vec!["T0", "T1", "T2"]);
        assert!(!s.assignment(AssignmentIdx(5)).is_initialized());
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_insert_rejects_chained_or_self() {
        let mut s = fixture();
        assert!(s
            .insert(AssignmentIdx(0), ChainElement::User(U2))
            .is_err());
        assert!(s
            .insert(AssignmentIdx(5), ChainElement::Assignment(AssignmentIdx(5)))
            .is_err());
    }

    #[test]
    fn test_move_subchain_across_users() {
        let mut s = fixture();
        s.move_subchain(AssignmentIdx(1), AssignmentIdx(2), ChainElement::User(U2))
            .unwrap();
        assert_eq!(ids(&s, U1), vec!["T0"]);
        assert_eq!(ids(&s, U2), vec!["T1", "T2", "T3"]);
        assert_eq!(s.assignment(AssignmentIdx(3)).start_time_in_minutes(), 3);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_move_subchain_into_itself_is_rejected() {
        let mut s = fixture();
        let before = s.clone();
        let err = s.move_subchain(
            AssignmentIdx(0),
            AssignmentIdx(2),
            ChainElement::Assignment(AssignmentIdx(1)),
        );
        assert!(matches!(err, Err(SolverError::StructuralViolation(_))));
        assert_eq!(s, before);
    }

    #[test]
    fn test_move_subchain_within_chain() {
        let mut s = fixture();
        s.move_subchain(AssignmentIdx(0), AssignmentIdx(0), ChainElement::Assignment(AssignmentIdx(2)))
            .unwrap();
        assert_eq!(ids(&s, U1), vec!["T1", "T2", "T0"]);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_swap_adjacent_and_distant() {
        let mut s = fixture();
        s.swap(AssignmentIdx(0), AssignmentIdx(1)).unwrap();
        assert_eq!(ids(&s, U1), vec!["T1", "T0", "T2"]);
        s.swap(AssignmentIdx(1), AssignmentIdx(2)).unwrap();
        assert_eq!(ids(&s, U1), vec!["T2", "T0", "T1"]);
        s.swap(AssignmentIdx(0), AssignmentIdx(3)).unwrap();
        assert_eq!(ids(&s, U1), vec!["T2", "T3", "T1"]);
        assert_eq!(ids(&s, U2), vec!["T0"]);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_reverse_segment() {
        let mut s = fixture();
        s.reverse(AssignmentIdx(0), AssignmentIdx(2)).unwrap();
        assert_eq!(ids(&s, U1), vec!["T2", "T1", "T0"]);
        s.reverse(AssignmentIdx(2), AssignmentIdx(0)).unwrap();
        assert_eq!(ids(&s, U1), vec!["T0", "T1", "T2"]);
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_pinned_node_is_frozen() {
        let users = vec![planning_user(), User::new("u1", true)];
        let assignments = vec![
            TaskAssignment::new(Task::new("A1"))
                .with_pinned(true)
                .with_previous(ChainElement::User(U1)),
            TaskAssignment::new(Task::new("A2"))
                .with_pinned(true)
                .with_previous(ChainElement::Assignment(AssignmentIdx(0))),
            TaskAssignment::new(Task::new("F")),
            dummy_task_assignment(),
        ];
        let mut s = TaskAssigningSolution::new("s", users, assignments).unwrap();
        let before = s.clone();

        // Between two pinned nodes, or before the first one.
        assert!(s.insert(AssignmentIdx(2), ChainElement::Assignment(AssignmentIdx(0))).is_err());
        assert!(s.insert(AssignmentIdx(2), ChainElement::User(U1)).is_err());
        assert!(s.remove(AssignmentIdx(1)).is_err());
        assert!(s.move_subchain(AssignmentIdx(1), AssignmentIdx(1), ChainElement::User(POOL)).is_err());
        assert_eq!(s, before);

        // Appending after the pinned tail is allowed.
        s.insert(AssignmentIdx(2), ChainElement::Assignment(AssignmentIdx(1)))
            .unwrap();
        assert_eq!(ids(&s, U1), vec!["A1", "A2", "F"]);
    }

    #[test]
    fn test_dummy_stays_in_pool() {
        let mut s = fixture();
        let dummy = s.dummy_assignment();
        assert!(s.move_subchain(dummy, dummy, ChainElement::User(U1)).is_err());
        assert!(s.remove(dummy).is_err());
        assert!(!s.is_movable(dummy));
    }

    #[test]
    fn test_delete_unchained_shifts_indices() {
        let mut s = fixture();
        s.remove(AssignmentIdx(1)).unwrap();
        s.delete_unchained(AssignmentIdx(1));
        assert_eq!(s.assignments().len(), 5);
        assert_eq!(ids(&s, U1), vec!["T0", "T2"]);
        assert_eq!(s.dummy_assignment(), AssignmentIdx(3));
        s.check_integrity().unwrap();
    }

    #[test]
    fn test_display() {
        let s = fixture();
        let text = s.to_string();
        assert!(text.contains("u1 -> T0 -> T1 -> T2"));
        assert!(text.contains("planninguser -> dummy-task"));
    }
}
