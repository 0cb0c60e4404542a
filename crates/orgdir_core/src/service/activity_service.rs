//! Activity tree use-case service.
//!
//! # Responsibility
//! - Enforce the tree level cap and parent validity above the repository.
//! - Provide level and subtree computations for category-inclusive search.
//!
//! # Invariants
//! - The tree holds at most [`MAX_TREE_DEPTH`] levels; a node attaches only
//!   under a parent at level 0 or 1.
//! - A node never appears in its own ancestor chain.
//! - Tree walks are iterative and hop-bounded; corrupt parent chains surface
//!   as errors instead of hanging.

use crate::model::activity::{
    normalize_activity_name, Activity, ActivityId, ActivityValidationError,
};
use crate::repo::activity_repo::{ActivityRepoError, ActivityRepository};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of tree levels, root included: root, child, grandchild.
pub const MAX_TREE_DEPTH: u32 = 3;

/// Errors from activity service operations.
#[derive(Debug)]
pub enum ActivityServiceError {
    /// Name failed validation.
    InvalidName(ActivityValidationError),
    /// Target activity does not exist.
    ActivityNotFound(ActivityId),
    /// Referenced parent does not exist.
    ParentNotFound(ActivityId),
    /// A node cannot be its own parent.
    SelfParent(ActivityId),
    /// Placement would create a level beyond the cap.
    DepthLimitExceeded {
        parent_id: ActivityId,
        parent_level: u32,
    },
    /// Reparenting would place a node inside its own subtree.
    CycleDetected {
        activity_id: ActivityId,
        parent_id: ActivityId,
    },
    /// Persisted tree state violates an invariant this service relies on.
    InconsistentTree(&'static str),
    /// Repository-level failure.
    Repo(ActivityRepoError),
}

impl Display for ActivityServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::ActivityNotFound(id) => write!(f, "activity not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent activity not found: {id}"),
            Self::SelfParent(id) => write!(f, "activity {id} cannot be its own parent"),
            Self::DepthLimitExceeded {
                parent_id,
                parent_level,
            } => write!(
                f,
                "cannot attach under activity {parent_id} at level {parent_level}: the tree allows {MAX_TREE_DEPTH} levels"
            ),
            Self::CycleDetected {
                activity_id,
                parent_id,
            } => write!(
                f,
                "cannot move activity {activity_id} under {parent_id} inside its own subtree"
            ),
            Self::InconsistentTree(message) => write!(f, "inconsistent activity tree: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActivityServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ActivityValidationError> for ActivityServiceError {
    fn from(value: ActivityValidationError) -> Self {
        Self::InvalidName(value)
    }
}

impl From<ActivityRepoError> for ActivityServiceError {
    fn from(value: ActivityRepoError) -> Self {
        match value {
            ActivityRepoError::ActivityNotFound(id) => Self::ActivityNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Activity tree service facade.
pub struct ActivityService<R: ActivityRepository> {
    repo: R,
}

impl<R: ActivityRepository> ActivityService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one activity, optionally under a parent.
    pub fn create_activity(
        &self,
        name: impl Into<String>,
        parent_id: Option<ActivityId>,
    ) -> Result<Activity, ActivityServiceError> {
        let normalized = normalize_activity_name(&name.into())?;
        if let Some(parent_id) = parent_id {
            self.ensure_valid_parent(parent_id, None)?;
        }
        self.repo
            .create_activity(normalized.as_str(), parent_id)
            .map_err(Into::into)
    }

    /// Applies the provided fields to one activity; `None` leaves a field as is.
    pub fn update_activity(
        &self,
        id: ActivityId,
        name: Option<String>,
        parent_id: Option<ActivityId>,
    ) -> Result<Activity, ActivityServiceError> {
        self.repo
            .get_activity(id)?
            .ok_or(ActivityServiceError::ActivityNotFound(id))?;

        let normalized = match name {
            Some(value) => Some(normalize_activity_name(&value)?),
            None => None,
        };
        if let Some(parent_id) = parent_id {
            self.ensure_valid_parent(parent_id, Some(id))?;
        }

        self.repo
            .update_activity(id, normalized.as_deref(), parent_id)
            .map_err(Into::into)
    }

    /// Deletes one activity. Nodes that still have children are refused by
    /// the store's parent reference constraint.
    pub fn delete_activity(&self, id: ActivityId) -> Result<(), ActivityServiceError> {
        self.repo.delete_activity(id).map_err(Into::into)
    }

    /// Loads one activity.
    pub fn get_activity(&self, id: ActivityId) -> Result<Option<Activity>, ActivityServiceError> {
        self.repo.get_activity(id).map_err(Into::into)
    }

    /// Lists every activity.
    pub fn list_activities(&self) -> Result<Vec<Activity>, ActivityServiceError> {
        self.repo.list_activities().map_err(Into::into)
    }

    /// Loads the activities whose ids appear in `ids`; unknown ids are skipped.
    pub fn list_by_ids(&self, ids: &[ActivityId]) -> Result<Vec<Activity>, ActivityServiceError> {
        self.repo.list_by_ids(ids).map_err(Into::into)
    }

    /// Returns how many parent hops separate a node from its root.
    ///
    /// # Contract
    /// - A root node is at level 0.
    /// - A missing id is at level 0; a dangling parent reference ends the
    ///   walk at the last node found.
    pub fn depth_of(&self, id: ActivityId) -> Result<u32, ActivityServiceError> {
        let Some(node) = self.repo.get_activity(id)? else {
            return Ok(0);
        };
        self.level_of_node(&node)
    }

    /// Expands one node to itself plus all descendants within `max_depth`
    /// downward hops.
    ///
    /// # Contract
    /// - Hop 0 is the root itself; nodes up to `max_depth` hops away are
    ///   included.
    /// - `max_depth == 0` and a missing root both yield an empty set.
    /// - Ids come back in visit order: the root first, then level by level.
    pub fn subtree_ids(
        &self,
        root_id: ActivityId,
        max_depth: u32,
    ) -> Result<Vec<ActivityId>, ActivityServiceError> {
        if max_depth == 0 {
            return Ok(Vec::new());
        }
        if self.repo.get_activity(root_id)?.is_none() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        seen.insert(root_id);
        let mut collected = vec![root_id];
        let mut frontier = vec![root_id];
        let mut hop = 0u32;

        while hop < max_depth && !frontier.is_empty() {
            let children = self.repo.list_children_of(&frontier)?;
            let mut next_frontier = Vec::new();
            for child in children {
                if seen.insert(child.id) {
                    collected.push(child.id);
                    next_frontier.push(child.id);
                }
            }
            frontier = next_frontier;
            hop += 1;
        }

        Ok(collected)
    }

    fn ensure_valid_parent(
        &self,
        parent_id: ActivityId,
        child_id: Option<ActivityId>,
    ) -> Result<(), ActivityServiceError> {
        if let Some(child_id) = child_id {
            if child_id == parent_id {
                return Err(ActivityServiceError::SelfParent(child_id));
            }
        }

        let parent = self
            .repo
            .get_activity(parent_id)?
            .ok_or(ActivityServiceError::ParentNotFound(parent_id))?;

        if let Some(child_id) = child_id {
            if self.would_create_cycle(child_id, parent_id)? {
                return Err(ActivityServiceError::CycleDetected {
                    activity_id: child_id,
                    parent_id,
                });
            }
        }

        let parent_level = self.level_of_node(&parent)?;
        if parent_level >= MAX_TREE_DEPTH - 1 {
            return Err(ActivityServiceError::DepthLimitExceeded {
                parent_id,
                parent_level,
            });
        }
        Ok(())
    }

    fn level_of_node(&self, node: &Activity) -> Result<u32, ActivityServiceError> {
        let mut level = 0u32;
        let mut visited = HashSet::new();
        visited.insert(node.id);
        let mut cursor = node.parent_id;
        while let Some(current) = cursor {
            if !visited.insert(current) {
                return Err(ActivityServiceError::InconsistentTree(
                    "activity parent chain loops",
                ));
            }
            match self.repo.get_activity(current)? {
                Some(ancestor) => {
                    level += 1;
                    cursor = ancestor.parent_id;
                }
                None => break,
            }
        }
        Ok(level)
    }

    fn would_create_cycle(
        &self,
        activity_id: ActivityId,
        candidate_parent_id: ActivityId,
    ) -> Result<bool, ActivityServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == activity_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }
            match self.repo.get_activity(current)? {
                Some(node) => cursor = node.parent_id,
                None => break,
            }
        }
        Ok(false)
    }
}
