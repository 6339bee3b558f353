//! Workspace persistence
//!
//! This module provides:
//! - The `WorkspaceRepository` interface used by the update engine
//! - A pnpm implementation reading `pnpm-workspace.yaml` and member `package.json` files
//! - Format-preserving catalog rewriting on save

mod pnpm;
mod writer;

pub use pnpm::{PnpmWorkspaceRepository, WORKSPACE_FILE};
pub use writer::{CatalogChange, CatalogWriter};

use crate::domain::Workspace;
use crate::error::WorkspaceError;
use std::path::Path;

/// Loads and persists workspaces
pub trait WorkspaceRepository {
    /// Load the workspace rooted exactly at `path`, if there is one
    fn find_by_path(&self, path: &Path) -> Result<Option<Workspace>, WorkspaceError>;

    /// Load the nearest workspace at or above `path`
    fn discover(&self, path: &Path) -> Result<Option<Workspace>, WorkspaceError>;

    /// Persist catalog changes; not atomic
    fn save(&self, workspace: &Workspace) -> Result<(), WorkspaceError>;
}
