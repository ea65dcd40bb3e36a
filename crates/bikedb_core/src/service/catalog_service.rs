//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide frame/component entry points for the CLI and importer.
//! - Navigate the relationship graph in both directions.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::logging::loggable;
use crate::model::entity::ComponentKind;
use crate::model::record::{Component, ComponentKey, Frame};
use crate::repo::catalog_repo::{CatalogRepository, RepoError, RepoResult};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// A frame together with every component attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAssembly {
    pub frame: Frame,
    /// Attached components grouped by kind; kinds without parts are absent.
    pub components: BTreeMap<ComponentKind, Vec<Component>>,
}

impl FrameAssembly {
    /// Components of one kind, empty when none are attached.
    pub fn components_of(&self, kind: ComponentKind) -> &[Component] {
        self.components
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn component_count(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }
}

/// Use-case service wrapper for catalog operations.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn add_frame(&self, frame: &Frame) -> RepoResult<()> {
        self.repo.create_frame(frame)?;
        info!(
            "event=frame_add module=service status=ok serial={}",
            loggable(&frame.serial)
        );
        Ok(())
    }

    pub fn update_frame(&self, frame: &Frame) -> RepoResult<()> {
        self.repo.update_frame(frame)
    }

    /// Attaches a component to its frame.
    ///
    /// Returns `ReferentialIntegrity` when the frame does not exist and
    /// `DuplicateKey` when the composite key is already taken.
    pub fn add_component(&self, component: &Component) -> RepoResult<()> {
        self.repo.create_component(component)?;
        info!(
            "event=component_add module=service status=ok table={} frame_serial={}",
            component.kind,
            loggable(&component.key.frame_serial)
        );
        Ok(())
    }

    pub fn get_frame(&self, serial: &str) -> RepoResult<Option<Frame>> {
        self.repo.get_frame(serial)
    }

    pub fn list_frames(&self) -> RepoResult<Vec<Frame>> {
        self.repo.list_frames()
    }

    pub fn get_component(
        &self,
        kind: ComponentKind,
        key: &ComponentKey,
    ) -> RepoResult<Option<Component>> {
        self.repo.get_component(kind, key)
    }

    /// Loads a frame and enumerates its attached components by kind.
    pub fn frame_assembly(&self, serial: &str) -> RepoResult<Option<FrameAssembly>> {
        let Some(frame) = self.repo.get_frame(serial)? else {
            return Ok(None);
        };

        let mut components = BTreeMap::new();
        for kind in ComponentKind::ALL {
            let attached = self.repo.list_components(serial, kind)?;
            if !attached.is_empty() {
                components.insert(kind, attached);
            }
        }

        Ok(Some(FrameAssembly { frame, components }))
    }

    /// Resolves the frame a component is attached to.
    ///
    /// A component whose frame is gone indicates a broken store and is
    /// reported as `ReferentialIntegrity`.
    pub fn resolve_frame(&self, component: &Component) -> RepoResult<Frame> {
        self.repo
            .get_frame(&component.key.frame_serial)?
            .ok_or_else(|| RepoError::ReferentialIntegrity {
                table: component.kind.table_name(),
                message: format!(
                    "component references missing frame `{}`",
                    component.key.frame_serial
                ),
            })
    }

    /// Hard-deletes a frame; fails while any component references it.
    pub fn remove_frame(&self, serial: &str) -> RepoResult<()> {
        self.repo.delete_frame(serial)?;
        info!(
            "event=frame_remove module=service status=ok serial={}",
            loggable(serial)
        );
        Ok(())
    }

    pub fn remove_component(&self, kind: ComponentKind, key: &ComponentKey) -> RepoResult<()> {
        self.repo.delete_component(kind, key)
    }
}
