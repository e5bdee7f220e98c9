//! Client-side state for the catalog admin screen.
//!
//! [`ViewCoordinator`] owns a [`CatalogStore`] for one screen session and
//! drives the create/edit and delete dialogs against it. Remote access goes
//! through the [`CatalogService`] seam; [`HttpCatalogClient`] is the REST
//! implementation.

pub mod client;
pub mod config;
pub mod deletion;
pub mod editor;
pub mod error;
pub mod events;
pub mod store;
pub mod table;
pub mod view;

pub use client::{CatalogService, HttpCatalogClient, MissingCatalogService};
pub use config::{load_settings, ClientSettings, ReconcilePolicy};
pub use deletion::{DeletionController, DeletionState, DeletionTarget};
pub use editor::{EntryEditController, NumericField, RemoteSave, TextField};
pub use error::{CatalogError, StoreError, SubmitError, ValidationErrors, ViewError};
pub use events::{CatalogEvent, Toast};
pub use store::CatalogStore;
pub use table::{Column, SortDirection, SortSpec};
pub use view::ViewCoordinator;
