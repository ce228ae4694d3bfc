//! Application services for tag annotation.

mod annotation;
mod catalog;

pub use annotation::{AnnotationError, AnnotationResult, TagAnnotationService};
pub use catalog::{
    CatalogError, CatalogResult, CreateTagRequest, TagCatalogService, UpdateTagRequest,
};
