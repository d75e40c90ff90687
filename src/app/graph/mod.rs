mod build;
mod interaction;
mod model;
mod transform;
mod view;

pub(in crate::app) use build::{BuildOptions, build_vault_graph};
pub(in crate::app) use interaction::InteractionController;
#[cfg(test)]
pub(in crate::app) use model::EdgeKind;
pub(in crate::app) use model::{GraphEdge, GraphModel, GraphNode};
pub(in crate::app) use transform::ViewTransform;
pub(in crate::app) use view::RenderSurface;
