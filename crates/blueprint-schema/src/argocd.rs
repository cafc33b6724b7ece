//! The ArgoCD blueprints shipped with the integration.

use crate::loader::{load, LoadError};
use crate::model::Blueprint;

pub const ARGOCD_CLUSTER: &str = "argocdCluster";
pub const ARGOCD_PROJECT: &str = "argocdProject";
pub const ARGOCD_APPLICATION: &str = "argocdApplication";
pub const ARGOCD_DEPLOYMENT_HISTORY: &str = "argocdDeploymentHistory";

/// Raw blueprint document, as registered with the catalog.
pub const ARGOCD_BLUEPRINTS: &str = include_str!("../resources/argocd_blueprints.json");

/// Load the bundled ArgoCD blueprints.
pub fn argocd_blueprints() -> Result<Vec<Blueprint>, LoadError> {
    load(ARGOCD_BLUEPRINTS)
}
