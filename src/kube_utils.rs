//! Shared Kubernetes utilities using kube-rs

use kube::api::GroupVersionKind;
use kube::discovery::{self, ApiResource};
use kube::Client;

use crate::Error;

/// Parse an apiVersion into (group, version)
///
/// # Examples
/// ```
/// use braid::kube_utils::parse_group_version;
///
/// let (group, version) = parse_group_version("apps/v1").unwrap();
/// assert_eq!(group, "apps");
/// assert_eq!(version, "v1");
///
/// let (group, version) = parse_group_version("v1").unwrap();
/// assert_eq!(group, "");
/// assert_eq!(version, "v1");
/// ```
pub fn parse_group_version(api_version: &str) -> Result<(String, String), Error> {
    let invalid = || Error::validation(format!("unexpected GroupVersion string: {:?}", api_version));
    match api_version.split('/').collect::<Vec<_>>().as_slice() {
        [version] if !version.is_empty() => Ok((String::new(), version.to_string())),
        [group, version] if !group.is_empty() && !version.is_empty() => {
            Ok((group.to_string(), version.to_string()))
        }
        _ => Err(invalid()),
    }
}

/// Resolve the served `ApiResource` for a group/version/kind via discovery.
///
/// Discovery supplies the correct plural, which cannot be derived reliably
/// from the kind of an arbitrary rendered object.
pub async fn resolve_api_resource(
    client: &Client,
    gvk: &GroupVersionKind,
) -> Result<ApiResource, Error> {
    let (ar, _caps) = discovery::pinned_kind(client, gvk).await?;
    Ok(ar)
}
