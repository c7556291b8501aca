//! Per-request authorization checks.

use lookit_core::{
  access::{Permission, PermissionScope, Researcher},
  store::ResponseStore,
  study::Study,
};
use uuid::Uuid;

use crate::ApiError;

/// Load a study the researcher is allowed to see. Lack of access is reported
/// before existence so that study ids do not leak.
pub async fn open_study<S: ResponseStore>(
  store: &S,
  researcher: &Researcher,
  study_id: Uuid,
) -> Result<Study, ApiError> {
  if !researcher.can_access(study_id) {
    return Err(ApiError::Forbidden(format!(
      "{} has no access to study {study_id}",
      researcher.username
    )));
  }
  store
    .get_study(study_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("study {study_id} not found")))
}

pub fn require(researcher: &Researcher, permission: Permission) -> Result<(), ApiError> {
  if researcher.can(permission) {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!(
      "{} lacks the {permission} permission",
      researcher.username
    )))
  }
}

/// The researcher's data scope; an empty scope may read nothing.
pub fn read_scope(researcher: &Researcher) -> Result<PermissionScope, ApiError> {
  let scope = researcher.scope();
  if scope.is_empty() {
    return Err(ApiError::Forbidden(format!(
      "{} may not read response data",
      researcher.username
    )));
  }
  Ok(scope)
}
