//! Permission checking.
//!
//! Account permissions are flat node strings. A request for several nodes
//! succeeds only when every node is granted; an empty request always
//! succeeds.

use sqlx::SqlitePool;

use crate::db::{Account, PermissionRepository, Role};
use crate::{LifError, Result};

/// Split a comma separated node list, dropping empty entries.
///
/// Nodes are opaque, so surrounding whitespace is kept as part of the node.
///
/// # Examples
///
/// ```
/// use lif_auth::auth::parse_nodes;
///
/// assert_eq!(parse_nodes("a.b,c.d"), vec!["a.b", "c.d"]);
/// assert_eq!(parse_nodes("a.b, c.d"), vec!["a.b", " c.d"]);
/// assert!(parse_nodes("").is_empty());
/// ```
pub fn parse_nodes(csv: &str) -> Vec<String> {
    csv.split(',')
        .filter(|node| !node.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check that an account holds every requested node.
pub async fn has_all<S: AsRef<str>>(pool: &SqlitePool, account_id: &str, nodes: &[S]) -> Result<bool> {
    PermissionRepository::new(pool).has_all(account_id, nodes).await
}

/// Require every requested node, failing with `NoPermission`.
pub async fn require_nodes<S: AsRef<str>>(pool: &SqlitePool, account: &Account, nodes: &[S]) -> Result<()> {
    if has_all(pool, &account.user_id, nodes).await? {
        Ok(())
    } else {
        let wanted: Vec<&str> = nodes.iter().map(AsRef::as_ref).collect();
        Err(LifError::NoPermission(wanted.join(",")))
    }
}

/// Require an exact role, failing with `NoPermission`.
pub fn require_role(account: &Account, role: Role) -> Result<()> {
    if account.role == role {
        Ok(())
    } else {
        Err(LifError::NoPermission(format!("role {role}")))
    }
}
