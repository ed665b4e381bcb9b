//! Acting-account resolution.
//!
//! An admin may view or create events on behalf of exactly one subordinate
//! per request, named by a manager or project engineer identifier. The
//! identifier `none` means "not given".

use tracing::debug;
use uuid::Uuid;

use crate::models::Account;
use crate::store::AccountDirectory;
use crate::{Error, Result};

/// Identifier value treated as absent.
pub const NO_SUBORDINATE: &str = "none";

fn given(id: Option<&str>) -> Option<&str> {
    id.map(str::trim)
        .filter(|id| !id.is_empty() && *id != NO_SUBORDINATE)
}

/// Resolve whose events this request reads or writes.
///
/// A manager identifier wins over an engineer identifier. Unknown or
/// unparseable identifiers are `NotFound`.
pub async fn resolve_acting_account(
    accounts: &dyn AccountDirectory,
    requester: &Account,
    manager_id: Option<&str>,
    engineer_id: Option<&str>,
) -> Result<Account> {
    if let Some(raw) = given(manager_id) {
        let not_found = || Error::NotFound(format!("Manager {}", raw));
        let id = Uuid::parse_str(raw).map_err(|_| not_found())?;
        let admin = accounts.manager_admin(id).await?.ok_or_else(not_found)?;
        debug!(requester = %requester.id, acting = %admin.id, "Acting for manager");
        return Ok(admin);
    }

    if let Some(raw) = given(engineer_id) {
        let not_found = || Error::NotFound(format!("Project engineer {}", raw));
        let id = Uuid::parse_str(raw).map_err(|_| not_found())?;
        let admin = accounts.engineer_admin(id).await?.ok_or_else(not_found)?;
        debug!(requester = %requester.id, acting = %admin.id, "Acting for project engineer");
        return Ok(admin);
    }

    Ok(requester.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn account(name: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            cognito_sub: format!("sub-{}", name),
            email: format!("{}@example.com", name),
            display_name: Some(name.to_string()),
        }
    }

    async fn fixture() -> (MemoryStore, Account, Account, Account, Uuid, Uuid) {
        let store = MemoryStore::new();
        let admin = account("admin");
        let manager = account("manager");
        let engineer = account("engineer");
        for a in [&admin, &manager, &engineer] {
            store.insert_account(a.clone()).await;
        }
        let manager_id = Uuid::new_v4();
        let engineer_id = Uuid::new_v4();
        store.insert_manager(manager_id, manager.id).await;
        store.insert_engineer(engineer_id, engineer.id).await;
        (store, admin, manager, engineer, manager_id, engineer_id)
    }

    #[tokio::test]
    async fn test_no_ids_returns_requester() {
        let (store, admin, ..) = fixture().await;
        let acting = resolve_acting_account(&store, &admin, None, None).await.unwrap();
        assert_eq!(acting, admin);

        let acting = resolve_acting_account(&store, &admin, Some("none"), Some("none"))
            .await
            .unwrap();
        assert_eq!(acting, admin);
    }

    #[tokio::test]
    async fn test_manager_resolves_to_linked_admin() {
        let (store, admin, manager, _, manager_id, engineer_id) = fixture().await;
        let id = manager_id.to_string();
        let other = engineer_id.to_string();
        let acting = resolve_acting_account(&store, &admin, Some(&id), Some(&other))
            .await
            .unwrap();
        assert_eq!(acting, manager);
    }

    #[tokio::test]
    async fn test_engineer_used_when_manager_is_sentinel() {
        let (store, admin, _, engineer, _, engineer_id) = fixture().await;
        let id = engineer_id.to_string();
        let acting = resolve_acting_account(&store, &admin, Some("none"), Some(&id))
            .await
            .unwrap();
        assert_eq!(acting, engineer);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (store, admin, ..) = fixture().await;
        let missing = Uuid::new_v4().to_string();

        let err = resolve_acting_account(&store, &admin, Some(&missing), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = resolve_acting_account(&store, &admin, None, Some("42"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
