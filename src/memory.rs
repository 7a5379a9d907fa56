//! In-process store with the same constraints as the Postgres schema:
//! unique `user.email`, `analysis.id_user` must reference a user, and
//! deleting a user cascades to their analyses.

use std::collections::BTreeMap;

use anyhow::bail;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    analysis::{
        repo::AnalysisRepo,
        repo_types::{Analysis, AnalysisFields},
    },
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User, UserUpdate},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    analyses: BTreeMap<i32, Analysis>,
    user_seq: i32,
    analysis_seq: i32,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, new: NewUser) -> anyhow::Result<User> {
        let mut t = self.tables.lock().await;
        if t.email_taken(&new.email, None) {
            bail!("duplicate key value violates unique constraint \"user_email_key\"");
        }
        t.user_seq += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.user_seq,
            username: new.username,
            email: new.email,
            password: new.password,
            department: new.department,
            category: new.category,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: i32) -> anyhow::Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.tables.lock().await.users.values().cloned().collect())
    }

    async fn update_user(&self, id: i32, changes: UserUpdate) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.lock().await;
        if let Some(email) = &changes.email {
            if t.email_taken(email, Some(id)) {
                bail!("duplicate key value violates unique constraint \"user_email_key\"");
            }
        }
        let Some(row) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = changes.username {
            row.username = v;
        }
        if let Some(v) = changes.email {
            row.email = v;
        }
        if let Some(v) = changes.password {
            row.password = v;
        }
        if changes.department.is_some() {
            row.department = changes.department;
        }
        if changes.category.is_some() {
            row.category = changes.category;
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(Some(row.clone()))
    }

    async fn set_password(&self, id: i32, password_hash: &str) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        match t.users.get_mut(&id) {
            Some(row) => {
                row.password = password_hash.to_owned();
                row.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: i32) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.analyses.retain(|_, a| a.id_user != id);
        Ok(true)
    }
}

#[async_trait]
impl AnalysisRepo for MemoryStore {
    async fn create_analysis(&self, owner: i32, fields: AnalysisFields) -> anyhow::Result<Analysis> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&owner) {
            bail!("insert on table \"analysis\" violates foreign key constraint \"analysis_id_user_fkey\"");
        }
        t.analysis_seq += 1;
        let now = OffsetDateTime::now_utc();
        let row = Analysis {
            id: t.analysis_seq,
            fields,
            created_at: now,
            updated_at: now,
            id_user: owner,
        };
        t.analyses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_analyses(&self, owner: i32) -> anyhow::Result<Vec<Analysis>> {
        let t = self.tables.lock().await;
        Ok(t.analyses
            .values()
            .filter(|a| a.id_user == owner)
            .cloned()
            .collect())
    }

    async fn find_analysis(&self, id: i32, owner: i32) -> anyhow::Result<Option<Analysis>> {
        let t = self.tables.lock().await;
        Ok(t.analyses.get(&id).filter(|a| a.id_user == owner).cloned())
    }

    async fn update_analysis(
        &self,
        id: i32,
        owner: i32,
        patch: AnalysisFields,
    ) -> anyhow::Result<Option<Analysis>> {
        let mut t = self.tables.lock().await;
        match t.analyses.get_mut(&id).filter(|a| a.id_user == owner) {
            Some(row) => {
                row.fields.apply(patch);
                row.updated_at = OffsetDateTime::now_utc();
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_analysis(&self, id: i32, owner: i32) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        if t.analyses.get(&id).is_some_and(|a| a.id_user == owner) {
            t.analyses.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "u".into(),
            email: email.into(),
            password: "$2b$10$hash".into(),
            department: None,
            category: None,
            role: "user".into(),
        }
    }

    #[tokio::test]
    async fn email_is_unique() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();
        let err = store.create_user(new_user("a@x.com")).await.unwrap_err();
        assert!(err.to_string().contains("unique"));
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();
        let b = store.create_user(new_user("b@x.com")).await.unwrap();
        let steal = UserUpdate {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert!(store.update_user(b.id, steal).await.is_err());
        // re-sending your own email is fine
        let same = UserUpdate {
            email: Some("b@x.com".into()),
            ..Default::default()
        };
        assert!(store.update_user(b.id, same).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn profile_update_keeps_password_set_in_between() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@x.com")).await.unwrap();
        // a reset lands between a profile edit's read and its write
        assert!(store.set_password(a.id, "$2b$10$reset").await.unwrap());
        let rename = UserUpdate {
            username: Some("renamed".into()),
            ..Default::default()
        };
        let row = store.update_user(a.id, rename).await.unwrap().unwrap();

        assert_eq!(row.username, "renamed");
        assert_eq!(row.password, "$2b$10$reset");
        assert_eq!(row.email, "a@x.com");
    }

    #[tokio::test]
    async fn update_of_missing_user_is_none() {
        let store = MemoryStore::new();
        let patch = UserUpdate {
            username: Some("ghost".into()),
            ..Default::default()
        };
        assert!(store.update_user(7, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn analysis_patches_on_different_fields_both_stick() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@x.com")).await.unwrap();
        let row = store
            .create_analysis(
                a.id,
                AnalysisFields {
                    year: Some(2024),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let first = AnalysisFields {
            count5: Some(9),
            ..Default::default()
        };
        let second = AnalysisFields {
            quality: Some(72.5),
            ..Default::default()
        };
        let (r1, r2) = tokio::join!(
            store.update_analysis(row.id, a.id, first),
            store.update_analysis(row.id, a.id, second),
        );
        assert!(r1.unwrap().is_some());
        assert!(r2.unwrap().is_some());

        let stored = store.find_analysis(row.id, a.id).await.unwrap().unwrap();
        assert_eq!(stored.fields.year, Some(2024));
        assert_eq!(stored.fields.count5, Some(9));
        assert_eq!(stored.fields.quality, Some(72.5));
    }

    #[tokio::test]
    async fn analysis_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store
            .create_analysis(42, AnalysisFields::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("foreign key"));
    }

    #[tokio::test]
    async fn queries_are_owner_scoped() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@x.com")).await.unwrap();
        let b = store.create_user(new_user("b@x.com")).await.unwrap();
        let row = store
            .create_analysis(a.id, AnalysisFields::default())
            .await
            .unwrap();

        assert!(store.find_analysis(row.id, b.id).await.unwrap().is_none());
        assert!(store.list_analyses(b.id).await.unwrap().is_empty());
        assert!(store
            .update_analysis(row.id, b.id, AnalysisFields::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_analysis(row.id, b.id).await.unwrap());
        assert!(store.find_analysis(row.id, a.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_user_cascades() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@x.com")).await.unwrap();
        let b = store.create_user(new_user("b@x.com")).await.unwrap();
        store.create_analysis(a.id, AnalysisFields::default()).await.unwrap();
        store.create_analysis(a.id, AnalysisFields::default()).await.unwrap();
        store.create_analysis(b.id, AnalysisFields::default()).await.unwrap();

        assert!(store.delete_user(a.id).await.unwrap());
        assert!(store.list_analyses(a.id).await.unwrap().is_empty());
        assert_eq!(store.list_analyses(b.id).await.unwrap().len(), 1);
        assert!(!store.delete_user(a.id).await.unwrap());
    }
}
