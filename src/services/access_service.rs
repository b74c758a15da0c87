// src/services/access_service.rs
// DOCUMENTATION: Gallery access control
// PURPOSE: Resolve what a caller may do on a gallery and manage grants

use crate::config::Config;
use crate::db::{AccessRepository, GalleryRepository, UserRepository};
use crate::errors::GalleryError;
use crate::models::{AccessLevel, AccessResponse, Gallery, GallerySummary, GrantAccessRequest, Role};
use crate::services::auth_service::normalize_email;
use crate::services::email::{enqueue_best_effort, gallery_access_email, EmailQueue};
use crate::services::security::Claims;
use sqlx::PgPool;
use uuid::Uuid;

/// What a caller may do on one gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub can_view: bool,
    pub can_upload: bool,
    pub can_manage: bool,
}

impl Permissions {
    /// ADMIN and the creator hold every right; otherwise the grant decides
    pub fn resolve(role: Role, is_creator: bool, grant: Option<AccessLevel>) -> Self {
        if role == Role::Admin || is_creator {
            return Permissions {
                can_view: true,
                can_upload: true,
                can_manage: true,
            };
        }

        match grant {
            Some(level) => Permissions {
                can_view: true,
                can_upload: level >= AccessLevel::Uploader,
                can_manage: level >= AccessLevel::Owner,
            },
            None => Permissions {
                can_view: false,
                can_upload: false,
                can_manage: false,
            },
        }
    }

    pub fn require_view(&self) -> Result<(), GalleryError> {
        self.require(self.can_view, "view")
    }

    pub fn require_upload(&self) -> Result<(), GalleryError> {
        self.require(self.can_upload, "upload to")
    }

    pub fn require_manage(&self) -> Result<(), GalleryError> {
        self.require(self.can_manage, "manage")
    }

    fn require(&self, allowed: bool, action: &str) -> Result<(), GalleryError> {
        if allowed {
            Ok(())
        } else {
            Err(GalleryError::Forbidden(format!(
                "You do not have permission to {} this gallery",
                action
            )))
        }
    }
}

pub struct AccessService;

impl AccessService {
    /// Permissions of the caller on a loaded gallery
    pub async fn permissions(
        pool: &PgPool,
        claims: &Claims,
        gallery: &Gallery,
    ) -> Result<Permissions, GalleryError> {
        let is_creator = gallery.created_by == claims.id;
        if claims.role == Role::Admin || is_creator {
            return Ok(Permissions::resolve(claims.role, is_creator, None));
        }

        let grant = AccessRepository::get_grant(pool, &normalize_email(&claims.email), gallery.id)
            .await?
            .map(|g| g.level());
        Ok(Permissions::resolve(claims.role, is_creator, grant))
    }

    /// Load a gallery and the caller's permissions on it
    pub async fn load(
        pool: &PgPool,
        claims: &Claims,
        gallery_id: Uuid,
    ) -> Result<(Gallery, Permissions), GalleryError> {
        let gallery = GalleryRepository::get_by_id(pool, gallery_id).await?;
        let permissions = Self::permissions(pool, claims, &gallery).await?;
        Ok((gallery, permissions))
    }

    /// Grant (or change) access for a list of emails and notify new grantees
    pub async fn grant(
        pool: &PgPool,
        config: &Config,
        queue: &dyn EmailQueue,
        claims: &Claims,
        req: GrantAccessRequest,
    ) -> Result<Vec<AccessResponse>, GalleryError> {
        let (gallery, permissions) = Self::load(pool, claims, req.gallery_id).await?;
        permissions.require_manage()?;

        let emails = dedup_emails(&req.emails)?;
        let mut granted = Vec::with_capacity(emails.len());

        for email in emails {
            let (access, created) =
                AccessRepository::upsert_grant(pool, &email, gallery.id, req.access_level, claims.id)
                    .await?;

            if created {
                let message = gallery_access_email(
                    &email,
                    &gallery,
                    Some(claims.email.as_str()),
                    &config.frontend_url,
                );
                enqueue_best_effort(queue, &message).await;
            }

            log::info!(
                "Granted {} on gallery {} to {} (new: {})",
                access.access_level,
                gallery.id,
                email,
                created
            );
            granted.push(access.to_response());
        }

        Ok(granted)
    }

    /// Revoke a grant; the creator's own grant is permanent
    pub async fn revoke(
        pool: &PgPool,
        claims: &Claims,
        gallery_id: Uuid,
        email: &str,
    ) -> Result<(), GalleryError> {
        let (gallery, permissions) = Self::load(pool, claims, gallery_id).await?;
        permissions.require_manage()?;

        let email = normalize_email(email);
        let creator = UserRepository::get_by_id(pool, gallery.created_by).await?;
        if creator.map(|u| normalize_email(&u.email)).as_deref() == Some(email.as_str()) {
            return Err(GalleryError::InvalidInput(
                "The gallery creator's access cannot be revoked".to_string(),
            ));
        }

        if !AccessRepository::delete_grant(pool, &email, gallery.id).await? {
            return Err(GalleryError::NotFound("Access grant".to_string()));
        }

        log::info!("Revoked access of {} on gallery {}", email, gallery.id);
        Ok(())
    }

    pub async fn list_for_gallery(
        pool: &PgPool,
        claims: &Claims,
        gallery_id: Uuid,
    ) -> Result<Vec<AccessResponse>, GalleryError> {
        let (gallery, permissions) = Self::load(pool, claims, gallery_id).await?;
        permissions.require_manage()?;

        let grants = AccessRepository::list_by_gallery(pool, gallery.id).await?;
        Ok(grants.iter().map(|g| g.to_response()).collect())
    }

    pub async fn my_galleries(pool: &PgPool, claims: &Claims) -> Result<Vec<GallerySummary>, GalleryError> {
        GalleryRepository::list_granted_to(pool, &normalize_email(&claims.email)).await
    }
}

/// Normalize, validate and dedup a list of grantee emails, keeping order
fn dedup_emails(emails: &[String]) -> Result<Vec<String>, GalleryError> {
    let mut out: Vec<String> = Vec::with_capacity(emails.len());
    for raw in emails {
        let email = normalize_email(raw);
        if !looks_like_email(&email) {
            return Err(GalleryError::ValidationError(format!("Invalid email address: {}", raw)));
        }
        if !out.contains(&email) {
            out.push(email);
        }
    }
    Ok(out)
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_fixtures;

    #[test]
    fn test_admin_and_creator_have_everything() {
        let all = Permissions {
            can_view: true,
            can_upload: true,
            can_manage: true,
        };
        assert_eq!(Permissions::resolve(Role::Admin, false, None), all);
        assert_eq!(Permissions::resolve(Role::User, true, None), all);
    }

    #[test]
    fn test_grant_levels() {
        let viewer = Permissions::resolve(Role::User, false, Some(AccessLevel::Viewer));
        assert!(viewer.can_view && !viewer.can_upload && !viewer.can_manage);

        let uploader = Permissions::resolve(Role::Uploader, false, Some(AccessLevel::Uploader));
        assert!(uploader.can_view && uploader.can_upload && !uploader.can_manage);

        let owner = Permissions::resolve(Role::User, false, Some(AccessLevel::Owner));
        assert!(owner.can_view && owner.can_upload && owner.can_manage);
    }

    #[test]
    fn test_no_grant_no_access() {
        let none = Permissions::resolve(Role::Uploader, false, None);
        assert!(none.require_view().is_err());
        assert!(none.require_upload().is_err());
    }

    #[test]
    fn test_dedup_emails() {
        let emails = vec![
            "A@x.io".to_string(),
            "a@x.io".to_string(),
            "b@x.io".to_string(),
        ];
        assert_eq!(dedup_emails(&emails).unwrap(), vec!["a@x.io", "b@x.io"]);
        assert!(dedup_emails(&["nope".to_string()]).is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_creator_grant_cannot_be_revoked(pool: PgPool) {
        let (_, admin) = test_fixtures::user(&pool, "admin@example.com", Role::Admin).await;
        let gallery = test_fixtures::gallery(&pool, &admin, "Holidays").await;

        let err = AccessService::revoke(&pool, &admin, gallery.id, "Admin@Example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, GalleryError::InvalidInput(_)));

        let missing = AccessService::revoke(&pool, &admin, gallery.id, "nobody@example.com").await;
        assert!(matches!(missing, Err(GalleryError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_grant_notifies_new_grantees_only(pool: PgPool) {
        let config = test_fixtures::config();
        let (queue, mut outbox) = test_fixtures::queue();
        let (_, admin) = test_fixtures::user(&pool, "admin@example.com", Role::Admin).await;
        let gallery = test_fixtures::gallery(&pool, &admin, "Holidays").await;

        let req = |emails: &[&str], level| GrantAccessRequest {
            gallery_id: gallery.id,
            emails: emails.iter().map(|e| e.to_string()).collect(),
            access_level: level,
        };

        let first = req(&["v@example.com"], AccessLevel::Viewer);
        let granted = AccessService::grant(&pool, &config, &queue, &admin, first)
            .await
            .unwrap();
        assert_eq!(granted.len(), 1);

        // Changing the level of an existing grant sends nothing
        AccessService::grant(
            &pool,
            &config,
            &queue,
            &admin,
            req(&["V@example.com", "w@example.com"], AccessLevel::Uploader),
        )
        .await
        .unwrap();

        assert_eq!(
            test_fixtures::recipients(&mut outbox),
            vec!["v@example.com", "w@example.com"]
        );

        let grants = AccessService::list_for_gallery(&pool, &admin, gallery.id).await.unwrap();
        let v = grants.iter().find(|g| g.email == "v@example.com").unwrap();
        assert_eq!(v.access_level, "UPLOADER");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_viewer_cannot_manage_grants(pool: PgPool) {
        let config = test_fixtures::config();
        let (queue, _outbox) = test_fixtures::queue();
        let (_, admin) = test_fixtures::user(&pool, "admin@example.com", Role::Admin).await;
        let (_, viewer) = test_fixtures::user(&pool, "v@example.com", Role::User).await;
        let gallery = test_fixtures::gallery(&pool, &admin, "Holidays").await;

        AccessRepository::upsert_grant(&pool, "v@example.com", gallery.id, AccessLevel::Viewer, admin.id)
            .await
            .unwrap();

        let req = GrantAccessRequest {
            gallery_id: gallery.id,
            emails: vec!["x@example.com".to_string()],
            access_level: AccessLevel::Viewer,
        };
        let result = AccessService::grant(&pool, &config, &queue, &viewer, req).await;
        assert!(matches!(result, Err(GalleryError::Forbidden(_))));

        let mine = AccessService::my_galleries(&pool, &viewer).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, gallery.id);
    }
}
