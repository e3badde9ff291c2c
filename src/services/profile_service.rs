use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{permissions::Permissions, Claims},
    backend::Access,
    errors::AppResult,
    models::{
        domain::{
            demographics::{or_unknown, LocationSource},
            GeoLocation, UserProfile, UserRole,
        },
        dto::{
            request::AutoGeolocationRequest,
            response::{AutoGeolocationOutcome, MeResponse},
        },
    },
    repositories::ProfileRepository,
    services::geolocation::{ClientContext, GeolocationService},
};

pub struct ProfileService {
    repository: Arc<dyn ProfileRepository>,
    geolocation: Arc<GeolocationService>,
}

impl ProfileService {
    pub fn new(
        repository: Arc<dyn ProfileRepository>,
        geolocation: Arc<GeolocationService>,
    ) -> Self {
        Self {
            repository,
            geolocation,
        }
    }

    /// Role stored on the profile; the session's synced role is used only
    /// when the profile has none.
    pub async fn resolve_role(&self, claims: &Claims, access: &Access) -> AppResult<UserRole> {
        let stored = self.repository.get_role(&claims.sub, access).await?;

        Ok(match stored {
            Some(label) => UserRole::from_label(&label),
            None => claims.role_or_default(),
        })
    }

    pub async fn get_profile(&self, user_id: &str, access: &Access) -> AppResult<Option<UserProfile>> {
        self.repository.get_profile(user_id, access).await
    }

    pub async fn me(&self, claims: &Claims, access: &Access) -> AppResult<MeResponse> {
        let profile = self.repository.get_profile(&claims.sub, access).await?;
        let role = self.resolve_role(claims, access).await?;

        Ok(MeResponse {
            user_id: claims.sub.clone(),
            email: claims
                .email
                .clone()
                .or_else(|| profile.as_ref().map(|p| p.email.clone())),
            profile,
            role,
            permissions: Permissions::for_role(role),
        })
    }

    /// Fills in the profile location when it has none yet, or when `force`
    /// is set.
    pub async fn auto_geolocate(
        &self,
        user_id: &str,
        request: &AutoGeolocationRequest,
        context: &ClientContext,
        access: &Access,
    ) -> AppResult<AutoGeolocationOutcome> {
        request.validate()?;

        if !request.force {
            if let Some(profile) = self.repository.get_profile(user_id, access).await? {
                if profile.has_location() {
                    return Ok(AutoGeolocationOutcome {
                        updated: false,
                        location: stored_location(&profile),
                    });
                }
            }
        }

        let location = self
            .geolocation
            .resolve(context, request.coordinates())
            .await;

        if location.is_unknown() {
            log::debug!("No location resolved for {}", user_id);
            return Ok(AutoGeolocationOutcome {
                updated: false,
                location,
            });
        }

        self.repository
            .update_location(user_id, &location, access)
            .await?;
        log::info!("Profile location for {} set from {:?}", user_id, location.source);

        Ok(AutoGeolocationOutcome {
            updated: true,
            location,
        })
    }
}

fn stored_location(profile: &UserProfile) -> GeoLocation {
    GeoLocation {
        country: or_unknown(profile.country.as_deref()),
        region: or_unknown(profile.region.as_deref()),
        city: or_unknown(profile.city.as_deref()),
        latitude: None,
        longitude: None,
        source: LocationSource::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repositories::profile_repository::MockProfileRepository,
        services::geolocation::MockGeoLookup, test_utils::fixtures,
    };

    fn service(repo: MockProfileRepository, lookup: MockGeoLookup) -> ProfileService {
        ProfileService::new(
            Arc::new(repo),
            Arc::new(GeolocationService::new(Arc::new(lookup))),
        )
    }

    fn public_context() -> ClientContext {
        ClientContext {
            ip: "203.0.113.7".parse().ok(),
            header_location: None,
        }
    }

    fn portugal() -> GeoLocation {
        GeoLocation {
            country: "Portugal".to_string(),
            region: "Porto".to_string(),
            city: "Porto".to_string(),
            latitude: None,
            longitude: None,
            source: LocationSource::IpLookup,
        }
    }

    #[tokio::test]
    async fn stored_role_wins_over_session_role() {
        let mut repo = MockProfileRepository::new();
        repo.expect_get_role()
            .returning(|_, _| Ok(Some("manager".to_string())));

        let service = service(repo, MockGeoLookup::new());
        let claims = fixtures::claims("user-1", Some("admin"));

        let role = service.resolve_role(&claims, &Access::Anon).await.unwrap();
        assert_eq!(role, UserRole::Manager);
    }

    #[tokio::test]
    async fn session_role_is_the_fallback() {
        let mut repo = MockProfileRepository::new();
        repo.expect_get_role().returning(|_, _| Ok(None));

        let service = service(repo, MockGeoLookup::new());

        let claims = fixtures::claims("user-1", Some("admin"));
        assert_eq!(
            service.resolve_role(&claims, &Access::Anon).await.unwrap(),
            UserRole::Admin
        );

        let claims = fixtures::claims("user-2", None);
        assert_eq!(
            service.resolve_role(&claims, &Access::Anon).await.unwrap(),
            UserRole::User
        );
    }

    #[tokio::test]
    async fn me_reports_permissions_for_role() {
        let mut repo = MockProfileRepository::new();
        repo.expect_get_profile()
            .returning(|id, _| Ok(Some(UserProfile::test_profile(id, UserRole::Admin))));
        repo.expect_get_role()
            .returning(|_, _| Ok(Some("admin".to_string())));

        let service = service(repo, MockGeoLookup::new());
        let me = service
            .me(&fixtures::claims("admin-1", None), &Access::Anon)
            .await
            .unwrap();

        assert_eq!(me.role, UserRole::Admin);
        assert!(me.permissions.can_edit_settings);
        assert!(me.profile.is_some());
    }

    #[tokio::test]
    async fn existing_location_is_kept_without_force() {
        let mut repo = MockProfileRepository::new();
        repo.expect_get_profile().returning(|id, _| {
            let mut profile = UserProfile::test_profile(id, UserRole::User);
            profile.country = Some("Spain".to_string());
            Ok(Some(profile))
        });
        repo.expect_update_location().never();

        let mut lookup = MockGeoLookup::new();
        lookup.expect_lookup_ip().never();

        let service = service(repo, lookup);
        let outcome = service
            .auto_geolocate(
                "user-1",
                &AutoGeolocationRequest::default(),
                &public_context(),
                &Access::Anon,
            )
            .await
            .unwrap();

        assert!(!outcome.updated);
        assert_eq!(outcome.location.country, "Spain");
    }

    #[tokio::test]
    async fn missing_location_is_resolved_and_saved() {
        let mut repo = MockProfileRepository::new();
        repo.expect_get_profile()
            .returning(|id, _| Ok(Some(UserProfile::test_profile(id, UserRole::User))));
        repo.expect_update_location()
            .withf(|id, location, _| id == "user-1" && location.country == "Portugal")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut lookup = MockGeoLookup::new();
        lookup.expect_lookup_ip().returning(|_| Ok(Some(portugal())));

        let service = service(repo, lookup);
        let outcome = service
            .auto_geolocate(
                "user-1",
                &AutoGeolocationRequest::default(),
                &public_context(),
                &Access::Anon,
            )
            .await
            .unwrap();

        assert!(outcome.updated);
    }

    #[tokio::test]
    async fn unresolved_location_is_not_saved() {
        let mut repo = MockProfileRepository::new();
        repo.expect_update_location().never();

        let service = service(repo, MockGeoLookup::new());
        let request = AutoGeolocationRequest {
            force: true,
            ..Default::default()
        };

        let outcome = service
            .auto_geolocate("user-1", &request, &ClientContext::default(), &Access::Anon)
            .await
            .unwrap();
        assert!(!outcome.updated);
        assert!(outcome.location.is_unknown());
    }
}
