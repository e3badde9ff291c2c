use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use validator::Validate;

use crate::{
    backend::Access,
    errors::{AppError, AppResult},
    models::{
        domain::{
            demographics::{age_from_birth_date, age_from_birth_year, or_unknown},
            DemographicsRecord,
        },
        dto::{request::DemographicsRequest, response::DemographicsStatus},
    },
    repositories::DemographicsRepository,
    services::geolocation::{hash_ip, ClientContext, GeolocationService},
};

pub struct DemographicsService {
    repository: Arc<dyn DemographicsRepository>,
    geolocation: Arc<GeolocationService>,
}

impl DemographicsService {
    pub fn new(
        repository: Arc<dyn DemographicsRepository>,
        geolocation: Arc<GeolocationService>,
    ) -> Self {
        Self {
            repository,
            geolocation,
        }
    }

    pub async fn check(&self, user_id: &str, access: &Access) -> AppResult<DemographicsStatus> {
        let has_demographics = self.repository.has_demographics(user_id, access).await?;
        Ok(DemographicsStatus { has_demographics })
    }

    pub async fn collect(
        &self,
        user_id: &str,
        request: &DemographicsRequest,
        context: &ClientContext,
        access: &Access,
    ) -> AppResult<DemographicsRecord> {
        request.validate()?;

        let today = Utc::now().date_naive();
        let age = extract_age(request, today)?;
        let location = self
            .geolocation
            .resolve(context, request.coordinates())
            .await;

        let record = DemographicsRecord {
            user_id: user_id.to_string(),
            age,
            gender: or_unknown(request.gender.as_deref()),
            denomination: or_unknown(request.denomination.as_deref()),
            country: location.country,
            region: location.region,
            city: location.city,
            latitude: location.latitude,
            longitude: location.longitude,
            location_source: location.source,
            ip_hash: context.ip.as_ref().map(hash_ip),
            collected_at: Utc::now(),
        };

        self.repository.save_demographics(&record, access).await?;
        log::info!(
            "Demographics collected for {} (location source {:?})",
            user_id,
            record.location_source
        );

        Ok(record)
    }
}

/// Age from the birth date when given, else the birth year. A malformed date
/// is a client error; an implausible age is dropped.
pub fn extract_age(request: &DemographicsRequest, today: NaiveDate) -> AppResult<Option<u8>> {
    if let Some(raw) = request.birth_date.as_deref().filter(|d| !d.trim().is_empty()) {
        let birth_date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::ValidationError(format!("Invalid birth date '{}', expected YYYY-MM-DD", raw))
        })?;
        return Ok(age_from_birth_date(birth_date, today));
    }

    Ok(request
        .birth_year
        .and_then(|year| age_from_birth_year(year, today)))
}
