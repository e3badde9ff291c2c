use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct AppSettings {
    pub general: GeneralSettings,
    pub quiz: QuizSettings,
    pub registration: RegistrationSettings,
    pub ai: AiSettings,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct GeneralSettings {
    pub site_name: String,
    pub default_locale: String,
    pub maintenance_mode: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct QuizSettings {
    pub questions_per_page: u32,
    pub show_progress: bool,
    pub allow_retake: bool,
    pub top_gifts_count: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct RegistrationSettings {
    pub require_approval: bool,
    pub notify_admins_on_signup: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct AiSettings {
    pub enabled: bool,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            general: GeneralSettings {
                site_name: "Spiritual Gifts".to_string(),
                default_locale: "en".to_string(),
                maintenance_mode: false,
            },
            quiz: QuizSettings {
                questions_per_page: 5,
                show_progress: true,
                allow_retake: true,
                top_gifts_count: 3,
            },
            registration: RegistrationSettings {
                require_approval: false,
                notify_admins_on_signup: true,
            },
            ai: AiSettings {
                enabled: true,
                model: "gpt-4o-mini".to_string(),
                max_tokens: 1200,
            },
        }
    }
}

/// Overlays `overrides` onto `defaults`. Objects merge key by key at every
/// depth; any other override value replaces the default outright.
pub fn merge_values(defaults: &mut Value, overrides: &Value) {
    match (defaults, overrides) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) if !value.is_null() => *slot = value.clone(),
        _ => {}
    }
}

/// Merges stored overrides onto `defaults`. An override set that no longer
/// fits the settings shape is dropped in favour of the defaults.
pub fn merge_settings(defaults: &AppSettings, overrides: &Value) -> AppSettings {
    let mut merged = match serde_json::to_value(defaults) {
        Ok(value) => value,
        Err(e) => {
            log::error!("Failed to serialize default settings: {}", e);
            return defaults.clone();
        }
    };
    merge_values(&mut merged, overrides);

    serde_json::from_value(merged).unwrap_or_else(|e| {
        log::warn!("Stored settings do not match the expected shape, using defaults: {}", e);
        defaults.clone()
    })
}
