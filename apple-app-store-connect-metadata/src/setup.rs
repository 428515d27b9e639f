//! The fixed sequence of API calls that brings one app's store listing in
//! line with [`MetadataContent`].

use apple_app_store_connect_api_client::{RequestError, Requester};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::{
    config::Config,
    content::MetadataContent,
    models::{
        find_locale, AppInfo, AppInfoLocalization, AppStoreState, AppStoreVersion, Document,
        ListDocument, VersionLocalization,
    },
};

pub const PRIMARY_LOCALE: &str = "ja";
pub const FALLBACK_LOCALE: &str = "en-US";

//
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("empty response for {0}")]
    EmptyResponse(&'static str),

    #[error("decode {what}: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("no App Store version found for app {0}")]
    NoAppStoreVersion(String),

    #[error("no app info found for app {0}")]
    NoAppInfo(String),

    #[error("no {locale} {resource} to update")]
    MissingLocalization {
        locale: &'static str,
        resource: &'static str,
    },
}

/// Outcome of a POST that App Store Connect may refuse, e.g. when the app
/// name is already taken in that locale by another app.
#[derive(Debug, Clone, PartialEq)]
pub enum Creation<T> {
    Created(T),
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct Report {
    pub version: AppStoreVersion,
    pub version_localization: VersionLocalization,
    pub created_version_localization: bool,
    pub app_info: AppInfo,
    pub category_updated: bool,
    pub app_info_localization: AppInfoLocalization,
    pub created_app_info_localization: bool,
    pub verified_version_localizations: Vec<VersionLocalization>,
    pub verified_app_info_localizations: Vec<AppInfoLocalization>,
}

pub async fn run<R>(
    api: &R,
    config: &Config,
    content: &MetadataContent,
) -> Result<Report, SetupError>
where
    R: Requester + ?Sized,
{
    let app_id = config.app_id.as_str();

    info!("[2] Getting editable app store version...");
    let version = select_app_store_version(api, app_id).await?;
    info!(
        "  Version: {} (state: {}, id: {})",
        version.attributes.version_string.as_deref().unwrap_or(""),
        version.attributes.app_store_state,
        version.id
    );

    info!("[3] Getting version localizations...");
    let localizations = list_version_localizations(api, &version.id).await?;
    for loc in &localizations {
        info!("    - {} (id: {})", loc.attributes.locale, loc.id);
    }

    info!("[4] Setting up version localization...");
    let attributes = content.version_localization_attributes(&version.attributes.app_store_state);
    let (version_localization, created_version_localization) =
        apply_version_localization(api, &version.id, &localizations, attributes).await?;
    log_version_localization(&version_localization);

    info!("[5] Getting app info...");
    let app_infos = list_app_infos(api, app_id).await?;
    for ai in &app_infos {
        info!(
            "  AppInfo: id={}, state={}",
            ai.id,
            ai.attributes.state().map(AppStoreState::as_str).unwrap_or("")
        );
    }
    let app_info = select_app_info(&app_infos)
        .cloned()
        .ok_or_else(|| SetupError::NoAppInfo(app_id.to_owned()))?;

    info!(
        "[5a] Setting primary category to {}...",
        content.primary_category
    );
    let category_updated =
        set_primary_category(api, &app_info.id, &content.primary_category).await;

    info!("[5b] Getting app info localizations...");
    let info_localizations = list_app_info_localizations(api, &app_info.id).await?;
    for loc in &info_localizations {
        info!(
            "    - {} (id: {}, name={}, subtitle={})",
            loc.attributes.locale,
            loc.id,
            loc.attributes.name.as_deref().unwrap_or(""),
            loc.attributes.subtitle.as_deref().unwrap_or("")
        );
    }

    info!("[5c] Setting subtitle and privacy policy...");
    let (app_info_localization, created_app_info_localization) = apply_app_info_localization(
        api,
        &app_info.id,
        &info_localizations,
        &content.app_name,
        content.app_info_localization_attributes(),
    )
    .await?;
    log_app_info_localization(&app_info_localization);

    info!("[6] VERIFICATION");
    let verified_version_localizations = list_version_localizations(api, &version.id).await?;
    let verified_app_info_localizations = list_app_info_localizations(api, &app_info.id).await?;
    log_verification(
        &verified_version_localizations,
        &verified_app_info_localizations,
    );

    info!("All metadata setup complete!");

    Ok(Report {
        version,
        version_localization,
        created_version_localization,
        app_info,
        category_updated,
        app_info_localization,
        created_app_info_localization,
        verified_version_localizations,
        verified_app_info_localizations,
    })
}

//
//
//
pub async fn select_app_store_version<R>(
    api: &R,
    app_id: &str,
) -> Result<AppStoreVersion, SetupError>
where
    R: Requester + ?Sized,
{
    let path = format!(
        "/apps/{app_id}/appStoreVersions?filter[appStoreState]={}",
        AppStoreState::REVIEW_PIPELINE.join(",")
    );
    let mut versions: ListDocument<AppStoreVersion> =
        decode(api.get(&path).await?, "appStoreVersions")?;

    if versions.data.is_empty() {
        versions = decode(
            api.get(&format!("/apps/{app_id}/appStoreVersions")).await?,
            "appStoreVersions",
        )?;
    }

    versions
        .data
        .into_iter()
        .next()
        .ok_or_else(|| SetupError::NoAppStoreVersion(app_id.to_owned()))
}

pub async fn list_version_localizations<R>(
    api: &R,
    version_id: &str,
) -> Result<Vec<VersionLocalization>, SetupError>
where
    R: Requester + ?Sized,
{
    let path = format!("/appStoreVersions/{version_id}/appStoreVersionLocalizations");
    let list: ListDocument<VersionLocalization> =
        decode(api.get(&path).await?, "appStoreVersionLocalizations")?;
    Ok(list.data)
}

pub async fn create_version_localization<R>(
    api: &R,
    version_id: &str,
    locale: &str,
    attributes: &Map<String, Value>,
) -> Result<Creation<VersionLocalization>, SetupError>
where
    R: Requester + ?Sized,
{
    let mut attributes = attributes.clone();
    attributes.insert("locale".into(), locale.into());

    let body = json!({
        "data": {
            "type": "appStoreVersionLocalizations",
            "attributes": attributes,
            "relationships": {
                "appStoreVersion": {
                    "data": {"type": "appStoreVersions", "id": version_id}
                }
            }
        }
    });

    create(api, "/appStoreVersionLocalizations", &body, "appStoreVersionLocalization").await
}

pub async fn update_version_localization<R>(
    api: &R,
    localization_id: &str,
    attributes: &Map<String, Value>,
) -> Result<VersionLocalization, SetupError>
where
    R: Requester + ?Sized,
{
    let body = json!({
        "data": {
            "type": "appStoreVersionLocalizations",
            "id": localization_id,
            "attributes": attributes
        }
    });
    let doc: Document<VersionLocalization> = decode(
        api.patch(
            &format!("/appStoreVersionLocalizations/{localization_id}"),
            &body,
        )
        .await?,
        "appStoreVersionLocalization",
    )?;
    Ok(doc.data)
}

/// Writes `attributes` to the `ja` version localization, creating it when
/// missing. A rejected creation puts the same text on `en-US` instead.
///
/// The returned flag is true when the localization was created.
pub async fn apply_version_localization<R>(
    api: &R,
    version_id: &str,
    localizations: &[VersionLocalization],
    attributes: Map<String, Value>,
) -> Result<(VersionLocalization, bool), SetupError>
where
    R: Requester + ?Sized,
{
    if let Some(ja) = find_locale(localizations, PRIMARY_LOCALE) {
        info!(
            "  Updating existing {} version localization (id: {})...",
            PRIMARY_LOCALE, ja.id
        );
        let updated = update_version_localization(api, &ja.id, &attributes).await?;
        return Ok((updated, false));
    }

    info!(
        "  Attempting to create {} version localization...",
        PRIMARY_LOCALE
    );
    match create_version_localization(api, version_id, PRIMARY_LOCALE, &attributes).await? {
        Creation::Created(created) => {
            info!(
                "  Created {} version localization (id: {})",
                PRIMARY_LOCALE, created.id
            );
            Ok((created, true))
        }
        Creation::Rejected { status, .. } => {
            warn!(
                "  Could not create {} locale (HTTP {}). Updating {} with the same content instead.",
                PRIMARY_LOCALE, status, FALLBACK_LOCALE
            );
            let en = find_locale(localizations, FALLBACK_LOCALE).ok_or(
                SetupError::MissingLocalization {
                    locale: FALLBACK_LOCALE,
                    resource: "appStoreVersionLocalization",
                },
            )?;
            info!(
                "  Updating {} version localization (id: {})...",
                FALLBACK_LOCALE, en.id
            );
            let updated = update_version_localization(api, &en.id, &attributes).await?;
            Ok((updated, false))
        }
    }
}

//
//
//
pub async fn list_app_infos<R>(api: &R, app_id: &str) -> Result<Vec<AppInfo>, SetupError>
where
    R: Requester + ?Sized,
{
    let list: ListDocument<AppInfo> =
        decode(api.get(&format!("/apps/{app_id}/appInfos")).await?, "appInfos")?;
    Ok(list.data)
}

/// The last editable app info, else the first one.
pub fn select_app_info(app_infos: &[AppInfo]) -> Option<&AppInfo> {
    app_infos
        .iter()
        .rev()
        .find(|ai| {
            ai.attributes
                .state()
                .map(AppStoreState::is_app_info_editable)
                .unwrap_or(false)
        })
        .or_else(|| app_infos.first())
}

/// Never fails the run; returns whether the category was set.
pub async fn set_primary_category<R>(api: &R, app_info_id: &str, category: &str) -> bool
where
    R: Requester + ?Sized,
{
    let body = json!({
        "data": {
            "type": "appInfos",
            "id": app_info_id,
            "relationships": {
                "primaryCategory": {
                    "data": {"type": "appCategories", "id": category}
                }
            }
        }
    });

    match api.patch(&format!("/appInfos/{app_info_id}"), &body).await {
        Ok(_) => {
            info!("  Primary category set successfully!");
            true
        }
        Err(err) => {
            warn!("  Warning: Could not set primary category: {err}");
            false
        }
    }
}

pub async fn list_app_info_localizations<R>(
    api: &R,
    app_info_id: &str,
) -> Result<Vec<AppInfoLocalization>, SetupError>
where
    R: Requester + ?Sized,
{
    let path = format!("/appInfos/{app_info_id}/appInfoLocalizations");
    let list: ListDocument<AppInfoLocalization> =
        decode(api.get(&path).await?, "appInfoLocalizations")?;
    Ok(list.data)
}

pub async fn create_app_info_localization<R>(
    api: &R,
    app_info_id: &str,
    locale: &str,
    name: &str,
    attributes: &Map<String, Value>,
) -> Result<Creation<AppInfoLocalization>, SetupError>
where
    R: Requester + ?Sized,
{
    let mut attributes = attributes.clone();
    attributes.insert("locale".into(), locale.into());
    attributes.insert("name".into(), name.into());

    let body = json!({
        "data": {
            "type": "appInfoLocalizations",
            "attributes": attributes,
            "relationships": {
                "appInfo": {
                    "data": {"type": "appInfos", "id": app_info_id}
                }
            }
        }
    });

    create(api, "/appInfoLocalizations", &body, "appInfoLocalization").await
}

pub async fn update_app_info_localization<R>(
    api: &R,
    localization_id: &str,
    attributes: &Map<String, Value>,
) -> Result<AppInfoLocalization, SetupError>
where
    R: Requester + ?Sized,
{
    let body = json!({
        "data": {
            "type": "appInfoLocalizations",
            "id": localization_id,
            "attributes": attributes
        }
    });
    let doc: Document<AppInfoLocalization> = decode(
        api.patch(&format!("/appInfoLocalizations/{localization_id}"), &body)
            .await?,
        "appInfoLocalization",
    )?;
    Ok(doc.data)
}

/// Same shape as [`apply_version_localization`]; creation also sets the
/// localized app name.
pub async fn apply_app_info_localization<R>(
    api: &R,
    app_info_id: &str,
    localizations: &[AppInfoLocalization],
    app_name: &str,
    attributes: Map<String, Value>,
) -> Result<(AppInfoLocalization, bool), SetupError>
where
    R: Requester + ?Sized,
{
    if let Some(ja) = find_locale(localizations, PRIMARY_LOCALE) {
        info!(
            "  Updating {} app info localization (id: {})...",
            PRIMARY_LOCALE, ja.id
        );
        let updated = update_app_info_localization(api, &ja.id, &attributes).await?;
        return Ok((updated, false));
    }

    info!("  Creating {} app info localization...", PRIMARY_LOCALE);
    match create_app_info_localization(api, app_info_id, PRIMARY_LOCALE, app_name, &attributes)
        .await?
    {
        Creation::Created(created) => {
            info!("  Created {} app info localization!", PRIMARY_LOCALE);
            Ok((created, true))
        }
        Creation::Rejected { status, .. } => {
            warn!(
                "  Could not create {} app info locale (HTTP {}). Updating {} instead...",
                PRIMARY_LOCALE, status, FALLBACK_LOCALE
            );
            let en = find_locale(localizations, FALLBACK_LOCALE).ok_or(
                SetupError::MissingLocalization {
                    locale: FALLBACK_LOCALE,
                    resource: "appInfoLocalization",
                },
            )?;
            let updated = update_app_info_localization(api, &en.id, &attributes).await?;
            Ok((updated, false))
        }
    }
}

//
//
//
async fn create<R, T>(
    api: &R,
    path: &str,
    body: &Value,
    what: &'static str,
) -> Result<Creation<T>, SetupError>
where
    R: Requester + ?Sized,
    T: DeserializeOwned,
{
    match api.post(path, body).await {
        Ok(value) => {
            let doc: Document<T> = decode(value, what)?;
            Ok(Creation::Created(doc.data))
        }
        Err(RequestError::Http { status, body }) => Ok(Creation::Rejected { status, body }),
        Err(err) => Err(err.into()),
    }
}

fn decode<T: DeserializeOwned>(value: Option<Value>, what: &'static str) -> Result<T, SetupError> {
    let value = value.ok_or(SetupError::EmptyResponse(what))?;
    serde_json::from_value(value).map_err(|source| SetupError::Decode { what, source })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn log_version_localization(loc: &VersionLocalization) {
    let a = &loc.attributes;
    info!("  Result: locale={}, id={}", a.locale, loc.id);
    info!(
        "    description length: {}",
        a.description.as_deref().unwrap_or("").chars().count()
    );
    info!("    keywords: {}", a.keywords.as_deref().unwrap_or(""));
    info!("    supportUrl: {}", a.support_url.as_deref().unwrap_or(""));
}

fn log_app_info_localization(loc: &AppInfoLocalization) {
    let a = &loc.attributes;
    info!("  Result: locale={}, id={}", a.locale, loc.id);
    info!("    name: {}", a.name.as_deref().unwrap_or(""));
    info!("    subtitle: {}", a.subtitle.as_deref().unwrap_or(""));
    info!(
        "    privacyPolicyUrl: {}",
        a.privacy_policy_url.as_deref().unwrap_or("")
    );
}

fn log_verification(versions: &[VersionLocalization], infos: &[AppInfoLocalization]) {
    info!("Version Localizations:");
    for loc in versions {
        let a = &loc.attributes;
        info!("  [{}] id={}", a.locale, loc.id);
        info!(
            "    description: {}...",
            truncate(a.description.as_deref().unwrap_or(""), 80)
        );
        info!("    keywords: {}", a.keywords.as_deref().unwrap_or(""));
        info!("    supportUrl: {}", a.support_url.as_deref().unwrap_or(""));
        info!("    whatsNew: {}", a.whats_new.as_deref().unwrap_or(""));
        info!(
            "    promotionalText: {}",
            a.promotional_text.as_deref().unwrap_or("")
        );
    }

    info!("App Info Localizations:");
    for loc in infos {
        let a = &loc.attributes;
        info!("  [{}] id={}", a.locale, loc.id);
        info!("    name: {}", a.name.as_deref().unwrap_or(""));
        info!("    subtitle: {}", a.subtitle.as_deref().unwrap_or(""));
        info!(
            "    privacyPolicyUrl: {}",
            a.privacy_policy_url.as_deref().unwrap_or("")
        );
    }
}
