//! JSON:API resources this tool reads back from App Store Connect.

use core::fmt;

use serde::{Deserialize, Serialize};

//
#[derive(Deserialize, Debug, Clone)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListDocument<T> {
    #[serde(default)]
    pub data: Vec<T>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Resource<A> {
    pub id: String,
    pub attributes: A,
}

pub type AppStoreVersion = Resource<AppStoreVersionAttributes>;
pub type VersionLocalization = Resource<VersionLocalizationAttributes>;
pub type AppInfo = Resource<AppInfoAttributes>;
pub type AppInfoLocalization = Resource<AppInfoLocalizationAttributes>;

//
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AppStoreState {
    PrepareForSubmission,
    ReadyForReview,
    WaitingForReview,
    InReview,
    DeveloperRejected,
    Other(String),
}

impl AppStoreState {
    /// States of a version that is still moving through review.
    pub const REVIEW_PIPELINE: &'static [&'static str] = &[
        "PREPARE_FOR_SUBMISSION",
        "READY_FOR_REVIEW",
        "WAITING_FOR_REVIEW",
        "IN_REVIEW",
        "DEVELOPER_REJECTED",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::PrepareForSubmission => "PREPARE_FOR_SUBMISSION",
            Self::ReadyForReview => "READY_FOR_REVIEW",
            Self::WaitingForReview => "WAITING_FOR_REVIEW",
            Self::InReview => "IN_REVIEW",
            Self::DeveloperRejected => "DEVELOPER_REJECTED",
            Self::Other(s) => s,
        }
    }

    /// App info rows in these states accept category and localization edits.
    pub fn is_app_info_editable(&self) -> bool {
        matches!(self, Self::PrepareForSubmission | Self::ReadyForReview)
    }
}

impl From<String> for AppStoreState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PREPARE_FOR_SUBMISSION" => Self::PrepareForSubmission,
            "READY_FOR_REVIEW" => Self::ReadyForReview,
            "WAITING_FOR_REVIEW" => Self::WaitingForReview,
            "IN_REVIEW" => Self::InReview,
            "DEVELOPER_REJECTED" => Self::DeveloperRejected,
            _ => Self::Other(s),
        }
    }
}

impl From<AppStoreState> for String {
    fn from(state: AppStoreState) -> Self {
        match state {
            AppStoreState::Other(s) => s,
            x => x.as_str().to_owned(),
        }
    }
}

impl fmt::Display for AppStoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreVersionAttributes {
    pub app_store_state: AppStoreState,
    #[serde(default)]
    pub version_string: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionLocalizationAttributes {
    pub locale: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub support_url: Option<String>,
    #[serde(default)]
    pub promotional_text: Option<String>,
    #[serde(default)]
    pub whats_new: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoAttributes {
    #[serde(default)]
    pub app_store_state: Option<AppStoreState>,
    // Newer API revisions report `state` alongside the deprecated field.
    #[serde(default)]
    pub state: Option<AppStoreState>,
}

impl AppInfoAttributes {
    pub fn state(&self) -> Option<&AppStoreState> {
        self.app_store_state.as_ref().or(self.state.as_ref())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoLocalizationAttributes {
    pub locale: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub privacy_policy_url: Option<String>,
}

/// Locale-keyed lookup over a list of localizations.
pub trait Localized {
    fn locale(&self) -> &str;
}

impl Localized for VersionLocalization {
    fn locale(&self) -> &str {
        &self.attributes.locale
    }
}

impl Localized for AppInfoLocalization {
    fn locale(&self) -> &str {
        &self.attributes.locale
    }
}

pub fn find_locale<'a, T: Localized>(list: &'a [T], locale: &str) -> Option<&'a T> {
    list.iter().find(|x| x.locale() == locale)
}
