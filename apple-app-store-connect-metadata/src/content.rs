use std::{fs, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{config::ConfigError, models::AppStoreState};

pub const DEFAULT_APP_NAME: &str = "題目カウンター";
pub const DEFAULT_DESCRIPTION: &str = "唱題の回数を、声で自動カウント。

題目カウンターは、音声認識技術を活用して「南無妙法蓮華経」の回数を自動でカウントするアプリです。唱題に集中しながら、正確な記録を残すことができます。

【主な機能】
・音声認識による自動カウント（オンライン・オフライン対応）
・手動タップカウント
・日々の目標設定と進捗表示
・過去30日間の唱題記録グラフ
・セッション履歴の管理

【3つの認識モード】
・ネイティブモード：Apple音声認識を使用（オフライン対応）
・クラウドモード：高精度なクラウド音声認識
・ローカルモード：音声の強弱で検出（完全オフライン）

アカウント登録は不要。すぐに使い始められます。

日々の唱題を、静かに見守るパートナーとして。";
pub const DEFAULT_KEYWORDS: &str =
    "題目,唱題,カウンター,南無妙法蓮華経,音声認識,日蓮,仏教,勤行,信仰,記録";
pub const DEFAULT_SUPPORT_URL: &str = "https://yoshi0703.github.io/daimoku-counter/";
pub const DEFAULT_WHATS_NEW: &str = "初回リリース";
pub const DEFAULT_SUBTITLE: &str = "音声認識で唱題を自動カウント";
pub const DEFAULT_PRIVACY_POLICY_URL: &str =
    "https://yoshi0703.github.io/daimoku-counter/privacy-policy.html";
pub const DEFAULT_PRIMARY_CATEGORY: &str = "LIFESTYLE";

/// The metadata pushed to App Store Connect.
///
/// Fields missing from a TOML override keep their built-in value.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MetadataContent {
    pub app_name: String,
    pub description: String,
    pub keywords: String,
    pub support_url: String,
    pub promotional_text: String,
    pub whats_new: String,
    pub subtitle: String,
    pub privacy_policy_url: String,
    pub primary_category: String,
}

impl Default for MetadataContent {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            keywords: DEFAULT_KEYWORDS.to_owned(),
            support_url: DEFAULT_SUPPORT_URL.to_owned(),
            promotional_text: String::new(),
            whats_new: DEFAULT_WHATS_NEW.to_owned(),
            subtitle: DEFAULT_SUBTITLE.to_owned(),
            privacy_policy_url: DEFAULT_PRIVACY_POLICY_URL.to_owned(),
            primary_category: DEFAULT_PRIMARY_CATEGORY.to_owned(),
        }
    }
}

impl MetadataContent {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::ReadContent {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&s).map_err(|source| ConfigError::ParseContent {
            path: path.to_owned(),
            source,
        })
    }

    /// `whatsNew` is rejected by the API while a version is the app's first
    /// submission, so it is left out in that state.
    pub fn version_localization_attributes(&self, state: &AppStoreState) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("description".into(), self.description.as_str().into());
        attributes.insert("keywords".into(), self.keywords.as_str().into());
        attributes.insert("supportUrl".into(), self.support_url.as_str().into());
        attributes.insert(
            "promotionalText".into(),
            self.promotional_text.as_str().into(),
        );
        if *state != AppStoreState::PrepareForSubmission {
            attributes.insert("whatsNew".into(), self.whats_new.as_str().into());
        }
        attributes
    }

    pub fn app_info_localization_attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("subtitle".into(), self.subtitle.as_str().into());
        attributes.insert(
            "privacyPolicyUrl".into(),
            self.privacy_policy_url.as_str().into(),
        );
        attributes
    }
}
