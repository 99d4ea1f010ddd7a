//! Third-party (7TV) emote catalog.
//!
//! A catalog is loaded once per channel owner. Loading never fails: any
//! problem yields an *unsupported* catalog whose scans find nothing, so
//! chat keeps rendering with protocol-native emotes only.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CatalogError;

/// Per-user emote set endpoint; the Twitch user id is appended.
pub const DEFAULT_CATALOG_URL: &str = "https://7tv.io/v3/users/twitch/";

/// Image formats in order of preference.
const FORMAT_PREFERENCE: [ImageFormat; 4] = [
    ImageFormat::Webp,
    ImageFormat::Avif,
    ImageFormat::Png,
    ImageFormat::Gif,
];

/// The user document served by the catalog service.
#[derive(Clone, Debug, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub emote_set: EmoteSetDocument,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmoteSetDocument {
    #[serde(default)]
    pub id: Option<String>,
    pub emotes: Vec<EmoteDocument>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmoteDocument {
    pub name: String,
    pub data: EmoteData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmoteData {
    pub host: EmoteHost,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmoteHost {
    /// Base url of the image variants, often protocol-relative.
    pub url: String,
    pub files: Vec<ImageFile>,
}

/// One rendered variant of an emote image.
#[derive(Clone, Debug, Deserialize)]
pub struct ImageFile {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Webp,
    Avif,
    Png,
    Gif,
    #[serde(other)]
    Other,
}

/// A usable catalog emote: its name and the variant chosen for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub image_base_url: String,
    pub variant_file_name: String,
}

impl CatalogEntry {
    /// `<base>/<variant>`.
    pub fn image_url(&self) -> String {
        format!(
            "{}/{}",
            self.image_base_url.trim_end_matches('/'),
            self.variant_file_name
        )
    }

    fn from_document(emote: &EmoteDocument) -> Option<Self> {
        let files = &emote.data.host.files;
        let variant = FORMAT_PREFERENCE
            .iter()
            .find_map(|format| files.iter().find(|file| file.format == *format))?;
        Some(Self {
            name: emote.name.clone(),
            image_base_url: resolve_base_url(&emote.data.host.url),
            variant_file_name: variant.name.clone(),
        })
    }
}

/// Resolve a protocol-relative url (`//host/path`) to `https:`.
fn resolve_base_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_owned()
    }
}

/// A whole-token catalog emote occurrence in a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogMatch<'a> {
    /// UTF-16 offset of the first code unit.
    pub start: usize,
    /// UTF-16 offset one past the last code unit.
    pub end: usize,
    pub entry: &'a CatalogEntry,
}

#[derive(Clone, Debug, Default)]
pub struct EmoteCatalog {
    /// `None` when the catalog could not be loaded.
    entries: Option<HashMap<String, CatalogEntry>>,
}

impl EmoteCatalog {
    /// A catalog that matches nothing.
    pub fn unsupported() -> Self {
        Self { entries: None }
    }

    /// Build the name index from a fetched document.
    ///
    /// Emotes without a usable image variant, and names that could never
    /// form a single token, are left out. The first emote wins when a name
    /// repeats.
    pub fn from_document(document: &UserDocument) -> Self {
        let mut entries = HashMap::with_capacity(document.emote_set.emotes.len());
        for emote in &document.emote_set.emotes {
            if emote.name.is_empty() || emote.name.contains(char::is_whitespace) {
                debug!(name = %emote.name, "skipping catalog emote with unusable name");
                continue;
            }
            match CatalogEntry::from_document(emote) {
                Some(entry) => {
                    entries.entry(entry.name.clone()).or_insert(entry);
                }
                None => debug!(name = %emote.name, "skipping catalog emote without a usable image"),
            }
        }
        Self {
            entries: Some(entries),
        }
    }

    /// Build a catalog from a user document in JSON form.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: UserDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(&document))
    }

    /// Fetch the user document for `user_id` from `base_url`.
    #[cfg(feature = "catalog-fetch")]
    pub async fn fetch(
        client: &reqwest::Client,
        base_url: &str,
        user_id: &str,
    ) -> Result<UserDocument, CatalogError> {
        let url = if base_url.ends_with('/') {
            format!("{}{}", base_url, user_id)
        } else {
            format!("{}/{}", base_url, user_id)
        };
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Load the catalog of `user_id` from the public service.
    #[cfg(feature = "catalog-fetch")]
    pub async fn load(client: &reqwest::Client, user_id: &str) -> Self {
        Self::load_from(client, DEFAULT_CATALOG_URL, user_id).await
    }

    /// Load the catalog of `user_id` from `base_url`. Never fails.
    #[cfg(feature = "catalog-fetch")]
    pub async fn load_from(client: &reqwest::Client, base_url: &str, user_id: &str) -> Self {
        match Self::fetch(client, base_url, user_id).await {
            Ok(document) => Self::from_document(&document),
            Err(e) => {
                warn!(user_id, error = %e, "emote catalog unavailable");
                Self::unsupported()
            }
        }
    }

    pub fn is_supported(&self) -> bool {
        self.entries.is_some()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.as_ref()?.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find every whole-token occurrence of a catalog emote in `text`.
    ///
    /// A token is a maximal run of non-whitespace characters, so a match is
    /// always preceded and followed by whitespace or the text boundary.
    /// Matches are returned in text order and never overlap.
    pub fn scan<'a>(&'a self, text: &str) -> Vec<CatalogMatch<'a>> {
        let Some(entries) = &self.entries else {
            return Vec::new();
        };
        if entries.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        let mut token: Option<(usize, usize)> = None;
        let mut unit = 0;
        let mut check = |byte_start: usize, byte_end: usize, unit_start: usize, unit_end: usize| {
            if let Some(entry) = entries.get(&text[byte_start..byte_end]) {
                matches.push(CatalogMatch {
                    start: unit_start,
                    end: unit_end,
                    entry,
                });
            }
        };

        for (byte, c) in text.char_indices() {
            if c.is_whitespace() {
                if let Some((byte_start, unit_start)) = token.take() {
                    check(byte_start, byte, unit_start, unit);
                }
            } else if token.is_none() {
                token = Some((byte, unit));
            }
            unit += c.len_utf16();
        }
        if let Some((byte_start, unit_start)) = token {
            check(byte_start, text.len(), unit_start, unit);
        }
        matches
    }
}
