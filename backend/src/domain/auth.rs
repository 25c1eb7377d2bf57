//! Identity claims and client device hints used during sign-in.

use serde::{Deserialize, Serialize};
use url::Url;

use super::UserId;

/// The signed-in identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Stable provider identifier.
    pub uid: UserId,
    /// Display name claim.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email claim.
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar claim.
    #[serde(default)]
    pub photo_url: Option<Url>,
}

impl Principal {
    /// Principal carrying only an identifier.
    pub fn new(uid: UserId) -> Self {
        Self {
            uid,
            display_name: None,
            email: None,
            photo_url: None,
        }
    }
}

const MOBILE_AGENT_MARKERS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Widest viewport still treated as a phone when touch is available.
pub const SMALL_SCREEN_MAX_WIDTH: u32 = 768;

/// Browser characteristics reported by the front end at sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    /// Raw `User-Agent` string.
    #[serde(default)]
    pub user_agent: String,
    /// Viewport width in CSS pixels.
    #[serde(default)]
    pub viewport_width: Option<u32>,
    /// Whether the device reports touch input.
    #[serde(default)]
    pub touch: bool,
}

impl DeviceProfile {
    /// Whether popups are unreliable and the redirect flow should be used.
    ///
    /// # Examples
    /// ```
    /// use tally::domain::DeviceProfile;
    ///
    /// let phone = DeviceProfile {
    ///     user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".into(),
    ///     ..DeviceProfile::default()
    /// };
    /// assert!(phone.prefers_redirect());
    /// ```
    pub fn prefers_redirect(&self) -> bool {
        let agent = self.user_agent.to_lowercase();
        let mobile_agent = MOBILE_AGENT_MARKERS
            .iter()
            .any(|marker| agent.contains(marker));
        let small_touch_screen = self.touch
            && self
                .viewport_width
                .is_some_and(|width| width <= SMALL_SCREEN_MAX_WIDTH);
        mobile_agent || small_touch_screen
    }
}
