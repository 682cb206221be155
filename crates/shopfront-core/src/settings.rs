//! # Store Settings
//!
//! Store-wide presentation and contact settings.
//!
//! Settings are persisted as loose key → JSON value pairs so the admin can
//! add or change one without a migration. This module resolves those pairs
//! into one typed, immutable [`StoreSettings`] value that is handed to
//! whatever needs it (checkout for the currency, the contact form for the
//! recipient, the frontend for site chrome).
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  defaults (every key)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for each stored (key, value):                                          │
//! │       ├── unknown key ───────────────► ignored                          │
//! │       ├── wrong JSON type ───────────► default kept                     │
//! │       ├── empty string ──────────────► default kept                     │
//! │       └── otherwise ─────────────────► overrides default                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreSettings (typed, read-only)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::DEFAULT_CURRENCY;

/// A footer navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FooterLink {
    pub text: String,
    pub url: String,
}

/// A footer social media icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SocialIcon {
    pub name: String,
    pub url: String,
    pub img: String,
}

/// Resolved store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StoreSettings {
    // Branding
    pub theme_color: String,
    pub main_logo_url: String,
    /// ISO 4217 code charged at checkout.
    pub currency: String,

    // SEO
    pub meta_title: String,
    pub meta_description: String,
    pub meta_keywords: String,

    // Home page hero
    pub home_phone_number: String,
    pub home_subtitle: String,
    pub home_heading: String,
    pub home_description: String,
    pub home_button_text: String,
    pub home_button_link: String,
    pub disclaimer_heading: String,
    pub disclaimer_content: String,

    // Footer
    pub footer_company_name: String,
    pub footer_company_tagline: String,
    pub footer_quick_links: Vec<FooterLink>,
    pub footer_contact_email: String,
    pub footer_contact_phone: String,
    pub footer_contact_address: String,
    pub footer_payment_methods: String,
    pub footer_newsletter_heading: String,
    pub footer_copyright_text: String,
    pub footer_social_icons: Vec<SocialIcon>,

    // Campaign banner
    pub enable_campaign_banner: bool,
    pub campaign_banner_heading: String,
    pub campaign_banner_text: String,
    pub campaign_banner_button_text: String,
    pub campaign_banner_button_link: String,
    pub campaign_banner_image_url: String,
    pub campaign_banner_background_color: String,
    pub campaign_banner_text_color: String,

    // Contact page; `contact_email` also receives contact form messages
    pub contact_address: String,
    pub contact_email: String,
    pub contact_phone: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            theme_color: "#1e90ff".to_string(),
            main_logo_url: "/image/CyberSafeTrust-logo.png".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            meta_title: "CyberSafeTrust | Antivirus Software & Security Solutions".to_string(),
            meta_description: "Protect your digital life with the most trusted antivirus \
                solutions. Save big on McAfee, Norton, Kaspersky, and more with instant \
                activation and up to 80% off."
                .to_string(),
            meta_keywords: "antivirus software, cybersecurity, virus protection, McAfee, \
                Norton, Kaspersky, Bitdefender, buy antivirus online, PC security"
                .to_string(),
            home_phone_number: "+5544669987".to_string(),
            home_subtitle: "Highest Quality Commodities".to_string(),
            home_heading: "Explore Top Antivirus Deals\nSave up to 80%".to_string(),
            home_description: "To protect your device and private information, choose the \
                best antivirus software."
                .to_string(),
            home_button_text: "GET STARTED →".to_string(),
            home_button_link: "/products".to_string(),
            disclaimer_heading: "Disclaimer".to_string(),
            disclaimer_content: "All trademarks, logos, brand names, and product names on \
                this site are the property of their respective owners and are displayed \
                for informational purposes only."
                .to_string(),
            footer_company_name: "CyberSafeTrust".to_string(),
            footer_company_tagline: "Protecting your digital life with the most trusted \
                antivirus solutions."
                .to_string(),
            footer_quick_links: vec![
                FooterLink {
                    text: "Home".to_string(),
                    url: "/".to_string(),
                },
                FooterLink {
                    text: "All Products".to_string(),
                    url: "/products".to_string(),
                },
            ],
            footer_contact_email: "support@cybersafetrust.com".to_string(),
            footer_contact_phone: "+91 98765 43210".to_string(),
            footer_contact_address: "Mumbai, India".to_string(),
            footer_payment_methods: "Paypal, Visa, MasterCard, Discover and American Express"
                .to_string(),
            footer_newsletter_heading: "Stay Updated".to_string(),
            footer_copyright_text: "© 2025 CyberSafeTrust. All rights reserved.".to_string(),
            footer_social_icons: vec![
                SocialIcon {
                    name: "Facebook".to_string(),
                    url: "#".to_string(),
                    img: "https://img.icons8.com/ios-filled/20/ffffff/facebook--v1.png"
                        .to_string(),
                },
                SocialIcon {
                    name: "Twitter".to_string(),
                    url: "#".to_string(),
                    img: "https://img.icons8.com/ios-filled/20/ffffff/twitter--v1.png"
                        .to_string(),
                },
                SocialIcon {
                    name: "LinkedIn".to_string(),
                    url: "#".to_string(),
                    img: "https://img.icons8.com/ios-filled/20/ffffff/linkedin.png".to_string(),
                },
            ],
            enable_campaign_banner: false,
            campaign_banner_heading: "Limited Time Offer!".to_string(),
            campaign_banner_text: "Get 50% OFF on all Antivirus products this week!".to_string(),
            campaign_banner_button_text: "Shop Now".to_string(),
            campaign_banner_button_link: "/products".to_string(),
            campaign_banner_image_url: String::new(),
            campaign_banner_background_color: "#f0f8ff".to_string(),
            campaign_banner_text_color: "#333333".to_string(),
            contact_address: "511, Cyberhub, Sector 19, Gurugram, HR12200".to_string(),
            contact_email: "support@cybersafetrust.com".to_string(),
            contact_phone: "+91 98765 43210".to_string(),
        }
    }
}

impl StoreSettings {
    /// Resolves stored key/value pairs over the defaults.
    ///
    /// ## Example
    /// ```rust
    /// use serde_json::json;
    /// use shopfront_core::settings::StoreSettings;
    ///
    /// let settings = StoreSettings::from_entries(vec![
    ///     ("themeColor".to_string(), json!("#000000")),
    ///     ("metaTitle".to_string(), json!("")),        // empty: default kept
    ///     ("enableCampaignBanner".to_string(), json!("yes")), // wrong type
    ///     ("somethingElse".to_string(), json!(1)),     // unknown: ignored
    /// ]);
    ///
    /// assert_eq!(settings.theme_color, "#000000");
    /// assert_eq!(settings.meta_title, StoreSettings::default().meta_title);
    /// assert!(!settings.enable_campaign_banner);
    /// ```
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut resolved = Self::default_map();

        for (key, value) in entries {
            let Some(default) = resolved.get(&key) else {
                continue;
            };
            if !same_json_type(default, &value) || is_blank(&value) {
                continue;
            }

            let previous = resolved.insert(key.clone(), value);
            // Arrays must also match the element shape
            if serde_json::from_value::<StoreSettings>(Value::Object(resolved.clone())).is_err() {
                if let Some(previous) = previous {
                    resolved.insert(key, previous);
                }
            }
        }

        serde_json::from_value(Value::Object(resolved)).unwrap_or_default()
    }

    /// Whether `key` names a setting (camelCase, as stored).
    pub fn is_known_key(key: &str) -> bool {
        Self::default_map().contains_key(key)
    }

    /// Whether `value` has the JSON type expected for `key`.
    pub fn accepts(key: &str, value: &Value) -> bool {
        Self::default_map()
            .get(key)
            .map(|default| same_json_type(default, value))
            .unwrap_or(false)
    }

    fn default_map() -> Map<String, Value> {
        match serde_json::to_value(StoreSettings::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn same_json_type(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::String(_), Value::String(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Number(_), Value::Number(_))
    )
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_nothing_stored() {
        let settings = StoreSettings::from_entries(Vec::new());
        assert_eq!(settings, StoreSettings::default());
        assert_eq!(settings.theme_color, "#1e90ff");
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.footer_quick_links.len(), 2);
    }

    #[test]
    fn test_overrides_apply() {
        let settings = StoreSettings::from_entries(vec![
            ("currency".to_string(), json!("EUR")),
            ("enableCampaignBanner".to_string(), json!(true)),
            (
                "footerQuickLinks".to_string(),
                json!([{ "text": "Blog", "url": "/page/blog" }]),
            ),
        ]);
        assert_eq!(settings.currency, "EUR");
        assert!(settings.enable_campaign_banner);
        assert_eq!(
            settings.footer_quick_links,
            vec![FooterLink {
                text: "Blog".to_string(),
                url: "/page/blog".to_string()
            }]
        );
    }

    #[test]
    fn test_malformed_array_keeps_default() {
        let settings = StoreSettings::from_entries(vec![(
            "footerSocialIcons".to_string(),
            json!([1, 2, 3]),
        )]);
        assert_eq!(
            settings.footer_social_icons,
            StoreSettings::default().footer_social_icons
        );
    }

    #[test]
    fn test_known_keys() {
        assert!(StoreSettings::is_known_key("themeColor"));
        assert!(StoreSettings::is_known_key("contactEmail"));
        assert!(!StoreSettings::is_known_key("theme_color"));
        assert!(StoreSettings::accepts("enableCampaignBanner", &json!(false)));
        assert!(!StoreSettings::accepts("enableCampaignBanner", &json!("false")));
    }
}
