//! Tenant branding constants.
//!
//! One storefront build serves one tenant, chosen at start-up. Everything
//! tenant-specific that the checkout shows lives here.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unknown tenant name in configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tenant '{0}' (expected 'bavaria' or 'fakher')")]
pub struct TenantError(String);

/// Brand assets and support contacts for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub name_ar: &'static str,
    pub name_en: &'static str,
    pub description: &'static str,
    pub phone: Option<&'static str>,
    pub email: Option<&'static str>,
    pub whatsapp: Option<&'static str>,
    pub instagram: Option<&'static str>,
    /// Header and main brand color.
    pub primary_color: &'static str,
    /// Accent color.
    pub secondary_color: &'static str,
}

impl Branding {
    /// Page title, e.g. "بافاريا | Bavaria".
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} | {}", self.name_ar, self.name_en)
    }
}

const BAVARIA: Branding = Branding {
    name_ar: "بافاريا",
    name_en: "Bavaria",
    description: "بافاريا للعطور – باقة من العطور الراقية والبخور الفاخر بلمسات عطرية مبتكرة تجمع بين الأصالة والفخامة",
    phone: None,
    email: None,
    whatsapp: None,
    instagram: None,
    primary_color: "#1f2a44",
    secondary_color: "#c9a227",
};

const FAKHER_ROASTER: Branding = Branding {
    name_ar: "فاخر",
    name_en: "Fakher Roaster",
    description: "محمصة فاخر",
    phone: Some("+96551153196"),
    email: None,
    whatsapp: Some("https://wa.me/96551153196"),
    instagram: Some("https://www.instagram.com/fakherroaster/"),
    primary_color: "#64502e",
    secondary_color: "#ff0000",
};

/// A storefront tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenant {
    #[default]
    Bavaria,
    FakherRoaster,
}

impl Tenant {
    #[must_use]
    pub const fn branding(self) -> &'static Branding {
        match self {
            Self::Bavaria => &BAVARIA,
            Self::FakherRoaster => &FAKHER_ROASTER,
        }
    }
}

impl FromStr for Tenant {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bavaria" => Ok(Self::Bavaria),
            "fakher" | "fakher_roaster" | "fakher-roaster" => Ok(Self::FakherRoaster),
            other => Err(TenantError(other.to_string())),
        }
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.branding().name_en)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tenants() {
        assert_eq!("Bavaria".parse::<Tenant>().unwrap(), Tenant::Bavaria);
        assert_eq!("fakher".parse::<Tenant>().unwrap(), Tenant::FakherRoaster);
        assert!("acme".parse::<Tenant>().is_err());
    }

    #[test]
    fn test_branding_differs_per_tenant() {
        let bavaria = Tenant::Bavaria.branding();
        let fakher = Tenant::FakherRoaster.branding();
        assert_eq!(bavaria.title(), "بافاريا | Bavaria");
        assert_ne!(bavaria.primary_color, fakher.primary_color);
        assert_eq!(fakher.whatsapp, Some("https://wa.me/96551153196"));
    }
}
