//! Address entry for the first checkout step.

use serde::{Deserialize, Serialize};

use super::email::Email;

/// Kind of delivery address.
///
/// The backend stores the Arabic word, so that is the wire value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressType {
    #[default]
    #[serde(rename = "دائم")]
    Permanent,
    #[serde(rename = "مؤقت")]
    Temporary,
}

impl AddressType {
    /// Value sent to the backend and used in form fields.
    #[must_use]
    pub const fn wire_value(self) -> &'static str {
        match self {
            Self::Permanent => "دائم",
            Self::Temporary => "مؤقت",
        }
    }

    /// Parse a form value; anything unknown falls back to permanent.
    #[must_use]
    pub fn from_form(value: &str) -> Self {
        match value.trim() {
            "مؤقت" | "temporary" => Self::Temporary,
            _ => Self::Permanent,
        }
    }
}

/// A required field of the address step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    Name,
    Phone,
    Country,
    City,
    Street,
}

/// The address form as the shopper is filling it in.
///
/// Lives only while the shopper is on the checkout; it is persisted to the
/// backend during order submission, never on step change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub name: String,
    pub phone: String,
    /// Optional; a fallback address is sent when blank.
    pub email: String,
    pub country: String,
    pub city: String,
    pub postal: String,
    pub street: String,
    pub address_type: AddressType,
}

impl Default for AddressDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            country: "Kuwait".to_string(),
            city: String::new(),
            postal: "00000".to_string(),
            street: String::new(),
            address_type: AddressType::Permanent,
        }
    }
}

impl AddressDraft {
    /// Fields that must be non-blank before leaving the address step.
    ///
    /// Email is optional; postal code and address type always have defaults.
    pub const REQUIRED: [AddressField; 5] = [
        AddressField::Name,
        AddressField::Phone,
        AddressField::Country,
        AddressField::City,
        AddressField::Street,
    ];

    /// Value of a required field.
    #[must_use]
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::Name => &self.name,
            AddressField::Phone => &self.phone,
            AddressField::Country => &self.country,
            AddressField::City => &self.city,
            AddressField::Street => &self.street,
        }
    }

    /// Required fields that are empty after trimming.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<AddressField> {
        Self::REQUIRED
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Email to send to the backend: the shopper's, or the fallback.
    #[must_use]
    pub fn contact_email(&self, fallback: &Email) -> String {
        let email = self.email.trim();
        if email.is_empty() {
            fallback.as_str().to_string()
        } else {
            email.to_string()
        }
    }

    /// Keep only ASCII digits, as the phone input does.
    #[must_use]
    pub fn normalize_phone(raw: &str) -> String {
        raw.chars().filter(char::is_ascii_digit).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete() -> AddressDraft {
        AddressDraft {
            name: "Sara".to_string(),
            phone: "96551234567".to_string(),
            city: "Salmiya".to_string(),
            street: "Block 10, Street 5".to_string(),
            ..AddressDraft::default()
        }
    }

    #[test]
    fn test_default_prefills_country_and_postal() {
        let draft = AddressDraft::default();
        assert_eq!(draft.country, "Kuwait");
        assert_eq!(draft.postal, "00000");
        assert_eq!(draft.address_type, AddressType::Permanent);
    }

    #[test]
    fn test_complete_draft_without_email() {
        assert!(complete().is_complete());
    }

    #[test]
    fn test_every_required_field_blocks_when_blank() {
        // Each required field, blanked alone, must be the single reported gap.
        for field in AddressDraft::REQUIRED {
            let mut draft = complete();
            match field {
                AddressField::Name => draft.name = "  ".to_string(),
                AddressField::Phone => draft.phone.clear(),
                AddressField::Country => draft.country.clear(),
                AddressField::City => draft.city = "\t".to_string(),
                AddressField::Street => draft.street.clear(),
            }
            assert_eq!(draft.missing_fields(), vec![field]);
        }
    }

    #[test]
    fn test_postal_and_email_are_not_required() {
        let mut draft = complete();
        draft.postal.clear();
        draft.email.clear();
        assert!(draft.is_complete());
    }

    #[test]
    fn test_contact_email_falls_back_when_blank() {
        let fallback = Email::parse("orders@awisapp.com").unwrap();
        let mut draft = complete();
        assert_eq!(draft.contact_email(&fallback), "orders@awisapp.com");

        draft.email = " sara@example.com ".to_string();
        assert_eq!(draft.contact_email(&fallback), "sara@example.com");
    }

    #[test]
    fn test_normalize_phone_keeps_digits() {
        assert_eq!(AddressDraft::normalize_phone("+965 5115-3196"), "96551153196");
    }

    #[test]
    fn test_address_type_wire_values() {
        assert_eq!(
            serde_json::to_string(&AddressType::Temporary).unwrap(),
            "\"مؤقت\""
        );
        assert_eq!(AddressType::from_form("مؤقت"), AddressType::Temporary);
        assert_eq!(AddressType::from_form("anything"), AddressType::Permanent);
    }
}
