//! Postal address matching tuple.

use crate::models::Contact;

/// Upper-case the first letter of every whitespace-separated word.
///
/// The remainder of each word is left untouched, so `"mcDonald st"` becomes
/// `"McDonald St"`. Address columns are stored in this form.
pub fn ucwords(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;

    for c in value.chars() {
        if at_word_start {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        at_word_start = c.is_whitespace();
    }

    result
}

/// Trim and title-case an optional component, dropping it when empty.
fn component(value: Option<&str>) -> Option<String> {
    value
        .map(|v| ucwords(v).trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A complete-enough address to match on.
///
/// Only built when `address1` is present together with a city or a zipcode;
/// partial addresses never activate address matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressTuple {
    pub address1: String,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

impl AddressTuple {
    /// Build the tuple from a contact, or `None` when it is too sparse.
    pub fn from_contact(contact: &Contact) -> Option<Self> {
        let address1 = component(contact.address1.as_deref())?;
        let city = component(contact.city.as_deref());
        let zipcode = component(contact.zipcode.as_deref());

        if city.is_none() && zipcode.is_none() {
            tracing::debug!(
                contact_id = contact.id,
                "Address lacks city and zipcode, skipping address matching"
            );
            return None;
        }

        Some(Self {
            address1,
            address2: component(contact.address2.as_deref()),
            city,
            state: component(contact.state.as_deref()),
            zipcode,
            country: component(contact.country.as_deref()),
        })
    }
}
