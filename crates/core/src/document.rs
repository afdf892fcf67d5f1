//! The site configuration document model.
//!
//! A single `SiteConfiguration` document is the canonical content record for
//! the storefront tenant: every piece of editable copy, the currency table,
//! testimonials, custom sections and legal text live here. The document is
//! persisted as camelCase JSON in the remote store and mutated exclusively
//! through the CMS engine's `ConfigStore`.
//!
//! Every container carries `#[serde(default)]` so a document persisted by an
//! older schema still deserializes, with the hard-coded defaults filling any
//! fields that were never persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::{CurrencyRate, format_usd};

/// The canonical content record for one storefront tenant.
///
/// Created with [`SiteConfiguration::default`] at store construction and
/// reconciled against the remote document on first subscription; never
/// deleted. Unknown top-level keys written by newer clients are preserved in
/// `extra` (the merge mechanism does not forbid dynamic keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfiguration {
    pub site_name: String,
    /// Must name a key of `currencies`; the price formatter tolerates a
    /// violation by falling back to USD.
    pub active_currency: String,
    pub currencies: BTreeMap<String, CurrencyRate>,
    pub testimonials: Vec<Testimonial>,
    pub custom_sections: BTreeMap<String, CustomSection>,
    pub faq_page: Vec<FaqEntry>,
    pub home: HomeContent,
    pub about: AboutContent,
    pub financing: FinancingContent,
    pub inventory_page: InventoryContent,
    pub contact: ContactContent,
    pub privacy_policy: String,
    pub terms_of_service: String,
    pub deal_of_the_week: DealOfTheWeek,
    /// Top-level keys not covered by the fixed schema.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SiteConfiguration {
    /// Format a canonical USD amount in the document's active currency.
    ///
    /// Pure and deterministic; safe to call at render frequency.
    #[must_use]
    pub fn format_price(&self, amount_usd: Decimal) -> String {
        format_usd(amount_usd, &self.active_currency, &self.currencies)
    }
}

impl Default for SiteConfiguration {
    fn default() -> Self {
        Self {
            site_name: "Velluto Motors".to_string(),
            active_currency: "USD".to_string(),
            currencies: default_currencies(),
            testimonials: default_testimonials(),
            custom_sections: default_custom_sections(),
            faq_page: default_faq(),
            home: HomeContent::default(),
            about: AboutContent::default(),
            financing: FinancingContent::default(),
            inventory_page: InventoryContent::default(),
            contact: ContactContent::default(),
            privacy_policy: "Velluto Motors collects only the information required to \
                arrange viewings, financing and delivery. We never sell client data."
                .to_string(),
            terms_of_service: "All listed vehicles are offered subject to prior sale. \
                Prices exclude registration, taxes and delivery unless stated otherwise."
                .to_string(),
            deal_of_the_week: DealOfTheWeek::default(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A client testimonial shown on the storefront.
///
/// The `id` is a UUID string assigned at creation and stable across edits, so
/// the editor can address an entry by index while the storefront keys on id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Testimonial {
    pub id: String,
    pub text: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Testimonial {
    /// Create a testimonial with a fresh unique id.
    #[must_use]
    pub fn new(text: &str, name: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            avatar: None,
        }
    }
}

impl Default for Testimonial {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

/// Which side of a custom section the image sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionLayout {
    #[default]
    Left,
    Right,
}

/// An administrator-authored content section.
///
/// Section keys are fixed at initialization; the CMS toggles `is_active`
/// rather than inserting or deleting keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomSection {
    pub is_active: bool,
    pub title: String,
    pub subtitle: String,
    pub content: String,
    pub image_url: String,
    pub layout: SectionLayout,
}

/// A question/answer pair on the FAQ page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqEntry {
    pub q: String,
    pub a: String,
}

/// Home page copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeContent {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_cta: String,
    pub hero_image: String,
    pub selling_points: Vec<String>,
}

impl Default for HomeContent {
    fn default() -> Self {
        Self {
            hero_title: "Exceptional machines, impeccably sourced".to_string(),
            hero_subtitle: "A curated marketplace for performance and grand touring icons"
                .to_string(),
            hero_cta: "Browse the collection".to_string(),
            hero_image: "/static/images/hero/showroom.jpg".to_string(),
            selling_points: vec![
                "Every vehicle inspected by marque specialists".to_string(),
                "Provenance dossier with each listing".to_string(),
                "White-glove delivery worldwide".to_string(),
            ],
        }
    }
}

/// About page copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AboutContent {
    pub heading: String,
    pub story: Vec<String>,
    pub values: Vec<String>,
    pub image_url: String,
}

impl Default for AboutContent {
    fn default() -> Self {
        Self {
            heading: "The house of Velluto".to_string(),
            story: vec![
                "Velluto Motors began as a two-car consignment in a Modena courtyard."
                    .to_string(),
                "Today we place rare automobiles with collectors on five continents."
                    .to_string(),
            ],
            values: vec![
                "Discretion".to_string(),
                "Provenance".to_string(),
                "Craft".to_string(),
            ],
            image_url: "/static/images/about/atelier.jpg".to_string(),
        }
    }
}

/// Financing page copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancingContent {
    pub heading: String,
    pub intro: String,
    pub options: Vec<String>,
    pub disclaimer: String,
}

impl Default for FinancingContent {
    fn default() -> Self {
        Self {
            heading: "Financing, quietly arranged".to_string(),
            intro: "Our partners structure terms around the vehicle, not a formula."
                .to_string(),
            options: vec![
                "Lease purchase from 24 months".to_string(),
                "Balloon settlement against future consignment".to_string(),
                "Collection-backed credit lines".to_string(),
            ],
            disclaimer: "Subject to status. Terms vary by jurisdiction.".to_string(),
        }
    }
}

/// Inventory page copy (the listing data itself lives elsewhere).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryContent {
    pub heading: String,
    pub subheading: String,
    pub empty_state_text: String,
    pub badges: Vec<String>,
}

impl Default for InventoryContent {
    fn default() -> Self {
        Self {
            heading: "Current collection".to_string(),
            subheading: "Each car is available for private viewing by appointment"
                .to_string(),
            empty_state_text: "The collection is being refreshed. Enquire for early access."
                .to_string(),
            badges: vec!["Inspected".to_string(), "Documented".to_string()],
        }
    }
}

/// Contact page copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactContent {
    pub heading: String,
    pub intro: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub hours: Vec<String>,
}

impl Default for ContactContent {
    fn default() -> Self {
        Self {
            heading: "Speak with the atelier".to_string(),
            intro: "Viewings are private and unhurried.".to_string(),
            address: "Via Emilia Est 11, Modena".to_string(),
            phone: "+39 059 000 000".to_string(),
            email: "atelier@vellutomotors.com".to_string(),
            hours: vec![
                "Tuesday - Saturday, 10:00 - 19:00".to_string(),
                "Sundays by appointment".to_string(),
            ],
        }
    }
}

/// The rotating featured listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealOfTheWeek {
    pub is_active: bool,
    pub make: String,
    pub model: String,
    pub description: String,
    pub price_usd: Decimal,
    pub image: String,
    pub end_time: DateTime<Utc>,
}

impl Default for DealOfTheWeek {
    fn default() -> Self {
        Self {
            is_active: false,
            make: "Aston Martin".to_string(),
            model: "DB5 Vantage".to_string(),
            description: "Matching numbers, Silver Birch over Connolly hide.".to_string(),
            price_usd: Decimal::new(1_250_000, 0),
            image: "/static/images/deals/db5.jpg".to_string(),
            // Fixed so the hard-coded default document is identical across
            // processes (the bootstrap seed must be idempotent).
            end_time: DateTime::from_timestamp(1_790_812_799, 0)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

fn default_currencies() -> BTreeMap<String, CurrencyRate> {
    let mut map = BTreeMap::new();
    map.insert("USD".to_string(), CurrencyRate::usd());
    map.insert(
        "EUR".to_string(),
        CurrencyRate::new("EUR", "€", Decimal::new(92, 2)),
    );
    map.insert(
        "GBP".to_string(),
        CurrencyRate::new("GBP", "£", Decimal::new(79, 2)),
    );
    map.insert(
        "AED".to_string(),
        CurrencyRate::new("AED", "د.إ", Decimal::new(367, 2)),
    );
    map.insert(
        "NGN".to_string(),
        CurrencyRate::new("NGN", "₦", Decimal::new(1550, 0)),
    );
    map
}

fn default_testimonials() -> Vec<Testimonial> {
    vec![
        Testimonial {
            id: "9b2f2c1e-4a77-4dc6-9f0e-0f6a1c2d3e4f".to_string(),
            text: "They found the exact specification I had chased for a decade."
                .to_string(),
            name: "A. Castellani".to_string(),
            role: "Collector, Lake Como".to_string(),
            avatar: None,
        },
        Testimonial {
            id: "f1d8a6b0-93c4-45e2-8b11-7cce5a9d20aa".to_string(),
            text: "The provenance file alone was worth the commission.".to_string(),
            name: "R. Osei".to_string(),
            role: "First-time buyer, Accra".to_string(),
            avatar: None,
        },
    ]
}

fn default_custom_sections() -> BTreeMap<String, CustomSection> {
    let mut map = BTreeMap::new();
    map.insert(
        "heritage".to_string(),
        CustomSection {
            is_active: true,
            title: "Heritage program".to_string(),
            subtitle: "Restoration and certification".to_string(),
            content: "Factory-correct restorations documented down to the fastener."
                .to_string(),
            image_url: "/static/images/sections/heritage.jpg".to_string(),
            layout: SectionLayout::Left,
        },
    );
    map.insert(
        "concierge".to_string(),
        CustomSection {
            is_active: false,
            title: "Concierge".to_string(),
            subtitle: "Ownership without friction".to_string(),
            content: "Storage, transport, registration and track support on retainer."
                .to_string(),
            image_url: "/static/images/sections/concierge.jpg".to_string(),
            layout: SectionLayout::Right,
        },
    );
    map
}

fn default_faq() -> Vec<FaqEntry> {
    vec![
        FaqEntry {
            q: "Can I view a car before committing?".to_string(),
            a: "Always. Every listing is available for a private viewing or a video \
                walk-around with the specialist who inspected it."
                .to_string(),
        },
        FaqEntry {
            q: "Do you ship internationally?".to_string(),
            a: "We arrange enclosed transport and customs handling worldwide."
                .to_string(),
        },
        FaqEntry {
            q: "Which currencies do you display?".to_string(),
            a: "Prices are held in US dollars and displayed in the currency the \
                storefront is set to."
                .to_string(),
        },
    ]
}
