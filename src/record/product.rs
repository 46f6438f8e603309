use crate::record::price::{discount_fraction, PriceText, NOT_AVAILABLE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Pricing for one color of a product
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Variant code read from the page URL (unique within a product)
    pub variant_code: String,

    /// Color name as displayed
    pub display_name: String,

    /// Regular price
    pub list_price: PriceText,

    /// Sale price, only when the variant is flagged and the label is shown
    pub sale_price: Option<PriceText>,

    /// `(list - sale) / list`, only when both amounts parsed
    pub discount_fraction: Option<f64>,
}

impl VariantRecord {
    /// Builds a variant record, deriving the discount from the two prices
    pub fn new(
        variant_code: impl Into<String>,
        display_name: impl Into<String>,
        list_price: PriceText,
        sale_price: Option<PriceText>,
    ) -> Self {
        let discount_fraction = discount_fraction(
            list_price.value,
            sale_price.as_ref().and_then(|price| price.value),
        );

        Self {
            variant_code: variant_code.into(),
            display_name: display_name.into(),
            list_price,
            sale_price,
            discount_fraction,
        }
    }
}

/// All variants extracted from one product page
///
/// Variants keep discovery order. Inserting a code that is already present
/// is ignored, so the first swatch carrying a code wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub product_url: String,
    variants: Vec<VariantRecord>,
}

impl ProductRecord {
    /// Creates an empty record for a product
    pub fn new(product_url: impl Into<String>) -> Self {
        Self {
            product_url: product_url.into(),
            variants: Vec::new(),
        }
    }

    /// Adds a variant unless its code was already recorded
    ///
    /// Returns true if the variant was added.
    pub fn insert(&mut self, variant: VariantRecord) -> bool {
        if self.contains(&variant.variant_code) {
            return false;
        }
        self.variants.push(variant);
        true
    }

    /// Returns true if a variant with this code was recorded
    pub fn contains(&self, variant_code: &str) -> bool {
        self.variants.iter().any(|v| v.variant_code == variant_code)
    }

    /// Looks up a variant by code
    pub fn get(&self, variant_code: &str) -> Option<&VariantRecord> {
        self.variants.iter().find(|v| v.variant_code == variant_code)
    }

    /// Variants in discovery order
    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    /// Variant codes in discovery order
    pub fn codes(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.variant_code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// One JSONL line as written to disk
#[derive(Serialize, Deserialize)]
struct ProductLine {
    #[serde(alias = "product_link")]
    product_url: String,
    #[serde(default)]
    colors: Vec<BTreeMap<String, VariantLine>>,
}

#[derive(Serialize, Deserialize)]
struct VariantLine {
    #[serde(default)]
    color_text: String,
    #[serde(default = "not_available")]
    original_price: String,
    #[serde(default = "not_available")]
    sale_price: String,
    #[serde(default)]
    sale_percent: Option<f64>,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

impl From<&VariantRecord> for VariantLine {
    fn from(variant: &VariantRecord) -> Self {
        Self {
            color_text: variant.display_name.clone(),
            original_price: variant.list_price.text.clone(),
            sale_price: variant
                .sale_price
                .as_ref()
                .map_or_else(not_available, |price| price.text.clone()),
            sale_percent: variant.discount_fraction,
        }
    }
}

impl VariantLine {
    fn into_record(self, variant_code: String) -> VariantRecord {
        let sale_price = if self.sale_price == NOT_AVAILABLE {
            None
        } else {
            Some(PriceText::parse(self.sale_price))
        };

        VariantRecord {
            variant_code,
            display_name: self.color_text,
            list_price: PriceText::parse(self.original_price),
            sale_price,
            // The stored fraction is authoritative for records already on disk.
            discount_fraction: self.sale_percent,
        }
    }
}

impl Serialize for ProductRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let line = ProductLine {
            product_url: self.product_url.clone(),
            colors: self
                .variants
                .iter()
                .map(|variant| {
                    let mut entry = BTreeMap::new();
                    entry.insert(variant.variant_code.clone(), VariantLine::from(variant));
                    entry
                })
                .collect(),
        };
        line.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProductRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let line = ProductLine::deserialize(deserializer)?;
        let mut record = ProductRecord::new(line.product_url);
        for entry in line.colors {
            for (code, variant) in entry {
                record.insert(variant.into_record(code));
            }
        }
        Ok(record)
    }
}
