//! Products available at the business-guidance stage (§4.6).

use banking_types::ProductType;

/// One product's one-line description, injected into the
/// business-guidance prompt from a config file.
#[derive(Debug, Clone)]
pub struct ProductDescriptor {
    /// The product this descriptor names.
    pub product_type: ProductType,
    /// A one-line Korean description shown to the classification LLM.
    pub description: String,
}
