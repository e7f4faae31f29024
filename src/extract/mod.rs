//! Structural extraction of product records from catalog search pages.
//!
//! Every field is resolved independently through its selector chain. A miss at
//! any stage resolves to the field's sentinel; extraction itself cannot fail.

pub mod catalog;
pub mod price;

use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::observability::metrics;
use crate::transport::FetchOutcome;
use crate::types::{CatalogKind, FieldValue, Identifier, ProductRecord};
use catalog::{CatalogStrategy, Field, SelectorChain};
use price::{collapse_whitespace, join_fraction};

struct CompiledChain {
    field: Field,
    selectors: Vec<Selector>,
}

impl CompiledChain {
    fn compile(kind: CatalogKind, chain: &SelectorChain) -> Self {
        let selectors = chain
            .selectors
            .iter()
            .filter_map(|raw| match Selector::parse(raw) {
                Ok(sel) => Some(sel),
                Err(e) => {
                    warn!(catalog = %kind, field = chain.field.as_str(), selector = *raw, "skipping invalid selector: {:?}", e);
                    None
                }
            })
            .collect();
        Self {
            field: chain.field,
            selectors,
        }
    }
}

struct CompiledStrategy {
    name: CompiledChain,
    regular_price: CompiledChain,
    promo_price: CompiledChain,
}

impl CompiledStrategy {
    fn compile(strategy: &CatalogStrategy) -> Self {
        Self {
            name: CompiledChain::compile(strategy.kind, &strategy.name),
            regular_price: CompiledChain::compile(strategy.kind, &strategy.regular_price),
            promo_price: CompiledChain::compile(strategy.kind, &strategy.promo_price),
        }
    }
}

/// Turns fetched documents into `ProductRecord`s. Selectors are compiled once;
/// share one instance across tasks.
pub struct Extractor {
    strategies: HashMap<CatalogKind, CompiledStrategy>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        let strategies = CatalogKind::ALL
            .iter()
            .map(|kind| (*kind, CompiledStrategy::compile(kind.strategy())))
            .collect();
        Self { strategies }
    }

    /// Record for a finished fetch: extracted on success, all sentinels on failure.
    pub fn record_for(&self, outcome: &FetchOutcome, kind: CatalogKind, identifier: Identifier) -> ProductRecord {
        match outcome {
            FetchOutcome::Document(body) => self.extract(body, kind, identifier),
            FetchOutcome::Failed(_) => ProductRecord::unavailable(identifier, kind),
        }
    }

    pub fn extract(&self, document: &str, kind: CatalogKind, identifier: Identifier) -> ProductRecord {
        let html = Html::parse_document(document);
        self.extract_html(&html, kind, identifier)
    }

    pub fn extract_html(&self, html: &Html, kind: CatalogKind, identifier: Identifier) -> ProductRecord {
        let Some(strategy) = self.strategies.get(&kind) else {
            return ProductRecord::unavailable(identifier, kind);
        };

        let name = self.resolve(html, kind, &strategy.name).map(|(_, text)| text);
        let regular = self.resolve(html, kind, &strategy.regular_price);
        let promo = self.resolve(html, kind, &strategy.promo_price);

        // Both chains landing on the same node means there is no separate promo price
        let promo = match (&regular, promo) {
            (Some((regular_node, _)), Some((promo_node, _))) if *regular_node == promo_node => None,
            (_, promo) => promo.map(|(_, text)| text),
        };
        let regular = regular.map(|(_, text)| text);

        metrics::extract::record_extracted(kind.name());
        ProductRecord::new(identifier, FieldValue::from(name), FieldValue::from(regular), promo, kind)
    }

    /// First non-empty match along the chain, with the node it came from.
    fn resolve<'a>(
        &self,
        html: &'a Html,
        kind: CatalogKind,
        chain: &CompiledChain,
    ) -> Option<(ElementRef<'a>, String)> {
        for (position, selector) in chain.selectors.iter().enumerate() {
            let Some(node) = html.select(selector).next() else {
                continue;
            };
            let value = if chain.field.is_price() {
                price_text(node)
            } else {
                plain_text(node)
            };
            if let Some(value) = value {
                if position > 0 {
                    debug!(catalog = %kind, field = chain.field.as_str(), position, "matched fallback selector");
                }
                return Some((node, value));
            }
        }
        debug!(catalog = %kind, field = chain.field.as_str(), "no selector matched");
        metrics::extract::field_missing(kind.name(), chain.field.as_str());
        None
    }
}

fn plain_text(node: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(&node.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Price text with any split-off fraction put back: a `<sup>` inside the node or
/// directly after it holds the decimals.
fn price_text(node: ElementRef<'_>) -> Option<String> {
    let mut integer = String::new();
    let mut fraction = None;
    split_superscript(node, &mut integer, &mut fraction);
    let fraction = fraction.or_else(|| following_superscript(node));
    join_fraction(&integer, fraction.as_deref())
}

fn split_superscript(el: ElementRef<'_>, main: &mut String, sup: &mut Option<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            main.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if child_el.value().name() == "sup" {
                if sup.is_none() {
                    *sup = Some(child_el.text().collect());
                }
            } else {
                split_superscript(child_el, main, sup);
            }
        }
    }
}

/// Text of the next element sibling if it is a `<sup>`. Whitespace and comments
/// in between are skipped; any other content breaks adjacency.
fn following_superscript(el: ElementRef<'_>) -> Option<String> {
    let mut sibling = el.next_sibling();
    while let Some(node) = sibling {
        match node.value() {
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Comment(_) => {}
            Node::Element(e) if e.name() == "sup" => {
                return ElementRef::wrap(node).map(|sup| sup.text().collect());
            }
            _ => return None,
        }
        sibling = node.next_sibling();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    fn extract(html: &str, kind: CatalogKind) -> ProductRecord {
        Extractor::new().extract(html, kind, id("100"))
    }

    #[test]
    fn praktis_regular_and_promo() {
        let html = r#"
            <div class="product">
              <p class="product-name h4">  Бормашина
                 500W </p>
              <div class="old-price"><span class="price">129.99 лв.</span></div>
              <div class="special-price"><span class="price">99.99 лв.</span></div>
            </div>"#;
        let record = extract(html, CatalogKind::Praktis);
        assert_eq!(record.display_name(), &FieldValue::Found("Бормашина 500W".into()));
        assert_eq!(record.regular_price(), &FieldValue::Found("129.99".into()));
        assert_eq!(record.promo_price(), Some("99.99"));
    }

    #[test]
    fn praktis_without_promotion_uses_plain_price() {
        let html = r#"<p class="product-name h4">Лепило</p><span class="price">8.40 лв.</span>"#;
        let record = extract(html, CatalogKind::Praktis);
        assert_eq!(record.regular_price(), &FieldValue::Found("8.40".into()));
        assert_eq!(record.promo_price(), None);
    }

    #[test]
    fn primary_selector_beats_fallback_when_both_present() {
        let html = r#"
            <h2 class="product-item__title"><a href="/p/1">Винтоверт</a></h2>
            <span class="product-price product-price--old"><span class="product-price__value">80</span><sup>00</sup></span>
            <span class="price__value">65</span><sup>90</sup>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("80.00".into()));
    }

    #[test]
    fn fallback_selector_used_when_primary_absent() {
        let html = r#"<span class="price__value">65</span><sup>90</sup>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("65.90".into()));
    }

    #[test]
    fn empty_primary_match_falls_through_to_next_selector() {
        let html = r#"<span class="price__value">65</span>
                      <span class="product-price--old"><span class="product-price__value"> </span></span>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("65".into()));
    }

    #[test]
    fn only_the_first_match_of_a_selector_is_inspected() {
        let html = r#"<span class="price__value">65</span>
                      <span class="product-price--old"><span class="product-price__value"></span></span>
                      <span class="product-price--old"><span class="product-price__value">80</span></span>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("65".into()));
    }

    #[test]
    fn currency_only_node_is_a_miss() {
        let html = r#"<span class="price">  лв. </span>"#;
        let record = extract(html, CatalogKind::Praktis);
        assert_eq!(record.regular_price(), &FieldValue::Unavailable);
    }

    #[test]
    fn fraction_in_adjacent_superscript_is_joined() {
        let html = r#"<span class="product-price__value">12</span> <sup>50</sup>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("12.50".into()));
    }

    #[test]
    fn fraction_nested_inside_value_node_is_joined() {
        let html = r#"<span class="product-price__value">12<sup>50</sup> лв.</span>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("12.50".into()));
    }

    #[test]
    fn distant_superscript_is_not_treated_as_fraction() {
        let html = r#"<div><span class="product-price__value">12</span><em>each</em><sup>50</sup></div>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("12".into()));
    }

    #[test]
    fn praktiker_promo_is_reconstructed_too() {
        let html = r#"
            <h2 class="product-item__title"><a>Боя</a></h2>
            <div class="product-store-prices__item">
              <span class="product-price product-price--old"><span class="product-price__value">30</span><sup>00</sup></span>
              <span class="product-price"><span class="product-price__value">24</span><sup>99</sup></span>
            </div>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("30.00".into()));
        assert_eq!(record.promo_price(), Some("24.99"));
    }

    #[test]
    fn praktiker_current_price_alone_is_not_a_promotion() {
        let html = r#"
            <h2 class="product-item__title"><a>Боя</a></h2>
            <div class="product-store-prices__item">
              <span class="product-price"><span class="product-price__value">24</span><sup>99</sup></span>
            </div>"#;
        let record = extract(html, CatalogKind::Praktiker);
        assert_eq!(record.regular_price(), &FieldValue::Found("24.99".into()));
        assert_eq!(record.promo_price(), None);
    }

    #[test]
    fn praktis_special_price_equal_to_old_price_is_still_a_promotion() {
        let html = r#"<p class="product-name h4">Лепило</p>
                      <div class="old-price"><span class="price">10.00 лв.</span></div>
                      <div class="special-price"><span class="price">10.00 лв.</span></div>"#;
        let record = extract(html, CatalogKind::Praktis);
        assert_eq!(record.regular_price(), &FieldValue::Found("10.00".into()));
        assert_eq!(record.promo_price(), Some("10.00"));
    }

    #[test]
    fn praktis_lone_special_price_is_not_counted_twice() {
        let html = r#"<div class="special-price"><span class="price">7.50 лв.</span></div>"#;
        let record = extract(html, CatalogKind::Praktis);
        assert_eq!(record.regular_price(), &FieldValue::Found("7.50".into()));
        assert_eq!(record.promo_price(), None);
    }

    #[test]
    fn missing_name_keeps_other_fields() {
        let html = r#"<div class="old-price"><span class="price">10.00 лв.</span></div>
                      <div class="special-price"><span class="price">7.50 лв.</span></div>"#;
        let record = extract(html, CatalogKind::Praktis);
        assert_eq!(record.display_name(), &FieldValue::Unavailable);
        assert_eq!(record.regular_price(), &FieldValue::Found("10.00".into()));
        assert_eq!(record.promo_price(), Some("7.50"));
        assert_eq!(record.identifier().as_str(), "100");
        assert_eq!(record.source_catalog(), CatalogKind::Praktis);
    }

    #[test]
    fn empty_document_yields_all_sentinels() {
        let record = extract("<html><body>Няма резултати</body></html>", CatalogKind::Praktiker);
        assert_eq!(record, ProductRecord::unavailable(id("100"), CatalogKind::Praktiker));
    }

    #[test]
    fn extraction_is_deterministic() {
        let html = r#"<p class="product-name h4">Чук</p><span class="price">12.00 лв.</span>"#;
        let extractor = Extractor::new();
        let a = extractor.extract(html, CatalogKind::Praktis, id("1"));
        let b = extractor.extract(html, CatalogKind::Praktis, id("1"));
        assert_eq!(a, b);
    }

    #[test]
    fn failed_fetch_becomes_sentinel_record() {
        let outcome = FetchOutcome::Failed(crate::error::FetchError::Timeout { url: "u".into() });
        let record = Extractor::new().record_for(&outcome, CatalogKind::Praktis, id("9"));
        assert_eq!(record, ProductRecord::unavailable(id("9"), CatalogKind::Praktis));
    }
}
