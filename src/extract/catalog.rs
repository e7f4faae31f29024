use crate::types::CatalogKind;

/// Which product field a selector chain feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    RegularPrice,
    PromoPrice,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::RegularPrice => "regular_price",
            Field::PromoPrice => "promo_price",
        }
    }

    pub fn is_price(&self) -> bool {
        !matches!(self, Field::Name)
    }
}

/// Ordered CSS selectors for one field. The first selector whose first match has
/// non-empty text wins.
///
/// Only the first match of each selector is inspected. If it is empty the chain
/// moves on to the next selector, even when later matches of the same selector
/// carry text.
#[derive(Debug, Clone, Copy)]
pub struct SelectorChain {
    pub field: Field,
    pub selectors: &'static [&'static str],
}

/// Extraction rules for one catalog's search-result template.
#[derive(Debug, Clone, Copy)]
pub struct CatalogStrategy {
    pub kind: CatalogKind,
    pub name: SelectorChain,
    pub regular_price: SelectorChain,
    pub promo_price: SelectorChain,
}

impl CatalogStrategy {
    pub fn chains(&self) -> [SelectorChain; 3] {
        [self.name, self.regular_price, self.promo_price]
    }
}

// The old-price node is only present while a promotion runs; without one the
// current price is the regular price.
static PRAKTIS: CatalogStrategy = CatalogStrategy {
    kind: CatalogKind::Praktis,
    name: SelectorChain {
        field: Field::Name,
        selectors: &["p.product-name.h4"],
    },
    regular_price: SelectorChain {
        field: Field::RegularPrice,
        selectors: &["span.price.striked, div.old-price span.price", "span.price"],
    },
    promo_price: SelectorChain {
        field: Field::PromoPrice,
        selectors: &["div.special-price span.price"],
    },
};

static PRAKTIKER: CatalogStrategy = CatalogStrategy {
    kind: CatalogKind::Praktiker,
    name: SelectorChain {
        field: Field::Name,
        selectors: &["h2.product-item__title a"],
    },
    regular_price: SelectorChain {
        field: Field::RegularPrice,
        selectors: &[
            "span.product-price--old .product-price__value",
            "span.product-price__value, span.price__value",
        ],
    },
    promo_price: SelectorChain {
        field: Field::PromoPrice,
        selectors: &[
            "div.product-store-prices__item > span.product-price:not(.product-price--old) span.product-price__value",
        ],
    },
};

impl CatalogKind {
    pub fn strategy(&self) -> &'static CatalogStrategy {
        match self {
            CatalogKind::Praktis => &PRAKTIS,
            CatalogKind::Praktiker => &PRAKTIKER,
        }
    }
}
