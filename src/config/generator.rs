//! Generator configuration loading from config.toml
//!
//! The population generator is parameterized by entity counts, value ranges,
//! and a random seed - nothing else. Defaults produce the stock demo dataset
//! (100 users, 200 products, 150 orders, 300 review attempts).

use std::path::Path;

use serde::Deserialize;

use crate::errors::{Error, Result};

/// Configuration for one population run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed for the pseudo-random source; equal seeds produce equal datasets
    pub seed: u64,
    /// Number of users to create
    pub users: u32,
    /// Number of products to create
    pub products: u32,
    /// Number of orders to create
    pub orders: u32,
    /// Number of review attempts; duplicates are skipped, not retried
    pub reviews: u32,
    /// Lower bound of generated product prices, in cents
    pub price_min_cents: i64,
    /// Upper bound of generated product prices, in cents
    pub price_max_cents: i64,
    /// Lower bound of generated cost prices, in cents
    pub cost_min_cents: i64,
    /// Upper bound of generated cost prices, in cents
    pub cost_max_cents: i64,
    /// Upper bound of generated stock quantities
    pub stock_max: i32,
    /// Discrete set of shipping charges orders draw from, in cents
    pub shipping_options_cents: Vec<i64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            users: 100,
            products: 200,
            orders: 150,
            reviews: 300,
            price_min_cents: 1_000,
            price_max_cents: 100_000,
            cost_min_cents: 500,
            cost_max_cents: 80_000,
            stock_max: 1_000,
            shipping_options_cents: vec![599, 799, 1_099, 1_599],
        }
    }
}

impl GeneratorConfig {
    /// Checks the configuration for ranges the generator cannot honor.
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.price_min_cents <= 0 || self.price_max_cents < self.price_min_cents {
            return Err(Error::Config {
                message: format!(
                    "price range {}..={} cents is invalid, prices must be positive",
                    self.price_min_cents, self.price_max_cents
                ),
            });
        }
        if self.cost_min_cents < 0 || self.cost_max_cents < self.cost_min_cents {
            return Err(Error::Config {
                message: format!(
                    "cost range {}..={} cents is invalid",
                    self.cost_min_cents, self.cost_max_cents
                ),
            });
        }
        if self.stock_max < 0 {
            return Err(Error::Config {
                message: format!("stock_max {} is negative", self.stock_max),
            });
        }
        if self.shipping_options_cents.is_empty()
            || self.shipping_options_cents.iter().any(|&cost| cost < 0)
        {
            return Err(Error::Config {
                message: "shipping_options_cents must list at least one non-negative charge"
                    .to_string(),
            });
        }
        if self.orders > 0 && (self.users == 0 || self.products == 0) {
            return Err(Error::Config {
                message: "orders require at least one user and one product".to_string(),
            });
        }
        if self.reviews > 0 && (self.users == 0 || self.products == 0) {
            return Err(Error::Config {
                message: "reviews require at least one user and one product".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level shape of config.toml.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    generator: GeneratorConfig,
}

/// Loads generator configuration from a TOML file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    Ok(file.generator)
}

/// Loads generator configuration from the given path, falling back to the
/// defaults when the file does not exist.
///
/// # Errors
/// Returns [`Error::Config`] if the file exists but cannot be parsed.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        Ok(GeneratorConfig::default())
    }
}
