pub mod oracle;
pub mod tokens;

pub use oracle::{HttpPriceOracle, OracleError, PriceOracle};
pub use tokens::TokenMetadataSource;
