use crate::blockchain::client::{GatewayClient, LedgerError};
use crate::models::Token;
use async_trait::async_trait;

/// Source of static token metadata
#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn token(&self, identifier: &str) -> Result<Token, LedgerError>;

    /// Raw base64 attributes of one token nonce held by `owner`
    async fn nft_attributes(&self, owner: &str, identifier: &str) -> Result<String, LedgerError>;
}

#[async_trait]
impl TokenMetadataSource for GatewayClient {
    async fn token(&self, identifier: &str) -> Result<Token, LedgerError> {
        self.get_token(identifier).await
    }

    async fn nft_attributes(&self, owner: &str, identifier: &str) -> Result<String, LedgerError> {
        self.get_nft_attributes(owner, identifier).await
    }
}
