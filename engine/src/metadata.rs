use alloy::primitives::Address;
use setchart_common::address::canonical;
use setchart_utils::registry::Registry;

use crate::{traits::MetadataSource, types::TokenMeta};

/// Decimals from the registry's known tokens, falling back to a live lookup.
/// Live answers are not cached, repeat lookups for a token just cost a call.
pub struct MetadataResolver<'a, M> {
    registry: &'a Registry,
    live: &'a M,
}

impl<'a, M: MetadataSource + Sync> MetadataResolver<'a, M> {
    pub fn new(registry: &'a Registry, live: &'a M) -> Self {
        Self { registry, live }
    }

    pub async fn resolve_decimals(&self, token: Address) -> crate::Result<u8> {
        if let Some(known) = self.registry.known_token(&token) {
            return Ok(known.decimals);
        }

        self.live.decimals(token).await.map_err(|e| match e {
            e @ crate::Error::MetadataUnavailable { .. } => e,
            e => crate::Error::MetadataUnavailable {
                token,
                reason: e.to_string(),
            },
        })
    }

    pub async fn resolve_meta(&self, token: Address) -> crate::Result<TokenMeta> {
        Ok(TokenMeta {
            address: token,
            decimals: self.resolve_decimals(token).await?,
            symbol: canonical(&token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::*;

    #[tokio::test]
    async fn test_known_token_skips_live_lookup() {
        let registry = Registry::default();
        let chain = MockChain::default();
        let resolver = MetadataResolver::new(&registry, &chain);

        let weth = registry.find("WETH").unwrap().address;
        assert_eq!(resolver.resolve_decimals(weth).await.unwrap(), 18);
        assert_eq!(chain.decimals_calls(), 0);
    }

    #[tokio::test]
    async fn test_live_lookup_is_not_cached() {
        let registry = test_registry();
        let chain = MockChain::default().with_decimals(T2, 6);
        let resolver = MetadataResolver::new(&registry, &chain);

        assert_eq!(resolver.resolve_decimals(T2).await.unwrap(), 6);
        assert_eq!(resolver.resolve_decimals(T2).await.unwrap(), 6);
        assert_eq!(chain.decimals_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unavailable() {
        let registry = test_registry();
        let chain = MockChain::default();
        let resolver = MetadataResolver::new(&registry, &chain);

        let err = resolver.resolve_decimals(T2).await.unwrap_err();
        assert!(matches!(err, crate::Error::MetadataUnavailable { token, .. } if token == T2));
    }

    #[tokio::test]
    async fn test_meta_uses_canonical_symbol() {
        let registry = test_registry();
        let chain = MockChain::default();
        let resolver = MetadataResolver::new(&registry, &chain);

        let meta = resolver.resolve_meta(T1).await.unwrap();
        assert_eq!(meta.decimals, 18);
        assert_eq!(meta.symbol, canonical(&T1));
        assert_eq!(meta.symbol, meta.symbol.to_lowercase());
    }
}
