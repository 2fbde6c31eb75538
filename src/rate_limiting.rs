use std::net::SocketAddr;

use actix_governor::governor::middleware::StateInformationMiddleware;
use actix_governor::{
    GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError,
};
use actix_web::dev::ServiceRequest;
use anyhow::anyhow;

use crate::model::configuration::RateLimitingConfiguration;

/// Buckets requests by client IP.
///
/// The TCP peer is the client unless the service runs behind a trusted proxy, in which case
/// `Forwarded`/`X-Forwarded-For` name it.
#[derive(Clone)]
pub struct ClientAddress {
    trust_forwarded_headers: bool,
}

impl ClientAddress {
    pub fn new(trust_forwarded_headers: bool) -> Self {
        Self {
            trust_forwarded_headers,
        }
    }
}

impl KeyExtractor for ClientAddress {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        if self.trust_forwarded_headers {
            let info = req.connection_info();
            let address = info
                .realip_remote_addr()
                .ok_or_else(|| SimpleKeyExtractionError::new("Can't extract key"))?;
            return Ok(client_ip(address));
        }

        req.peer_addr()
            .map(|socket| socket.ip().to_string())
            .ok_or_else(|| SimpleKeyExtractionError::new("Can't extract key"))
    }
}

/// `10.0.0.1:51234` and `10.0.0.1` share the same bucket
fn client_ip(address: &str) -> String {
    address
        .parse::<SocketAddr>()
        .map(|socket| socket.ip().to_string())
        .unwrap_or_else(|_| address.to_owned())
}

pub fn build_rate_limiting_conf(
    configuration: &RateLimitingConfiguration,
) -> anyhow::Result<GovernorConfig<ClientAddress, StateInformationMiddleware>> {
    GovernorConfigBuilder::default()
        .per_second(configuration.fill_rate)
        .burst_size(configuration.bucket_size)
        .key_extractor(ClientAddress::new(configuration.trust_forwarded_headers))
        .use_headers()
        .finish()
        .ok_or_else(|| anyhow!("Rate limiting fill rate and bucket size must be greater than 0"))
}
