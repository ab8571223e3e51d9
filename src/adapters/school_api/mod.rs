//! School fee-status API adapters.

mod http_fee_client;
mod mock_fee_client;

pub use http_fee_client::{HttpFeeStatusClient, SchoolApiClientConfig};
pub use mock_fee_client::{FeeCall, MockFeeStatusClient};
