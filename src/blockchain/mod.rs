pub mod abi;
pub mod client;
pub mod contract;
pub mod events;
pub mod traits;
pub mod wallet;

pub use contract::{ElectionClient, ElectionDetails, LocalSigner};
pub use events::{CandidateRecord, ContractEvent, ElectionRecord, LogRange, VoteRecord};
pub use traits::{CreatedElection, ElectionWriter, ProviderRpcError, WalletProvider};
pub use wallet::{ConnectionState, WalletSession};
