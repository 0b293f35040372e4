use crate::chain::{
    blockdata::genesis::GenesisInfo, hashes::PowAlgorithm, network::Network, pow::Target,
};

/// Consensus parameters for different networks.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Network for which these parameters are defined.
    pub network: Network,
    /// Digest used to score proof-of-work.
    pub pow_algorithm: PowAlgorithm,
    /// The maximum attainable target value for these params.
    pub pow_limit: Target,
    /// Fields of the network's first block.
    pub genesis: GenesisInfo,
}

impl Params {
    /// Consensus parameters for mainnet.
    pub const MAINNET: Self = Self {
        network: Network::Mainnet,
        pow_algorithm: PowAlgorithm::Scrypt,
        pow_limit: Target::MAX_ATTAINABLE_MAINNET,
        genesis: GenesisInfo::MAINNET,
    };
    /// Consensus parameters for testnet.
    pub const TESTNET: Self = Self {
        network: Network::Testnet,
        pow_algorithm: PowAlgorithm::Scrypt,
        pow_limit: Target::MAX_ATTAINABLE_MAINNET,
        genesis: GenesisInfo::TESTNET,
    };
    /// Consensus parameters for regtest.
    pub const REGTEST: Self = Self {
        network: Network::Regtest,
        pow_algorithm: PowAlgorithm::Scrypt,
        pow_limit: Target::MAX_ATTAINABLE_REGTEST,
        genesis: GenesisInfo::REGTEST,
    };

    /// Returns a copy of these parameters scoring proof-of-work with
    /// `algorithm` instead.
    pub const fn with_pow_algorithm(mut self, algorithm: PowAlgorithm) -> Self {
        self.pow_algorithm = algorithm;
        self
    }
}
