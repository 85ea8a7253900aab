mod store;

pub mod certificate_repository;
pub mod distribution_repository;
pub mod pool_repository;
pub mod tournament_repository;

// Re-export all repositories for convenient access
pub use certificate_repository::CertificateRepository;
pub use distribution_repository::DistributionRepository;
pub use pool_repository::PoolRepository;
pub use store::Shared;
pub use tournament_repository::TournamentRepository;
