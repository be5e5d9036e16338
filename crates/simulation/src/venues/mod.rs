//! In-memory implementations of every venue the vault drives.

mod pool;
mod reserve;
mod shares;
mod wallets;

pub use pool::SimulatedPool;
pub use reserve::SimulatedReserve;
pub use shares::SimulatedShareLedger;
pub use wallets::SimulatedWallets;
