// Draft engine: pool resolution, turn projection, pick commits, auto-pick.

pub mod autopick;
pub mod commit;
pub mod pick;
pub mod player;
pub mod pool;
pub mod turn;

pub use autopick::best_available;
pub use commit::{commit_pick, PickError};
pub use pick::DraftPick;
pub use player::{Player, PlayerKind};
pub use pool::{resolve, PoolEntry};
pub use turn::{project, OrderSlot, TurnState};
