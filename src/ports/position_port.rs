//! Position source port trait.

use crate::domain::error::RiskdeskError;
use crate::domain::position::AccountPositions;

/// Supplies grouped positions for every account, in display order.
pub trait PositionPort {
    fn fetch_accounts(&self) -> Result<Vec<AccountPositions>, RiskdeskError>;
}
