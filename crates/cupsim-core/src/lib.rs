// Tournament progression engine: rosters, match ledger, group standings,
// qualification, bracket pairing and knockout rounds.

pub mod bracket;
pub mod error;
pub mod group;
pub mod knockout;
pub mod ledger;
pub mod player;
pub mod qualification;
pub mod roster;
pub mod standings;
pub mod store;
pub mod team;
pub mod tournament;
