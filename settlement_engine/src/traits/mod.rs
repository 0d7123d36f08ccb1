//! The engine's outward-facing seams.
//!
//! [`MarketplaceDatabase`] is the storage contract a backend must implement to host the settlement
//! engine. The side-effect traits ([`NotificationSink`], [`ChatStore`], [`RealtimePush`],
//! [`UserDirectory`]) are the narrow contracts through which settlement talks to its collaborators;
//! everything behind them (delivery, retry, rendering) is out of the engine's scope.
mod marketplace_database;
mod side_effects;

pub use marketplace_database::MarketplaceDatabase;
pub use side_effects::{
    ChatStore,
    NotificationSink,
    NullPush,
    RealtimePush,
    SideEffectError,
    SideEffects,
    UserDirectory,
};
