//! Keys of the `client_state` table. These match the browser local-storage
//! keys the web client uses, so exported state can be moved between the two.

/// Visit counter table, JSON-encoded (monument id → count + last visit).
pub const MONUMENT_VISITS: &str = "historica-monument-storage";

/// Present once the welcome overlay has been dismissed.
pub const HAS_VISITED: &str = "hasVisitedHistorica";
