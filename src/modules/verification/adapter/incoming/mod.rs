pub mod delivery_dedup;
pub mod pubsub_envelope;
pub mod web;
