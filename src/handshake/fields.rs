//! Field lists accepted by the relay hops.
//!
//! The relays verify an OAuth 1.0 signature over exactly these fields and
//! reject requests carrying anything else, so bodies are always built from
//! these lists.

/// Fields posted to the first relay hop.
pub const RELAY_ONE_FIELDS: &[&str] = &[
    "resource_link_id",
    "lti_version",
    "lti_message_type",
    "user_id",
    "oauth_callback",
    "oauth_nonce",
    "oauth_version",
    "oauth_timestamp",
    "oauth_consumer_key",
    "oauth_signature_method",
    "oauth_signature",
    "context_id",
    "context_type",
    "roles",
];

/// Fields posted to the second relay hop.
pub const RELAY_TWO_FIELDS: &[&str] = &[
    "resource_link_id",
    "lti_version",
    "lti_message_type",
    "user_id",
    "oauth_callback",
    "oauth_nonce",
    "oauth_version",
    "oauth_timestamp",
    "oauth_consumer_key",
    "oauth_signature_method",
    "oauth_signature",
    "context_id",
    "context_type",
    "roles",
    "custom_code",
    "custom_download",
    "custom_warn",
];
