//! Integration tests for Sumi-Swarm
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! transport clients and full runs end-to-end.

mod client_tests;
mod crawl_tests;

use sumi_swarm::config::UserAgentConfig;

/// User agent shared by every test configuration
pub fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}
