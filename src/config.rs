// ABOUTME: Backend platform credentials and collection identifiers read from the environment
// ABOUTME: Loaded once at startup and passed to the client factory per request

use anyhow::{Context, Result};
use std::env;

/// Avatar assigned to newly created user documents until the user picks one.
pub const AVATAR_PLACEHOLDER: &str = "https://www.gravatar.com/avatar/?d=mp";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub project: String,
    pub api_key: String,
    pub database_id: String,
    pub users_collection_id: String,
    pub files_collection_id: String,
    pub bucket_id: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: require("APPWRITE_ENDPOINT")?,
            project: require("APPWRITE_PROJECT")?,
            api_key: require("APPWRITE_KEY")?,
            database_id: require("APPWRITE_DATABASE")?,
            users_collection_id: require("APPWRITE_USERS_COLLECTION")?,
            files_collection_id: require("APPWRITE_FILES_COLLECTION")?,
            bucket_id: require("APPWRITE_BUCKET")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} is not set", name))
}
