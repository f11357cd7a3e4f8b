//! User profile persistence.
//!
//! The profile (display name, bio, optional avatar) is stored wholesale as a
//! single JSON document; a stable locally generated user id lives in the same
//! file.  The service is constructed once at the composition root and passed
//! by reference to consumers; there is no global instance.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use directories::ProjectDirs;
use palaver_shared::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the profile service.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("invalid avatar encoding: {0}")]
    Avatar(#[from] base64::DecodeError),

    #[error("could not determine application data directory")]
    NoDataDir,
}

/// The local user's editable profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub bio: String,
    pub avatar: Option<Vec<u8>>,
}

/// Whether a save touched the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The profile changed and the file was rewritten.
    Saved,
    /// Name, bio, and avatar were all unchanged; the file was not touched.
    Unchanged,
}

/// On-disk representation.  The avatar is base64 inside the JSON document.
#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    user_id: String,
    name: String,
    bio: String,
    avatar: Option<String>,
}

/// Owns the profile file and the in-memory current profile.
pub struct ProfileService {
    path: PathBuf,
    user_id: UserId,
    current: UserProfile,
}

impl ProfileService {
    /// Default profile path in the platform data directory.
    pub fn default_path() -> Result<PathBuf, ProfileError> {
        let project_dirs =
            ProjectDirs::from("com", "palaver", "palaver").ok_or(ProfileError::NoDataDir)?;
        Ok(project_dirs.data_dir().join("profile.json"))
    }

    /// Open the profile at the given path, creating it with a fresh user id
    /// and an empty profile if it does not exist yet.
    pub fn open(path: PathBuf) -> Result<Self, ProfileError> {
        match fs::read(&path) {
            Ok(bytes) => {
                let file: ProfileFile = serde_json::from_slice(&bytes)?;
                let avatar = file.avatar.map(|b64| BASE64.decode(b64)).transpose()?;
                Ok(Self {
                    path,
                    user_id: UserId(file.user_id),
                    current: UserProfile {
                        name: file.name,
                        bio: file.bio,
                        avatar,
                    },
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let service = Self {
                    path,
                    user_id: UserId(Uuid::new_v4().to_string()),
                    current: UserProfile::default(),
                };
                service.write_file(&service.current)?;
                tracing::info!(user_id = %service.user_id, "created new profile");
                Ok(service)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The stable, locally generated user id.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The current in-memory profile.
    pub fn current(&self) -> &UserProfile {
        &self.current
    }

    /// Persist the profile.
    ///
    /// If name, bio, and avatar are all unchanged versus the current
    /// profile, the file is not rewritten and [`SaveOutcome::Unchanged`] is
    /// returned.
    pub fn save(&mut self, profile: UserProfile) -> Result<SaveOutcome, ProfileError> {
        if self.current == profile {
            tracing::debug!("profile unchanged, skipping write");
            return Ok(SaveOutcome::Unchanged);
        }

        self.write_file(&profile)?;
        self.current = profile;
        tracing::info!("profile saved");
        Ok(SaveOutcome::Saved)
    }

    fn write_file(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = ProfileFile {
            user_id: self.user_id.as_str().to_string(),
            name: profile.name.clone(),
            bio: profile.bio.clone(),
            avatar: profile.avatar.as_ref().map(|bytes| BASE64.encode(bytes)),
        };

        let json = serde_json::to_vec_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
